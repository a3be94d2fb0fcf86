use mayor_policy::{PolicyRecord, PolicyStatus};

/// Search box over a listing: case-insensitive substring of id or owner,
/// optionally narrowed to one status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyQuery {
    pub text: String,
    pub status: Option<PolicyStatus>,
}

impl PolicyQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: PolicyStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, record: &PolicyRecord) -> bool {
        let needle = self.text.to_lowercase();
        let text_match = needle.is_empty()
            || record.id().as_str().to_lowercase().contains(&needle)
            || record.owner().as_str().to_lowercase().contains(&needle);
        let status_match = self.status.map_or(true, |s| record.status() == s);
        text_match && status_match
    }

    /// Keep matching records, preserving order.
    pub fn filter(&self, records: Vec<PolicyRecord>) -> Vec<PolicyRecord> {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

/// Per-status counts for a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolicyStats {
    pub total: usize,
    pub draft: usize,
    pub active: usize,
    pub archived: usize,
}

pub fn stats(records: &[PolicyRecord]) -> PolicyStats {
    records
        .iter()
        .fold(PolicyStats::default(), |mut acc, record| {
            acc.total += 1;
            match record.status() {
                PolicyStatus::Draft => acc.draft += 1,
                PolicyStatus::Active => acc.active += 1,
                PolicyStatus::Archived => acc.archived += 1,
            }
            acc
        })
}
