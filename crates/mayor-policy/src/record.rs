use mayor_cipher::Ciphertext;
use mayor_core::{Identity, PolicyId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// PolicyStatus — Draft -> Active -> Archived, Archived terminal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyStatus {
    Draft,
    Active,
    Archived,
}

impl PolicyStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PolicyStatus::Archived)
    }
}

impl fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyStatus::Draft => write!(f, "draft"),
            PolicyStatus::Active => write!(f, "active"),
            PolicyStatus::Archived => write!(f, "archived"),
        }
    }
}

impl FromStr for PolicyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Ok(PolicyStatus::Draft),
            "active" => Ok(PolicyStatus::Active),
            "archived" => Ok(PolicyStatus::Archived),
            other => Err(format!("unknown policy status '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Impact — scores assigned once at creation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Impact {
    pub happiness: i64,
    pub revenue: i64,
}

// ---------------------------------------------------------------------------
// PolicyRecord
// ---------------------------------------------------------------------------

/// One published policy.
///
/// Fields are read-only from outside this crate: `id`, `owner`,
/// `created_at` and the impacts never change, and the ciphertexts and
/// status change only through `lifecycle` transitions, which return a new
/// record rather than mutating this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRecord {
    pub(crate) id: PolicyId,
    pub(crate) encrypted_tax_rate: Ciphertext,
    pub(crate) encrypted_tariff: Ciphertext,
    pub(crate) created_at: u64,
    pub(crate) owner: Identity,
    pub(crate) status: PolicyStatus,
    pub(crate) impact: Impact,
}

impl PolicyRecord {
    pub fn id(&self) -> &PolicyId {
        &self.id
    }

    pub fn encrypted_tax_rate(&self) -> &Ciphertext {
        &self.encrypted_tax_rate
    }

    pub fn encrypted_tariff(&self) -> &Ciphertext {
        &self.encrypted_tariff
    }

    /// Creation time, unix seconds.
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    pub fn status(&self) -> PolicyStatus {
        self.status
    }

    pub fn happiness_impact(&self) -> i64 {
        self.impact.happiness
    }

    pub fn revenue_impact(&self) -> i64 {
        self.impact.revenue
    }

    pub fn impact(&self) -> Impact {
        self.impact
    }

    pub fn is_owned_by(&self, actor: &Identity) -> bool {
        self.owner.matches(actor)
    }

    /// Field-level read access for views that pick a column by name.
    pub fn field(&self, field: PolicyField) -> &Ciphertext {
        match field {
            PolicyField::TaxRate => &self.encrypted_tax_rate,
            PolicyField::Tariff => &self.encrypted_tariff,
        }
    }
}

/// The two encrypted columns of a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyField {
    TaxRate,
    Tariff,
}

impl fmt::Display for PolicyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyField::TaxRate => write!(f, "tax rate"),
            PolicyField::Tariff => write!(f, "trade tariff"),
        }
    }
}
