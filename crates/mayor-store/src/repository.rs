use futures::future::join_all;
use mayor_cipher::{Decimal, ValueCodec};
use mayor_core::{Identity, KeyValueStore, PolicyId, Timestamp};
use mayor_policy::lifecycle::{self, Transition};
use mayor_policy::{encode_record, parse_record, ImpactScorer, PolicyRecord, RandomImpactScorer};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{RepoError, RepoResult};
use crate::key_index::{encode_index, parse_index, KEY_INDEX};
use crate::query::PolicyQuery;

pub const DEFAULT_MAX_ID_ATTEMPTS: u32 = 5;

type IdGenerator = dyn Fn(Timestamp) -> PolicyId + Send + Sync;

/// Policy records over a `KeyValueStore`.
///
/// Records live under `policy_<id>`, the ids under the `policy_keys`
/// index. The repository is the only writer of either.
///
/// `create` holds a write guard from the existence check through the index
/// append, so concurrent creates on one repository never lose index
/// entries. Repositories sharing a store do not share the guard; across
/// them the index append is still last-writer-wins. `apply` takes no lock:
/// two transitions racing on one id are last-writer-wins.
pub struct PolicyRepository {
    store: Arc<dyn KeyValueStore>,
    codec: Arc<dyn ValueCodec>,
    scorer: Arc<dyn ImpactScorer>,
    id_generator: Arc<IdGenerator>,
    max_id_attempts: u32,
    listing: Mutex<()>,
    writing: Mutex<()>,
}

impl PolicyRepository {
    pub fn new(store: Arc<dyn KeyValueStore>, codec: Arc<dyn ValueCodec>) -> Self {
        Self {
            store,
            codec,
            scorer: Arc::new(RandomImpactScorer),
            id_generator: Arc::new(PolicyId::generate),
            max_id_attempts: DEFAULT_MAX_ID_ATTEMPTS,
            listing: Mutex::new(()),
            writing: Mutex::new(()),
        }
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn ImpactScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Replace how `publish` mints ids.
    pub fn with_id_generator(
        mut self,
        generator: impl Fn(Timestamp) -> PolicyId + Send + Sync + 'static,
    ) -> Self {
        self.id_generator = Arc::new(generator);
        self
    }

    pub fn with_max_id_attempts(mut self, attempts: u32) -> Self {
        self.max_id_attempts = attempts.max(1);
        self
    }

    pub fn codec(&self) -> &dyn ValueCodec {
        self.codec.as_ref()
    }

    async fn ensure_available(&self) -> RepoResult<()> {
        if self.store.is_available().await {
            Ok(())
        } else {
            Err(RepoError::StoreUnavailable)
        }
    }

    async fn read_index(&self) -> RepoResult<Vec<PolicyId>> {
        match self.store.get(KEY_INDEX).await? {
            Some(bytes) => Ok(parse_index(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    async fn exists(&self, id: &PolicyId) -> RepoResult<bool> {
        Ok(matches!(
            self.store.get(&id.storage_key()).await?,
            Some(bytes) if !bytes.is_empty()
        ))
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Store a new record and append its id to the index.
    ///
    /// If the index write fails after the record write, the record is left
    /// orphaned (stored but unlisted) and the index error is returned.
    pub async fn create(&self, record: &PolicyRecord) -> RepoResult<PolicyId> {
        self.ensure_available().await?;
        let _guard = self.writing.lock().await;

        let id = record.id().clone();
        if self.exists(&id).await? {
            return Err(RepoError::Conflict(format!("policy {} already exists", id)));
        }

        let mut ids = self.read_index().await?;
        let bytes = encode_record(record)?;
        self.store.set(&id.storage_key(), &bytes).await?;

        ids.push(id.clone());
        let index = encode_index(&ids)?;
        if let Err(e) = self.store.set(KEY_INDEX, &index).await {
            tracing::warn!(policy_id = %id, error = %e, "policy record written but index append failed; record is orphaned");
            return Err(e.into());
        }

        tracing::info!(policy_id = %id, owner = %record.owner(), "policy created");
        Ok(id)
    }

    /// Encrypt and store a new Draft policy under a freshly minted id.
    ///
    /// An id that is already taken is retried with a new one, up to the
    /// configured attempt limit.
    pub async fn publish(
        &self,
        owner: &Identity,
        tax_rate: Decimal,
        tariff: Decimal,
    ) -> RepoResult<PolicyRecord> {
        let impact = self.scorer.score(tax_rate, tariff);

        for attempt in 1..=self.max_id_attempts {
            let now = Timestamp::now();
            let record = lifecycle::create(
                self.codec.as_ref(),
                (self.id_generator)(now),
                owner.clone(),
                tax_rate,
                tariff,
                impact,
                now.seconds_since_epoch,
            );

            match self.create(&record).await {
                Ok(_) => return Ok(record),
                Err(RepoError::Conflict(reason)) => {
                    tracing::warn!(attempt, %reason, "policy id collision, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(RepoError::Conflict(format!(
            "no free policy id after {} attempts",
            self.max_id_attempts
        )))
    }

    /// Read-modify-write a lifecycle transition.
    pub async fn apply(
        &self,
        id: &PolicyId,
        transition: Transition,
        actor: &Identity,
    ) -> RepoResult<PolicyRecord> {
        let record = self.get(id).await?;
        let next = lifecycle::apply(&record, transition, actor, self.codec.as_ref())?;

        let bytes = encode_record(&next)?;
        self.store.set(&id.storage_key(), &bytes).await?;

        tracing::info!(policy_id = %id, %transition, status = %next.status(), "policy transitioned");
        Ok(next)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn get(&self, id: &PolicyId) -> RepoResult<PolicyRecord> {
        self.ensure_available().await?;

        match self.store.get(&id.storage_key()).await? {
            Some(bytes) if !bytes.is_empty() => Ok(parse_record(id, &bytes)?),
            _ => Err(RepoError::RecordNotFound(id.clone())),
        }
    }

    /// Every indexed record, newest first (ties broken by id).
    ///
    /// Records are fetched concurrently. A missing, unreadable or
    /// unparseable record is logged and skipped; only an unavailable store
    /// or a corrupt index fails the call. One listing at a time per
    /// repository.
    pub async fn list(&self) -> RepoResult<Vec<PolicyRecord>> {
        let _guard = self
            .listing
            .try_lock()
            .map_err(|_| RepoError::ListInFlight)?;

        self.ensure_available().await?;

        let mut seen = HashSet::new();
        let ids: Vec<PolicyId> = self
            .read_index()
            .await?
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();

        let fetches = ids.iter().map(|id| {
            let store = Arc::clone(&self.store);
            async move { (id, store.get(&id.storage_key()).await) }
        });
        let results = join_all(fetches).await;

        let mut records = Vec::with_capacity(results.len());
        for (id, result) in results {
            match result {
                Ok(Some(bytes)) if !bytes.is_empty() => match parse_record(id, &bytes) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        tracing::warn!(policy_id = %id, error = %e, "skipping unparseable policy record")
                    }
                },
                Ok(_) => tracing::warn!(policy_id = %id, "skipping indexed policy with no record"),
                Err(e) => {
                    tracing::warn!(policy_id = %id, error = %e, "skipping policy that failed to load")
                }
            }
        }

        records.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        tracing::debug!(indexed = ids.len(), loaded = records.len(), "policies listed");
        Ok(records)
    }

    /// `list()` filtered by `query`.
    pub async fn search(&self, query: &PolicyQuery) -> RepoResult<Vec<PolicyRecord>> {
        Ok(query.filter(self.list().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use mayor_cipher::ReferenceCodec;
    use mayor_policy::{FixedImpactScorer, Impact, LifecycleError, PolicyStatus};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn repo_with(store: Arc<InMemoryStore>) -> PolicyRepository {
        PolicyRepository::new(store, Arc::new(ReferenceCodec::new())).with_scorer(Arc::new(
            FixedImpactScorer(Impact {
                happiness: 3,
                revenue: -2,
            }),
        ))
    }

    fn record(id: &str, created_at: u64) -> PolicyRecord {
        lifecycle::create(
            &ReferenceCodec::new(),
            PolicyId::new(id),
            Identity::new("0xA"),
            Decimal::new(125, 1),
            Decimal::new(70, 1),
            Impact::default(),
            created_at,
        )
    }

    #[tokio::test]
    async fn test_create_writes_record_and_index() {
        let store = Arc::new(InMemoryStore::new());
        let repo = repo_with(store.clone());

        let id = repo.create(&record("p1", 10)).await.unwrap();
        assert_eq!(id, PolicyId::new("p1"));

        let index = store.get(KEY_INDEX).await.unwrap().unwrap();
        assert_eq!(index, br#"["p1"]"#);
        assert!(store.get("policy_p1").await.unwrap().is_some());
        assert_eq!(repo.get(&id).await.unwrap(), record("p1", 10));
    }

    #[tokio::test]
    async fn test_create_conflict() {
        let repo = repo_with(Arc::new(InMemoryStore::new()));
        repo.create(&record("p1", 10)).await.unwrap();
        assert!(matches!(
            repo.create(&record("p1", 20)).await,
            Err(RepoError::Conflict(_))
        ));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let repo = repo_with(Arc::new(InMemoryStore::new()));
        assert!(matches!(
            repo.get(&PolicyId::new("nope")).await,
            Err(RepoError::RecordNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_corrupt_is_parse_error() {
        let store = Arc::new(InMemoryStore::new());
        store.insert_raw("policy_bad", b"{\"taxRate\":1}").unwrap();
        let repo = repo_with(store);
        assert!(matches!(
            repo.get(&PolicyId::new("bad")).await,
            Err(RepoError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_list_empty_without_index() {
        let repo = repo_with(Arc::new(InMemoryStore::new()));
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_sorted_newest_first_then_id() {
        let repo = repo_with(Arc::new(InMemoryStore::new()));
        for (id, t) in [("b", 5), ("c", 9), ("a", 5), ("d", 1)] {
            repo.create(&record(id, t)).await.unwrap();
        }
        let ids: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .iter()
            .map(|r| r.id().to_string())
            .collect();
        assert_eq!(ids, vec!["c", "a", "b", "d"]);
    }

    #[tokio::test]
    async fn test_list_skips_missing_and_corrupt() {
        let store = Arc::new(InMemoryStore::new());
        let repo = repo_with(store.clone());
        repo.create(&record("good", 1)).await.unwrap();
        store
            .insert_raw(KEY_INDEX, br#"["good","ghost","broken","good"]"#)
            .unwrap();
        store.insert_raw("policy_broken", b"not json").unwrap();

        let listed = repo.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id(), &PolicyId::new("good"));
    }

    #[tokio::test]
    async fn test_corrupt_index_fails_list_and_create() {
        let store = Arc::new(InMemoryStore::new());
        store.insert_raw(KEY_INDEX, b"{oops").unwrap();
        let repo = repo_with(store.clone());

        assert!(matches!(repo.list().await, Err(RepoError::Parse(_))));
        assert!(matches!(
            repo.create(&record("p1", 1)).await,
            Err(RepoError::Parse(_))
        ));
        assert!(store.get("policy_p1").await.unwrap().is_none());
        assert_eq!(store.get(KEY_INDEX).await.unwrap().unwrap(), b"{oops");
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let store = Arc::new(InMemoryStore::new());
        let repo = repo_with(store.clone());
        repo.create(&record("p1", 1)).await.unwrap();
        store.set_available(false);

        assert!(matches!(repo.list().await, Err(RepoError::StoreUnavailable)));
        assert!(matches!(
            repo.get(&PolicyId::new("p1")).await,
            Err(RepoError::StoreUnavailable)
        ));
        assert!(matches!(
            repo.create(&record("p2", 1)).await,
            Err(RepoError::StoreUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_publish_uses_scorer_and_is_draft() {
        let repo = repo_with(Arc::new(InMemoryStore::new()));
        let owner = Identity::new("0xA");
        let published = repo
            .publish(&owner, Decimal::new(125, 1), Decimal::new(7, 0))
            .await
            .unwrap();
        assert_eq!(published.status(), PolicyStatus::Draft);
        assert_eq!(published.happiness_impact(), 3);
        assert_eq!(published.revenue_impact(), -2);
        assert!(published.id().as_str().starts_with("policy-"));
        assert_eq!(repo.get(published.id()).await.unwrap(), published);
    }

    #[tokio::test]
    async fn test_publish_retries_id_collision() {
        let store = Arc::new(InMemoryStore::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let repo = repo_with(store).with_id_generator(move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            PolicyId::new(if n < 2 { "taken" } else { "fresh" })
        });
        repo.create(&record("taken", 1)).await.unwrap();

        let published = repo
            .publish(&Identity::new("0xA"), Decimal::ONE, Decimal::ONE)
            .await
            .unwrap();
        assert_eq!(published.id(), &PolicyId::new("fresh"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_publish_gives_up_after_max_attempts() {
        let repo = repo_with(Arc::new(InMemoryStore::new()))
            .with_id_generator(|_| PolicyId::new("taken"))
            .with_max_id_attempts(3);
        repo.create(&record("taken", 1)).await.unwrap();

        assert!(matches!(
            repo.publish(&Identity::new("0xA"), Decimal::ONE, Decimal::ONE)
                .await,
            Err(RepoError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_apply_persists_transition() {
        let repo = repo_with(Arc::new(InMemoryStore::new()));
        let owner = Identity::new("0xA");
        repo.create(&record("p1", 1)).await.unwrap();
        let id = PolicyId::new("p1");

        let active = repo.apply(&id, Transition::Activate, &owner).await.unwrap();
        assert_eq!(repo.get(&id).await.unwrap(), active);
        assert_eq!(active.status(), PolicyStatus::Active);

        let err = repo
            .apply(&id, Transition::Activate, &owner)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::Lifecycle(LifecycleError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_apply_by_non_owner_leaves_stored_bytes() {
        let store = Arc::new(InMemoryStore::new());
        let repo = repo_with(store.clone());
        repo.create(&record("p1", 1)).await.unwrap();
        let before = store.get("policy_p1").await.unwrap();

        let err = repo
            .apply(&PolicyId::new("p1"), Transition::Archive, &Identity::new("0xB"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::Lifecycle(LifecycleError::Unauthorized { .. })
        ));
        assert_eq!(store.get("policy_p1").await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_apply_missing_record() {
        let repo = repo_with(Arc::new(InMemoryStore::new()));
        assert!(matches!(
            repo.apply(&PolicyId::new("x"), Transition::Archive, &Identity::new("0xA"))
                .await,
            Err(RepoError::RecordNotFound(_))
        ));
    }

    struct YieldingStore {
        inner: InMemoryStore,
    }

    #[async_trait::async_trait]
    impl KeyValueStore for YieldingStore {
        async fn get(&self, key: &str) -> mayor_core::MayorResult<Option<Vec<u8>>> {
            tokio::task::yield_now().await;
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &[u8]) -> mayor_core::MayorResult<()> {
            tokio::task::yield_now().await;
            self.inner.set(key, value).await
        }

        async fn is_available(&self) -> bool {
            tokio::task::yield_now().await;
            true
        }
    }

    #[tokio::test]
    async fn test_interleaved_publishes_keep_every_index_entry() {
        let store = Arc::new(YieldingStore {
            inner: InMemoryStore::new(),
        });
        let repo = PolicyRepository::new(store.clone(), Arc::new(ReferenceCodec::new()));
        let owner = Identity::new("0xA");

        let (a, b) = tokio::join!(
            repo.publish(&owner, Decimal::new(10, 0), Decimal::new(5, 0)),
            repo.publish(&owner, Decimal::new(20, 0), Decimal::new(6, 0)),
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a.id(), b.id());

        let listed = repo.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.contains(&a) && listed.contains(&b));

        let index = parse_index(&store.inner.get(KEY_INDEX).await.unwrap().unwrap()).unwrap();
        assert_eq!(index.len(), 2);
    }
}
