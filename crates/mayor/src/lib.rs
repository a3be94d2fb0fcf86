//! Mayor root library.
//!
//! Ties the policy repository, the reveal flow and the caller's wallet
//! together behind one owned [`AppState`]. The binary builds an `AppState`
//! with [`initialize`] and drives it one command at a time.

pub mod config;
pub mod error;

pub use config::{RepositoryConfig, RevealConfig, RootConfig, StoreBackend, StoreConfig, WalletConfig};
pub use error::{RootError, RootResult};

use async_trait::async_trait;
use mayor_cipher::{Decimal, LocalWallet, ReferenceCodec, RevealContext, RevealSession, RevealState};
use mayor_core::{
    Identity, IdentityProvider, KeyValueStore, PolicyId, SignatureAuthority, SignatureError,
    Timestamp,
};
use mayor_policy::lifecycle::Transition;
use mayor_policy::{PolicyField, PolicyRecord};
use mayor_store::{InMemoryStore, PolicyQuery, PolicyRepository, PolicyStats};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Entries kept in the action history.
pub const HISTORY_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// Wallet key file
// ---------------------------------------------------------------------------

/// Load the wallet at `path`, or `None` when no key file exists.
pub fn load_wallet(path: &Path) -> RootResult<Option<LocalWallet>> {
    if !path.exists() {
        return Ok(None);
    }
    let encoded = zeroize::Zeroizing::new(std::fs::read_to_string(path)?);
    Ok(Some(LocalWallet::from_hex(&encoded)?))
}

/// Load the wallet at `path`, generating and saving a new one if absent.
pub fn load_or_create_wallet(path: &Path) -> RootResult<LocalWallet> {
    if let Some(wallet) = load_wallet(path)? {
        return Ok(wallet);
    }

    let wallet = LocalWallet::generate();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, wallet.to_hex().as_bytes())?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        let _ = std::fs::set_permissions(path, perms);
    }
    info!(identity = %wallet.identity(), "new wallet created");
    Ok(wallet)
}

/// Stand-in for a missing wallet: no identity, refuses to sign.
struct Disconnected;

impl IdentityProvider for Disconnected {
    fn current_identity(&self) -> Option<Identity> {
        None
    }
}

#[async_trait]
impl SignatureAuthority for Disconnected {
    async fn sign(&self, _message: &str) -> Result<Vec<u8>, SignatureError> {
        Err(SignatureError::Fault("no wallet connected".into()))
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The policy currently opened for viewing, with its own reveal session.
struct Viewing {
    record: PolicyRecord,
    session: RevealSession,
}

/// Everything one user session needs, passed by reference into every
/// operation.
pub struct AppState {
    pub config: RootConfig,
    repository: PolicyRepository,
    identity: Arc<dyn IdentityProvider>,
    authority: Arc<dyn SignatureAuthority>,
    viewing: Option<Viewing>,
    history: VecDeque<String>,
}

impl AppState {
    pub fn new(
        config: RootConfig,
        repository: PolicyRepository,
        identity: Arc<dyn IdentityProvider>,
        authority: Arc<dyn SignatureAuthority>,
    ) -> Self {
        Self {
            config,
            repository,
            identity,
            authority,
            viewing: None,
            history: VecDeque::with_capacity(HISTORY_LIMIT),
        }
    }

    /// State whose identity and signer are both `wallet`, or a
    /// disconnected state when `wallet` is `None`.
    pub fn with_wallet(
        config: RootConfig,
        repository: PolicyRepository,
        wallet: Option<LocalWallet>,
    ) -> Self {
        match wallet {
            Some(wallet) => {
                let wallet = Arc::new(wallet);
                Self::new(config, repository, wallet.clone(), wallet)
            }
            None => Self::new(
                config,
                repository,
                Arc::new(Disconnected),
                Arc::new(Disconnected),
            ),
        }
    }

    pub fn repository(&self) -> &PolicyRepository {
        &self.repository
    }

    pub fn is_connected(&self) -> bool {
        self.identity.is_connected()
    }

    /// The caller's identity, or `NotConnected`.
    pub fn identity(&self) -> RootResult<Identity> {
        self.identity
            .current_identity()
            .ok_or(RootError::NotConnected)
    }

    /// Newest first, at most `HISTORY_LIMIT` entries.
    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    fn record_action(&mut self, action: String) {
        let stamped = format!("{}: {}", chrono::Utc::now().format("%H:%M:%S"), action);
        self.history.push_front(stamped);
        self.history.truncate(HISTORY_LIMIT);
    }

    // -----------------------------------------------------------------------
    // Policy operations
    // -----------------------------------------------------------------------

    pub async fn publish(&mut self, tax_rate: Decimal, tariff: Decimal) -> RootResult<PolicyRecord> {
        let owner = self.identity()?;
        let record = self.repository.publish(&owner, tax_rate, tariff).await?;
        self.record_action(format!("Created policy {}", record.id()));
        Ok(record)
    }

    pub async fn list(&self) -> RootResult<Vec<PolicyRecord>> {
        Ok(self.repository.list().await?)
    }

    pub async fn search(&self, query: &PolicyQuery) -> RootResult<Vec<PolicyRecord>> {
        Ok(self.repository.search(query).await?)
    }

    pub async fn stats(&self) -> RootResult<PolicyStats> {
        Ok(mayor_store::stats(&self.list().await?))
    }

    pub async fn activate(&mut self, id: &PolicyId) -> RootResult<PolicyRecord> {
        self.transition(id, Transition::Activate, "Activated").await
    }

    pub async fn archive(&mut self, id: &PolicyId) -> RootResult<PolicyRecord> {
        self.transition(id, Transition::Archive, "Archived").await
    }

    async fn transition(
        &mut self,
        id: &PolicyId,
        transition: Transition,
        verb: &str,
    ) -> RootResult<PolicyRecord> {
        let actor = self.identity()?;
        let record = self.repository.apply(id, transition, &actor).await?;
        self.record_action(format!("{} policy {}", verb, id));

        if let Some(viewing) = self.viewing.as_mut() {
            if viewing.record.id() == id {
                viewing.record = record.clone();
            }
        }
        Ok(record)
    }

    // -----------------------------------------------------------------------
    // Viewing and reveal
    // -----------------------------------------------------------------------

    /// Open a policy for viewing. Starts a fresh reveal session, dropping
    /// any authorization held for the previously viewed policy.
    pub async fn view(&mut self, id: &PolicyId) -> RootResult<&PolicyRecord> {
        let identity = self.identity()?;
        let record = self.repository.get(id).await?;
        let viewing = self.viewing.insert(Viewing {
            record,
            session: RevealSession::new(identity),
        });
        Ok(&viewing.record)
    }

    pub fn viewed(&self) -> Option<&PolicyRecord> {
        self.viewing.as_ref().map(|v| &v.record)
    }

    /// Reveal state of the viewed policy's session, if any.
    pub fn reveal_state(&self) -> Option<RevealState> {
        self.viewing
            .as_ref()
            .map(|v| v.session.state_at(Timestamp::now()))
    }

    /// Decrypt one field of the viewed policy.
    ///
    /// The first reveal in a session asks the signer to sign a challenge.
    /// Later reveals reuse the proof until it expires.
    pub async fn reveal(&mut self, field: PolicyField) -> RootResult<Decimal> {
        if !self.is_connected() {
            return Err(RootError::NotConnected);
        }
        let context = self.reveal_context();
        let authority = Arc::clone(&self.authority);
        let viewing = self.viewing.as_mut().ok_or(RootError::NothingInView)?;

        let proof = match viewing.session.state_at(Timestamp::now()) {
            RevealState::Authorized => viewing.session.proof().cloned(),
            _ => None,
        };
        let proof = match proof {
            Some(proof) => proof,
            None => {
                viewing.session.request_challenge(context)?;
                viewing.session.authorize(authority.as_ref()).await?
            }
        };

        let value = self
            .repository
            .codec()
            .decrypt(viewing.record.field(field), Some(&proof))?;
        info!(policy_id = %viewing.record.id(), %field, "policy value revealed");
        Ok(value)
    }

    fn reveal_context(&self) -> RevealContext {
        RevealContext {
            public_key_material: RevealContext::generate_key_material(),
            store_address: self.config.reveal.store_address.clone(),
            network_id: self.config.reveal.network_id,
            valid_from: Timestamp::now(),
            valid_duration_seconds: self.config.reveal.validity_seconds,
        }
    }
}

// ---------------------------------------------------------------------------
// Initialization
// ---------------------------------------------------------------------------

fn open_store(config: &StoreConfig) -> RootResult<Arc<dyn KeyValueStore>> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(InMemoryStore::new())),
        #[cfg(feature = "sqlite")]
        StoreBackend::Sqlite => {
            if let Some(parent) = config.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let path = config
                .path
                .to_str()
                .ok_or_else(|| RootError::Config("store.path is not valid UTF-8".into()))?;
            Ok(Arc::new(mayor_store::SqliteStore::open(path)?))
        }
        #[cfg(not(feature = "sqlite"))]
        StoreBackend::Sqlite => Err(RootError::Config(
            "sqlite backend requested but this build lacks the `sqlite` feature".into(),
        )),
    }
}

/// Build an `AppState` from configuration: open the store, load the wallet
/// if its key file exists.
pub fn initialize(config: RootConfig) -> RootResult<AppState> {
    config.validate()?;

    info!(
        backend = ?config.store.backend,
        store_path = %config.store.path.display(),
        "initializing mayor"
    );

    let store = open_store(&config.store)?;
    let repository = PolicyRepository::new(store, Arc::new(ReferenceCodec::new()))
        .with_max_id_attempts(config.repository.max_id_attempts);
    let wallet = load_wallet(&config.wallet.key_path)?;
    if let Some(wallet) = &wallet {
        info!(identity = %wallet.identity(), "wallet loaded");
    }

    Ok(AppState::with_wallet(config, repository, wallet))
}
