//! End-to-end: two mayors sharing one SQLite-backed ledger.
//!
//! 1. Alice initializes a wallet and config, publishes a policy
//! 2. The policy survives a restart
//! 3. Bob can list and read it but cannot activate or archive it
//! 4. Alice activates it and reveals the raised values with a signed challenge

use mayor::{initialize, load_or_create_wallet, RootConfig, RootError, StoreBackend};
use mayor_cipher::{Decimal, RevealState};
use mayor_policy::{PolicyField, PolicyStatus};
use mayor_store::PolicyQuery;
use std::path::PathBuf;
use std::str::FromStr;

struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("mayor-e2e-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        Self { dir }
    }

    fn config_for(&self, who: &str) -> RootConfig {
        let mut config = RootConfig::default();
        config.store.backend = StoreBackend::Sqlite;
        config.store.path = self.dir.join("policies.db");
        config.wallet.key_path = self.dir.join(format!("{}.key", who));
        config.reveal.validity_seconds = 600;
        config
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[tokio::test]
async fn two_mayors_one_ledger() {
    let ws = Workspace::new("ledger");

    // Chapter 1: Alice sets up and publishes.
    let alice_config = ws.config_for("alice");
    let alice_wallet = load_or_create_wallet(&alice_config.wallet.key_path).unwrap();
    let config_path = ws.dir.join("config.toml");
    alice_config.save(&config_path).unwrap();

    let mut alice = initialize(RootConfig::load(&config_path).unwrap()).unwrap();
    assert_eq!(alice.identity().unwrap(), alice_wallet.identity());
    let policy = alice.publish(d("12.5"), d("7.0")).await.unwrap();
    assert_eq!(policy.status(), PolicyStatus::Draft);
    drop(alice);

    // Chapter 2: restart, the record is still there.
    let mut alice = initialize(ws.config_for("alice")).unwrap();
    let listed = alice.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], policy);

    // Chapter 3: Bob reads but cannot transition.
    let bob_config = ws.config_for("bob");
    load_or_create_wallet(&bob_config.wallet.key_path).unwrap();
    let mut bob = initialize(bob_config).unwrap();

    let hits = bob
        .search(&PolicyQuery::new(alice_wallet.identity().as_str()))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert!(bob.activate(policy.id()).await.is_err());
    assert!(bob.archive(policy.id()).await.is_err());
    assert_eq!(
        bob.repository().get(policy.id()).await.unwrap(),
        policy,
        "failed transitions must not touch the stored record"
    );

    // Chapter 4: Alice activates and reveals.
    alice.activate(policy.id()).await.unwrap();
    alice.view(policy.id()).await.unwrap();
    assert_eq!(alice.reveal(PolicyField::TaxRate).await.unwrap(), d("13.75"));
    assert_eq!(alice.reveal(PolicyField::Tariff).await.unwrap(), d("7.7"));
    assert_eq!(alice.reveal_state(), Some(RevealState::Authorized));

    let stats = alice.stats().await.unwrap();
    assert_eq!((stats.total, stats.active), (1, 1));

    let history: Vec<&str> = alice.history().collect();
    assert_eq!(history.len(), 1);
    assert!(history[0].contains("Activated policy"));
}

#[tokio::test]
async fn no_wallet_means_read_only() {
    let ws = Workspace::new("readonly");
    let mut config = ws.config_for("nobody");
    config.store.backend = StoreBackend::Memory;

    let mut state = initialize(config).unwrap();
    assert!(!state.is_connected());
    assert!(state.list().await.unwrap().is_empty());
    assert!(matches!(
        state.publish(d("1"), d("1")).await,
        Err(RootError::NotConnected)
    ));
}
