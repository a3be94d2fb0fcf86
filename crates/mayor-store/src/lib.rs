//! Storage for policy records.
//!
//! - [`memory`] and (with the `sqlite` feature) `sqlite`: `KeyValueStore`
//!   backends holding opaque bytes
//! - [`key_index`]: the `policy_keys` id list
//! - [`repository`]: `PolicyRepository`, the only code that reads or writes
//!   records and the index
//! - [`query`]: search filters and per-status counts over a listing

pub mod error;
pub mod key_index;
pub mod memory;
pub mod query;
pub mod repository;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use error::{RepoError, RepoResult};
pub use key_index::KEY_INDEX;
pub use memory::InMemoryStore;
pub use query::{stats, PolicyQuery, PolicyStats};
pub use repository::{PolicyRepository, DEFAULT_MAX_ID_ATTEMPTS};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
