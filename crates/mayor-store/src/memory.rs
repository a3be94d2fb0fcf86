use async_trait::async_trait;
use mayor_core::{KeyValueStore, MayorError, MayorResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-memory key-value store.
///
/// Used by tests and by ephemeral runs where nothing needs to persist.
pub struct InMemoryStore {
    data: Mutex<HashMap<String, Vec<u8>>>,
    available: AtomicBool,
}

fn lock_data(
    mutex: &Mutex<HashMap<String, Vec<u8>>>,
) -> MayorResult<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>> {
    mutex
        .lock()
        .map_err(|e| MayorError::Store(format!("lock poisoned: {}", e)))
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Toggle what `is_available` reports. Reads and writes still go through.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// All stored keys (for testing/inspection).
    pub fn keys(&self) -> Vec<String> {
        lock_data(&self.data)
            .map(|d| d.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        lock_data(&self.data).map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write raw bytes without going through the async trait.
    pub fn insert_raw(&self, key: &str, value: &[u8]) -> MayorResult<()> {
        lock_data(&self.data)?.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> MayorResult<Option<Vec<u8>>> {
        let data = lock_data(&self.data)?;
        Ok(data.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> MayorResult<()> {
        self.insert_raw(key, value)
    }

    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}
