use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{SessionStore, StoreKey, StoreOp};
use crate::StoreResult;

/// Non-persistent store, lost when dropped
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: Mutex<BTreeMap<StoreKey, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `values`
    pub fn with_values(values: impl IntoIterator<Item = (StoreKey, String)>) -> Self {
        Self {
            values: Mutex::new(values.into_iter().collect()),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: StoreKey) -> StoreResult<Option<String>> {
        Ok(self
            .values
            .lock()
            .expect("Locking failed")
            .get(&key)
            .cloned())
    }

    fn apply(&self, ops: &[StoreOp]) -> StoreResult<()> {
        let mut values = self.values.lock().expect("Locking failed");
        for op in ops {
            match op {
                StoreOp::Set(key, value) => {
                    values.insert(*key, value.clone());
                }
                StoreOp::Remove(key) => {
                    values.remove(key);
                }
            }
        }
        Ok(())
    }
}
