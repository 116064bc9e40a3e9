//! Key-value persistence for the session record
//!
//! The session only ever needs a handful of string values, so the trait is
//! a tiny synchronous key-value interface. Writes go in batches that are
//! applied all-or-nothing.

mod memory;
mod redb_store;
#[cfg(test)]
mod tests;

use std::fmt;

pub use self::memory::MemorySessionStore;
pub use self::redb_store::RedbSessionStore;
use crate::StoreResult;

/// Keys of the persisted session record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreKey {
    Token,
    /// Decimal string form of the numeric user id
    UserId,
    AuthMode,
    /// Cached profile JSON
    Profile,
}

impl StoreKey {
    pub const ALL: [StoreKey; 4] = [
        StoreKey::Token,
        StoreKey::UserId,
        StoreKey::AuthMode,
        StoreKey::Profile,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StoreKey::Token => "token",
            StoreKey::UserId => "userId",
            StoreKey::AuthMode => "authMode",
            StoreKey::Profile => "user",
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Set(StoreKey, String),
    Remove(StoreKey),
}

pub trait SessionStore: Send + Sync {
    fn get(&self, key: StoreKey) -> StoreResult<Option<String>>;

    /// Apply all `ops` atomically, in order
    fn apply(&self, ops: &[StoreOp]) -> StoreResult<()>;
}
