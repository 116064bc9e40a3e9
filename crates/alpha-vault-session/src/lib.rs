//! Client-side session state for Alpha Vault
//!
//! [`SessionManager`] is the single owner of the persisted session record
//! (token, user id, auth mode) and of the cached profile. Everything else
//! observes the current identity through [`SessionManager::identity`], a
//! replay-of-latest broadcast.
//!
//! Persistence goes through the [`SessionStore`] trait, with an in-memory
//! implementation and a redb-backed one.

pub mod error;
mod manager;
pub mod store;

pub use self::error::{SessionError, SessionResult, StoreError, StoreResult};
pub use self::manager::{AuthStatus, SessionManager};
pub use self::store::{MemorySessionStore, RedbSessionStore, SessionStore, StoreKey, StoreOp};

const LOG_TARGET: &str = "alpha_vault::session";
