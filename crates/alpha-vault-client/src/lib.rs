//! Alpha Vault backend client
//!
//! Everything here sits on top of a shared
//! [`SessionManager`](alpha_vault_session::SessionManager):
//!
//! * [`ApiClient`] sends requests with the stored credentials and clears the
//!   session when the backend answers 401/403.
//! * [`AuthApi`] logs in, registers and logs out.
//! * [`RouteGuard`] decides whether a protected area may be entered.
//! * [`service`] has the per-feature CRUD services, which refuse to work
//!   without a known identity.

mod api;
pub mod auth;
mod credentials;
pub mod error;
pub mod guard;
pub mod service;

pub use self::api::{ApiClient, AuthEvent};
pub use self::auth::{AuthApi, LoginOutcome, Registration};
pub use self::error::{ApiError, ApiResult};
pub use self::guard::{GuardOutcome, LoginRedirect, RouteGuard};

const LOG_TARGET: &str = "alpha_vault::client";
