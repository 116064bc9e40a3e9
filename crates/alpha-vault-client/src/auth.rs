//! Login, registration and logout against the backend
//!
//! Successful logins are handed to the
//! [`SessionManager`](alpha_vault_session::SessionManager); this module never
//! touches session storage itself.

use std::sync::Arc;

use alpha_vault_core::UserId;
use alpha_vault_util_error::FmtCompact as _;
use reqwest::Method;
use serde::Serialize;
use serde_json::{Value, json};
use snafu::{ResultExt as _, Snafu};
use tracing::{debug, info};

use crate::api::{ApiClient, AuthEvent};
use crate::credentials::{self, LoginCredentials};
use crate::error::{
    ApiResult, InvalidRegistrationSnafu, LoginRejectedSnafu, MissingCredentialsSnafu, RequestSnafu,
};
use crate::LOG_TARGET;

const MIN_PASSWORD_LEN: usize = 8;

/// How a login ended up being recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Bearer token and user id stored
    Token(UserId),
    /// No token in the response; cookie session with cached profile
    Session(Option<UserId>),
}

impl LoginOutcome {
    pub fn user_id(self) -> Option<UserId> {
        match self {
            LoginOutcome::Token(id) => Some(id),
            LoginOutcome::Session(id) => id,
        }
    }
}

/// Steps of the signup form, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SignupPhase {
    Account,
    Personal,
    Financial,
    Terms,
}

#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(display("{phase:?} step: {reason}"))]
pub struct RegistrationError {
    pub phase: SignupPhase,
    pub reason: &'static str,
}

/// Everything the signup form collects
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    /// ISO 4217 code
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_income: Option<f64>,
    pub accepted_terms: bool,
}

impl Registration {
    /// Check the phases in order, reporting the first one that is incomplete
    pub fn validate(&self) -> Result<(), RegistrationError> {
        let fail = |phase, reason| RegistrationError { phase, reason };

        if !self.email.contains('@') {
            return Err(fail(SignupPhase::Account, "email address is not valid"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(fail(SignupPhase::Account, "password is too short"));
        }
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(fail(SignupPhase::Personal, "name is required"));
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(fail(SignupPhase::Financial, "currency must be a 3-letter code"));
        }
        if self.monthly_income.is_some_and(|v| v < 0.0) {
            return Err(fail(SignupPhase::Financial, "income can't be negative"));
        }
        if !self.accepted_terms {
            return Err(fail(SignupPhase::Terms, "terms must be accepted"));
        }
        Ok(())
    }
}

pub struct AuthApi {
    api: Arc<ApiClient>,
}

impl AuthApi {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<LoginOutcome> {
        let body = self
            .post_credentials(
                "api/auth/login",
                &json!({ "email": email, "password": password }),
            )
            .await?;
        self.establish(&body)
    }

    /// Submit the signup form
    ///
    /// Does not log in; the account has to be confirmed first.
    pub async fn register(&self, registration: &Registration) -> ApiResult<()> {
        registration.validate().context(InvalidRegistrationSnafu)?;

        let req = self
            .api
            .request(Method::POST, "api/auth/register")?
            .json(registration);
        self.api.send(req).await?;
        info!(target: LOG_TARGET, email = %registration.email, "Registration submitted");
        Ok(())
    }

    /// Confirm a registration; logs in on success
    pub async fn confirm_registration(&self, email: &str, code: &str) -> ApiResult<LoginOutcome> {
        let body = self
            .post_credentials("api/auth/confirm", &json!({ "email": email, "code": code }))
            .await?;
        self.establish(&body)
    }

    /// Log out on the backend (best effort) and locally
    pub async fn logout(&self) {
        match self.api.request(Method::POST, "api/auth/logout") {
            Ok(req) => {
                if let Err(err) = self.api.send_raw(req).await {
                    debug!(target: LOG_TARGET, err = %err.fmt_compact(), "Backend logout failed, ignoring");
                }
            }
            Err(err) => {
                debug!(target: LOG_TARGET, err = %err.fmt_compact(), "Backend logout skipped");
            }
        }

        self.api.session().logout();
        self.api.emit(AuthEvent::LoggedOut);
    }

    /// POST to a credential-issuing endpoint
    ///
    /// Bypasses the 401/403 handling: a rejected login is not an expired
    /// session.
    async fn post_credentials(&self, path: &str, payload: &Value) -> ApiResult<Value> {
        let req = self.api.request(Method::POST, path)?.json(payload);
        let resp = self.api.send_raw(req).await?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return LoginRejectedSnafu {
                status: status.as_u16(),
                body,
            }
            .fail();
        }

        resp.json().await.context(RequestSnafu)
    }

    fn establish(&self, body: &Value) -> ApiResult<LoginOutcome> {
        let session = self.api.session();
        let LoginCredentials {
            token,
            user_id,
            profile,
        } = credentials::extract(body);

        let outcome = match (token, user_id, profile) {
            (Some(token), Some(user_id), profile) => {
                session.set_auth_data(token, user_id)?;
                if let Some(profile) = profile {
                    session.cache_profile(&profile)?;
                }
                LoginOutcome::Token(user_id)
            }
            (None, _, Some(profile)) => {
                session.set_session_auth(&profile)?;
                LoginOutcome::Session(profile.user_id())
            }
            _ => return MissingCredentialsSnafu.fail(),
        };

        self.api.emit(AuthEvent::LoggedIn {
            user_id: outcome.user_id(),
        });
        Ok(outcome)
    }
}
