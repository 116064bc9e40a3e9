use std::sync::Arc;

use alpha_vault_core::Timestamp;
use alpha_vault_session::{AuthStatus, SessionManager};
use tracing::debug;

use crate::LOG_TARGET;

pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Allow,
    Redirect(LoginRedirect),
}

/// Where to send a user that may not enter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    /// The session existed but its token had expired
    pub expired: bool,
    /// The route that was being entered
    pub return_to: Option<String>,
}

impl LoginRedirect {
    /// `/login`, with `expired=true` and `returnUrl` query parameters as needed
    pub fn to_path(&self) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        if self.expired {
            query.append_pair("expired", "true");
        }
        if let Some(return_to) = &self.return_to {
            query.append_pair("returnUrl", return_to);
        }
        let query = query.finish();

        if query.is_empty() {
            LOGIN_PATH.to_owned()
        } else {
            format!("{LOGIN_PATH}?{query}")
        }
    }
}

/// Gate in front of protected areas
pub struct RouteGuard {
    session: Arc<SessionManager>,
}

impl RouteGuard {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    pub fn check(&self, route: &str) -> GuardOutcome {
        self.check_at(route, Timestamp::now())
    }

    pub fn check_at(&self, route: &str, now: Timestamp) -> GuardOutcome {
        let status = self.session.auth_status_at(now);
        if status.is_authenticated() {
            return GuardOutcome::Allow;
        }

        debug!(target: LOG_TARGET, route, ?status, "Route guard denied access");
        // Make sure nothing half-valid lingers
        self.session.logout();

        GuardOutcome::Redirect(LoginRedirect {
            expired: status == AuthStatus::Expired,
            return_to: Some(route.to_owned()).filter(|r| !r.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use alpha_vault_core::{Token, UserId};
    use alpha_vault_session::MemorySessionStore;

    use super::*;

    fn guard() -> (Arc<SessionManager>, RouteGuard) {
        let session = Arc::new(SessionManager::new(Arc::new(MemorySessionStore::new())));
        (session.clone(), RouteGuard::new(session))
    }

    #[test_log::test]
    fn anonymous_is_redirected_without_expired_flag() {
        let (_session, guard) = guard();
        let outcome = guard.check("/dashboard");
        assert_eq!(
            outcome,
            GuardOutcome::Redirect(LoginRedirect {
                expired: false,
                return_to: Some("/dashboard".into()),
            })
        );
    }

    #[test_log::test]
    fn invalid_token_redirects_as_expired() {
        let (session, guard) = guard();
        session
            .set_auth_data(Token::new("not-a-jwt"), UserId::new(1))
            .unwrap();

        let GuardOutcome::Redirect(redirect) = guard.check("/expenses") else {
            panic!("expected redirect");
        };
        assert!(redirect.expired);
        assert_eq!(redirect.to_path(), "/login?expired=true&returnUrl=%2Fexpenses");
        assert_eq!(session.get_token(), None);
        assert_eq!(session.current_identity(), None);
    }

    #[test_log::test]
    fn token_without_expiry_is_allowed() {
        let (session, guard) = guard();
        // `{"sub":"1"}`
        session
            .set_auth_data(Token::new("e30.eyJzdWIiOiIxIn0.c2ln"), UserId::new(1))
            .unwrap();
        assert_eq!(guard.check("/"), GuardOutcome::Allow);
    }

    #[test]
    fn plain_login_path() {
        let redirect = LoginRedirect {
            expired: false,
            return_to: None,
        };
        assert_eq!(redirect.to_path(), "/login");
    }
}
