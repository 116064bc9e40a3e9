
use std::sync::Arc;

use alpha_vault_core::{AuthMode, Expiry, Profile, Timestamp, Token, UserId};
use alpha_vault_util_error::FmtCompact as _;
use snafu::ResultExt as _;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{
    CorruptProfileSnafu, CorruptUserIdSnafu, ProfileEncodeSnafu, SessionResult, StoreSnafu,
};
use crate::store::{SessionStore, StoreKey, StoreOp};
use crate::LOG_TARGET;

/// Outcome of an authentication check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// Valid token paired with a user id
    Token,
    /// Cookie session with a cached profile
    Session,
    /// A token was stored but expired or unreadable; the session was cleared
    Expired,
    /// Nothing usable stored
    Anonymous,
}

impl AuthStatus {
    pub fn is_authenticated(self) -> bool {
        matches!(self, AuthStatus::Token | AuthStatus::Session)
    }
}

/// Single source of truth for "who is logged in"
///
/// Owns the persisted session record and publishes the current identity on
/// a `watch` channel. Late subscribers get the latest value immediately.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,

    /// Current identity; `None` means logged out
    identity_tx: watch::Sender<Option<UserId>>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        let (identity_tx, _) = watch::channel(None);
        let s = Self { store, identity_tx };

        let initial = s.get_user_id();
        debug!(target: LOG_TARGET, user_id = ?initial, "Session manager started");
        s.identity_tx.send_replace(initial);
        s
    }

    fn read(&self, key: StoreKey) -> Option<String> {
        match self.store.get(key) {
            Ok(v) => v.filter(|v| !v.is_empty()),
            Err(err) => {
                warn!(target: LOG_TARGET, %key, err = %err.fmt_compact(), "Failed to read session store");
                None
            }
        }
    }

    pub fn get_token(&self) -> Option<Token> {
        self.read(StoreKey::Token).map(Token::new)
    }

    /// Stored user id, with corruption reported as an error
    pub fn try_get_user_id(&self) -> SessionResult<Option<UserId>> {
        let Some(raw) = self.store.get(StoreKey::UserId).context(StoreSnafu)? else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse().map(Some).context(CorruptUserIdSnafu)
    }

    /// Stored user id, or `None` if missing or unreadable
    pub fn get_user_id(&self) -> Option<UserId> {
        match self.try_get_user_id() {
            Ok(id) => id,
            Err(err) => {
                warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Ignoring stored user id");
                None
            }
        }
    }

    pub fn auth_mode(&self) -> Option<AuthMode> {
        let raw = self.read(StoreKey::AuthMode)?;
        match raw.parse() {
            Ok(mode) => Some(mode),
            Err(err) => {
                warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Ignoring stored auth mode");
                None
            }
        }
    }

    /// Subscribe to identity changes
    ///
    /// The receiver starts out holding the latest published identity.
    pub fn identity(&self) -> watch::Receiver<Option<UserId>> {
        self.identity_tx.subscribe()
    }

    pub fn current_identity(&self) -> Option<UserId> {
        *self.identity_tx.borrow()
    }

    fn publish(&self, identity: Option<UserId>) {
        self.identity_tx.send_replace(identity);
    }

    /// Record a successful token login and publish the identity
    pub fn set_auth_data(&self, token: Token, user_id: UserId) -> SessionResult<()> {
        self.store
            .apply(&[
                StoreOp::Set(StoreKey::Token, token.into_string()),
                StoreOp::Set(StoreKey::UserId, user_id.to_string()),
                StoreOp::Set(StoreKey::AuthMode, AuthMode::Token.as_str().to_owned()),
            ])
            .context(StoreSnafu)?;

        info!(target: LOG_TARGET, %user_id, "Logged in");
        self.publish(Some(user_id));
        Ok(())
    }

    /// Record a successful cookie-session login
    ///
    /// The profile stands in for the token. Its id, if it has one, becomes
    /// the published identity.
    pub fn set_session_auth(&self, profile: &Profile) -> SessionResult<()> {
        let profile_json = serde_json::to_string(profile).context(ProfileEncodeSnafu)?;
        let user_id = profile.user_id();

        let mut ops = vec![
            StoreOp::Remove(StoreKey::Token),
            StoreOp::Set(StoreKey::AuthMode, AuthMode::Session.as_str().to_owned()),
            StoreOp::Set(StoreKey::Profile, profile_json),
        ];
        ops.push(match user_id {
            Some(id) => StoreOp::Set(StoreKey::UserId, id.to_string()),
            None => StoreOp::Remove(StoreKey::UserId),
        });
        self.store.apply(&ops).context(StoreSnafu)?;

        info!(target: LOG_TARGET, user_id = ?user_id, "Logged in with session");
        self.publish(user_id);
        Ok(())
    }

    /// Clear the session record and publish "no identity"
    ///
    /// The cached profile is left in place, use [`Self::clear_profile`] to
    /// drop it too. Safe to call repeatedly.
    pub fn logout(&self) {
        if let Err(err) = self.store.apply(&[
            StoreOp::Remove(StoreKey::Token),
            StoreOp::Remove(StoreKey::UserId),
            StoreOp::Remove(StoreKey::AuthMode),
        ]) {
            warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Failed to clear session store");
        }

        debug!(target: LOG_TARGET, "Logged out");
        self.publish(None);
    }

    pub fn auth_status_at(&self, now: Timestamp) -> AuthStatus {
        if let Some(token) = self.get_token() {
            match token.expiry_at(now) {
                Ok(Expiry::Never | Expiry::ValidUntil(_)) => {
                    if self.get_user_id().is_some() {
                        return AuthStatus::Token;
                    }
                }
                Ok(Expiry::Expired) => {
                    info!(target: LOG_TARGET, "Stored token expired, clearing session");
                    self.logout();
                    return AuthStatus::Expired;
                }
                Err(err) => {
                    warn!(target: LOG_TARGET, err = %err.fmt_compact(), "Stored token invalid, clearing session");
                    self.logout();
                    return AuthStatus::Expired;
                }
            }
        }

        if self.auth_mode() == Some(AuthMode::Session) && self.read(StoreKey::Profile).is_some() {
            return AuthStatus::Session;
        }

        AuthStatus::Anonymous
    }

    pub fn auth_status(&self) -> AuthStatus {
        self.auth_status_at(Timestamp::now())
    }

    /// Whether there is a usable session right now
    ///
    /// Clears the session as a side effect when the stored token turned out
    /// to be expired.
    pub fn is_authenticated_at(&self, now: Timestamp) -> bool {
        self.auth_status_at(now).is_authenticated()
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(Timestamp::now())
    }

    /// Cached profile; corrupt JSON is an error, not `None`
    pub fn profile(&self) -> SessionResult<Option<Profile>> {
        let Some(raw) = self.store.get(StoreKey::Profile).context(StoreSnafu)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .context(CorruptProfileSnafu)
    }

    pub fn cache_profile(&self, profile: &Profile) -> SessionResult<()> {
        let json = serde_json::to_string(profile).context(ProfileEncodeSnafu)?;
        self.store
            .apply(&[StoreOp::Set(StoreKey::Profile, json)])
            .context(StoreSnafu)
    }

    pub fn clear_profile(&self) -> SessionResult<()> {
        self.store
            .apply(&[StoreOp::Remove(StoreKey::Profile)])
            .context(StoreSnafu)
    }
}
