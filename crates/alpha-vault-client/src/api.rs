use std::sync::Arc;
use std::time::Duration;

use alpha_vault_core::UserId;
use alpha_vault_session::SessionManager;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use snafu::ResultExt as _;
use tokio::sync::broadcast;
use tracing::{debug, info};
use url::Url;

use crate::LOG_TARGET;
use crate::error::{ApiResult, RequestSnafu, StatusSnafu, UnauthorizedSnafu, UrlSnafu};

/// Session transitions observed by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    LoggedIn { user_id: Option<UserId> },
    LoggedOut,
    /// Backend rejected our credentials; the session was cleared and the user
    /// should be sent to the login view flagged as "expired"
    SessionExpired,
}

/// HTTP access to the Alpha Vault backend
///
/// Stamps requests with the stored bearer token, and keeps a cookie jar for
/// session-mode logins. Any 401/403 response clears the session.
pub struct ApiClient {
    http: reqwest::Client,
    /// Always ends with `/`, so relative joins append
    base_url: Url,
    session: Arc<SessionManager>,
    events_tx: broadcast::Sender<AuthEvent>,
}

#[bon::bon]
impl ApiClient {
    #[builder(finish_fn(name = "build"))]
    pub fn new(
        #[builder(start_fn)] mut base_url: Url,
        session: Arc<SessionManager>,
        #[builder(default = Duration::from_secs(30))] timeout: Duration,
    ) -> ApiResult<Arc<Self>> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .context(RequestSnafu)?;
        let (events_tx, _) = broadcast::channel(16);

        debug!(target: LOG_TARGET, %base_url, "Api client created");
        Ok(Arc::new(Self {
            http,
            base_url,
            session,
            events_tx,
        }))
    }
}

impl ApiClient {
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn events(&self) -> broadcast::Receiver<AuthEvent> {
        self.events_tx.subscribe()
    }

    pub(crate) fn emit(&self, event: AuthEvent) {
        // No subscribers is fine
        let _ = self.events_tx.send(event);
    }

    pub(crate) fn url(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .context(UrlSnafu)
    }

    /// Start a request, with the bearer token attached if one is stored
    pub(crate) fn request(&self, method: Method, path: &str) -> ApiResult<RequestBuilder> {
        let req = self.http.request(method, self.url(path)?);
        Ok(match self.session.get_token() {
            Some(token) => req.bearer_auth(token.as_str()),
            None => req,
        })
    }

    /// Send without any status handling
    pub(crate) async fn send_raw(&self, req: RequestBuilder) -> ApiResult<Response> {
        req.send().await.context(RequestSnafu)
    }

    /// Send, turning auth failures into a cleared session and other non-2xx
    /// statuses into errors
    pub(crate) async fn send(&self, req: RequestBuilder) -> ApiResult<Response> {
        let resp = self.send_raw(req).await?;
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            info!(target: LOG_TARGET, status = status.as_u16(), url = %resp.url(), "Backend rejected credentials, logging out");
            self.session.logout();
            self.emit(AuthEvent::SessionExpired);
            return UnauthorizedSnafu {
                status: status.as_u16(),
            }
            .fail();
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return StatusSnafu {
                status: status.as_u16(),
                body,
            }
            .fail();
        }

        Ok(resp)
    }

    pub(crate) async fn send_json<T>(&self, req: RequestBuilder) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        self.send(req).await?.json().await.context(RequestSnafu)
    }
}
