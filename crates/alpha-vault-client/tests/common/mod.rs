#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use alpha_vault_client::ApiClient;
use alpha_vault_core::Token;
use alpha_vault_session::{MemorySessionStore, SessionManager};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

pub const VALID_CODE: &str = "123456";
pub const WRONG_PASSWORD: &str = "wrong";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
pub struct BackendState {
    /// Resource path -> stored records
    records: Mutex<BTreeMap<String, Vec<Value>>>,
    next_id: AtomicU64,
    requests: Mutex<Vec<RecordedRequest>>,
    /// Body returned by successful login/confirm calls
    login_response: Mutex<Value>,
    /// When set, every resource call answers with this status
    forced_status: Mutex<Option<u16>>,
}

impl BackendState {
    fn record(
        &self,
        method: Method,
        path: String,
        query: HashMap<String, String>,
        headers: &HeaderMap,
        body: Option<Value>,
    ) {
        let authorization = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned);
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            path,
            query,
            authorization,
            body,
        });
    }

    fn forced(&self) -> Option<Response> {
        let status = (*self.forced_status.lock().unwrap())?;
        Some(
            (
                StatusCode::from_u16(status).unwrap(),
                Json(json!({ "error": "forced" })),
            )
                .into_response(),
        )
    }
}

/// Fake Alpha Vault backend on a random local port
pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
    handle: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(BackendState::default());
        state.next_id.store(1, Ordering::SeqCst);

        let router = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/confirm", post(confirm))
            .route("/api/auth/register", post(register))
            .route("/api/auth/logout", post(logout))
            .route("/api/{resource}", get(list).post(create))
            .route(
                "/api/{resource}/{id}",
                get(get_one).put(update).delete(delete),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("No local addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server failed");
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}/", self.addr)).unwrap()
    }

    pub fn set_login_response(&self, body: Value) {
        *self.state.login_response.lock().unwrap() = body;
    }

    pub fn force_status(&self, status: Option<u16>) {
        *self.state.forced_status.lock().unwrap() = status;
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    pub fn records(&self, resource: &str) -> Vec<Value> {
        self.state
            .records
            .lock()
            .unwrap()
            .get(resource)
            .cloned()
            .unwrap_or_default()
    }

    /// Fresh session + api client pointed at this backend
    pub fn client(&self) -> (Arc<SessionManager>, Arc<ApiClient>) {
        let session = Arc::new(SessionManager::new(Arc::new(MemorySessionStore::new())));
        let api = ApiClient::builder(self.base_url())
            .session(session.clone())
            .build()
            .expect("Failed to build api client");
        (session, api)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Unsigned JWT with the given `exp`, relative to now
pub fn jwt_expiring_in(secs: i64) -> Token {
    let now = alpha_vault_core::Timestamp::now().as_secs() as i64;
    jwt(json!({ "sub": "42", "exp": now + secs }))
}

pub fn jwt(payload: Value) -> Token {
    let enc = |b: &[u8]| data_encoding::BASE64URL_NOPAD.encode(b);
    Token::new(format!(
        "{}.{}.{}",
        enc(br#"{"alg":"HS256","typ":"JWT"}"#),
        enc(payload.to_string().as_bytes()),
        enc(b"sig")
    ))
}

async fn login(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record(
        Method::POST,
        "/api/auth/login".into(),
        HashMap::new(),
        &headers,
        Some(body.clone()),
    );
    if body["password"] == WRONG_PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "bad credentials" })),
        )
            .into_response();
    }
    Json(state.login_response.lock().unwrap().clone()).into_response()
}

async fn confirm(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record(
        Method::POST,
        "/api/auth/confirm".into(),
        HashMap::new(),
        &headers,
        Some(body.clone()),
    );
    if body["code"] != VALID_CODE {
        return (StatusCode::BAD_REQUEST, "invalid code").into_response();
    }
    Json(state.login_response.lock().unwrap().clone()).into_response()
}

async fn register(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record(
        Method::POST,
        "/api/auth/register".into(),
        HashMap::new(),
        &headers,
        Some(body),
    );
    (StatusCode::CREATED, Json(json!({ "status": "pending" }))).into_response()
}

async fn logout(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    state.record(
        Method::POST,
        "/api/auth/logout".into(),
        HashMap::new(),
        &headers,
        None,
    );
    StatusCode::NO_CONTENT.into_response()
}

async fn list(
    State(state): State<Arc<BackendState>>,
    Path(resource): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    state.record(
        Method::GET,
        format!("/api/{resource}"),
        query.clone(),
        &headers,
        None,
    );
    if let Some(resp) = state.forced() {
        return resp;
    }

    let page: usize = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(0);
    let size: usize = query.get("size").and_then(|s| s.parse().ok()).unwrap_or(20);
    let user_id = query.get("userId").cloned().unwrap_or_default();

    let owned: Vec<Value> = state
        .records
        .lock()
        .unwrap()
        .get(&resource)
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r["userId"].to_string() == user_id)
        .collect();
    let items: Vec<Value> = owned.iter().skip(page * size).take(size).cloned().collect();

    Json(json!({
        "items": items,
        "page": page,
        "size": size,
        "total": owned.len(),
    }))
    .into_response()
}

async fn create(
    State(state): State<Arc<BackendState>>,
    Path(resource): Path<String>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    state.record(
        Method::POST,
        format!("/api/{resource}"),
        HashMap::new(),
        &headers,
        Some(body.clone()),
    );
    if let Some(resp) = state.forced() {
        return resp;
    }

    body["id"] = json!(state.next_id.fetch_add(1, Ordering::SeqCst));
    state
        .records
        .lock()
        .unwrap()
        .entry(resource)
        .or_default()
        .push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn get_one(
    State(state): State<Arc<BackendState>>,
    Path((resource, id)): Path<(String, u64)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    state.record(
        Method::GET,
        format!("/api/{resource}/{id}"),
        query,
        &headers,
        None,
    );
    if let Some(resp) = state.forced() {
        return resp;
    }

    let found = state
        .records
        .lock()
        .unwrap()
        .get(&resource)
        .and_then(|records| records.iter().find(|r| r["id"] == id).cloned());
    match found {
        Some(record) => Json(record).into_response(),
        None => (StatusCode::NOT_FOUND, "no such record").into_response(),
    }
}

async fn update(
    State(state): State<Arc<BackendState>>,
    Path((resource, id)): Path<(String, u64)>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    state.record(
        Method::PUT,
        format!("/api/{resource}/{id}"),
        HashMap::new(),
        &headers,
        Some(body.clone()),
    );
    if let Some(resp) = state.forced() {
        return resp;
    }

    body["id"] = json!(id);
    let mut records = state.records.lock().unwrap();
    let Some(slot) = records
        .get_mut(&resource)
        .and_then(|records| records.iter_mut().find(|r| r["id"] == id))
    else {
        return (StatusCode::NOT_FOUND, "no such record").into_response();
    };
    *slot = body.clone();
    Json(body).into_response()
}

async fn delete(
    State(state): State<Arc<BackendState>>,
    Path((resource, id)): Path<(String, u64)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    state.record(
        Method::DELETE,
        format!("/api/{resource}/{id}"),
        query,
        &headers,
        None,
    );
    if let Some(resp) = state.forced() {
        return resp;
    }

    if let Some(records) = state.records.lock().unwrap().get_mut(&resource) {
        records.retain(|r| r["id"] != id);
    }
    StatusCode::NO_CONTENT.into_response()
}
