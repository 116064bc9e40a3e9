//! Per-feature CRUD services
//!
//! Each service caches the identity stream at construction. Calls made
//! before an identity is known fail with
//! [`ApiError::MissingIdentity`](crate::ApiError::MissingIdentity) without
//! touching the network. Outgoing records are stamped with the cached user
//! id.

mod page_cache;

use std::marker::PhantomData;
use std::sync::Arc;

use alpha_vault_core::UserId;
use alpha_vault_core::record::{Budget, Debt, Expense, Income, Investment, OwnedRecord, SavingsGoal};
use alpha_vault_session::SessionManager;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

pub use self::page_cache::PageCache;
use crate::LOG_TARGET;
use crate::api::ApiClient;
use crate::error::{ApiResult, MissingIdentitySnafu};

/// A record type served under `api/{PATH}`
pub trait Resource:
    OwnedRecord + Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
    const PATH: &'static str;
    /// Human name, for errors and logs
    const NAME: &'static str;
    /// Keep fetched list pages around until the next mutation
    const CACHE_PAGES: bool = false;
}

impl Resource for Budget {
    const PATH: &'static str = "budgets";
    const NAME: &'static str = "budget";
}

impl Resource for Income {
    const PATH: &'static str = "incomes";
    const NAME: &'static str = "income";
    const CACHE_PAGES: bool = true;
}

impl Resource for Expense {
    const PATH: &'static str = "expenses";
    const NAME: &'static str = "expense";
    const CACHE_PAGES: bool = true;
}

impl Resource for Debt {
    const PATH: &'static str = "debts";
    const NAME: &'static str = "debt";
}

impl Resource for Investment {
    const PATH: &'static str = "investments";
    const NAME: &'static str = "investment";
}

impl Resource for SavingsGoal {
    const PATH: &'static str = "savings-goals";
    const NAME: &'static str = "savings goal";
}

pub type BudgetService = ResourceService<Budget>;
pub type IncomeService = ResourceService<Income>;
pub type ExpenseService = ResourceService<Expense>;
pub type DebtService = ResourceService<Debt>;
pub type InvestmentService = ResourceService<Investment>;
pub type SavingsGoalService = ResourceService<SavingsGoal>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    /// Zero-based
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u32 = 20;

    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<R> {
    pub items: Vec<R>,
    pub page: u32,
    pub size: u32,
    pub total: u64,
}

/// Latest identity seen on the session's identity stream
#[derive(Debug, Clone)]
pub struct IdentityCache {
    rx: watch::Receiver<Option<UserId>>,
}

impl IdentityCache {
    pub fn new(session: &SessionManager) -> Self {
        Self {
            rx: session.identity(),
        }
    }

    pub fn current(&self) -> Option<UserId> {
        *self.rx.borrow()
    }

    pub fn require(&self, service: &'static str) -> ApiResult<UserId> {
        match self.current() {
            Some(id) => Ok(id),
            None => MissingIdentitySnafu { service }.fail(),
        }
    }
}

pub struct ResourceService<R> {
    api: Arc<ApiClient>,
    identity: IdentityCache,
    page_cache: Option<PageCache<R>>,
    _resource: PhantomData<fn() -> R>,
}

impl<R> ResourceService<R>
where
    R: Resource,
{
    pub fn new(api: Arc<ApiClient>) -> Self {
        let identity = IdentityCache::new(api.session());
        let page_cache = R::CACHE_PAGES.then(|| PageCache::new(api.session().identity()));
        Self {
            api,
            identity,
            page_cache,
            _resource: PhantomData,
        }
    }

    pub fn identity(&self) -> Option<UserId> {
        self.identity.current()
    }

    fn require_identity(&self) -> ApiResult<UserId> {
        self.identity.require(R::NAME)
    }

    fn item_path(id: u64) -> String {
        format!("api/{}/{id}", R::PATH)
    }

    fn collection_path() -> String {
        format!("api/{}", R::PATH)
    }

    fn invalidate(&self) {
        if let Some(cache) = &self.page_cache {
            cache.invalidate();
        }
    }

    pub async fn list(&self, page: PageRequest) -> ApiResult<Page<R>> {
        let user_id = self.require_identity()?;

        if let Some(cached) = self
            .page_cache
            .as_ref()
            .and_then(|cache| cache.get(user_id, page))
        {
            debug!(target: LOG_TARGET, resource = R::NAME, %user_id, page = page.page, "Page cache hit");
            return Ok(cached);
        }

        let req = self
            .api
            .request(Method::GET, &Self::collection_path())?
            .query(&[
                ("userId", user_id.raw()),
                ("page", u64::from(page.page)),
                ("size", u64::from(page.size)),
            ]);
        let fetched: Page<R> = self.api.send_json(req).await?;

        if let Some(cache) = &self.page_cache {
            cache.insert(user_id, page, fetched.clone());
        }
        Ok(fetched)
    }

    pub async fn get(&self, id: u64) -> ApiResult<R> {
        let user_id = self.require_identity()?;
        let req = self
            .api
            .request(Method::GET, &Self::item_path(id))?
            .query(&[("userId", user_id.raw())]);
        self.api.send_json(req).await
    }

    pub async fn create(&self, mut record: R) -> ApiResult<R> {
        let user_id = self.require_identity()?;
        record.set_user_id(user_id);

        let req = self
            .api
            .request(Method::POST, &Self::collection_path())?
            .json(&record);
        let created = self.api.send_json(req).await?;
        self.invalidate();
        debug!(target: LOG_TARGET, resource = R::NAME, %user_id, "Record created");
        Ok(created)
    }

    pub async fn update(&self, id: u64, mut record: R) -> ApiResult<R> {
        let user_id = self.require_identity()?;
        record.set_user_id(user_id);

        let req = self
            .api
            .request(Method::PUT, &Self::item_path(id))?
            .json(&record);
        let updated = self.api.send_json(req).await?;
        self.invalidate();
        Ok(updated)
    }

    pub async fn delete(&self, id: u64) -> ApiResult<()> {
        let user_id = self.require_identity()?;
        let req = self
            .api
            .request(Method::DELETE, &Self::item_path(id))?
            .query(&[("userId", user_id.raw())]);
        self.api.send(req).await?;
        self.invalidate();
        Ok(())
    }
}
