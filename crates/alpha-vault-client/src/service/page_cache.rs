use std::collections::HashMap;
use std::sync::Mutex;

use alpha_vault_core::UserId;
use tokio::sync::watch;

use super::{Page, PageRequest};

/// Fetched list pages of one user session
///
/// Pages belong to whoever they were fetched for. Asking with a different
/// user id, storing a page for one, or any publish on the identity stream
/// (logout, re-login as the same user) starts over.
pub struct PageCache<R> {
    inner: Mutex<PageCacheInner<R>>,
}

struct PageCacheInner<R> {
    owner: Option<UserId>,
    pages: HashMap<PageRequest, Page<R>>,
    identity: watch::Receiver<Option<UserId>>,
}

impl<R> PageCacheInner<R> {
    /// Drop everything if the identity stream published since last check
    ///
    /// Returns `true` if the cache was dropped.
    fn reset_on_identity_change(&mut self) -> bool {
        // A closed channel can't publish anymore
        if !self.identity.has_changed().unwrap_or(false) {
            return false;
        }
        self.identity.mark_unchanged();
        self.pages.clear();
        self.owner = None;
        true
    }
}

impl<R> PageCache<R>
where
    R: Clone,
{
    /// Pages kept per user before the cache starts over
    pub const MAX_PAGES: usize = 32;

    pub fn new(identity: watch::Receiver<Option<UserId>>) -> Self {
        Self {
            inner: Mutex::new(PageCacheInner {
                owner: None,
                pages: HashMap::new(),
                identity,
            }),
        }
    }

    pub fn get(&self, user_id: UserId, req: PageRequest) -> Option<Page<R>> {
        let mut inner = self.inner.lock().expect("Locking failed");
        inner.reset_on_identity_change();
        if inner.owner != Some(user_id) {
            return None;
        }
        inner.pages.get(&req).cloned()
    }

    /// Store a fetched page
    ///
    /// A page whose fetch raced with an identity change is not stored.
    pub fn insert(&self, user_id: UserId, req: PageRequest, page: Page<R>) {
        let mut inner = self.inner.lock().expect("Locking failed");
        if inner.reset_on_identity_change() {
            return;
        }
        if inner.owner != Some(user_id) || Self::MAX_PAGES <= inner.pages.len() {
            inner.pages.clear();
            inner.owner = Some(user_id);
        }
        inner.pages.insert(req, page);
    }

    pub fn invalidate(&self) {
        let mut inner = self.inner.lock().expect("Locking failed");
        inner.pages.clear();
        inner.owner = None;
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("Locking failed").pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
