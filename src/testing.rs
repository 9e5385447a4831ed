//! Test doubles shared by the unit tests.

use crate::error::{HttpError, HttpResult, StorageError};
use crate::pipeline::auth::TokenRefresher;
use crate::request::{HttpRequest, HttpResponse, Transport};
use crate::storage::{MemoryStore, PersistentStore};
use backoffice_shared::RefreshResponse;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

// =========================================================
// Storage with injectable failures
// =========================================================

#[derive(Clone, Default)]
pub struct FaultyStore {
    pub inner: MemoryStore,
    fail_get: Cell<bool>,
    fail_set: Cell<bool>,
    fail_remove: Cell<bool>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_get(&self, fail: bool) {
        self.fail_get.set(fail);
    }

    pub fn fail_set(&self, fail: bool) {
        self.fail_set.set(fail);
    }

    pub fn fail_remove(&self, fail: bool) {
        self.fail_remove.set(fail);
    }
}

impl PersistentStore for FaultyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_get.get() {
            return Err(StorageError::Unavailable("simulated read failure".into()));
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_set.get() {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
                size: value.len(),
                limit: 0,
            });
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if self.fail_remove.get() {
            return Err(StorageError::Unavailable("simulated remove failure".into()));
        }
        self.inner.remove(key)
    }
}

// =========================================================
// MockTransport
// =========================================================

type Handler = Box<dyn Fn(&HttpRequest) -> HttpResult<HttpResponse>>;

/// Answers from scripted responses, then from a handler, then with 404.
#[derive(Default)]
pub struct MockTransport {
    scripted: RefCell<HashMap<String, VecDeque<HttpResult<HttpResponse>>>>,
    handler: RefCell<Option<Handler>>,
    pub requests: RefCell<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues one response for `url`; queued responses are used in order.
    pub fn mock_response(&self, url: &str, status: u16, body: serde_json::Value) {
        let body = match body {
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        self.push(url, Ok(HttpResponse::new(status, body)));
    }

    pub fn mock_network_error(&self, url: &str) {
        self.push(url, Err(HttpError::Network("connection refused".into())));
    }

    pub fn respond_with(&self, handler: impl Fn(&HttpRequest) -> HttpResult<HttpResponse> + 'static) {
        *self.handler.borrow_mut() = Some(Box::new(handler));
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests.borrow().iter().filter(|r| r.url == url).count()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.borrow().last().cloned()
    }

    fn push(&self, url: &str, result: HttpResult<HttpResponse>) {
        self.scripted
            .borrow_mut()
            .entry(url.to_string())
            .or_default()
            .push_back(result);
    }
}

#[async_trait::async_trait(?Send)]
impl Transport for MockTransport {
    async fn send(&self, req: HttpRequest) -> HttpResult<HttpResponse> {
        self.requests.borrow_mut().push(req.clone());

        let scripted = self
            .scripted
            .borrow_mut()
            .get_mut(&req.url)
            .and_then(VecDeque::pop_front);
        if let Some(result) = scripted {
            return result;
        }
        if let Some(handler) = self.handler.borrow().as_ref() {
            return handler(&req);
        }
        Ok(HttpResponse::new(404, "Not Found"))
    }
}

// =========================================================
// MockRefresher
// =========================================================

#[derive(Default)]
pub struct MockRefresher {
    results: RefCell<VecDeque<HttpResult<RefreshResponse>>>,
    pub calls: RefCell<Vec<String>>,
}

impl MockRefresher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeed_with(&self, token: &str) {
        self.results.borrow_mut().push_back(Ok(RefreshResponse {
            token: token.to_string(),
            refresh_token: None,
        }));
    }

    pub fn fail(&self, status: u16) {
        self.results.borrow_mut().push_back(Err(HttpError::Status {
            method: "POST",
            url: "/api/auth/refresh".into(),
            status,
            body: String::new(),
        }));
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

#[async_trait::async_trait(?Send)]
impl TokenRefresher for MockRefresher {
    async fn refresh(&self, refresh_token: &str) -> HttpResult<RefreshResponse> {
        self.calls.borrow_mut().push(refresh_token.to_string());
        self.results
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(HttpError::Network("no scripted refresh".into())))
    }
}
