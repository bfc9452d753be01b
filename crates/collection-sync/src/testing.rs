//! In-memory backend for tests
//!
//! Records every call, applies it to a server-side item list, can hold
//! responses behind a gate and fail scripted calls.

use std::cell::{Cell, RefCell};

use async_trait::async_trait;
use futures::channel::oneshot;
use serde_json::Value;

use crate::api::{ApiError, CollectionApi};
use crate::domain::{CollectionRef, ItemId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Method {
    Fetch,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub method: Method,
    pub id: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
pub(crate) struct FakeApi {
    calls: RefCell<Vec<Call>>,
    server: RefCell<Vec<Value>>,
    next_id: Cell<u32>,
    failures: RefCell<Vec<(Method, Option<String>, ApiError)>>,
    gated: Cell<bool>,
    waiting: RefCell<Vec<oneshot::Sender<()>>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<Value>) -> Self {
        let api = Self::new();
        *api.server.borrow_mut() = items;
        api
    }

    /// Hold every following response until `release`
    pub fn gate(&self) {
        self.gated.set(true);
    }

    /// Let all held responses through; returns how many there were
    pub fn release(&self) -> usize {
        let waiting = std::mem::take(&mut *self.waiting.borrow_mut());
        let n = waiting.len();
        for tx in waiting {
            let _ = tx.send(());
        }
        n
    }

    /// Stop gating and release whatever is held
    pub fn open(&self) -> usize {
        self.gated.set(false);
        self.release()
    }

    /// Calls currently held at the gate
    pub fn held(&self) -> usize {
        self.waiting.borrow().len()
    }

    /// Fail the next call of `method` (on `id`, when given) with `err`
    pub fn fail_next(&self, method: Method, id: Option<&str>, err: ApiError) {
        self.failures.borrow_mut().push((method, id.map(str::to_string), err));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn methods(&self) -> Vec<Method> {
        self.calls.borrow().iter().map(|call| call.method).collect()
    }

    pub fn count(&self, method: Method) -> usize {
        self.calls.borrow().iter().filter(|call| call.method == method).count()
    }

    /// Mutating calls only
    pub fn writes(&self) -> usize {
        self.calls.borrow().iter().filter(|call| call.method != Method::Fetch).count()
    }

    pub fn server_items(&self) -> Vec<Value> {
        self.server.borrow().clone()
    }

    /// Server-side FAQ questions sorted by `order`
    pub fn server_questions(&self) -> Vec<String> {
        let mut items = self.server_items();
        items.sort_by_key(|item| item["order"].as_u64().unwrap_or(u64::MAX));
        items
            .iter()
            .map(|item| item["question"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    fn record(&self, method: Method, id: Option<&ItemId>, body: Option<&Value>) {
        self.calls.borrow_mut().push(Call {
            method,
            id: id.map(|id| id.to_string()),
            body: body.cloned(),
        });
    }

    async fn wait_gate(&self) {
        if !self.gated.get() {
            return;
        }
        let (tx, rx) = oneshot::channel();
        self.waiting.borrow_mut().push(tx);
        let _ = rx.await;
    }

    fn scripted_failure(&self, method: Method, id: Option<&ItemId>) -> Option<ApiError> {
        let mut failures = self.failures.borrow_mut();
        let position = failures.iter().position(|(m, target, _)| {
            *m == method && target.as_deref().map_or(true, |t| Some(t) == id.map(ItemId::as_str))
        })?;
        Some(failures.remove(position).2)
    }

    fn position(&self, id: &ItemId) -> Option<usize> {
        self.server
            .borrow()
            .iter()
            .position(|item| item["id"].as_str() == Some(id.as_str()))
    }

    fn not_found(id: &ItemId) -> ApiError {
        ApiError::Status { status: 404, message: format!("{} not found", id) }
    }
}

#[async_trait(?Send)]
impl CollectionApi for FakeApi {
    async fn fetch(&self, _collection: &CollectionRef) -> Result<Vec<Value>, ApiError> {
        self.record(Method::Fetch, None, None);
        self.wait_gate().await;
        if let Some(err) = self.scripted_failure(Method::Fetch, None) {
            return Err(err);
        }
        Ok(self.server_items())
    }

    async fn create(&self, _collection: &CollectionRef, body: Value) -> Result<Value, ApiError> {
        self.record(Method::Create, None, Some(&body));
        self.wait_gate().await;
        if let Some(err) = self.scripted_failure(Method::Create, None) {
            return Err(err);
        }
        self.next_id.set(self.next_id.get() + 1);
        let mut created = body;
        created["id"] = Value::from(format!("srv-{}", self.next_id.get()));
        self.server.borrow_mut().push(created.clone());
        Ok(created)
    }

    async fn update(&self, _collection: &CollectionRef, id: &ItemId, body: Value) -> Result<(), ApiError> {
        self.record(Method::Update, Some(id), Some(&body));
        self.wait_gate().await;
        if let Some(err) = self.scripted_failure(Method::Update, Some(id)) {
            return Err(err);
        }
        let index = self.position(id).ok_or_else(|| Self::not_found(id))?;
        self.server.borrow_mut()[index] = body;
        Ok(())
    }

    async fn delete(&self, _collection: &CollectionRef, id: &ItemId) -> Result<(), ApiError> {
        self.record(Method::Delete, Some(id), None);
        self.wait_gate().await;
        if let Some(err) = self.scripted_failure(Method::Delete, Some(id)) {
            return Err(err);
        }
        let index = self.position(id).ok_or_else(|| Self::not_found(id))?;
        self.server.borrow_mut().remove(index);
        Ok(())
    }
}
