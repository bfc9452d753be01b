//! Reconciliation Engine
//!
//! Diffs the desired (optimistic) snapshot against the last server-confirmed
//! snapshot and turns the difference into per-item operations. Items are
//! matched by server id; anything without a known id is a create.
//!
//! Execution runs creates and updates first and deletes last, each operation
//! in its own error boundary, so a partial failure can never leave the
//! visible collection emptier than before.

use std::collections::{HashMap, HashSet};

use futures::future::join_all;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::api::{decode_created_id, encode_create, encode_update, CollectionApi};
use crate::domain::{CollectionItem, CollectionRef, ItemId, ItemKey, Payload};
use crate::error::SyncError;
use crate::retry::{Delay, RetryPolicy};

/// Which surviving items get an update when the order changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStrategy {
    /// Only items whose order or content differ
    #[default]
    Minimal,
    /// Every surviving item as soon as any order differs
    FullOrder,
}

/// One per-item call to make against the backend
#[derive(Debug, Clone, PartialEq)]
pub enum PendingOperation<P> {
    Create {
        key: ItemKey,
        order: u32,
        payload: P,
    },
    Update {
        key: ItemKey,
        id: ItemId,
        order: u32,
        payload: P,
        content_changed: bool,
        order_changed: bool,
    },
    Delete {
        key: ItemKey,
        id: ItemId,
    },
}

impl<P> PendingOperation<P> {
    pub fn key(&self) -> ItemKey {
        match self {
            PendingOperation::Create { key, .. }
            | PendingOperation::Update { key, .. }
            | PendingOperation::Delete { key, .. } => *key,
        }
    }

    pub fn id(&self) -> Option<&ItemId> {
        match self {
            PendingOperation::Create { .. } => None,
            PendingOperation::Update { id, .. } | PendingOperation::Delete { id, .. } => Some(id),
        }
    }

    /// Content-only edits are idempotent; anything carrying an order is not
    /// retried since the order may be stale by then
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PendingOperation::Update { content_changed: true, order_changed: false, .. }
        )
    }

    fn label(&self) -> &'static str {
        match self {
            PendingOperation::Create { .. } => "create",
            PendingOperation::Update { .. } => "update",
            PendingOperation::Delete { .. } => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationSet<P> {
    pub creates: Vec<PendingOperation<P>>,
    pub updates: Vec<PendingOperation<P>>,
    pub deletes: Vec<PendingOperation<P>>,
}

impl<P> Default for OperationSet<P> {
    fn default() -> Self {
        Self { creates: Vec::new(), updates: Vec::new(), deletes: Vec::new() }
    }
}

impl<P> OperationSet<P> {
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.creates.len() + self.updates.len() + self.deletes.len()
    }
}

/// Result of one executed operation
#[derive(Debug, Clone, PartialEq)]
pub struct OperationOutcome<P> {
    pub op: PendingOperation<P>,
    /// `Ok(Some(id))` for a confirmed create
    pub result: Result<Option<ItemId>, SyncError>,
}

/// Everything one reconciliation round produced
#[derive(Debug, Clone, PartialEq)]
pub struct RoundReport<P> {
    pub outcomes: Vec<OperationOutcome<P>>,
}

impl<P> Default for RoundReport<P> {
    fn default() -> Self {
        Self { outcomes: Vec::new() }
    }
}

impl<P: Payload> RoundReport<P> {
    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&PendingOperation<P>, &SyncError)> {
        self.outcomes.iter().filter_map(|outcome| match &outcome.result {
            Err(err) => Some((&outcome.op, err)),
            Ok(_) => None,
        })
    }

    /// Server ids assigned to created items
    pub fn created_ids(&self) -> impl Iterator<Item = (ItemKey, &ItemId)> {
        self.outcomes.iter().filter_map(|outcome| match (&outcome.op, &outcome.result) {
            (PendingOperation::Create { key, .. }, Ok(Some(id))) => Some((*key, id)),
            _ => None,
        })
    }

    /// Advance a confirmed snapshot by the operations the server accepted
    pub fn apply_confirmed(&self, synced: &mut Vec<CollectionItem<P>>) {
        for outcome in &self.outcomes {
            let Ok(created) = &outcome.result else {
                continue;
            };
            match &outcome.op {
                PendingOperation::Create { key, order, payload } => {
                    if let Some(id) = created {
                        synced.push(CollectionItem {
                            key: *key,
                            id: Some(id.clone()),
                            order: *order,
                            payload: payload.clone(),
                        });
                    }
                }
                PendingOperation::Update { id, order, payload, .. } => {
                    if let Some(item) = synced.iter_mut().find(|item| item.id.as_ref() == Some(id)) {
                        item.order = *order;
                        item.payload = payload.clone();
                    }
                }
                PendingOperation::Delete { id, .. } => {
                    synced.retain(|item| item.id.as_ref() != Some(id));
                }
            }
        }
        synced.sort_by_key(|item| item.order);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReconciliationEngine {
    pub strategy: UpdateStrategy,
    pub retry: RetryPolicy,
}

impl ReconciliationEngine {
    pub fn new(strategy: UpdateStrategy, retry: RetryPolicy) -> Self {
        Self { strategy, retry }
    }

    pub fn diff<P: Payload>(&self, desired: &[CollectionItem<P>], last_synced: &[CollectionItem<P>]) -> OperationSet<P> {
        diff(desired, last_synced, self.strategy)
    }

    /// Run every operation; creates and updates concurrently, then deletes
    pub async fn execute<P: Payload>(
        &self,
        api: &dyn CollectionApi,
        collection: &CollectionRef,
        ops: OperationSet<P>,
        delay: &dyn Delay,
    ) -> RoundReport<P> {
        if ops.is_empty() {
            return RoundReport::default();
        }
        debug!(
            "[{}] reconcile: {} create, {} update, {} delete",
            collection.id(),
            ops.creates.len(),
            ops.updates.len(),
            ops.deletes.len()
        );

        let OperationSet { creates, updates, deletes } = ops;
        let mut outcomes = join_all(
            creates
                .into_iter()
                .chain(updates)
                .map(|op| self.run_one(api, collection, op, delay)),
        )
        .await;
        outcomes.extend(join_all(deletes.into_iter().map(|op| self.run_one(api, collection, op, delay))).await);

        RoundReport { outcomes }
    }

    async fn run_one<P: Payload>(
        &self,
        api: &dyn CollectionApi,
        collection: &CollectionRef,
        op: PendingOperation<P>,
        delay: &dyn Delay,
    ) -> OperationOutcome<P> {
        let result = match &op {
            PendingOperation::Create { order, payload, .. } => match encode_create(collection, *order, payload) {
                Ok(body) => match api.create(collection, body).await {
                    Ok(created) => decode_created_id(&created).map(Some).map_err(SyncError::from),
                    Err(err) => Err(err.into()),
                },
                Err(err) => Err(err.into()),
            },
            PendingOperation::Update { id, order, payload, .. } => match encode_update(collection, id, *order, payload) {
                Ok(body) => self
                    .retry
                    .run(delay, op.is_retryable(), || {
                        let body = body.clone();
                        async move { api.update(collection, id, body).await.map_err(SyncError::from) }
                    })
                    .await
                    .map(|_| None),
                Err(err) => Err(err.into()),
            },
            PendingOperation::Delete { id, .. } => {
                api.delete(collection, id).await.map(|_| None).map_err(SyncError::from)
            }
        };
        if let Err(err) = &result {
            warn!("[{}] {} {} failed: {}", collection.id(), op.label(), op.key(), err);
        }
        OperationOutcome { op, result }
    }
}

/// Minimal operation set turning `last_synced` into `desired`
pub fn diff<P: Payload>(
    desired: &[CollectionItem<P>],
    last_synced: &[CollectionItem<P>],
    strategy: UpdateStrategy,
) -> OperationSet<P> {
    let synced_by_id: HashMap<&ItemId, &CollectionItem<P>> = last_synced
        .iter()
        .filter_map(|item| item.id.as_ref().map(|id| (id, item)))
        .collect();

    let mut ops = OperationSet::default();
    let mut surviving = Vec::new();
    let mut any_order_changed = false;

    for item in desired {
        let known = item.id.as_ref().and_then(|id| synced_by_id.get(id).map(|synced| (id, *synced)));
        match known {
            None => ops.creates.push(PendingOperation::Create {
                key: item.key,
                order: item.order,
                payload: item.payload.clone(),
            }),
            Some((id, synced)) => {
                let content_changed = synced.payload != item.payload;
                let order_changed = synced.order != item.order;
                any_order_changed |= order_changed;
                surviving.push((item, id, content_changed, order_changed));
            }
        }
    }

    for (item, id, content_changed, order_changed) in surviving {
        let resend = strategy == UpdateStrategy::FullOrder && any_order_changed;
        if content_changed || order_changed || resend {
            ops.updates.push(PendingOperation::Update {
                key: item.key,
                id: id.clone(),
                order: item.order,
                payload: item.payload.clone(),
                content_changed,
                order_changed,
            });
        }
    }

    let desired_ids: HashSet<&ItemId> = desired.iter().filter_map(|item| item.id.as_ref()).collect();
    for synced in last_synced {
        if let Some(id) = &synced.id {
            if !desired_ids.contains(id) {
                ops.deletes.push(PendingOperation::Delete { key: synced.key, id: id.clone() });
            }
        }
    }

    ops
}
