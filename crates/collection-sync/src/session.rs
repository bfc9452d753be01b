//! Collection Session
//!
//! Client-facing facade for one ordered collection. Owns the optimistic
//! store and the last confirmed snapshot, applies every user intent
//! synchronously and hands persistence to the shared [`SyncScheduler`].
//!
//! `reorder`, `edit`, `remove` and `add` return as soon as the optimistic
//! mutation is applied. Observers are called after every borrow has been
//! released, so they may call back into the session.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use async_trait::async_trait;
use futures::task::{LocalSpawn, LocalSpawnExt};
use log::{debug, error, warn};

use crate::api::{decode_records, CollectionApi};
use crate::config::SyncConfig;
use crate::controller::{DragOutcome, InputMode, ReorderController, ReorderTarget};
use crate::domain::{CollectionId, CollectionItem, CollectionRef, ItemKey, ItemRecord, Payload};
use crate::error::{SyncError, SyncResult};
use crate::permission::{Affordances, ParentEntity, PermissionGate, Viewer};
use crate::pointer::SlotBounds;
use crate::reconcile::{PendingOperation, ReconciliationEngine, RoundReport};
use crate::reporter::{ErrorReport, ErrorReporter};
use crate::retry::Delay;
use crate::scheduler::{Scheduled, SyncScheduler, SyncTarget};
use crate::store::{ChangeEvent, OrderedCollectionStore};

/// Lifecycle: `Idle -> Dirty -> Syncing -> Idle | Error`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncStatus {
    #[default]
    Idle,
    Dirty,
    Syncing,
    Error,
}

/// Observable sync state of one collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncState {
    pub status: SyncStatus,
    /// Local state differs from the last confirmed snapshot
    pub dirty: bool,
    pub in_flight: bool,
    pub generation: u64,
}

/// Collaborators shared between sessions
#[derive(Clone)]
pub struct SessionDeps {
    pub api: Rc<dyn CollectionApi>,
    pub scheduler: Rc<SyncScheduler>,
    pub reporter: Rc<dyn ErrorReporter>,
    pub spawner: Rc<dyn LocalSpawn>,
    pub delay: Rc<dyn Delay>,
}

/// What one round hands back to `commit`
pub struct RoundOutcome<P> {
    /// Store revision the round diffed against
    revision: u64,
    report: RoundReport<P>,
}

struct Confirmed<P> {
    snapshot: Vec<CollectionItem<P>>,
    dirty: bool,
    status: SyncStatus,
}

type ChangeObserver<P> = Rc<dyn Fn(&ChangeEvent<P>)>;
type StateObserver = Rc<dyn Fn(SyncState)>;

pub struct CollectionSession<P: Payload> {
    collection: CollectionRef,
    id: CollectionId,
    store: RefCell<OrderedCollectionStore<P>>,
    confirmed: RefCell<Confirmed<P>>,
    controller: RefCell<ReorderController>,
    engine: ReconciliationEngine,
    viewer: RefCell<Viewer>,
    entity: RefCell<ParentEntity>,
    deps: SessionDeps,
    change_observers: RefCell<Vec<ChangeObserver<P>>>,
    state_observers: RefCell<Vec<StateObserver>>,
    this: Weak<Self>,
}

impl<P: Payload> CollectionSession<P> {
    pub fn new(entity: ParentEntity, viewer: Viewer, config: &SyncConfig, deps: SessionDeps) -> Rc<Self> {
        let collection = CollectionRef::new(entity.parent.clone(), P::KIND);
        let id = collection.id();
        Rc::new_cyclic(|this| Self {
            collection,
            id,
            store: RefCell::new(OrderedCollectionStore::new()),
            confirmed: RefCell::new(Confirmed {
                snapshot: Vec::new(),
                dirty: false,
                status: SyncStatus::Idle,
            }),
            controller: RefCell::new(ReorderController::new(config.drag.hysteresis_px)),
            engine: ReconciliationEngine::new(config.update_strategy, config.retry),
            viewer: RefCell::new(viewer),
            entity: RefCell::new(entity),
            deps,
            change_observers: RefCell::new(Vec::new()),
            state_observers: RefCell::new(Vec::new()),
            this: this.clone(),
        })
    }

    // ========================
    // Queries
    // ========================

    pub fn collection(&self) -> &CollectionRef {
        &self.collection
    }

    pub fn id(&self) -> &CollectionId {
        &self.id
    }

    pub fn items(&self) -> Vec<CollectionItem<P>> {
        self.store.borrow().snapshot()
    }

    pub fn last_synced(&self) -> Vec<CollectionItem<P>> {
        self.confirmed.borrow().snapshot.clone()
    }

    pub fn sync_state(&self) -> SyncState {
        let confirmed = self.confirmed.borrow();
        SyncState {
            status: confirmed.status,
            dirty: confirmed.dirty,
            in_flight: self.deps.scheduler.in_flight(&self.id),
            generation: self.deps.scheduler.generation(&self.id),
        }
    }

    pub fn can_edit(&self) -> bool {
        PermissionGate::can_edit(&self.viewer.borrow(), &self.entity.borrow())
    }

    pub fn affordances(&self) -> Affordances {
        Affordances::from_capability(self.can_edit())
    }

    pub fn set_viewer(&self, viewer: Viewer) {
        *self.viewer.borrow_mut() = viewer;
    }

    pub fn subscribe(&self, observer: impl Fn(&ChangeEvent<P>) + 'static) {
        self.change_observers.borrow_mut().push(Rc::new(observer));
    }

    pub fn subscribe_state(&self, observer: impl Fn(SyncState) + 'static) {
        self.state_observers.borrow_mut().push(Rc::new(observer));
    }

    // ========================
    // Loading
    // ========================

    /// Fetch the collection from the server and replace local state
    pub async fn load(&self) -> SyncResult<()> {
        let values = match self.deps.api.fetch(&self.collection).await {
            Ok(values) => values,
            Err(err) => return Err(self.fail(None, err.into())),
        };
        let records = match decode_records::<P>(&self.collection, &values) {
            Ok(records) => records,
            Err(err) => return Err(self.fail(None, err.into())),
        };
        self.load_records(records);
        Ok(())
    }

    /// Replace local state with server records; any round in flight becomes stale
    pub fn load_records(&self, records: Vec<ItemRecord<P>>) {
        let event = {
            let mut store = self.store.borrow_mut();
            let mut confirmed = self.confirmed.borrow_mut();
            if confirmed.dirty {
                warn!("[{}] reload discards unsynced local changes", self.id);
            }
            let event = store.load(records);
            confirmed.snapshot = store.snapshot();
            confirmed.dirty = false;
            confirmed.status = SyncStatus::Idle;
            event
        };
        self.deps.scheduler.invalidate(&self.id);
        debug!("[{}] loaded {} items", self.id, event.snapshot.len());
        self.emit(&event);
        self.emit_state();
    }

    // ========================
    // Mutations
    // ========================

    pub fn reorder(&self, key: ItemKey, target: ReorderTarget, mode: InputMode) -> SyncResult<()> {
        self.ensure_can_edit(Some(key))?;
        let event = ReorderController::reorder(&mut *self.store.borrow_mut(), key, target, mode)?;
        if let Some(event) = event {
            self.applied(&event);
            self.schedule();
        }
        Ok(())
    }

    pub fn edit(&self, key: ItemKey, patch: P::Patch) -> SyncResult<()> {
        self.ensure_can_edit(Some(key))?;
        let result = self.store.borrow_mut().update_item(key, patch);
        let event = match result {
            Ok(event) => event,
            Err(err @ SyncError::Validation(_)) => return Err(self.fail(Some(key.to_string()), err)),
            Err(err) => return Err(err),
        };
        self.applied(&event);
        self.schedule();
        Ok(())
    }

    pub fn remove(&self, key: ItemKey) -> SyncResult<()> {
        self.ensure_can_edit(Some(key))?;
        let (_, event) = self.store.borrow_mut().remove_by_id(key)?;
        self.applied(&event);
        self.schedule();
        Ok(())
    }

    /// Insert a new item at `at_index` (appends when `None`)
    pub fn add(&self, payload: P, at_index: Option<usize>) -> SyncResult<ItemKey> {
        self.ensure_can_edit(None)?;
        if let Err(err) = payload.validate() {
            return Err(self.fail(None, err.into()));
        }
        let (key, event) = {
            let mut store = self.store.borrow_mut();
            let at = at_index.unwrap_or(store.len());
            let event = store.insert(ItemRecord::new(None, at as u32, payload), at)?;
            (store.get()[at].key, event)
        };
        self.applied(&event);
        self.schedule();
        Ok(key)
    }

    // ========================
    // Pointer drag
    // ========================

    pub fn begin_drag(&self, key: ItemKey, slots: Vec<SlotBounds>) -> SyncResult<()> {
        self.ensure_can_edit(Some(key))?;
        let store = self.store.borrow();
        self.controller.borrow_mut().begin_drag(&*store, key, slots)?;
        Ok(())
    }

    /// Moves the dragged item live; persistence waits for `end_drag`
    pub fn drag_to(&self, pointer_y: f64) -> SyncResult<()> {
        let event = {
            let mut store = self.store.borrow_mut();
            self.controller.borrow_mut().drag_to(&mut *store, pointer_y)?
        };
        if let Some(event) = event {
            self.applied(&event);
        }
        Ok(())
    }

    pub fn remeasure(&self, slots: Vec<SlotBounds>) {
        self.controller.borrow_mut().remeasure(slots);
    }

    pub fn dragged(&self) -> Option<ItemKey> {
        self.controller.borrow().dragged()
    }

    pub fn end_drag(&self) -> Option<DragOutcome> {
        let outcome = self.controller.borrow_mut().end_drag()?;
        if outcome.moved() {
            self.schedule();
        }
        Some(outcome)
    }

    /// Push whatever differs from the last confirmed state (manual retry)
    pub fn sync_now(&self) {
        self.schedule();
    }

    // ========================
    // Internals
    // ========================

    fn ensure_can_edit(&self, key: Option<ItemKey>) -> SyncResult<()> {
        ReorderController::guard(self.can_edit(), &self.id)
            .map_err(|err| self.fail(key.map(|key| key.to_string()), err))
    }

    /// Report `err` once and hand it back
    fn fail(&self, item_id: Option<String>, err: SyncError) -> SyncError {
        self.deps.reporter.report(ErrorReport::new(&self.id, item_id, &err));
        err
    }

    /// Bookkeeping after an optimistic mutation
    fn applied(&self, event: &ChangeEvent<P>) {
        {
            let mut confirmed = self.confirmed.borrow_mut();
            confirmed.dirty = true;
            if confirmed.status != SyncStatus::Syncing {
                confirmed.status = SyncStatus::Dirty;
            }
        }
        self.emit(event);
        self.emit_state();
    }

    fn schedule(&self) {
        let Some(this) = self.this.upgrade() else {
            return;
        };
        let spawned = self.deps.spawner.spawn_local(async move {
            // in_flight is only cleared once the last round returns
            if let Scheduled::Completed { .. } = this.deps.scheduler.schedule(&*this).await {
                this.emit_state();
            }
        });
        if let Err(err) = spawned {
            error!("[{}] failed to spawn sync: {}", self.id, err);
        }
    }

    fn set_status(&self, status: SyncStatus) {
        self.confirmed.borrow_mut().status = status;
        self.emit_state();
    }

    fn emit(&self, event: &ChangeEvent<P>) {
        let observers = self.change_observers.borrow().clone();
        for observer in observers {
            observer(event);
        }
    }

    fn emit_state(&self) {
        let state = self.sync_state();
        let observers = self.state_observers.borrow().clone();
        for observer in observers {
            observer(state);
        }
    }

    fn failure_report(&self, op: &PendingOperation<P>, err: &SyncError) -> ErrorReport {
        match op.id() {
            Some(id) => ErrorReport::new(&self.id, Some(id.to_string()), err),
            None => ErrorReport::for_key(&self.id, op.key(), err),
        }
    }
}

#[async_trait(?Send)]
impl<P: Payload> SyncTarget for CollectionSession<P> {
    type Round = RoundOutcome<P>;

    fn collection_id(&self) -> CollectionId {
        self.id.clone()
    }

    async fn run_round(&self, generation: u64) -> RoundOutcome<P> {
        let (ops, revision) = {
            let store = self.store.borrow();
            let confirmed = self.confirmed.borrow();
            (self.engine.diff(store.get(), &confirmed.snapshot), store.revision())
        };
        if ops.is_empty() {
            return RoundOutcome { revision, report: RoundReport::default() };
        }
        debug!("[{}] round gen={} with {} operations", self.id, generation, ops.len());
        self.set_status(SyncStatus::Syncing);
        let report = self
            .engine
            .execute(&*self.deps.api, &self.collection, ops, &*self.deps.delay)
            .await;
        RoundOutcome { revision, report }
    }

    fn commit(&self, generation: u64, outcome: RoundOutcome<P>) {
        let RoundOutcome { revision, report } = outcome;
        let failures: Vec<(PendingOperation<P>, SyncError)> =
            report.failures().map(|(op, err)| (op.clone(), err.clone())).collect();
        let mut events = Vec::new();
        {
            let mut store = self.store.borrow_mut();
            let mut confirmed = self.confirmed.borrow_mut();

            for (key, id) in report.created_ids() {
                if store.index_of(key).is_none() {
                    debug!("[{}] {} was removed while its create was in flight", self.id, key);
                    continue;
                }
                if let Ok(event) = store.attach_id(key, id.clone()) {
                    events.push(event);
                }
            }
            report.apply_confirmed(&mut confirmed.snapshot);

            for (op, _) in &failures {
                let key = op.key();
                if store.touched_since(key, revision) {
                    debug!("[{}] keeping newer intent for {} over failed round", self.id, key);
                    continue;
                }
                match op {
                    PendingOperation::Create { .. } => {
                        if let Some(event) = store.discard(key) {
                            events.push(event);
                        }
                    }
                    PendingOperation::Update { .. } | PendingOperation::Delete { .. } => {
                        if let Some(index) = confirmed.snapshot.iter().position(|item| item.key == key) {
                            let synced = confirmed.snapshot[index].clone();
                            events.push(store.restore(&synced, index));
                        }
                    }
                }
                warn!("[{}] rolled back {} after failed sync", self.id, key);
            }

            confirmed.dirty = !self.engine.diff(store.get(), &confirmed.snapshot).is_empty();
            confirmed.status = if !failures.is_empty() {
                SyncStatus::Error
            } else if confirmed.dirty {
                SyncStatus::Dirty
            } else {
                SyncStatus::Idle
            };
        }
        debug!("[{}] committed gen={} ({} failed)", self.id, generation, failures.len());

        for (op, err) in &failures {
            self.deps.reporter.report(self.failure_report(op, err));
        }
        for event in &events {
            self.emit(event);
        }
        self.emit_state();
    }

    fn discard(&self, generation: u64, outcome: RoundOutcome<P>) {
        warn!(
            "[{}] ignoring {} results of superseded round gen={}",
            self.id,
            outcome.report.outcomes.len(),
            generation
        );
        {
            let mut confirmed = self.confirmed.borrow_mut();
            if confirmed.status == SyncStatus::Syncing {
                confirmed.status = if confirmed.dirty { SyncStatus::Dirty } else { SyncStatus::Idle };
            }
        }
        self.emit_state();
    }
}
