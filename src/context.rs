//! Application Context
//!
//! Shared state provided via Leptos Context API.

use std::rc::Rc;

use collection_sync::{
    Affordances, CollectionItem, CollectionSession, ErrorReport, FaqEntry, ItemKey, SyncConfig, SyncState,
};
use leptos::prelude::*;

pub type FaqSession = CollectionSession<FaqEntry>;

/// App-wide signals provided via context
#[derive(Clone, Copy)]
pub struct AppContext {
    /// Session of the FAQ collection on this page
    session: StoredValue<Rc<FaqSession>, LocalStorage>,
    pub config: StoredValue<SyncConfig>,
    /// Optimistic item list, mirrored from session change events
    pub items: ReadSignal<Vec<CollectionItem<FaqEntry>>>,
    pub sync_state: ReadSignal<SyncState>,
    pub errors: ReadSignal<Vec<ErrorReport>>,
    set_errors: WriteSignal<Vec<ErrorReport>>,
    /// Item open in the edit form (None = form adds a new item)
    pub editing: ReadSignal<Option<ItemKey>>,
    set_editing: WriteSignal<Option<ItemKey>>,
    pub affordances: Affordances,
}

impl AppContext {
    pub fn new(
        session: Rc<FaqSession>,
        config: SyncConfig,
        errors: (ReadSignal<Vec<ErrorReport>>, WriteSignal<Vec<ErrorReport>>),
    ) -> Self {
        let (items, set_items) = signal(session.items());
        let (sync_state, set_sync_state) = signal(session.sync_state());
        let (editing, set_editing) = signal(None::<ItemKey>);
        session.subscribe(move |event| set_items.set(event.snapshot.clone()));
        session.subscribe_state(move |state| set_sync_state.set(state));

        Self {
            affordances: session.affordances(),
            session: StoredValue::new_local(session),
            config: StoredValue::new(config),
            items,
            sync_state,
            errors: errors.0,
            set_errors: errors.1,
            editing,
            set_editing,
        }
    }

    /// Run `f` against the session
    pub fn with_session<R>(&self, f: impl FnOnce(&FaqSession) -> R) -> R {
        self.session.with_value(|session| f(session))
    }

    /// Owned handle for async work
    pub fn session(&self) -> Rc<FaqSession> {
        self.session.get_value()
    }

    pub fn dismiss_error(&self, index: usize) {
        self.set_errors.update(|errors| {
            if index < errors.len() {
                errors.remove(index);
            }
        });
    }

    pub fn clear_errors(&self) {
        self.set_errors.set(Vec::new());
    }

    /// Open the form on an existing item, or on a new one
    pub fn set_editing(&self, key: Option<ItemKey>) {
        self.set_editing.set(key);
    }
}
