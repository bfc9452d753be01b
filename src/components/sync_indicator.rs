//! Sync Indicator Component
//!
//! Shows whether local changes are saved.

use collection_sync::{SyncState, SyncStatus};
use leptos::prelude::*;

use crate::context::AppContext;

fn label(state: SyncState) -> &'static str {
    match state.status {
        SyncStatus::Idle => "Saved",
        SyncStatus::Dirty => "Unsaved changes",
        SyncStatus::Syncing => "Saving…",
        SyncStatus::Error => "Not saved",
    }
}

#[component]
pub fn SyncIndicator() -> impl IntoView {
    let ctx = expect_context::<AppContext>();

    let class = move || match ctx.sync_state.get().status {
        SyncStatus::Idle => "sync-indicator idle",
        SyncStatus::Dirty => "sync-indicator dirty",
        SyncStatus::Syncing => "sync-indicator syncing",
        SyncStatus::Error => "sync-indicator error",
    };

    view! {
        <span class=class data-testid="sync-status" aria-live="polite">
            {move || label(ctx.sync_state.get())}
        </span>
    }
}
