//! Sortable List Component
//!
//! Renders the FAQ collection with pointer and keyboard reordering.
//! Gesture plumbing comes from leptos-dragdrop; where a row lands is decided
//! by the session's reorder controller.

use collection_sync::{ItemKey, SlotBounds};
use leptos::prelude::*;
use log::debug;

use crate::components::FaqRow;
use crate::context::AppContext;

use leptos_dragdrop::*;

/// Rows are measured in document order, which is list order
const ROW_SELECTOR: &str = "[data-testid=\"faq-card\"]";

fn measure_slots() -> Vec<SlotBounds> {
    measure_rows(ROW_SELECTOR)
        .into_iter()
        .map(|row| SlotBounds::new(row.top, row.height))
        .collect()
}

#[component]
pub fn SortableList() -> impl IntoView {
    let ctx = expect_context::<AppContext>();

    let dnd = create_dnd_signals();
    if ctx.affordances.drag_handle {
        let threshold = ctx.config.with_value(|config| config.drag.threshold_px.round() as i32);
        bind_sortable(
            dnd,
            threshold,
            move |id, pointer_y| {
                let slots = measure_slots();
                ctx.with_session(|session| {
                    if session.begin_drag(ItemKey(id), slots).is_ok() {
                        let _ = session.drag_to(pointer_y);
                    }
                });
            },
            move |pointer_y| {
                ctx.with_session(|session| {
                    session.remeasure(measure_slots());
                    let _ = session.drag_to(pointer_y);
                });
            },
            move |_id| {
                if let Some(outcome) = ctx.with_session(|session| session.end_drag()) {
                    debug!("[DND] dropped {} at {} (from {})", outcome.key, outcome.to, outcome.from);
                }
            },
        );
    }

    view! {
        <div class="sortable-list" role="list">
            <Show when=move || ctx.items.get().is_empty()>
                <p class="empty-list">"No questions yet."</p>
            </Show>
            <For
                each=move || ctx.items.get()
                // Re-render a row when its content or position changes
                key=|item| (item.key, item.order, item.payload.question.clone(), item.payload.answer.clone())
                children=move |item| {
                    let id = item.key.0;
                    let dragging = move || dnd.dragging_id_read.get() == Some(id);
                    view! { <FaqRow item=item dnd=dnd dragging=Signal::derive(dragging) /> }
                }
            />
        </div>
    }
}
