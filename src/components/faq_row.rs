//! FAQ Row Component
//!
//! One question/answer card. Editing controls and key handlers are only
//! attached when the viewer may edit.

use collection_sync::{CollectionItem, Direction, FaqEntry, InputMode, ItemKey, ReorderTarget};
use leptos::prelude::*;
use wasm_bindgen::JsCast;

use crate::components::DeleteConfirmButton;
use crate::context::AppContext;

use leptos_dragdrop::{make_on_keydown, make_on_mousedown, DndSignals, Step};

/// Rows are re-created when they move; put focus back on the moved one
fn refocus(id: u64) {
    request_animation_frame(move || {
        let row = web_sys::window()
            .and_then(|win| win.document())
            .and_then(|doc| doc.query_selector(&format!("[data-item-key=\"{}\"]", id)).ok().flatten())
            .and_then(|el| el.dyn_into::<web_sys::HtmlElement>().ok());
        if let Some(row) = row {
            let _ = row.focus();
        }
    });
}

#[component]
pub fn FaqRow(
    item: CollectionItem<FaqEntry>,
    dnd: DndSignals,
    #[prop(into)] dragging: Signal<bool>,
) -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let affordances = ctx.affordances;

    let key = item.key;
    let id = key.0;
    let question = item.payload.question.clone();
    let answer = item.payload.answer.clone();
    let pending = !item.is_persisted();
    let delete_label = question.clone();

    let class = move || {
        let mut class = String::from("faq-card");
        if dragging.get() {
            class.push_str(" dragging");
        }
        if pending {
            class.push_str(" pending");
        }
        class
    };

    let controls = affordances.edit_button.then(|| {
        view! {
            <span class="faq-controls">
                <button
                    class="edit-btn"
                    data-testid="faq-edit-button"
                    on:click=move |ev| {
                        ev.stop_propagation();
                        ctx.set_editing(Some(key));
                    }
                >
                    "Edit"
                </button>
                {affordances.delete_button.then(|| view! {
                    <DeleteConfirmButton
                        label=delete_label.clone()
                        test_id="faq-delete-button"
                        on_confirm=move |_| ctx.with_session(|session| {
                            let _ = session.remove(key);
                        })
                    />
                })}
            </span>
        }
    });

    let handle = affordances.drag_handle.then(|| {
        view! {
            <span class="drag-handle" data-testid="faq-drag-handle" title="Drag to reorder" on:mousedown=make_on_mousedown(dnd, id)>
                "⠿"
            </span>
        }
    });

    let body = view! {
        {handle}
        <div class="faq-content">
            <h3 class="faq-question">{question}</h3>
            <p class="faq-answer">{answer}</p>
        </div>
        {controls}
    };

    if affordances.keyboard_reorder {
        let on_keydown = make_on_keydown(id, move |id, step| {
            let direction = match step {
                Step::Up => Direction::Up,
                Step::Down => Direction::Down,
            };
            let moved = ctx.with_session(|session| {
                session.reorder(ItemKey(id), ReorderTarget::Direction(direction), InputMode::Keyboard)
            });
            if moved.is_ok() {
                refocus(id);
            }
        });
        view! {
            <div
                class=class
                role="listitem"
                data-testid="faq-card"
                data-item-key=id.to_string()
                tabindex=affordances.tab_index.to_string()
                aria-roledescription="sortable"
                on:keydown=on_keydown
            >
                {body}
            </div>
        }
        .into_any()
    } else {
        view! {
            <div class=class role="listitem" data-testid="faq-card" data-item-key=id.to_string() tabindex=affordances.tab_index.to_string()>
                {body}
            </div>
        }
        .into_any()
    }
}
