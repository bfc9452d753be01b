//! Delete Confirm Button Component
//!
//! Two-step delete for a list row. The first click arms the button; it
//! disarms itself after a few seconds or on Escape.

use gloo_timers::callback::Timeout;
use leptos::prelude::*;

const DISARM_AFTER_MS: u32 = 3_000;

/// # Arguments
/// * `label` - Title of the row, used for the accessible name
/// * `test_id` - `data-testid` of the first button; the confirm button gets `<test_id>-confirm`
/// * `on_confirm` - Runs once the deletion is confirmed
#[component]
pub fn DeleteConfirmButton(
    #[prop(into)] label: String,
    #[prop(into)] test_id: String,
    #[prop(into)] on_confirm: Callback<()>,
) -> impl IntoView {
    // Bumped on every arm so an older timer cannot disarm a newer click
    let (armed_at, set_armed_at) = signal(None::<u32>);
    let arms = StoredValue::new(0u32);

    let arm = move |ev: web_sys::MouseEvent| {
        ev.stop_propagation();
        let n = arms.get_value() + 1;
        arms.set_value(n);
        set_armed_at.set(Some(n));
        Timeout::new(DISARM_AFTER_MS, move || {
            if armed_at.get_untracked() == Some(n) {
                set_armed_at.set(None);
            }
        })
        .forget();
    };

    let on_keydown = move |ev: web_sys::KeyboardEvent| {
        if ev.key() == "Escape" {
            ev.stop_propagation();
            set_armed_at.set(None);
        }
    };

    let delete_label = format!("Delete \"{}\"", label);
    let confirm_id = format!("{}-confirm", test_id);

    move || {
        if armed_at.get().is_none() {
            view! {
                <button class="delete-btn" data-testid=test_id.clone() aria-label=delete_label.clone() on:click=arm>
                    "×"
                </button>
            }
            .into_any()
        } else {
            view! {
                <span class="delete-confirm" role="group" on:keydown=on_keydown>
                    <button
                        class="confirm-btn"
                        data-testid=confirm_id.clone()
                        on:click=move |ev| {
                            ev.stop_propagation();
                            set_armed_at.set(None);
                            on_confirm.run(());
                        }
                    >
                        "Delete"
                    </button>
                    <button
                        class="cancel-btn"
                        on:click=move |ev| {
                            ev.stop_propagation();
                            set_armed_at.set(None);
                        }
                    >
                        "Keep"
                    </button>
                </span>
            }
            .into_any()
        }
    }
}
