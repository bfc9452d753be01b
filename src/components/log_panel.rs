//! Log Panel Component
//!
//! Recent lines of the rolling logger, refreshed whenever sync state changes.

use leptos::prelude::*;

use crate::context::AppContext;

#[component]
pub fn LogPanel() -> impl IntoView {
    let ctx = expect_context::<AppContext>();

    let lines = move || {
        ctx.sync_state.track();
        ctx.errors.track();
        rolling_logger::recent_lines().join("\n")
    };

    view! {
        <details class="log-panel">
            <summary>"Diagnostics"</summary>
            <pre>{lines}</pre>
        </details>
    }
}
