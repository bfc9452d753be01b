//! Error Banner Component
//!
//! Lists the reports delivered by the session's error reporter. Failed
//! changes have already been rolled back; "Retry" pushes whatever still
//! differs from the server.

use collection_sync::{ErrorKind, ErrorReport};
use leptos::prelude::*;

use crate::context::AppContext;

fn title(report: &ErrorReport) -> &'static str {
    match report.kind {
        ErrorKind::Network => "Connection problem",
        ErrorKind::Server => "Server error",
        ErrorKind::Validation => "Invalid input",
        ErrorKind::Conflict => "Changed elsewhere",
        ErrorKind::Forbidden => "Not allowed",
    }
}

#[component]
pub fn ErrorBanner() -> impl IntoView {
    let ctx = expect_context::<AppContext>();

    let retry = move |_| {
        ctx.clear_errors();
        ctx.with_session(|session| session.sync_now());
    };

    view! {
        <Show when=move || !ctx.errors.get().is_empty()>
            <div class="error-banner" role="alert" data-testid="error-banner">
                <ul>
                    {move || ctx.errors.get().into_iter().enumerate().map(|(index, report)| view! {
                        <li class="error-item">
                            <strong>{title(&report)}</strong>
                            " "
                            <span class="error-message">{report.message.clone()}</span>
                            <button class="dismiss-btn" on:click=move |_| ctx.dismiss_error(index)>"×"</button>
                        </li>
                    }).collect_view()}
                </ul>
                <button class="retry-btn" on:click=retry>"Retry"</button>
            </div>
        </Show>
    }
}
