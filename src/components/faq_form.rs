//! FAQ Form Component
//!
//! Adds a new question or edits the one selected in the list. Required
//! fields are checked before anything reaches the session.

use collection_sync::{FaqEntry, FaqPatch, Payload};
use leptos::prelude::*;

use crate::context::AppContext;

#[component]
pub fn FaqForm() -> impl IntoView {
    let ctx = expect_context::<AppContext>();

    let (question, set_question) = signal(String::new());
    let (answer, set_answer) = signal(String::new());
    let (form_error, set_form_error) = signal(None::<String>);

    // Prefill when an item is picked for editing
    Effect::new(move |_| {
        let entry = ctx.editing.get().and_then(|key| {
            ctx.items.get_untracked().into_iter().find(|item| item.key == key)
        });
        match entry {
            Some(item) => {
                set_question.set(item.payload.question);
                set_answer.set(item.payload.answer);
            }
            None => {
                set_question.set(String::new());
                set_answer.set(String::new());
            }
        }
        set_form_error.set(None);
    });

    let reset = move || {
        ctx.set_editing(None);
        set_question.set(String::new());
        set_answer.set(String::new());
        set_form_error.set(None);
    };

    let submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let entry = FaqEntry::new(question.get().trim(), answer.get().trim());
        if let Err(err) = entry.validate() {
            set_form_error.set(Some(err.to_string()));
            return;
        }

        let result = ctx.with_session(|session| match ctx.editing.get_untracked() {
            Some(key) => session.edit(
                key,
                FaqPatch {
                    question: Some(entry.question),
                    answer: Some(entry.answer),
                },
            ),
            None => session.add(entry, None).map(|_| ()),
        });
        match result {
            Ok(()) => reset(),
            Err(err) => set_form_error.set(Some(err.to_string())),
        }
    };

    view! {
        <form class="faq-form" data-testid="faq-form" on:submit=submit>
            <h2>{move || if ctx.editing.get().is_some() { "Edit question" } else { "Add question" }}</h2>
            <input
                type="text"
                placeholder="Question"
                data-testid="faq-question-input"
                prop:value=move || question.get()
                on:input=move |ev| set_question.set(event_target_value(&ev))
            />
            <textarea
                placeholder="Answer"
                data-testid="faq-answer-input"
                prop:value=move || answer.get()
                on:input=move |ev| set_answer.set(event_target_value(&ev))
            />
            {move || form_error.get().map(|message| view! {
                <p class="form-error" role="alert">{message}</p>
            })}
            <div class="form-actions">
                <button type="submit" data-testid="faq-save-button">
                    {move || if ctx.editing.get().is_some() { "Save" } else { "Add" }}
                </button>
                <Show when=move || ctx.editing.get().is_some()>
                    <button type="button" class="cancel-btn" on:click=move |_| reset()>
                        "Cancel"
                    </button>
                </Show>
            </div>
        </form>
    }
}
