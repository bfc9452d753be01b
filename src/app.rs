//! Collection Sync Frontend App
//!
//! FAQ management page for one organization, group or event. The parent
//! entity and the viewer come from the page URL, e.g.
//! `?parent=event&id=42&owner=u1&user=u1&token=...`.

use std::rc::Rc;

use collection_sync::{
    ErrorReport, LogReporter, ErrorReporter, ParentEntity, ParentKind, ParentRef, RestClient, Role,
    SessionDeps, SyncConfig, SyncScheduler, UserId, Viewer,
};
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{error, info};

use crate::components::{ErrorBanner, FaqForm, LogPanel, SortableList, SyncIndicator};
use crate::context::{AppContext, FaqSession};
use crate::platform::{GlooDelay, LeptosSpawner};

/// What the page is about and who is looking at it
#[derive(Debug, Clone, PartialEq)]
pub struct PageParams {
    pub entity: ParentEntity,
    pub viewer: Viewer,
    pub token: Option<String>,
}

impl PageParams {
    /// Parse a `location.search` string
    pub fn from_query(query: &str) -> Self {
        let mut kind = ParentKind::Event;
        let mut id = String::new();
        let mut owner = None;
        let mut user = None;
        let mut role = None;
        let mut token = None;

        for pair in query.trim_start_matches('?').split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            match key {
                "parent" => {
                    kind = match value {
                        "organization" => ParentKind::Organization,
                        "group" => ParentKind::Group,
                        _ => ParentKind::Event,
                    }
                }
                "id" => id = value.to_string(),
                "owner" => owner = Some(UserId::from(value)),
                "user" => user = Some(UserId::from(value)),
                "role" => role = Some(if value == "staff" { Role::Staff } else { Role::Member }),
                "token" => token = Some(value.to_string()),
                _ => {}
            }
        }

        let viewer = match user {
            Some(user_id) => Viewer { user_id: Some(user_id), role: role.unwrap_or(Role::Member) },
            None => Viewer::anonymous(),
        };
        Self {
            entity: ParentEntity::new(ParentRef::new(kind, id), owner),
            viewer,
            token,
        }
    }

    fn from_location() -> Self {
        let search = web_sys::window()
            .and_then(|win| win.location().search().ok())
            .unwrap_or_default();
        Self::from_query(&search)
    }
}

fn load_config() -> SyncConfig {
    match SyncConfig::from_optional(option_env!("COLLECTION_SYNC_CONFIG")) {
        Ok(config) => config,
        Err(err) => {
            error!("[APP] invalid COLLECTION_SYNC_CONFIG, using defaults: {}", err);
            SyncConfig::default()
        }
    }
}

fn build_session(params: &PageParams, config: &SyncConfig, set_errors: WriteSignal<Vec<ErrorReport>>) -> Rc<FaqSession> {
    let mut client = RestClient::new(config.api_base_url.clone());
    if let Some(token) = &params.token {
        client = client.with_token(token.clone());
    }
    let reporter = move |report: ErrorReport| {
        LogReporter.report(report.clone());
        set_errors.update(|errors| errors.push(report));
    };
    let deps = SessionDeps {
        api: Rc::new(client),
        scheduler: Rc::new(SyncScheduler::new()),
        reporter: Rc::new(reporter),
        spawner: Rc::new(LeptosSpawner),
        delay: Rc::new(GlooDelay),
    };
    FaqSession::new(params.entity.clone(), params.viewer.clone(), config, deps)
}

#[component]
pub fn App() -> impl IntoView {
    let config = load_config();
    let params = PageParams::from_location();
    let (errors, set_errors) = signal(Vec::<ErrorReport>::new());

    let session = build_session(&params, &config, set_errors);
    info!("[APP] FAQ page for {} (can edit: {})", session.id(), session.can_edit());

    let ctx = AppContext::new(session, config, (errors, set_errors));
    provide_context(ctx);

    // Load the collection on mount; failures land in the error banner
    let loader = ctx.session();
    spawn_local(async move {
        let _ = loader.load().await;
    });

    view! {
        <main class="main-content faq-page">
            <header class="faq-header">
                <h1>"FAQ"</h1>
                <SyncIndicator />
            </header>

            <ErrorBanner />

            <SortableList />

            <Show when=move || ctx.affordances.edit_button>
                <FaqForm />
            </Show>

            <p class="item-count">{move || format!("{} questions", ctx.items.get().len())}</p>

            <LogPanel />
        </main>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_with_member_viewer() {
        let params = PageParams::from_query("?parent=group&id=g7&owner=u1&user=u2&token=abc");
        assert_eq!(params.entity.parent, ParentRef::new(ParentKind::Group, "g7"));
        assert_eq!(params.entity.created_by, Some(UserId::from("u1")));
        assert_eq!(params.viewer, Viewer::member("u2"));
        assert_eq!(params.token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_query_defaults_to_anonymous_event_viewer() {
        let params = PageParams::from_query("?id=42&user=");
        assert_eq!(params.entity.parent, ParentRef::new(ParentKind::Event, "42"));
        assert!(!params.viewer.is_signed_in());
        assert!(params.token.is_none());
    }

    #[test]
    fn test_staff_role() {
        let params = PageParams::from_query("user=admin&role=staff");
        assert_eq!(params.viewer.role, Role::Staff);
    }
}
