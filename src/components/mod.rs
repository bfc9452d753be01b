//! UI Components
//!
//! Reusable Leptos components.

mod delete_confirm_button;
mod error_banner;
mod faq_form;
mod faq_row;
mod log_panel;
mod sortable_list;
mod sync_indicator;

pub use delete_confirm_button::DeleteConfirmButton;
pub use error_banner::ErrorBanner;
pub use faq_form::FaqForm;
pub use faq_row::FaqRow;
pub use log_panel::LogPanel;
pub use sortable_list::SortableList;
pub use sync_indicator::SyncIndicator;
