//! Collection Sync
//!
//! Keeps locally reordered and edited sub-resource lists (FAQ entries,
//! resources, social links, gallery images) consistent with the backend.
//!
//! Layered architecture:
//! - domain: identifiers, collection addressing, items and payloads
//! - store / permission / pointer / controller: pure local state and gestures
//! - scheduler / reconcile / retry / reporter: persistence and failure handling
//! - api: per-item REST access
//! - session: client facade tying it together

pub mod api;
pub mod config;
pub mod controller;
pub mod domain;
pub mod error;
pub mod permission;
pub mod pointer;
pub mod reconcile;
pub mod reporter;
pub mod retry;
pub mod scheduler;
pub mod session;
pub mod store;

#[cfg(test)]
mod testing;
#[cfg(test)]
mod tests;

pub use api::{ApiError, CollectionApi, RestClient};
pub use config::{ConfigError, DragConfig, SyncConfig};
pub use controller::{Direction, DragOutcome, InputMode, ReorderController, ReorderTarget};
pub use domain::*;
pub use error::{ErrorKind, StoreError, SyncError, SyncResult, ValidationError};
pub use permission::{Affordances, ParentEntity, PermissionGate, Role, Viewer};
pub use pointer::SlotBounds;
pub use reconcile::{OperationSet, PendingOperation, ReconciliationEngine, UpdateStrategy};
pub use reporter::{CollectingReporter, ErrorReport, ErrorReporter, LogReporter};
pub use retry::{Delay, ImmediateDelay, RetryPolicy};
pub use scheduler::{Scheduled, SyncScheduler, SyncTarget};
pub use session::{CollectionSession, SessionDeps, SyncState, SyncStatus};
pub use store::{ChangeEvent, ChangeKind, OrderedCollectionStore};
