//! Error Reporter
//!
//! Every failure is turned into one [`ErrorReport`] and handed to the
//! reporter exactly once. The UI plugs in its toast/banner; tests collect.

use std::cell::RefCell;

use log::{error, warn};
use serde::Serialize;

use crate::domain::{CollectionId, ItemKey};
use crate::error::{ErrorKind, SyncError};

/// Payload of the user-facing error channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub collection: CollectionId,
    /// Server id of the affected item, or its client key when it has none
    pub item_id: Option<String>,
    pub message: String,
}

impl ErrorReport {
    pub fn new(collection: &CollectionId, item_id: Option<String>, error: &SyncError) -> Self {
        Self {
            kind: error.kind(),
            collection: collection.clone(),
            item_id,
            message: error.to_string(),
        }
    }

    /// Item not yet known to the server, identified by its client key
    pub fn for_key(collection: &CollectionId, key: ItemKey, error: &SyncError) -> Self {
        Self::new(collection, Some(key.to_string()), error)
    }
}

pub trait ErrorReporter {
    fn report(&self, report: ErrorReport);
}

impl<F: Fn(ErrorReport)> ErrorReporter for F {
    fn report(&self, report: ErrorReport) {
        self(report)
    }
}

/// Writes reports to the log only
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, report: ErrorReport) {
        match report.kind {
            ErrorKind::Forbidden => error!(
                "[{}] {:?} item={:?}: {}",
                report.collection, report.kind, report.item_id, report.message
            ),
            _ => warn!(
                "[{}] {:?} item={:?}: {}",
                report.collection, report.kind, report.item_id, report.message
            ),
        }
    }
}

/// Keeps every report; drained by the UI banner or inspected by tests
#[derive(Debug, Default)]
pub struct CollectingReporter {
    reports: RefCell<Vec<ErrorReport>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<ErrorReport> {
        self.reports.borrow().clone()
    }

    pub fn take(&self) -> Vec<ErrorReport> {
        std::mem::take(&mut *self.reports.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.reports.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.borrow().is_empty()
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, report: ErrorReport) {
        LogReporter.report(report.clone());
        self.reports.borrow_mut().push(report);
    }
}
