//! Permission Gate
//!
//! Single capability check performed at the subsystem boundary. The
//! controller consults it before every mutation and the UI renders from the
//! derived [`Affordances`] instead of re-deriving the flag per control.

use serde::{Deserialize, Serialize};

use crate::domain::{ParentRef, UserId};

/// Platform-level role of the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Not signed in
    #[default]
    Anonymous,
    Member,
    /// Platform staff, may edit any entity
    Staff,
}

/// Who is looking at the page
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Viewer {
    pub user_id: Option<UserId>,
    pub role: Role,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn member(user_id: impl Into<UserId>) -> Self {
        Self { user_id: Some(user_id.into()), role: Role::Member }
    }

    pub fn is_signed_in(&self) -> bool {
        self.user_id.is_some() && self.role != Role::Anonymous
    }
}

/// The organization / group / event owning a collection, with the
/// relationships that grant edit rights
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentEntity {
    pub parent: ParentRef,
    pub created_by: Option<UserId>,
    #[serde(default)]
    pub admins: Vec<UserId>,
}

impl ParentEntity {
    pub fn new(parent: ParentRef, created_by: Option<UserId>) -> Self {
        Self { parent, created_by, admins: Vec::new() }
    }
}

pub struct PermissionGate;

impl PermissionGate {
    /// Whether `viewer` may mutate collections of `entity`
    pub fn can_edit(viewer: &Viewer, entity: &ParentEntity) -> bool {
        if !viewer.is_signed_in() {
            return false;
        }
        if viewer.role == Role::Staff {
            return true;
        }
        let Some(user) = viewer.user_id.as_ref() else {
            return false;
        };
        entity.created_by.as_ref() == Some(user) || entity.admins.contains(user)
    }
}

/// Which editing controls a list row may attach
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Affordances {
    pub drag_handle: bool,
    pub edit_button: bool,
    pub delete_button: bool,
    /// Arrow-key handlers bound on the row
    pub keyboard_reorder: bool,
    /// `tabindex` of the row (-1 = not focusable for reordering)
    pub tab_index: i32,
}

impl Affordances {
    pub fn from_capability(can_edit: bool) -> Self {
        if can_edit {
            Self {
                drag_handle: true,
                edit_button: true,
                delete_button: true,
                keyboard_reorder: true,
                tab_index: 0,
            }
        } else {
            Self {
                drag_handle: false,
                edit_button: false,
                delete_button: false,
                keyboard_reorder: false,
                tab_index: -1,
            }
        }
    }

    pub fn for_viewer(viewer: &Viewer, entity: &ParentEntity) -> Self {
        Self::from_capability(PermissionGate::can_edit(viewer, entity))
    }
}
