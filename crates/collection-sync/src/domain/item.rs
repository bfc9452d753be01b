//! Collection Item Entity
//!
//! One ordered entry of a collection (FAQ entry, resource, social link or
//! gallery image) plus the server-side record shape it is loaded from.

use serde::{Deserialize, Serialize};

use super::entity::{ItemId, ItemKey};

/// An item held by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionItem<P> {
    /// Client-side handle, stable for the item's whole life in the store
    pub key: ItemKey,
    /// Server id (None = not created on the server yet)
    pub id: Option<ItemId>,
    /// Position within the collection
    pub order: u32,
    /// Entity fields
    pub payload: P,
}

impl<P> CollectionItem<P> {
    /// Whether the server knows about this item
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// Item as the server (or a caller loading data) describes it, before the
/// store assigns it a key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord<P> {
    pub id: Option<ItemId>,
    pub order: u32,
    pub payload: P,
}

impl<P> ItemRecord<P> {
    pub fn new(id: impl Into<Option<ItemId>>, order: u32, payload: P) -> Self {
        Self { id: id.into(), order, payload }
    }
}
