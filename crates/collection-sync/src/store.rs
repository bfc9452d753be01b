//! Ordered Collection Store
//!
//! In-memory ordered list backing one collection. Pure data and mutations:
//! no I/O, no observers. Every mutation returns a [`ChangeEvent`] which the
//! owner fans out once it has released its borrow of the store.
//!
//! Positions are always dense: after any operation the `order` of the item at
//! index `i` is `i`.

use std::collections::HashMap;

use log::error;

use crate::domain::{CollectionItem, ItemId, ItemKey, ItemRecord, Payload};
use crate::error::{StoreError, SyncError};

/// What happened to the collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Loaded,
    Inserted { index: usize },
    Removed { index: usize },
    Moved { from: usize, to: usize },
    Updated,
    IdAttached,
    /// Rollback to the last confirmed state of one item
    Restored { index: Option<usize> },
}

/// Change descriptor emitted for observers
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent<P> {
    pub item: Option<ItemKey>,
    pub kind: ChangeKind,
    pub snapshot: Vec<CollectionItem<P>>,
}

impl<P> ChangeEvent<P> {
    /// `(from, to)` when this event describes a move
    pub fn moved(&self) -> Option<(usize, usize)> {
        match self.kind {
            ChangeKind::Moved { from, to } => Some((from, to)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderedCollectionStore<P> {
    items: Vec<CollectionItem<P>>,
    next_key: u64,
    /// Bumped by every mutation
    revision: u64,
    /// Revision at which the user last touched each item
    touched: HashMap<ItemKey, u64>,
}

impl<P> Default for OrderedCollectionStore<P> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_key: 1,
            revision: 0,
            touched: HashMap::new(),
        }
    }
}

impl<P: Clone> OrderedCollectionStore<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with records loaded from the server
    ///
    /// Records are sorted by `order`; ties keep their relative input position.
    pub fn load(&mut self, records: Vec<ItemRecord<P>>) -> ChangeEvent<P> {
        let mut items: Vec<CollectionItem<P>> = records
            .into_iter()
            .map(|record| CollectionItem {
                key: self.allocate_key(),
                id: record.id,
                order: record.order,
                payload: record.payload,
            })
            .collect();
        items.sort_by_key(|item| item.order);
        self.items = items;
        self.touched.clear();
        self.reindex_all();
        self.revision += 1;
        self.event(None, ChangeKind::Loaded)
    }

    pub fn get(&self) -> &[CollectionItem<P>] {
        &self.items
    }

    pub fn snapshot(&self) -> Vec<CollectionItem<P>> {
        self.items.clone()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn index_of(&self, key: ItemKey) -> Option<usize> {
        self.items.iter().position(|item| item.key == key)
    }

    pub fn item(&self, key: ItemKey) -> Option<&CollectionItem<P>> {
        self.items.iter().find(|item| item.key == key)
    }

    /// Insert a record at `at_index` (== len appends)
    pub fn insert(&mut self, record: ItemRecord<P>, at_index: usize) -> Result<ChangeEvent<P>, StoreError> {
        if at_index > self.items.len() {
            return Err(self.invalid_index(at_index, self.items.len()));
        }
        let key = self.allocate_key();
        self.items.insert(
            at_index,
            CollectionItem { key, id: record.id, order: at_index as u32, payload: record.payload },
        );
        self.reindex_range(at_index, self.items.len() - 1);
        self.touch(key);
        Ok(self.event(Some(key), ChangeKind::Inserted { index: at_index }))
    }

    pub fn remove_by_id(&mut self, key: ItemKey) -> Result<(CollectionItem<P>, ChangeEvent<P>), StoreError> {
        let index = self.require(key)?;
        let removed = self.items.remove(index);
        if index < self.items.len() {
            self.reindex_range(index, self.items.len() - 1);
        }
        self.touch(key);
        Ok((removed, self.event(Some(key), ChangeKind::Removed { index })))
    }

    /// Splice an item out and back in at `to_index`, shifting everything in
    /// between by one
    pub fn move_item(&mut self, key: ItemKey, to_index: usize) -> Result<ChangeEvent<P>, StoreError> {
        let from = self.require(key)?;
        if to_index >= self.items.len() {
            return Err(self.invalid_index(to_index, self.items.len()));
        }
        let item = self.items.remove(from);
        self.items.insert(to_index, item);
        self.reindex_range(from.min(to_index), from.max(to_index));
        self.touch(key);
        Ok(self.event(Some(key), ChangeKind::Moved { from, to: to_index }))
    }

    /// Record the server id of a freshly created item
    pub fn attach_id(&mut self, key: ItemKey, id: ItemId) -> Result<ChangeEvent<P>, StoreError> {
        let index = self.require(key)?;
        self.items[index].id = Some(id);
        self.revision += 1;
        Ok(self.event(Some(key), ChangeKind::IdAttached))
    }

    /// Put one item back to its last confirmed content and position
    ///
    /// Re-inserts it when it was removed locally. Does not count as a user
    /// touch.
    pub fn restore(&mut self, synced: &CollectionItem<P>, synced_index: usize) -> ChangeEvent<P> {
        let index = match self.index_of(synced.key) {
            Some(current) => {
                let mut item = self.items.remove(current);
                item.id = synced.id.clone();
                item.payload = synced.payload.clone();
                let target = synced_index.min(self.items.len());
                self.items.insert(target, item);
                target
            }
            None => {
                let target = synced_index.min(self.items.len());
                self.items.insert(target, synced.clone());
                target
            }
        };
        self.reindex_all();
        self.revision += 1;
        self.event(Some(synced.key), ChangeKind::Restored { index: Some(index) })
    }

    /// Drop an item that never made it to the server
    pub fn discard(&mut self, key: ItemKey) -> Option<ChangeEvent<P>> {
        let index = self.index_of(key)?;
        self.items.remove(index);
        self.reindex_all();
        self.revision += 1;
        Some(self.event(Some(key), ChangeKind::Restored { index: None }))
    }

    /// Whether the user changed `key` after `revision` was captured
    pub fn touched_since(&self, key: ItemKey, revision: u64) -> bool {
        self.touched.get(&key).is_some_and(|touched| *touched > revision)
    }

    fn require(&self, key: ItemKey) -> Result<usize, StoreError> {
        self.index_of(key).ok_or_else(|| {
            error!("store: unknown item {}", key);
            StoreError::UnknownId(key)
        })
    }

    fn invalid_index(&self, index: usize, len: usize) -> StoreError {
        error!("store: index {} out of bounds (len {})", index, len);
        StoreError::InvalidIndex { index, len }
    }

    fn allocate_key(&mut self) -> ItemKey {
        let key = ItemKey(self.next_key);
        self.next_key += 1;
        key
    }

    fn touch(&mut self, key: ItemKey) {
        self.revision += 1;
        self.touched.insert(key, self.revision);
    }

    fn reindex_range(&mut self, start: usize, end: usize) {
        for (index, item) in self.items.iter_mut().enumerate().take(end + 1).skip(start) {
            item.order = index as u32;
        }
    }

    fn reindex_all(&mut self) {
        for (index, item) in self.items.iter_mut().enumerate() {
            item.order = index as u32;
        }
    }

    fn event(&self, item: Option<ItemKey>, kind: ChangeKind) -> ChangeEvent<P> {
        ChangeEvent { item, kind, snapshot: self.items.clone() }
    }
}

impl<P: Payload> OrderedCollectionStore<P> {
    /// Apply a partial edit; the edited payload must pass validation or the
    /// store is left untouched
    pub fn update_item(&mut self, key: ItemKey, patch: P::Patch) -> Result<ChangeEvent<P>, SyncError> {
        let index = self.require(key)?;
        let mut payload = self.items[index].payload.clone();
        payload.apply(patch);
        payload.validate()?;
        self.items[index].payload = payload;
        self.touch(key);
        Ok(self.event(Some(key), ChangeKind::Updated))
    }
}
