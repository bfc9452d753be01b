//! Domain Layer
//!
//! Identifiers, collection addressing, items and payloads.
//! This layer has NO I/O (serde only).

mod entity;
mod collection;
mod item;
mod payload;

pub use entity::{CollectionId, ItemId, ItemKey, UserId};
pub use collection::{CollectionKind, CollectionRef, ParentKind, ParentRef};
pub use item::{CollectionItem, ItemRecord};
pub use payload::{
    FaqEntry, FaqPatch, GalleryImage, GalleryImagePatch, Payload, Resource, ResourcePatch,
    SocialLink, SocialLinkPatch,
};
