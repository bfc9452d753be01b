//! Collection Addressing
//!
//! Which parent an ordered collection hangs off, which kind of sub-resource it
//! holds, and how that maps onto backend paths and field names.

use serde::{Deserialize, Serialize};

use super::entity::CollectionId;

/// Parent entity type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParentKind {
    Organization,
    Group,
    Event,
}

impl ParentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParentKind::Organization => "organization",
            ParentKind::Group => "group",
            ParentKind::Event => "event",
        }
    }

    /// Name of the foreign-key field the backend expects in item bodies
    pub fn parent_field(&self) -> &'static str {
        match self {
            ParentKind::Organization => "org",
            ParentKind::Group => "group",
            ParentKind::Event => "event",
        }
    }

    /// Path of the parent entity resource (without id)
    pub fn entity_path(&self) -> &'static str {
        match self {
            ParentKind::Organization => "communities/organizations",
            ParentKind::Group => "communities/groups",
            ParentKind::Event => "events/events",
        }
    }

    fn area(&self) -> &'static str {
        match self {
            ParentKind::Organization | ParentKind::Group => "communities",
            ParentKind::Event => "events",
        }
    }
}

/// Kind of ordered sub-resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Faq,
    Resource,
    SocialLink,
    Image,
}

impl CollectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Faq => "faq",
            CollectionKind::Resource => "resource",
            CollectionKind::SocialLink => "social_link",
            CollectionKind::Image => "image",
        }
    }

    /// Field carrying the position. Gallery images call it `sequence_index`.
    pub fn order_field(&self) -> &'static str {
        match self {
            CollectionKind::Image => "sequence_index",
            _ => "order",
        }
    }

    /// Field names under which the parent entity embeds this collection
    /// (camelCase first, snake_case fallback)
    pub fn embedded_fields(&self) -> [&'static str; 2] {
        match self {
            CollectionKind::Faq => ["faqEntries", "faq_entries"],
            CollectionKind::Resource => ["resources", "resources"],
            CollectionKind::SocialLink => ["socialLinks", "social_links"],
            CollectionKind::Image => ["images", "images"],
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            CollectionKind::Faq => "faqs",
            CollectionKind::Resource => "resources",
            CollectionKind::SocialLink => "social_links",
            CollectionKind::Image => "images",
        }
    }
}

/// A concrete parent entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParentRef {
    pub kind: ParentKind,
    pub id: String,
}

impl ParentRef {
    pub fn new(kind: ParentKind, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }

    pub fn entity_path(&self) -> String {
        format!("{}/{}", self.kind.entity_path(), self.id)
    }
}

/// One ordered collection: a kind of sub-resource under one parent
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionRef {
    pub parent: ParentRef,
    pub kind: CollectionKind,
}

impl CollectionRef {
    pub fn new(parent: ParentRef, kind: CollectionKind) -> Self {
        Self { parent, kind }
    }

    pub fn id(&self) -> CollectionId {
        CollectionId(format!(
            "{}:{}:{}",
            self.parent.kind.as_str(),
            self.parent.id,
            self.kind.as_str()
        ))
    }

    /// Path used for `POST` (create)
    pub fn collection_path(&self) -> String {
        match self.kind {
            CollectionKind::Image => format!(
                "{}/{}/{}/images",
                self.parent.kind.area(),
                self.parent.kind.as_str(),
                self.parent.id
            ),
            kind => format!(
                "{}/{}_{}",
                self.parent.kind.area(),
                self.parent.kind.as_str(),
                kind.suffix()
            ),
        }
    }

    /// Path used for `PUT` / `DELETE` of one item
    pub fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.collection_path(), id)
    }

    pub fn parent_field(&self) -> &'static str {
        self.parent.kind.parent_field()
    }

    pub fn order_field(&self) -> &'static str {
        self.kind.order_field()
    }
}
