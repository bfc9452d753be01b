//! Item Payloads
//!
//! The entity fields carried by each collection kind. The engine treats them
//! as opaque apart from validation, patching and equality.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::collection::CollectionKind;
use crate::error::ValidationError;

/// Entity fields of one collection kind
pub trait Payload: Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + 'static {
    /// Partial edit applied by `edit`
    type Patch: Clone + fmt::Debug;

    /// Collection kind this payload belongs to
    const KIND: CollectionKind;

    /// Apply a partial edit in place
    fn apply(&mut self, patch: Self::Patch);

    /// Client-side precondition check; failing items never reach the network
    fn validate(&self) -> Result<(), ValidationError>;

    /// Short human label used in list rows and log lines
    fn title(&self) -> &str;
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, format!("{} is required", field)));
    }
    Ok(())
}

fn require_url(field: &'static str, value: &str) -> Result<(), ValidationError> {
    require(field, value)?;
    let v = value.trim();
    if !(v.starts_with("https://") || v.starts_with("http://")) {
        return Err(ValidationError::new(field, format!("{} must be an http(s) URL", field)));
    }
    Ok(())
}

// ========================
// FAQ entries
// ========================

/// Question/answer pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqEntry {
    #[serde(default = "default_iso")]
    pub iso: String,
    pub question: String,
    pub answer: String,
}

fn default_iso() -> String {
    "en".to_string()
}

impl FaqEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            iso: default_iso(),
            question: question.into(),
            answer: answer.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FaqPatch {
    pub question: Option<String>,
    pub answer: Option<String>,
}

impl Payload for FaqEntry {
    type Patch = FaqPatch;
    const KIND: CollectionKind = CollectionKind::Faq;

    fn apply(&mut self, patch: FaqPatch) {
        if let Some(question) = patch.question {
            self.question = question;
        }
        if let Some(answer) = patch.answer {
            self.answer = answer;
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("question", &self.question)?;
        require("answer", &self.answer)
    }

    fn title(&self) -> &str {
        &self.question
    }
}

// ========================
// Resources
// ========================

/// Linked resource (document, website, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
}

#[derive(Debug, Clone, Default)]
pub struct ResourcePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
}

impl Payload for Resource {
    type Patch = ResourcePatch;
    const KIND: CollectionKind = CollectionKind::Resource;

    fn apply(&mut self, patch: ResourcePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(url) = patch.url {
            self.url = url;
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        require_url("url", &self.url)
    }

    fn title(&self) -> &str {
        &self.name
    }
}

// ========================
// Social links
// ========================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialLink {
    pub link: String,
    pub label: String,
}

#[derive(Debug, Clone, Default)]
pub struct SocialLinkPatch {
    pub link: Option<String>,
    pub label: Option<String>,
}

impl Payload for SocialLink {
    type Patch = SocialLinkPatch;
    const KIND: CollectionKind = CollectionKind::SocialLink;

    fn apply(&mut self, patch: SocialLinkPatch) {
        if let Some(link) = patch.link {
            self.link = link;
        }
        if let Some(label) = patch.label {
            self.label = label;
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("label", &self.label)?;
        require_url("link", &self.link)
    }

    fn title(&self) -> &str {
        &self.label
    }
}

// ========================
// Gallery images
// ========================

/// Uploaded image; the upload itself happens elsewhere, the collection only
/// orders references to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryImage {
    #[serde(alias = "fileObject")]
    pub file_object: String,
    #[serde(default)]
    pub alt: String,
}

#[derive(Debug, Clone, Default)]
pub struct GalleryImagePatch {
    pub alt: Option<String>,
}

impl Payload for GalleryImage {
    type Patch = GalleryImagePatch;
    const KIND: CollectionKind = CollectionKind::Image;

    fn apply(&mut self, patch: GalleryImagePatch) {
        if let Some(alt) = patch.alt {
            self.alt = alt;
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require("file_object", &self.file_object)
    }

    fn title(&self) -> &str {
        if self.alt.is_empty() {
            &self.file_object
        } else {
            &self.alt
        }
    }
}
