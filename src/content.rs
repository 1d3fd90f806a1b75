//! Content payload types carried by localized records.
//!
//! These are plain value objects; formatting and placeholder policy live
//! in the rendering layer.

use serde::{Deserialize, Serialize};

/// A bare display name (entity names, menu node names).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameData {
    pub name: String,
}

/// A named text block with a body (category/item/page texts).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextData {
    pub name: String,
    pub body: String,
}

/// A short teaser text without a name of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortTextData {
    pub body: String,
}

/// SEO metadata. Every field is optional; an empty record is still a
/// realized language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoData {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub meta_keywords: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub meta_robots: Option<String>,
    #[serde(default)]
    pub meta_canonical: Option<String>,
    #[serde(default)]
    pub h1: Option<String>,
}

/// Caption for a banner, gallery or image position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionData {
    pub name: String,
    pub description: String,
}

/// Translated name/value pair of an item parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterNameData {
    pub name: String,
    pub value: String,
}

/// A single localized storage value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueData {
    pub value: String,
}
