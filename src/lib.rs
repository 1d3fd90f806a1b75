//! Multilingual content-management core.
//!
//! Manages a product catalogue, static pages, image galleries, banners,
//! navigation menus and a localized key-value store, with one shared
//! policy for multilingual completeness and consistency:
//!
//! - every non-empty set of per-language records has exactly one default,
//! - display values resolve as requested language, then default record,
//! - coverage ("which catalog languages are missing?") is recomputed from
//!   current data and compared against the full language catalog,
//! - ordered children are appended with monotonically increasing weights.
//!
//! The crate is a library consumed by an admin/editing surface and a
//! rendering layer; it has no wire protocol of its own.

pub mod admin;
pub mod banner;
pub mod catalogue;
pub mod config;
pub mod content;
pub mod error;
pub mod gallery;
pub mod i18n;
pub mod localization;
pub mod media;
pub mod menu;
pub mod ordering;
pub mod page;
pub mod render;
pub mod storage;
pub mod store;

pub use error::{Error, Result};
