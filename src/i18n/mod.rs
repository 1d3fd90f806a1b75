//! Internationalization (i18n) core for multi-language content.
//!
//! This module contains the cross-cutting language logic shared by every
//! content family in the crate. All completeness and consistency policy
//! lives here so the per-entity modules cannot drift apart.
//!
//! # Architecture
//!
//! - `catalog`: Source of truth for the site's configured languages
//! - `localized`: Per-language record sets with a single default record,
//!   fallback resolution and realized/unrealized set algebra
//! - `coverage`: Structural comparison of two record sets' language coverage
//!
//! # Example
//!
//! ```rust,ignore
//! use lingua_cms::i18n::{LanguageCatalog, LanguageCoverageChecker};
//!
//! let catalog = LanguageCatalog::new(&db);
//! let texts = store::records::load::<TextData>(&db, &CATEGORY_TEXTS, category_id)?;
//! let seo = store::records::load::<SeoData>(&db, &CATEGORY_SEO, category_id)?;
//!
//! let missing = texts.unrealized_language_ids(&catalog.all_language_ids()?);
//! let matched = LanguageCoverageChecker::languages_match(&texts, &seo);
//! ```

mod catalog;
mod coverage;
mod localized;

pub use catalog::LanguageCatalog;
pub use coverage::LanguageCoverageChecker;
pub use localized::{
    validate_default_uniqueness, validate_language_uniqueness, DefaultFlag, Localizable,
    LocalizedRecord, PendingRecord,
};

/// Database identifier of a configured language.
pub type LanguageId = i64;
