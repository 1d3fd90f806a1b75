//! Error taxonomy for the content core.
//!
//! Validation errors are recovered at the editing surface (the save is
//! rejected and re-prompted), resolution errors propagate to the rendering
//! layer which decides a non-fatal display fallback. Nothing here is meant
//! to abort the process.

use crate::i18n::LanguageId;
use thiserror::Error;

/// Rejection of a proposed record-set save.
///
/// Raised before persistence; a failed validation rolls back the whole
/// transactional save and is surfaced as a form-level message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A non-empty proposed set has no entry marked default.
    #[error("record set must have at least one default entry")]
    NoDefault,

    /// More than one entry in the proposed set is marked default.
    #[error("record set must have only one default entry")]
    MultipleDefault,

    /// Two live entries in the proposed set share a language.
    #[error("record set already has an entry for language {language}")]
    DuplicateLanguage { language: LanguageId },

    /// A parameter-name translation uses the owning item's default language.
    #[error("item parameter already has a name in the item's default language")]
    ParameterLanguageConflict,

    /// An item sets a price without a currency, or a currency without a
    /// price.
    #[error("price and currency must be set together")]
    IncompletePricing,
}

/// Failure to resolve localized content for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The collection has no record for the requested language and no
    /// default record. The rendering layer chooses what to show instead.
    #[error("no content available")]
    NoContent,
}

/// Violation of the global currency default invariant at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CurrencyDefaultError {
    #[error("currency set must have exactly one default currency, found none")]
    NoDefault,

    #[error("currency set must have exactly one default currency, found more than one")]
    MultipleDefault,
}

/// Crate-level error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Currency(#[from] CurrencyDefaultError),

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("payload encoding error: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("unknown language code '{0}'")]
    UnknownLanguage(String),

    #[error("unknown template tag '{0}'")]
    UnknownTemplateTag(String),

    #[error("unknown menu kind '{0}'")]
    UnknownMenuKind(String),

    #[error("invalid storage key '{0}': only latin characters are allowed")]
    InvalidStorageKey(String),

    #[error("invalid size spec '{0}'")]
    InvalidSizeSpec(String),

    #[error("{0} {1} not found")]
    NotFound(&'static str, i64),
}

pub type Result<T> = std::result::Result<T, Error>;
