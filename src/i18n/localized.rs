//! Localized record sets: the generic unit of multilingual content.
//!
//! A `Localizable<T>` is the full set of per-language records of one kind
//! (names, texts, SEO data, captions) belonging to one owning entity. It
//! carries the two invariants every kind must uphold:
//!
//! 1. Exactly one record is marked default whenever the set is non-empty.
//! 2. No two records share a language.
//!
//! Resolution, realized/unrealized set algebra and submission-time
//! validation all live here, so every entity family gets identical policy.

use crate::error::{ResolveError, ValidationError};
use crate::i18n::LanguageId;
use std::collections::BTreeSet;

/// One persisted per-language record of some kind.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalizedRecord<T> {
    /// Language this record realizes.
    pub language: LanguageId,

    /// Whether this record is the designated fallback for its kind.
    pub default: bool,

    /// The content payload (name, text body, SEO fields, ...).
    pub value: T,
}

/// One entry of a proposed record-set save, as submitted by the editing
/// surface. Entries marked `deleted` are about to be removed and do not
/// count toward any invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRecord<T> {
    /// Existing row id, `None` for a record being created by this save.
    pub id: Option<i64>,
    pub language: LanguageId,
    pub default: bool,
    pub deleted: bool,
    /// Explicit ordering key for weighted kinds. `None` means append: the
    /// store assigns the next weight in the owner's scope at save time.
    /// Ignored by validation and by unweighted kinds.
    pub weight: Option<i64>,
    pub value: T,
}

impl<T> PendingRecord<T> {
    /// A freshly created entry: no row id yet, not deleted, appended.
    pub fn new(language: LanguageId, default: bool, value: T) -> Self {
        Self {
            id: None,
            language,
            default,
            deleted: false,
            weight: None,
            value,
        }
    }

    /// The (default, deleted) pair used by default-uniqueness validation.
    pub fn flag(&self) -> DefaultFlag {
        DefaultFlag {
            default: self.default,
            deleted: self.deleted,
        }
    }
}

/// The part of a pending entry that default-uniqueness validation looks at.
///
/// Ordered image positions carry a default flag without being localized,
/// so the check is defined over flags rather than over `PendingRecord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultFlag {
    pub default: bool,
    pub deleted: bool,
}

/// Validate that a proposed set has exactly one default among its live
/// entries.
///
/// An entirely empty (or entirely deleted) set passes: zero records is a
/// valid state while an entity is still being created. A failed validation
/// must abort the whole transactional save.
pub fn validate_default_uniqueness<I>(flags: I) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = DefaultFlag>,
{
    let mut live = 0usize;
    let mut defaults = 0usize;
    for flag in flags {
        if flag.deleted {
            continue;
        }
        live += 1;
        if flag.default {
            defaults += 1;
        }
    }

    if live == 0 {
        return Ok(());
    }
    match defaults {
        0 => Err(ValidationError::NoDefault),
        1 => Ok(()),
        _ => Err(ValidationError::MultipleDefault),
    }
}

/// Validate that no two live entries of a proposed set share a language.
pub fn validate_language_uniqueness<T>(
    pending: &[PendingRecord<T>],
) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    for record in pending.iter().filter(|r| !r.deleted) {
        if !seen.insert(record.language) {
            return Err(ValidationError::DuplicateLanguage {
                language: record.language,
            });
        }
    }
    Ok(())
}

/// The full set of records of one kind for one owning entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Localizable<T> {
    records: Vec<LocalizedRecord<T>>,
}

impl<T> Localizable<T> {
    pub fn new(records: Vec<LocalizedRecord<T>>) -> Self {
        Self { records }
    }

    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn records(&self) -> &[LocalizedRecord<T>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The record for a specific language, if realized.
    pub fn get(&self, language: LanguageId) -> Option<&LocalizedRecord<T>> {
        self.records.iter().find(|r| r.language == language)
    }

    /// The designated default record, if the set is non-empty and valid.
    pub fn default_record(&self) -> Option<&LocalizedRecord<T>> {
        self.records.iter().find(|r| r.default)
    }

    /// Resolve the record to display for `requested`.
    ///
    /// Fallback order is fixed: the record for the requested language if
    /// one exists, else the default record, else `NoContent`. A record for
    /// a language other than the requested one is only ever returned when
    /// no requested-language record exists.
    pub fn resolve(&self, requested: LanguageId) -> Result<&LocalizedRecord<T>, ResolveError> {
        if let Some(record) = self.get(requested) {
            return Ok(record);
        }
        self.default_record().ok_or(ResolveError::NoContent)
    }

    /// Languages actually present in this set.
    pub fn realized_language_ids(&self) -> BTreeSet<LanguageId> {
        self.records.iter().map(|r| r.language).collect()
    }

    /// Whether every catalog language is realized.
    ///
    /// The comparison is against the full catalog: any configured language
    /// missing from this set makes the answer false, and an empty set is
    /// never fully realized against a non-empty catalog.
    pub fn is_fully_realized(&self, catalog: &BTreeSet<LanguageId>) -> bool {
        self.unrealized_language_ids(catalog).is_empty()
    }

    /// Catalog languages missing from this set.
    pub fn unrealized_language_ids(&self, catalog: &BTreeSet<LanguageId>) -> BTreeSet<LanguageId> {
        let realized = self.realized_language_ids();
        catalog.difference(&realized).copied().collect()
    }
}

impl<T> Default for Localizable<T> {
    fn default() -> Self {
        Self::empty()
    }
}
