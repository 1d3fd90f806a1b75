//! Structural comparison of two record sets' language coverage.
//!
//! The canonical use is cross-checking two independently maintained
//! collections of the same owning entity, e.g. body texts against SEO
//! data: both may be partial, but an editor wants to know whether they
//! cover the same languages.

use crate::i18n::{LanguageId, Localizable};
use std::collections::BTreeSet;

/// Stateless comparator over realized language sets.
///
/// Carries no persistence side effects; used by admin-side filtering and
/// the language-check diagnostics.
pub struct LanguageCoverageChecker;

impl LanguageCoverageChecker {
    /// Whether both collections realize exactly the same language set.
    ///
    /// Set equality, not subset: two partial collections can still match.
    /// Symmetric by construction.
    pub fn languages_match<A, B>(a: &Localizable<A>, b: &Localizable<B>) -> bool {
        a.realized_language_ids() == b.realized_language_ids()
    }

    /// Languages realized by `b` but missing from `a`.
    pub fn missing_from_first<A, B>(a: &Localizable<A>, b: &Localizable<B>) -> BTreeSet<LanguageId> {
        b.realized_language_ids()
            .difference(&a.realized_language_ids())
            .copied()
            .collect()
    }

    /// Languages realized by `a` but missing from `b`.
    pub fn missing_from_second<A, B>(
        a: &Localizable<A>,
        b: &Localizable<B>,
    ) -> BTreeSet<LanguageId> {
        Self::missing_from_first(b, a)
    }
}
