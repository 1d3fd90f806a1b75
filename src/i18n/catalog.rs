//! Language catalog: the set of languages content must cover.
//!
//! A pure read accessor over the configured language collection. Every
//! "fully realized" and "unrealized languages" computation in the crate
//! compares against this catalog, never against a subset.

use crate::error::Result;
use crate::i18n::LanguageId;
use crate::localization::{self, Language};
use crate::store::Database;
use std::collections::BTreeSet;

/// Read handle over the site's configured languages.
///
/// No caching: coverage checks always see the currently committed
/// language set.
pub struct LanguageCatalog<'a> {
    db: &'a Database,
}

impl<'a> LanguageCatalog<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Ids of every configured language.
    pub fn all_language_ids(&self) -> Result<BTreeSet<LanguageId>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare("SELECT id FROM languages")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<rusqlite::Result<BTreeSet<_>>>()?;
        Ok(ids)
    }

    /// Every configured language, in insertion order.
    pub fn all_languages(&self) -> Result<Vec<Language>> {
        localization::all_languages(self.db)
    }

    /// Human names for a set of language ids, for diagnostics display.
    pub fn language_names(&self, ids: &BTreeSet<LanguageId>) -> Result<Vec<String>> {
        Ok(self
            .all_languages()?
            .into_iter()
            .filter(|language| ids.contains(&language.id))
            .map(|language| language.name)
            .collect())
    }
}
