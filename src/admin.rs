//! Editing-surface services: audit labels and list classification.
//!
//! The admin backend calls into this module for everything that is not a
//! plain entity CRUD: who created/edited an entity and when, and the
//! language-coverage classifications that back its list filters and
//! check columns.

use crate::error::Result;
use crate::i18n::{LanguageCatalog, LanguageId};
use crate::store::records::{self, RecordKind};
use crate::store::Database;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use std::collections::BTreeSet;

/// The entity families the admin surface manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Banner,
    Category,
    Item,
    Gallery,
    MenuNode,
    StorageKey,
    Page,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Banner => "banner",
            EntityKind::Category => "category",
            EntityKind::Item => "item",
            EntityKind::Gallery => "gallery",
            EntityKind::MenuNode => "menu_node",
            EntityKind::StorageKey => "storage_key",
            EntityKind::Page => "page",
        }
    }
}

// ==================== Audit labels ====================

/// Who created and last edited an entity, and when (rfc3339).
#[derive(Debug, Clone, PartialEq)]
pub struct AuditLabel {
    pub entity_id: i64,
    pub author: String,
    pub last_editor: Option<String>,
    pub created_at: String,
    pub modified_at: Option<String>,
}

/// Stamp a freshly created entity with its author.
pub fn record_creation(db: &Database, kind: EntityKind, entity_id: i64, author: &str) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    db.lock().execute(
        "INSERT INTO audit_labels (entity_kind, entity_id, author, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![kind.as_str(), entity_id, author, now],
    )?;
    Ok(())
}

/// Stamp an edit. An entity that somehow has no label yet gets one with
/// the editor as author.
pub fn record_edit(db: &Database, kind: EntityKind, entity_id: i64, editor: &str) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    let conn = db.lock();
    let updated = conn.execute(
        "UPDATE audit_labels SET last_editor = ?1, modified_at = ?2
         WHERE entity_kind = ?3 AND entity_id = ?4",
        params![editor, now, kind.as_str(), entity_id],
    )?;
    if updated == 0 {
        conn.execute(
            "INSERT INTO audit_labels (entity_kind, entity_id, author, last_editor, created_at, modified_at)
             VALUES (?1, ?2, ?3, ?3, ?4, ?4)",
            params![kind.as_str(), entity_id, editor, now],
        )?;
    }
    Ok(())
}

pub fn audit_label(db: &Database, kind: EntityKind, entity_id: i64) -> Result<Option<AuditLabel>> {
    let label = db
        .lock()
        .query_row(
            "SELECT entity_id, author, last_editor, created_at, modified_at
             FROM audit_labels WHERE entity_kind = ?1 AND entity_id = ?2",
            params![kind.as_str(), entity_id],
            |row| {
                Ok(AuditLabel {
                    entity_id: row.get(0)?,
                    author: row.get(1)?,
                    last_editor: row.get(2)?,
                    created_at: row.get(3)?,
                    modified_at: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(label)
}

/// Distinct authors of one entity family, for the author list filter.
pub fn authors(db: &Database, kind: EntityKind) -> Result<Vec<String>> {
    let conn = db.lock();
    let mut stmt = conn.prepare(
        "SELECT DISTINCT author FROM audit_labels WHERE entity_kind = ?1 ORDER BY author",
    )?;
    let authors = stmt
        .query_map([kind.as_str()], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(authors)
}

/// Entities of one family created by `author`.
pub fn entities_by_author(db: &Database, kind: EntityKind, author: &str) -> Result<Vec<i64>> {
    let conn = db.lock();
    let mut stmt = conn.prepare(
        "SELECT entity_id FROM audit_labels
         WHERE entity_kind = ?1 AND author = ?2 ORDER BY entity_id",
    )?;
    let ids = stmt
        .query_map(params![kind.as_str(), author], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(ids)
}

// ==================== Coverage classification ====================

/// Admin list filter over one kind's language coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageFilter {
    /// Every catalog language is realized.
    FullyRealized,
    /// At least one catalog language is missing.
    HasUnrealized,
    /// A specific language is missing.
    MissingLanguage(LanguageId),
}

/// Catalog languages missing from one owner's kind.
pub fn unrealized_languages(
    db: &Database,
    kind: &RecordKind,
    owner: i64,
) -> Result<BTreeSet<LanguageId>> {
    let catalog = LanguageCatalog::new(db).all_language_ids()?;
    let realized = records::realized_language_ids(db, kind, owner)?;
    Ok(catalog.difference(&realized).copied().collect())
}

/// Whether two kinds of one owner realize the same language set.
pub fn languages_match(
    db: &Database,
    a: &RecordKind,
    b: &RecordKind,
    owner: i64,
) -> Result<bool> {
    let realized_a = records::realized_language_ids(db, a, owner)?;
    let realized_b = records::realized_language_ids(db, b, owner)?;
    Ok(realized_a == realized_b)
}

fn owner_ids(db: &Database, kind: &RecordKind) -> Result<Vec<i64>> {
    let conn = db.lock();
    let mut stmt = conn.prepare(&format!("SELECT id FROM {} ORDER BY id", kind.owner_table))?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(ids)
}

/// Ids of every owner whose coverage of `kind` matches `filter`.
///
/// Always recomputed from current data; classification results are never
/// stored.
pub fn classify_by_coverage(
    db: &Database,
    kind: &RecordKind,
    filter: CoverageFilter,
) -> Result<Vec<i64>> {
    let catalog = LanguageCatalog::new(db).all_language_ids()?;
    let mut matching = Vec::new();
    for owner in owner_ids(db, kind)? {
        let realized = records::realized_language_ids(db, kind, owner)?;
        let unrealized: BTreeSet<LanguageId> =
            catalog.difference(&realized).copied().collect();
        let matches = match filter {
            CoverageFilter::FullyRealized => unrealized.is_empty(),
            CoverageFilter::HasUnrealized => !unrealized.is_empty(),
            CoverageFilter::MissingLanguage(language) => unrealized.contains(&language),
        };
        if matches {
            matching.push(owner);
        }
    }
    Ok(matching)
}

/// Partition one family's owners by whether two kinds' language sets
/// agree. Returns (matching, mismatching).
pub fn partition_by_coverage_match(
    db: &Database,
    a: &RecordKind,
    b: &RecordKind,
) -> Result<(Vec<i64>, Vec<i64>)> {
    let mut matching = Vec::new();
    let mut mismatching = Vec::new();
    for owner in owner_ids(db, a)? {
        if languages_match(db, a, b, owner)? {
            matching.push(owner);
        } else {
            mismatching.push(owner);
        }
    }
    Ok((matching, mismatching))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ValueData;
    use crate::i18n::PendingRecord;
    use crate::localization::create_language;
    use crate::storage;
    use crate::store::records::STORAGE_VALUES;

    fn val(value: &str) -> ValueData {
        ValueData {
            value: value.to_string(),
        }
    }

    fn test_db() -> (Database, LanguageId, LanguageId) {
        let db = Database::open_in_memory().unwrap();
        let en = create_language(&db, "English", "en").unwrap();
        let ru = create_language(&db, "Russian", "ru").unwrap();
        (db, en, ru)
    }

    // ==================== Audit Label Tests ====================

    #[test]
    fn test_creation_then_edit() {
        let (db, _, _) = test_db();
        record_creation(&db, EntityKind::Banner, 1, "alice").unwrap();

        let label = audit_label(&db, EntityKind::Banner, 1).unwrap().unwrap();
        assert_eq!(label.author, "alice");
        assert!(label.last_editor.is_none());
        assert!(label.modified_at.is_none());

        record_edit(&db, EntityKind::Banner, 1, "bob").unwrap();
        let label = audit_label(&db, EntityKind::Banner, 1).unwrap().unwrap();
        assert_eq!(label.author, "alice");
        assert_eq!(label.last_editor.as_deref(), Some("bob"));
        assert!(label.modified_at.is_some());
    }

    #[test]
    fn test_edit_without_label_creates_one() {
        let (db, _, _) = test_db();
        record_edit(&db, EntityKind::Item, 7, "carol").unwrap();
        let label = audit_label(&db, EntityKind::Item, 7).unwrap().unwrap();
        assert_eq!(label.author, "carol");
    }

    #[test]
    fn test_labels_are_scoped_by_entity_kind() {
        let (db, _, _) = test_db();
        record_creation(&db, EntityKind::Banner, 1, "alice").unwrap();
        assert!(audit_label(&db, EntityKind::Item, 1).unwrap().is_none());
    }

    #[test]
    fn test_authors_and_entities_by_author() {
        let (db, _, _) = test_db();
        record_creation(&db, EntityKind::Page, 1, "alice").unwrap();
        record_creation(&db, EntityKind::Page, 2, "bob").unwrap();
        record_creation(&db, EntityKind::Page, 3, "alice").unwrap();

        assert_eq!(authors(&db, EntityKind::Page).unwrap(), vec!["alice", "bob"]);
        assert_eq!(
            entities_by_author(&db, EntityKind::Page, "alice").unwrap(),
            vec![1, 3]
        );
    }

    // ==================== Classification Tests ====================

    fn seed_storage(db: &Database, en: LanguageId, ru: LanguageId) -> (i64, i64) {
        let full = storage::create_key(db, "full").unwrap();
        storage::save_values(
            db,
            full,
            &[
                PendingRecord::new(en, true, val("a")),
                PendingRecord::new(ru, false, val("b")),
            ],
        )
        .unwrap();

        let partial = storage::create_key(db, "partial").unwrap();
        storage::save_values(db, partial, &[PendingRecord::new(en, true, val("a"))]).unwrap();

        (full, partial)
    }

    #[test]
    fn test_classify_fully_realized() {
        let (db, en, ru) = test_db();
        let (full, partial) = seed_storage(&db, en, ru);

        assert_eq!(
            classify_by_coverage(&db, &STORAGE_VALUES, CoverageFilter::FullyRealized).unwrap(),
            vec![full]
        );
        assert_eq!(
            classify_by_coverage(&db, &STORAGE_VALUES, CoverageFilter::HasUnrealized).unwrap(),
            vec![partial]
        );
    }

    #[test]
    fn test_classify_missing_specific_language() {
        let (db, en, ru) = test_db();
        let (_, partial) = seed_storage(&db, en, ru);

        assert_eq!(
            classify_by_coverage(&db, &STORAGE_VALUES, CoverageFilter::MissingLanguage(ru))
                .unwrap(),
            vec![partial]
        );
        assert!(
            classify_by_coverage(&db, &STORAGE_VALUES, CoverageFilter::MissingLanguage(en))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_classification_reflects_catalog_growth() {
        let (db, en, ru) = test_db();
        let (full, _) = seed_storage(&db, en, ru);

        // A new catalog language instantly unrealizes everything.
        create_language(&db, "Ukrainian", "uk").unwrap();
        assert!(
            !classify_by_coverage(&db, &STORAGE_VALUES, CoverageFilter::FullyRealized)
                .unwrap()
                .contains(&full)
        );
    }
}
