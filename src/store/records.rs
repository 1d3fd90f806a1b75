//! Generic store for localized record sets.
//!
//! Every kind of localized content (names, texts, SEO data, captions,
//! storage values) shares one table layout and one implementation of
//! load/save/coverage queries, driven by a [`RecordKind`] descriptor, so
//! the validation and coverage policy cannot drift between families.

use crate::error::Result;
use crate::i18n::{
    validate_default_uniqueness, validate_language_uniqueness, LanguageId, Localizable,
    LocalizedRecord, PendingRecord,
};
use crate::ordering::OrderedSiblingSet;
use crate::store::Database;
use rusqlite::{params, Connection, Transaction};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// Descriptor of one (owning entity, kind) record table.
#[derive(Debug, Clone, Copy)]
pub struct RecordKind {
    /// Record table name.
    pub table: &'static str,
    /// Table holding the owning entities (carries the revision counter).
    pub owner_table: &'static str,
    /// Column of `table` referencing the owner row.
    pub owner_col: &'static str,
    /// Whether records of this kind are ordered siblings with weights.
    pub weighted: bool,
}

impl RecordKind {
    const fn new(
        table: &'static str,
        owner_table: &'static str,
        owner_col: &'static str,
        weighted: bool,
    ) -> Self {
        Self {
            table,
            owner_table,
            owner_col,
            weighted,
        }
    }

    fn siblings(&self) -> OrderedSiblingSet {
        OrderedSiblingSet {
            table: self.table,
            scope_col: self.owner_col,
        }
    }
}

// ==================== Kind registry ====================

pub const BANNER_TEXTS: RecordKind = RecordKind::new("banner_texts", "banners", "banner_id", false);
pub const BANNER_IMAGE_CAPTIONS: RecordKind = RecordKind::new(
    "banner_image_captions",
    "banner_image_positions",
    "position_id",
    false,
);

pub const CATEGORY_NAMES: RecordKind =
    RecordKind::new("category_names", "categories", "category_id", false);
pub const CATEGORY_TEXTS: RecordKind =
    RecordKind::new("category_texts", "categories", "category_id", true);
pub const CATEGORY_SEO: RecordKind =
    RecordKind::new("category_seo_information", "categories", "category_id", false);

pub const ITEM_NAMES: RecordKind = RecordKind::new("item_names", "items", "item_id", false);
pub const ITEM_TEXTS: RecordKind = RecordKind::new("item_texts", "items", "item_id", true);
pub const ITEM_SHORT_TEXTS: RecordKind =
    RecordKind::new("item_short_texts", "items", "item_id", false);
pub const ITEM_SEO: RecordKind = RecordKind::new("item_seo_information", "items", "item_id", false);
pub const ITEM_PARAMETER_NAMES: RecordKind = RecordKind::new(
    "item_parameter_names",
    "item_parameters",
    "parameter_id",
    false,
);

pub const GALLERY_TEXTS: RecordKind =
    RecordKind::new("gallery_texts", "galleries", "gallery_id", false);
pub const GALLERY_IMAGE_CAPTIONS: RecordKind = RecordKind::new(
    "gallery_image_captions",
    "gallery_image_positions",
    "position_id",
    false,
);

pub const MENU_NODE_NAMES: RecordKind =
    RecordKind::new("menu_node_names", "menu_nodes", "node_id", false);

pub const STORAGE_VALUES: RecordKind =
    RecordKind::new("storage_values", "storage_keys", "storage_id", false);

pub const PAGE_TEXTS: RecordKind = RecordKind::new("page_texts", "pages", "page_id", true);
pub const PAGE_SEO: RecordKind = RecordKind::new("page_seo_information", "pages", "page_id", false);

/// Every kind, used for schema creation.
pub const ALL_RECORD_KINDS: &[RecordKind] = &[
    BANNER_TEXTS,
    BANNER_IMAGE_CAPTIONS,
    CATEGORY_NAMES,
    CATEGORY_TEXTS,
    CATEGORY_SEO,
    ITEM_NAMES,
    ITEM_TEXTS,
    ITEM_SHORT_TEXTS,
    ITEM_SEO,
    ITEM_PARAMETER_NAMES,
    GALLERY_TEXTS,
    GALLERY_IMAGE_CAPTIONS,
    MENU_NODE_NAMES,
    STORAGE_VALUES,
    PAGE_TEXTS,
    PAGE_SEO,
];

// ==================== Reads ====================

/// Load the full record set of `kind` for one owner.
pub fn load<T: DeserializeOwned>(
    db: &Database,
    kind: &RecordKind,
    owner: i64,
) -> Result<Localizable<T>> {
    load_with(&db.lock(), kind, owner)
}

/// Same as [`load`], on an already-held connection or transaction.
pub fn load_with<T: DeserializeOwned>(
    conn: &Connection,
    kind: &RecordKind,
    owner: i64,
) -> Result<Localizable<T>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT language_id, is_default, payload FROM {table}
         WHERE {owner} = ?1 ORDER BY weight, id",
        table = kind.table,
        owner = kind.owner_col,
    ))?;
    let rows = stmt
        .query_map([owner], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)? != 0,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut records = Vec::with_capacity(rows.len());
    for (language, default, payload) in rows {
        records.push(LocalizedRecord {
            language,
            default,
            value: serde_json::from_str(&payload)?,
        });
    }
    Ok(Localizable::new(records))
}

/// Load the record set in editable form, with row ids, for the editing
/// surface to modify and hand back to [`save_set`].
pub fn load_pending<T: DeserializeOwned>(
    db: &Database,
    kind: &RecordKind,
    owner: i64,
) -> Result<Vec<PendingRecord<T>>> {
    let conn = db.lock();
    let mut stmt = conn.prepare(&format!(
        "SELECT id, language_id, is_default, weight, payload FROM {table}
         WHERE {owner} = ?1 ORDER BY weight, id",
        table = kind.table,
        owner = kind.owner_col,
    ))?;
    let rows = stmt
        .query_map([owner], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)? != 0,
                row.get::<_, Option<i64>>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut pending = Vec::with_capacity(rows.len());
    for (id, language, default, weight, payload) in rows {
        pending.push(PendingRecord {
            id: Some(id),
            language,
            default,
            deleted: false,
            weight,
            value: serde_json::from_str(&payload)?,
        });
    }
    Ok(pending)
}

/// Languages actually present for one owner's kind, straight from the
/// store. Always recomputed; coverage is never cached.
pub fn realized_language_ids(
    db: &Database,
    kind: &RecordKind,
    owner: i64,
) -> Result<BTreeSet<LanguageId>> {
    realized_language_ids_with(&db.lock(), kind, owner)
}

pub fn realized_language_ids_with(
    conn: &Connection,
    kind: &RecordKind,
    owner: i64,
) -> Result<BTreeSet<LanguageId>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT language_id FROM {table} WHERE {owner} = ?1",
        table = kind.table,
        owner = kind.owner_col,
    ))?;
    let ids = stmt
        .query_map([owner], |row| row.get::<_, i64>(0))?
        .collect::<rusqlite::Result<BTreeSet<_>>>()?;
    Ok(ids)
}

// ==================== Writes ====================

/// Persist a proposed record set for one owner, all-or-nothing.
///
/// Validation runs first, inside the same transaction as the write it
/// guards; a rejected set leaves the store untouched. On success the
/// owner's revision is bumped so cached render output keyed on it falls
/// out of date.
pub fn save_set<T: Serialize>(
    db: &Database,
    kind: &RecordKind,
    owner: i64,
    pending: &[PendingRecord<T>],
) -> Result<()> {
    db.with_tx(|tx| save_set_in_tx(tx, kind, owner, pending))
}

/// Transaction-scoped body of [`save_set`], composable with other writes
/// (entity row updates, audit labels) in one commit.
pub fn save_set_in_tx<T: Serialize>(
    tx: &Transaction,
    kind: &RecordKind,
    owner: i64,
    pending: &[PendingRecord<T>],
) -> Result<()> {
    validate_default_uniqueness(pending.iter().map(|r| r.flag()))?;
    validate_language_uniqueness(pending)?;
    write_set_in_tx(tx, kind, owner, pending)
}

/// Write a record set without the default-uniqueness check.
///
/// Only for kinds whose fallback lives outside the record set (item
/// parameter names fall back to the parameter's untranslated default
/// name). Language uniqueness still holds.
pub(crate) fn write_set_in_tx<T: Serialize>(
    tx: &Transaction,
    kind: &RecordKind,
    owner: i64,
    pending: &[PendingRecord<T>],
) -> Result<()> {
    for record in pending {
        if record.deleted {
            if let Some(id) = record.id {
                tx.execute(&format!("DELETE FROM {} WHERE id = ?1", kind.table), [id])?;
            }
            continue;
        }

        let payload = serde_json::to_string(&record.value)?;
        match record.id {
            Some(id) => match record.weight {
                Some(weight) => {
                    tx.execute(
                        &format!(
                            "UPDATE {} SET language_id = ?1, is_default = ?2, weight = ?3,
                             payload = ?4 WHERE id = ?5",
                            kind.table
                        ),
                        params![record.language, record.default, weight, payload, id],
                    )?;
                }
                None => {
                    tx.execute(
                        &format!(
                            "UPDATE {} SET language_id = ?1, is_default = ?2, payload = ?3
                             WHERE id = ?4",
                            kind.table
                        ),
                        params![record.language, record.default, payload, id],
                    )?;
                }
            },
            None => {
                // New siblings are appended, never inserted mid-sequence,
                // unless the caller supplied an explicit weight.
                let weight = match (kind.weighted, record.weight) {
                    (_, Some(weight)) => Some(weight),
                    (true, None) => Some(kind.siblings().next_weight(tx, owner)?),
                    (false, None) => None,
                };
                tx.execute(
                    &format!(
                        "INSERT INTO {table} ({owner}, language_id, is_default, weight, payload)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        table = kind.table,
                        owner = kind.owner_col,
                    ),
                    params![owner, record.language, record.default, weight, payload],
                )?;
            }
        }
    }

    bump_revision(tx, kind.owner_table, owner)?;
    debug!(table = kind.table, owner, "saved record set");
    Ok(())
}

/// Delete every record of `kind` for one owner (entity-deletion cascade).
pub fn delete_all_in_tx(tx: &Transaction, kind: &RecordKind, owner: i64) -> Result<()> {
    tx.execute(
        &format!(
            "DELETE FROM {table} WHERE {owner} = ?1",
            table = kind.table,
            owner = kind.owner_col,
        ),
        [owner],
    )?;
    Ok(())
}

fn bump_revision(tx: &Transaction, owner_table: &str, owner: i64) -> Result<()> {
    tx.execute(
        &format!(
            "UPDATE {} SET revision = revision + 1 WHERE id = ?1",
            owner_table
        ),
        [owner],
    )?;
    Ok(())
}

/// Current revision counter of an owning entity row.
pub fn entity_revision(conn: &Connection, owner_table: &str, id: i64) -> Result<i64> {
    let revision = conn.query_row(
        &format!("SELECT revision FROM {} WHERE id = ?1", owner_table),
        [id],
        |row| row.get(0),
    )?;
    Ok(revision)
}
