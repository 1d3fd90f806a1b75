//! Info storage: localized key-value pairs.
//!
//! Small pieces of site copy (phone numbers, footer lines, labels) keyed
//! by a latin-letters-only key, each with one localized value set.

use crate::admin::EntityKind;
use crate::content::ValueData;
use crate::error::{Error, Result};
use crate::i18n::{LanguageCatalog, LanguageId, Localizable, PendingRecord};
use crate::store::records::{self, STORAGE_VALUES};
use crate::store::Database;
use regex::Regex;
use rusqlite::{params, OptionalExtension, Row};
use std::collections::BTreeSet;
use std::sync::OnceLock;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct StorageKey {
    pub id: i64,
    pub key: String,
    pub revision: i64,
}

static KEY_REGEX: OnceLock<Regex> = OnceLock::new();

/// Only latin characters are allowed in storage keys.
pub fn validate_key(key: &str) -> Result<()> {
    let regex = KEY_REGEX.get_or_init(|| Regex::new(r"^[a-zA-Z]+$").unwrap());
    if regex.is_match(key) {
        Ok(())
    } else {
        Err(Error::InvalidStorageKey(key.to_string()))
    }
}

fn key_from_row(row: &Row) -> rusqlite::Result<StorageKey> {
    Ok(StorageKey {
        id: row.get(0)?,
        key: row.get(1)?,
        revision: row.get(2)?,
    })
}

pub fn create_key(db: &Database, key: &str) -> Result<i64> {
    validate_key(key)?;
    let conn = db.lock();
    conn.execute("INSERT INTO storage_keys (key) VALUES (?1)", [key])?;
    let id = conn.last_insert_rowid();
    info!(key, id, "created storage key");
    Ok(id)
}

pub fn key_by_id(db: &Database, id: i64) -> Result<Option<StorageKey>> {
    let key = db
        .lock()
        .query_row(
            "SELECT id, key, revision FROM storage_keys WHERE id = ?1",
            [id],
            key_from_row,
        )
        .optional()?;
    Ok(key)
}

pub fn key_by_name(db: &Database, key: &str) -> Result<Option<StorageKey>> {
    let key = db
        .lock()
        .query_row(
            "SELECT id, key, revision FROM storage_keys WHERE key = ?1",
            [key],
            key_from_row,
        )
        .optional()?;
    Ok(key)
}

pub fn all_keys(db: &Database) -> Result<Vec<StorageKey>> {
    let conn = db.lock();
    let mut stmt = conn.prepare("SELECT id, key, revision FROM storage_keys ORDER BY key")?;
    let keys = stmt
        .query_map([], key_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(keys)
}

pub fn delete_key(db: &Database, id: i64) -> Result<()> {
    db.with_tx(|tx| {
        records::delete_all_in_tx(tx, &STORAGE_VALUES, id)?;
        tx.execute(
            "DELETE FROM audit_labels WHERE entity_kind = ?1 AND entity_id = ?2",
            params![EntityKind::StorageKey.as_str(), id],
        )?;
        tx.execute("DELETE FROM storage_keys WHERE id = ?1", [id])?;
        Ok(())
    })
}

// ==================== Values ====================

pub fn values(db: &Database, storage_id: i64) -> Result<Localizable<ValueData>> {
    records::load(db, &STORAGE_VALUES, storage_id)
}

pub fn save_values(
    db: &Database,
    storage_id: i64,
    pending: &[PendingRecord<ValueData>],
) -> Result<()> {
    records::save_set(db, &STORAGE_VALUES, storage_id, pending)
}

/// Resolved value for a key name, the form templates use
/// (`storage "phone"` -> localized string).
pub fn value(db: &Database, key: &str, language: LanguageId) -> Result<String> {
    let storage = key_by_name(db, key)?.ok_or(Error::NotFound("storage key", 0))?;
    let values = values(db, storage.id)?;
    let record = values.resolve(language).map_err(Error::from)?;
    Ok(record.value.value.clone())
}

pub fn unrealized_value_languages(db: &Database, storage_id: i64) -> Result<BTreeSet<LanguageId>> {
    let catalog = LanguageCatalog::new(db).all_language_ids()?;
    let realized = records::realized_language_ids(db, &STORAGE_VALUES, storage_id)?;
    Ok(catalog.difference(&realized).copied().collect())
}
