//! Static pages grouped into page categories.
//!
//! Pages carry ordered localized text blocks and SEO data; the page name
//! itself is an untranslated admin label, unique within its category.

use crate::admin::EntityKind;
use crate::content::{SeoData, TextData};
use crate::error::Result;
use crate::i18n::{
    LanguageCatalog, LanguageCoverageChecker, LanguageId, Localizable, PendingRecord,
};
use crate::render::TemplateTag;
use crate::store::records::{self, PAGE_SEO, PAGE_TEXTS};
use crate::store::Database;
use rusqlite::{params, OptionalExtension, Row};
use std::collections::BTreeSet;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct PageCategory {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub id: i64,
    /// Admin label, unique within the page category.
    pub name: String,
    pub category_id: i64,
    pub default_language: LanguageId,
    pub template: TemplateTag,
    pub revision: i64,
}

const PAGE_COLS: &str = "id, name, category_id, default_language, template, revision";

fn page_from_row(row: &Row) -> rusqlite::Result<Page> {
    Ok(Page {
        id: row.get(0)?,
        name: row.get(1)?,
        category_id: row.get(2)?,
        default_language: row.get(3)?,
        template: row.get(4)?,
        revision: row.get(5)?,
    })
}

// ==================== Page categories ====================

pub fn create_page_category(db: &Database, name: &str) -> Result<i64> {
    let conn = db.lock();
    conn.execute("INSERT INTO page_categories (name) VALUES (?1)", [name])?;
    Ok(conn.last_insert_rowid())
}

pub fn page_categories(db: &Database) -> Result<Vec<PageCategory>> {
    let conn = db.lock();
    let mut stmt = conn.prepare("SELECT id, name FROM page_categories ORDER BY name")?;
    let categories = stmt
        .query_map([], |row| {
            Ok(PageCategory {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(categories)
}

// ==================== Pages ====================

pub fn create_page(
    db: &Database,
    name: &str,
    category_id: i64,
    default_language: LanguageId,
    template: TemplateTag,
) -> Result<i64> {
    let conn = db.lock();
    conn.execute(
        "INSERT INTO pages (name, category_id, default_language, template)
         VALUES (?1, ?2, ?3, ?4)",
        params![name, category_id, default_language, template],
    )?;
    let id = conn.last_insert_rowid();
    info!(name, id, "created page");
    Ok(id)
}

pub fn page_by_id(db: &Database, id: i64) -> Result<Option<Page>> {
    let page = db
        .lock()
        .query_row(
            &format!("SELECT {PAGE_COLS} FROM pages WHERE id = ?1"),
            [id],
            page_from_row,
        )
        .optional()?;
    Ok(page)
}

pub fn pages_in_category(db: &Database, category_id: i64) -> Result<Vec<Page>> {
    let conn = db.lock();
    let mut stmt = conn.prepare(&format!(
        "SELECT {PAGE_COLS} FROM pages WHERE category_id = ?1 ORDER BY name"
    ))?;
    let pages = stmt
        .query_map([category_id], page_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(pages)
}

pub fn all_pages(db: &Database) -> Result<Vec<Page>> {
    let conn = db.lock();
    let mut stmt = conn.prepare(&format!("SELECT {PAGE_COLS} FROM pages ORDER BY id"))?;
    let pages = stmt
        .query_map([], page_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(pages)
}

/// Replace the page's ordered gallery list.
pub fn set_page_galleries(db: &Database, page_id: i64, gallery_ids: &[i64]) -> Result<()> {
    db.with_tx(|tx| {
        tx.execute("DELETE FROM page_galleries WHERE page_id = ?1", [page_id])?;
        for (weight, gallery_id) in gallery_ids.iter().enumerate() {
            tx.execute(
                "INSERT INTO page_galleries (page_id, gallery_id, weight) VALUES (?1, ?2, ?3)",
                params![page_id, gallery_id, weight as i64],
            )?;
        }
        tx.execute(
            "UPDATE pages SET revision = revision + 1 WHERE id = ?1",
            [page_id],
        )?;
        Ok(())
    })
}

pub fn page_galleries(db: &Database, page_id: i64) -> Result<Vec<i64>> {
    let conn = db.lock();
    let mut stmt = conn.prepare(
        "SELECT gallery_id FROM page_galleries WHERE page_id = ?1 ORDER BY weight, gallery_id",
    )?;
    let ids = stmt
        .query_map([page_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(ids)
}

pub fn delete_page(db: &Database, id: i64) -> Result<()> {
    db.with_tx(|tx| {
        records::delete_all_in_tx(tx, &PAGE_TEXTS, id)?;
        records::delete_all_in_tx(tx, &PAGE_SEO, id)?;
        tx.execute("DELETE FROM page_galleries WHERE page_id = ?1", [id])?;
        tx.execute(
            "DELETE FROM audit_labels WHERE entity_kind = ?1 AND entity_id = ?2",
            params![EntityKind::Page.as_str(), id],
        )?;
        tx.execute("DELETE FROM pages WHERE id = ?1", [id])?;
        Ok(())
    })?;
    info!(id, "deleted page");
    Ok(())
}

// ==================== Texts and SEO ====================

pub fn texts(db: &Database, page_id: i64) -> Result<Localizable<TextData>> {
    records::load(db, &PAGE_TEXTS, page_id)
}

pub fn save_texts(db: &Database, page_id: i64, pending: &[PendingRecord<TextData>]) -> Result<()> {
    records::save_set(db, &PAGE_TEXTS, page_id, pending)
}

pub fn seo(db: &Database, page_id: i64) -> Result<Localizable<SeoData>> {
    records::load(db, &PAGE_SEO, page_id)
}

pub fn save_seo(db: &Database, page_id: i64, pending: &[PendingRecord<SeoData>]) -> Result<()> {
    records::save_set(db, &PAGE_SEO, page_id, pending)
}

/// Whether the page's text and SEO language sets agree.
pub fn text_seo_match(db: &Database, page_id: i64) -> Result<bool> {
    let texts = texts(db, page_id)?;
    let seo = seo(db, page_id)?;
    Ok(LanguageCoverageChecker::languages_match(&texts, &seo))
}

pub fn unrealized_text_languages(db: &Database, page_id: i64) -> Result<BTreeSet<LanguageId>> {
    let catalog = LanguageCatalog::new(db).all_language_ids()?;
    let realized = records::realized_language_ids(db, &PAGE_TEXTS, page_id)?;
    Ok(catalog.difference(&realized).copied().collect())
}

pub fn unrealized_seo_languages(db: &Database, page_id: i64) -> Result<BTreeSet<LanguageId>> {
    let catalog = LanguageCatalog::new(db).all_language_ids()?;
    let realized = records::realized_language_ids(db, &PAGE_SEO, page_id)?;
    Ok(catalog.difference(&realized).copied().collect())
}
