//! Banners: rotating image sets with localized captions.
//!
//! A banner is a marker-addressed collection of ordered image positions.
//! The banner itself carries one caption kind; each image position
//! carries its own optional caption kind.

use crate::admin::EntityKind;
use crate::content::CaptionData;
use crate::error::{Error, Result};
use crate::i18n::{LanguageCatalog, LanguageId, Localizable, PendingRecord};
use crate::media::{self, ImageRef};
use crate::ordering::OrderedSiblingSet;
use crate::store::records::{self, BANNER_IMAGE_CAPTIONS, BANNER_TEXTS};
use crate::store::Database;
use rusqlite::{params, OptionalExtension, Row};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub id: i64,
    pub marker: String,
    pub revision: i64,
}

/// One ordered image slot of a banner.
#[derive(Debug, Clone, PartialEq)]
pub struct BannerImagePosition {
    pub id: i64,
    pub banner_id: i64,
    pub image: ImageRef,
    pub weight: i64,
    pub active: bool,
}

const POSITIONS: OrderedSiblingSet = OrderedSiblingSet {
    table: "banner_image_positions",
    scope_col: "banner_id",
};

fn banner_from_row(row: &Row) -> rusqlite::Result<Banner> {
    Ok(Banner {
        id: row.get(0)?,
        marker: row.get(1)?,
        revision: row.get(2)?,
    })
}

fn position_from_row(row: &Row) -> rusqlite::Result<BannerImagePosition> {
    Ok(BannerImagePosition {
        id: row.get(0)?,
        banner_id: row.get(1)?,
        image: ImageRef {
            original: row.get(2)?,
            large: row.get(3)?,
            medium: row.get(4)?,
            small: row.get(5)?,
        },
        weight: row.get(6)?,
        active: row.get::<_, i64>(7)? != 0,
    })
}

// ==================== Banners ====================

pub fn create_banner(db: &Database, marker: &str) -> Result<i64> {
    let conn = db.lock();
    conn.execute("INSERT INTO banners (marker) VALUES (?1)", [marker])?;
    let id = conn.last_insert_rowid();
    info!(marker, id, "created banner");
    Ok(id)
}

pub fn banner_by_id(db: &Database, id: i64) -> Result<Option<Banner>> {
    let banner = db
        .lock()
        .query_row(
            "SELECT id, marker, revision FROM banners WHERE id = ?1",
            [id],
            banner_from_row,
        )
        .optional()?;
    Ok(banner)
}

pub fn banner_by_marker(db: &Database, marker: &str) -> Result<Option<Banner>> {
    let banner = db
        .lock()
        .query_row(
            "SELECT id, marker, revision FROM banners WHERE marker = ?1",
            [marker],
            banner_from_row,
        )
        .optional()?;
    Ok(banner)
}

pub fn all_banners(db: &Database) -> Result<Vec<Banner>> {
    let conn = db.lock();
    let mut stmt = conn.prepare("SELECT id, marker, revision FROM banners ORDER BY id")?;
    let banners = stmt
        .query_map([], banner_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(banners)
}

/// Delete a banner, its captions, its image positions and their captions,
/// then try to remove its media tree. Media failures never block the
/// deletion.
pub fn delete_banner(db: &Database, id: i64, media_root: Option<&Path>) -> Result<()> {
    db.with_tx(|tx| {
        tx.execute(
            "DELETE FROM banner_image_captions WHERE position_id IN
             (SELECT id FROM banner_image_positions WHERE banner_id = ?1)",
            [id],
        )?;
        tx.execute(
            "DELETE FROM banner_image_positions WHERE banner_id = ?1",
            [id],
        )?;
        records::delete_all_in_tx(tx, &BANNER_TEXTS, id)?;
        tx.execute(
            "DELETE FROM audit_labels WHERE entity_kind = ?1 AND entity_id = ?2",
            params![EntityKind::Banner.as_str(), id],
        )?;
        tx.execute("DELETE FROM banners WHERE id = ?1", [id])?;
        Ok(())
    })?;

    if let Some(root) = media_root {
        media::remove_media_tree(root, &media::banner_media_dir(id));
    }
    info!(id, "deleted banner");
    Ok(())
}

// ==================== Captions ====================

pub fn texts(db: &Database, banner_id: i64) -> Result<Localizable<CaptionData>> {
    records::load(db, &BANNER_TEXTS, banner_id)
}

pub fn save_texts(
    db: &Database,
    banner_id: i64,
    pending: &[PendingRecord<CaptionData>],
) -> Result<()> {
    records::save_set(db, &BANNER_TEXTS, banner_id, pending)
}

/// Resolved display name of the banner for a request language.
pub fn display_name(db: &Database, banner_id: i64, language: LanguageId) -> Result<String> {
    let texts = texts(db, banner_id)?;
    let record = texts.resolve(language).map_err(Error::from)?;
    Ok(record.value.name.clone())
}

/// Catalog languages the banner's captions do not yet cover.
pub fn unrealized_text_languages(db: &Database, banner_id: i64) -> Result<BTreeSet<LanguageId>> {
    let catalog = LanguageCatalog::new(db).all_language_ids()?;
    let realized = records::realized_language_ids(db, &BANNER_TEXTS, banner_id)?;
    Ok(catalog.difference(&realized).copied().collect())
}

// ==================== Image positions ====================

/// Append an image position; without an explicit weight it lands after
/// the banner's current last position.
pub fn add_image_position(
    db: &Database,
    banner_id: i64,
    image: &ImageRef,
    weight: Option<i64>,
    active: bool,
) -> Result<i64> {
    db.with_tx(|tx| {
        let weight = match weight {
            Some(weight) => weight,
            None => POSITIONS.next_weight(tx, banner_id)?,
        };
        tx.execute(
            "INSERT INTO banner_image_positions
             (banner_id, image_original, image_large, image_medium, image_small, weight, active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                banner_id,
                image.original,
                image.large,
                image.medium,
                image.small,
                weight,
                active
            ],
        )?;
        tx.execute(
            "UPDATE banners SET revision = revision + 1 WHERE id = ?1",
            [banner_id],
        )?;
        Ok(tx.last_insert_rowid())
    })
}

/// Positions of one banner in display order (weight, then id for ties).
pub fn image_positions(
    db: &Database,
    banner_id: i64,
    active_only: bool,
) -> Result<Vec<BannerImagePosition>> {
    let conn = db.lock();
    let sql = if active_only {
        "SELECT id, banner_id, image_original, image_large, image_medium, image_small, weight, active
         FROM banner_image_positions WHERE banner_id = ?1 AND active = 1 ORDER BY weight, id"
    } else {
        "SELECT id, banner_id, image_original, image_large, image_medium, image_small, weight, active
         FROM banner_image_positions WHERE banner_id = ?1 ORDER BY weight, id"
    };
    let mut stmt = conn.prepare(sql)?;
    let positions = stmt
        .query_map([banner_id], position_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(positions)
}

pub fn remove_image_position(db: &Database, position_id: i64) -> Result<()> {
    db.with_tx(|tx| {
        records::delete_all_in_tx(tx, &BANNER_IMAGE_CAPTIONS, position_id)?;
        tx.execute(
            "UPDATE banners SET revision = revision + 1 WHERE id IN
             (SELECT banner_id FROM banner_image_positions WHERE id = ?1)",
            [position_id],
        )?;
        tx.execute(
            "DELETE FROM banner_image_positions WHERE id = ?1",
            [position_id],
        )?;
        Ok(())
    })
}

pub fn image_captions(db: &Database, position_id: i64) -> Result<Localizable<CaptionData>> {
    records::load(db, &BANNER_IMAGE_CAPTIONS, position_id)
}

pub fn save_image_captions(
    db: &Database,
    position_id: i64,
    pending: &[PendingRecord<CaptionData>],
) -> Result<()> {
    records::save_set(db, &BANNER_IMAGE_CAPTIONS, position_id, pending)
}

/// Caption for one image position, or `None` when the position has no
/// captions at all: captions are an optional kind and the rendering layer
/// picks the placeholder.
pub fn image_caption(
    db: &Database,
    position_id: i64,
    language: LanguageId,
) -> Result<Option<CaptionData>> {
    let captions = image_captions(db, position_id)?;
    match captions.resolve(language) {
        Ok(record) => Ok(Some(record.value.clone())),
        Err(_) => Ok(None),
    }
}
