//! Image galleries with localized names and per-image captions.

use crate::admin::EntityKind;
use crate::content::CaptionData;
use crate::error::{Error, Result};
use crate::i18n::{LanguageCatalog, LanguageId, Localizable, PendingRecord};
use crate::media::{self, ImageRef};
use crate::ordering::OrderedSiblingSet;
use crate::store::records::{self, GALLERY_IMAGE_CAPTIONS, GALLERY_TEXTS};
use crate::store::Database;
use rusqlite::{params, OptionalExtension, Row};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct Gallery {
    pub id: i64,
    /// Stable handle used by templates and the media layout.
    pub marker: String,
    pub first_image: Option<String>,
    pub second_image: Option<String>,
    pub revision: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GalleryImagePosition {
    pub id: i64,
    pub gallery_id: i64,
    pub image: ImageRef,
    pub weight: i64,
    pub active: bool,
}

const POSITIONS: OrderedSiblingSet = OrderedSiblingSet {
    table: "gallery_image_positions",
    scope_col: "gallery_id",
};

fn gallery_from_row(row: &Row) -> rusqlite::Result<Gallery> {
    Ok(Gallery {
        id: row.get(0)?,
        marker: row.get(1)?,
        first_image: row.get(2)?,
        second_image: row.get(3)?,
        revision: row.get(4)?,
    })
}

fn position_from_row(row: &Row) -> rusqlite::Result<GalleryImagePosition> {
    Ok(GalleryImagePosition {
        id: row.get(0)?,
        gallery_id: row.get(1)?,
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

// ==================== Galleries ====================

pub fn create_gallery(db: &Database, marker: &str) -> Result<i64> {
    let conn = db.lock();
    conn.execute("INSERT INTO galleries (marker) VALUES (?1)", [marker])?;
    let id = conn.last_insert_rowid();
    info!(marker, id, "created gallery");
    Ok(id)
}

pub fn gallery_by_id(db: &Database, id: i64) -> Result<Option<Gallery>> {
    let gallery = db
        .lock()
        .query_row(
            "SELECT id, marker, first_image, second_image, revision FROM galleries WHERE id = ?1",
            [id],
            gallery_from_row,
        )
        .optional()?;
    Ok(gallery)
}

pub fn gallery_by_marker(db: &Database, marker: &str) -> Result<Option<Gallery>> {
    let gallery = db
        .lock()
        .query_row(
            "SELECT id, marker, first_image, second_image, revision FROM galleries WHERE marker = ?1",
            [marker],
            gallery_from_row,
        )
        .optional()?;
    Ok(gallery)
}

pub fn all_galleries(db: &Database) -> Result<Vec<Gallery>> {
    let conn = db.lock();
    let mut stmt = conn
        .prepare("SELECT id, marker, first_image, second_image, revision FROM galleries ORDER BY id")?;
    let galleries = stmt
        .query_map([], gallery_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(galleries)
}

/// Delete a gallery, its text data, its image positions and their
/// captions, and drop it from any category/page gallery lists. Media
/// removal is best-effort.
pub fn delete_gallery(db: &Database, id: i64, media_root: Option<&Path>) -> Result<()> {
    let marker = gallery_by_id(db, id)?.map(|gallery| gallery.marker);

    db.with_tx(|tx| {
        tx.execute(
            "DELETE FROM gallery_image_captions WHERE position_id IN
             (SELECT id FROM gallery_image_positions WHERE gallery_id = ?1)",
            [id],
        )?;
        tx.execute(
            "DELETE FROM gallery_image_positions WHERE gallery_id = ?1",
            [id],
        )?;
        records::delete_all_in_tx(tx, &GALLERY_TEXTS, id)?;
        tx.execute("DELETE FROM category_galleries WHERE gallery_id = ?1", [id])?;
        tx.execute("DELETE FROM page_galleries WHERE gallery_id = ?1", [id])?;
        tx.execute(
            "DELETE FROM audit_labels WHERE entity_kind = ?1 AND entity_id = ?2",
            params![EntityKind::Gallery.as_str(), id],
        )?;
        tx.execute("DELETE FROM galleries WHERE id = ?1", [id])?;
        Ok(())
    })?;

    if let (Some(root), Some(marker)) = (media_root, marker) {
        media::remove_media_tree(root, &media::gallery_media_dir(&marker));
    }
    info!(id, "deleted gallery");
    Ok(())
}

// ==================== Text data ====================

pub fn texts(db: &Database, gallery_id: i64) -> Result<Localizable<CaptionData>> {
    records::load(db, &GALLERY_TEXTS, gallery_id)
}

pub fn save_texts(
    db: &Database,
    gallery_id: i64,
    pending: &[PendingRecord<CaptionData>],
) -> Result<()> {
    records::save_set(db, &GALLERY_TEXTS, gallery_id, pending)
}

pub fn display_name(db: &Database, gallery_id: i64, language: LanguageId) -> Result<String> {
    let texts = texts(db, gallery_id)?;
    let record = texts.resolve(language).map_err(Error::from)?;
    Ok(record.value.name.clone())
}

pub fn description(db: &Database, gallery_id: i64, language: LanguageId) -> Result<String> {
    let texts = texts(db, gallery_id)?;
    let record = texts.resolve(language).map_err(Error::from)?;
    Ok(record.value.description.clone())
}

pub fn unrealized_text_languages(db: &Database, gallery_id: i64) -> Result<BTreeSet<LanguageId>> {
    let catalog = LanguageCatalog::new(db).all_language_ids()?;
    let realized = records::realized_language_ids(db, &GALLERY_TEXTS, gallery_id)?;
    Ok(catalog.difference(&realized).copied().collect())
}

// ==================== Image positions ====================

pub fn add_image_position(
    db: &Database,
    gallery_id: i64,
    image: &ImageRef,
    weight: Option<i64>,
    active: bool,
) -> Result<i64> {
    db.with_tx(|tx| {
        let weight = match weight {
            Some(weight) => weight,
            None => POSITIONS.next_weight(tx, gallery_id)?,
        };
        tx.execute(
            "INSERT INTO gallery_image_positions
             (gallery_id, image_original, image_large, image_medium, image_small, weight, active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                gallery_id,
                image.original,
                image.large,
                image.medium,
                image.small,
                weight,
                active
            ],
        )?;
        tx.execute(
            "UPDATE galleries SET revision = revision + 1 WHERE id = ?1",
            [gallery_id],
        )?;
        Ok(tx.last_insert_rowid())
    })
}

pub fn image_positions(
    db: &Database,
    gallery_id: i64,
    active_only: bool,
) -> Result<Vec<GalleryImagePosition>> {
    let conn = db.lock();
    let sql = if active_only {
        "SELECT id, gallery_id, image_original, image_large, image_medium, image_small, weight, active
         FROM gallery_image_positions WHERE gallery_id = ?1 AND active = 1 ORDER BY weight, id"
    } else {
        "SELECT id, gallery_id, image_original, image_large, image_medium, image_small, weight, active
         FROM gallery_image_positions WHERE gallery_id = ?1 ORDER BY weight, id"
    };
    let mut stmt = conn.prepare(sql)?;
    let positions = stmt
        .query_map([gallery_id], position_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(positions)
}

pub fn remove_image_position(db: &Database, position_id: i64) -> Result<()> {
    db.with_tx(|tx| {
        records::delete_all_in_tx(tx, &GALLERY_IMAGE_CAPTIONS, position_id)?;
        tx.execute(
            "UPDATE galleries SET revision = revision + 1 WHERE id IN
             (SELECT gallery_id FROM gallery_image_positions WHERE id = ?1)",
            [position_id],
        )?;
        tx.execute(
            "DELETE FROM gallery_image_positions WHERE id = ?1",
            [position_id],
        )?;
        Ok(())
    })
}

pub fn image_captions(db: &Database, position_id: i64) -> Result<Localizable<CaptionData>> {
    records::load(db, &GALLERY_IMAGE_CAPTIONS, position_id)
}

pub fn save_image_captions(
    db: &Database,
    position_id: i64,
    pending: &[PendingRecord<CaptionData>],
) -> Result<()> {
    records::save_set(db, &GALLERY_IMAGE_CAPTIONS, position_id, pending)
}

/// Caption of one image, `None` when the position has no captions
/// (a valid empty state for this kind).
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::localization::create_language;

    fn caption(name: &str) -> CaptionData {
        CaptionData {
            name: name.to_string(),
            description: format!("{} description", name),
        }
    }

    fn test_db() -> (Database, LanguageId, LanguageId) {
        let db = Database::open_in_memory().unwrap();
        let en = create_language(&db, "English", "en").unwrap();
        let ru = create_language(&db, "Russian", "ru").unwrap();
        (db, en, ru)
    }

    #[test]
    fn test_display_name_and_description_resolve() {
        let (db, en, ru) = test_db();
        let gallery = create_gallery(&db, "front").unwrap();
        save_texts(
            &db,
            gallery,
            &[
                PendingRecord::new(en, true, caption("Front page")),
                PendingRecord::new(ru, false, caption("Главная")),
            ],
        )
        .unwrap();

        assert_eq!(display_name(&db, gallery, ru).unwrap(), "Главная");
        assert_eq!(
            description(&db, gallery, 99).unwrap(),
            "Front page description"
        );
    }

    #[test]
    fn test_gallery_by_marker() {
        let (db, _, _) = test_db();
        let id = create_gallery(&db, "front").unwrap();
        assert_eq!(gallery_by_marker(&db, "front").unwrap().unwrap().id, id);
        assert!(gallery_by_marker(&db, "missing").unwrap().is_none());
    }

    #[test]
    fn test_image_positions_are_ordered_and_filtered() {
        let (db, _, _) = test_db();
        let gallery = create_gallery(&db, "front").unwrap();
        add_image_position(&db, gallery, &ImageRef::new("a.jpg"), Some(5), true).unwrap();
        add_image_position(&db, gallery, &ImageRef::new("b.jpg"), None, true).unwrap();
        add_image_position(&db, gallery, &ImageRef::new("c.jpg"), None, false).unwrap();

        let all = image_positions(&db, gallery, false).unwrap();
        // Explicit weight 5, then appended 6 and 7.
        assert_eq!(
            all.iter().map(|p| p.weight).collect::<Vec<_>>(),
            vec![5, 6, 7]
        );
        assert_eq!(image_positions(&db, gallery, true).unwrap().len(), 2);
    }

    #[test]
    fn test_delete_gallery_cascades_and_unlinks() {
        let (db, en, _) = test_db();
        let gallery = create_gallery(&db, "front").unwrap();
        save_texts(&db, gallery, &[PendingRecord::new(en, true, caption("G"))]).unwrap();
        let position =
            add_image_position(&db, gallery, &ImageRef::new("a.jpg"), None, true).unwrap();
        save_image_captions(
            &db,
            position,
            &[PendingRecord::new(en, true, caption("Img"))],
        )
        .unwrap();

        delete_gallery(&db, gallery, None).unwrap();
        assert!(gallery_by_id(&db, gallery).unwrap().is_none());
        assert!(texts(&db, gallery).unwrap().is_empty());
        assert!(image_positions(&db, gallery, false).unwrap().is_empty());
    }
}
