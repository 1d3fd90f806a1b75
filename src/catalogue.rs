//! Product catalogue: categories and items.
//!
//! Categories group items and carry names, ordered text blocks and SEO
//! data. Items additionally carry short texts, a priced currency, ordered
//! image positions (one of which is the default), and ordered parameters
//! with translated name/value pairs.

use crate::admin::EntityKind;
use crate::content::{NameData, ParameterNameData, SeoData, ShortTextData, TextData};
use crate::error::{Error, Result, ValidationError};
use crate::i18n::{
    validate_default_uniqueness, validate_language_uniqueness, LanguageCatalog,
    LanguageCoverageChecker, LanguageId, Localizable, PendingRecord,
};
use crate::localization::{self, Currency};
use crate::media::{self, ImageRef};
use crate::ordering::OrderedSiblingSet;
use crate::render::TemplateTag;
use crate::store::records::{
    self, CATEGORY_NAMES, CATEGORY_SEO, CATEGORY_TEXTS, ITEM_NAMES, ITEM_PARAMETER_NAMES,
    ITEM_SEO, ITEM_SHORT_TEXTS, ITEM_TEXTS,
};
use crate::store::Database;
use rusqlite::{params, OptionalExtension, Row, Transaction};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

// ==================== Category ====================

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub default_language: LanguageId,
    pub template: TemplateTag,
    /// Site-unique URL slug.
    pub url: String,
    pub first_image: Option<String>,
    pub second_image: Option<String>,
    pub revision: i64,
}

fn category_from_row(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        default_language: row.get(1)?,
        template: row.get(2)?,
        url: row.get(3)?,
        first_image: row.get(4)?,
        second_image: row.get(5)?,
        revision: row.get(6)?,
    })
}

const CATEGORY_COLS: &str =
    "id, default_language, template, url, first_image, second_image, revision";

pub fn create_category(
    db: &Database,
    default_language: LanguageId,
    template: TemplateTag,
    url: &str,
) -> Result<i64> {
    let conn = db.lock();
    conn.execute(
        "INSERT INTO categories (default_language, template, url) VALUES (?1, ?2, ?3)",
        params![default_language, template, url],
    )?;
    let id = conn.last_insert_rowid();
    info!(url, id, "created category");
    Ok(id)
}

pub fn category_by_id(db: &Database, id: i64) -> Result<Option<Category>> {
    let category = db
        .lock()
        .query_row(
            &format!("SELECT {CATEGORY_COLS} FROM categories WHERE id = ?1"),
            [id],
            category_from_row,
        )
        .optional()?;
    Ok(category)
}

pub fn category_by_url(db: &Database, url: &str) -> Result<Option<Category>> {
    let category = db
        .lock()
        .query_row(
            &format!("SELECT {CATEGORY_COLS} FROM categories WHERE url = ?1"),
            [url],
            category_from_row,
        )
        .optional()?;
    Ok(category)
}

pub fn all_categories(db: &Database) -> Result<Vec<Category>> {
    let conn = db.lock();
    let mut stmt = conn.prepare(&format!("SELECT {CATEGORY_COLS} FROM categories ORDER BY id"))?;
    let categories = stmt
        .query_map([], category_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(categories)
}

/// Replace the category's ordered gallery list.
pub fn set_category_galleries(db: &Database, category_id: i64, gallery_ids: &[i64]) -> Result<()> {
    db.with_tx(|tx| {
        tx.execute(
            "DELETE FROM category_galleries WHERE category_id = ?1",
            [category_id],
        )?;
        for (weight, gallery_id) in gallery_ids.iter().enumerate() {
            tx.execute(
                "INSERT INTO category_galleries (category_id, gallery_id, weight) VALUES (?1, ?2, ?3)",
                params![category_id, gallery_id, weight as i64],
            )?;
        }
        tx.execute(
            "UPDATE categories SET revision = revision + 1 WHERE id = ?1",
            [category_id],
        )?;
        Ok(())
    })
}

pub fn category_galleries(db: &Database, category_id: i64) -> Result<Vec<i64>> {
    let conn = db.lock();
    let mut stmt = conn.prepare(
        "SELECT gallery_id FROM category_galleries WHERE category_id = ?1 ORDER BY weight, gallery_id",
    )?;
    let ids = stmt
        .query_map([category_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(ids)
}

pub fn category_names(db: &Database, category_id: i64) -> Result<Localizable<NameData>> {
    records::load(db, &CATEGORY_NAMES, category_id)
}

pub fn save_category_names(
    db: &Database,
    category_id: i64,
    pending: &[PendingRecord<NameData>],
) -> Result<()> {
    records::save_set(db, &CATEGORY_NAMES, category_id, pending)
}

pub fn category_display_name(
    db: &Database,
    category_id: i64,
    language: LanguageId,
) -> Result<String> {
    let names = category_names(db, category_id)?;
    let record = names.resolve(language).map_err(Error::from)?;
    Ok(record.value.name.clone())
}

pub fn category_texts(db: &Database, category_id: i64) -> Result<Localizable<TextData>> {
    records::load(db, &CATEGORY_TEXTS, category_id)
}

pub fn save_category_texts(
    db: &Database,
    category_id: i64,
    pending: &[PendingRecord<TextData>],
) -> Result<()> {
    records::save_set(db, &CATEGORY_TEXTS, category_id, pending)
}

pub fn category_seo(db: &Database, category_id: i64) -> Result<Localizable<SeoData>> {
    records::load(db, &CATEGORY_SEO, category_id)
}

pub fn save_category_seo(
    db: &Database,
    category_id: i64,
    pending: &[PendingRecord<SeoData>],
) -> Result<()> {
    records::save_set(db, &CATEGORY_SEO, category_id, pending)
}

/// Whether the category's text and SEO language sets agree.
pub fn category_text_seo_match(db: &Database, category_id: i64) -> Result<bool> {
    let texts = category_texts(db, category_id)?;
    let seo = category_seo(db, category_id)?;
    Ok(LanguageCoverageChecker::languages_match(&texts, &seo))
}

/// Delete a category, everything it owns — including its items — and try
/// to remove its media tree (which nests the item trees).
pub fn delete_category(db: &Database, id: i64, media_root: Option<&Path>) -> Result<()> {
    let item_ids: Vec<i64> = {
        let conn = db.lock();
        let mut stmt = conn.prepare("SELECT id FROM items WHERE category_id = ?1")?;
        let result = stmt
            .query_map([id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        result
    };

    db.with_tx(|tx| {
        for item_id in &item_ids {
            delete_item_in_tx(tx, *item_id)?;
        }
        records::delete_all_in_tx(tx, &CATEGORY_NAMES, id)?;
        records::delete_all_in_tx(tx, &CATEGORY_TEXTS, id)?;
        records::delete_all_in_tx(tx, &CATEGORY_SEO, id)?;
        tx.execute("DELETE FROM category_galleries WHERE category_id = ?1", [id])?;
        tx.execute(
            "DELETE FROM audit_labels WHERE entity_kind = ?1 AND entity_id = ?2",
            params![EntityKind::Category.as_str(), id],
        )?;
        tx.execute("DELETE FROM categories WHERE id = ?1", [id])?;
        Ok(())
    })?;

    if let Some(root) = media_root {
        media::remove_media_tree(root, &media::category_media_dir(id));
    }
    info!(id, "deleted category");
    Ok(())
}

// ==================== Item ====================

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: i64,
    pub default_price: Option<f64>,
    pub currency_id: Option<i64>,
    pub default_language: LanguageId,
    pub category_id: i64,
    pub template: TemplateTag,
    pub active: bool,
    pub new: bool,
    pub top: bool,
    pub stock: bool,
    pub pending: bool,
    pub code: Option<String>,
    pub url: String,
    pub revision: i64,
}

/// Fields of an item to be created.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub default_price: Option<f64>,
    pub currency_id: Option<i64>,
    pub default_language: LanguageId,
    pub category_id: i64,
    pub template: TemplateTag,
    pub active: bool,
    pub new: bool,
    pub top: bool,
    pub stock: bool,
    pub pending: bool,
    pub code: Option<String>,
    pub url: String,
}

const ITEM_COLS: &str = "id, default_price, currency_id, default_language, category_id, template,
    active, is_new, top, stock, pending, code, url, revision";

fn item_from_row(row: &Row) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        default_price: row.get(1)?,
        currency_id: row.get(2)?,
        default_language: row.get(3)?,
        category_id: row.get(4)?,
        template: row.get(5)?,
        active: row.get::<_, i64>(6)? != 0,
        new: row.get::<_, i64>(7)? != 0,
        top: row.get::<_, i64>(8)? != 0,
        stock: row.get::<_, i64>(9)? != 0,
        pending: row.get::<_, i64>(10)? != 0,
        code: row.get(11)?,
        url: row.get(12)?,
        revision: row.get(13)?,
    })
}

/// Price and currency must arrive together or not at all.
pub fn validate_item_pricing(
    default_price: Option<f64>,
    currency_id: Option<i64>,
) -> std::result::Result<(), ValidationError> {
    match (default_price, currency_id) {
        (Some(_), None) | (None, Some(_)) => Err(ValidationError::IncompletePricing),
        _ => Ok(()),
    }
}

pub fn create_item(db: &Database, item: &NewItem) -> Result<i64> {
    validate_item_pricing(item.default_price, item.currency_id)?;
    let conn = db.lock();
    conn.execute(
        "INSERT INTO items (default_price, currency_id, default_language, category_id, template,
         active, is_new, top, stock, pending, code, url)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            item.default_price,
            item.currency_id,
            item.default_language,
            item.category_id,
            item.template,
            item.active,
            item.new,
            item.top,
            item.stock,
            item.pending,
            item.code,
            item.url
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!(url = %item.url, id, "created item");
    Ok(id)
}

pub fn item_by_id(db: &Database, id: i64) -> Result<Option<Item>> {
    let item = db
        .lock()
        .query_row(
            &format!("SELECT {ITEM_COLS} FROM items WHERE id = ?1"),
            [id],
            item_from_row,
        )
        .optional()?;
    Ok(item)
}

pub fn item_by_url(db: &Database, url: &str) -> Result<Option<Item>> {
    let item = db
        .lock()
        .query_row(
            &format!("SELECT {ITEM_COLS} FROM items WHERE url = ?1"),
            [url],
            item_from_row,
        )
        .optional()?;
    Ok(item)
}

pub fn items_in_category(
    db: &Database,
    category_id: i64,
    active_only: bool,
) -> Result<Vec<Item>> {
    let conn = db.lock();
    let sql = if active_only {
        format!("SELECT {ITEM_COLS} FROM items WHERE category_id = ?1 AND active = 1 ORDER BY id")
    } else {
        format!("SELECT {ITEM_COLS} FROM items WHERE category_id = ?1 ORDER BY id")
    };
    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map([category_id], item_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(items)
}

pub fn item_names(db: &Database, item_id: i64) -> Result<Localizable<NameData>> {
    records::load(db, &ITEM_NAMES, item_id)
}

pub fn save_item_names(
    db: &Database,
    item_id: i64,
    pending: &[PendingRecord<NameData>],
) -> Result<()> {
    records::save_set(db, &ITEM_NAMES, item_id, pending)
}

pub fn item_display_name(db: &Database, item_id: i64, language: LanguageId) -> Result<String> {
    let names = item_names(db, item_id)?;
    let record = names.resolve(language).map_err(Error::from)?;
    Ok(record.value.name.clone())
}

pub fn item_texts(db: &Database, item_id: i64) -> Result<Localizable<TextData>> {
    records::load(db, &ITEM_TEXTS, item_id)
}

pub fn save_item_texts(
    db: &Database,
    item_id: i64,
    pending: &[PendingRecord<TextData>],
) -> Result<()> {
    records::save_set(db, &ITEM_TEXTS, item_id, pending)
}

pub fn item_short_texts(db: &Database, item_id: i64) -> Result<Localizable<ShortTextData>> {
    records::load(db, &ITEM_SHORT_TEXTS, item_id)
}

pub fn save_item_short_texts(
    db: &Database,
    item_id: i64,
    pending: &[PendingRecord<ShortTextData>],
) -> Result<()> {
    records::save_set(db, &ITEM_SHORT_TEXTS, item_id, pending)
}

pub fn item_seo(db: &Database, item_id: i64) -> Result<Localizable<SeoData>> {
    records::load(db, &ITEM_SEO, item_id)
}

pub fn save_item_seo(
    db: &Database,
    item_id: i64,
    pending: &[PendingRecord<SeoData>],
) -> Result<()> {
    records::save_set(db, &ITEM_SEO, item_id, pending)
}

pub fn item_text_seo_match(db: &Database, item_id: i64) -> Result<bool> {
    let texts = item_texts(db, item_id)?;
    let seo = item_seo(db, item_id)?;
    Ok(LanguageCoverageChecker::languages_match(&texts, &seo))
}

/// Catalog languages missing from one of the item's kinds.
pub fn item_unrealized_text_languages(db: &Database, item_id: i64) -> Result<BTreeSet<LanguageId>> {
    let catalog = LanguageCatalog::new(db).all_language_ids()?;
    let realized = records::realized_language_ids(db, &ITEM_TEXTS, item_id)?;
    Ok(catalog.difference(&realized).copied().collect())
}

/// The item's price in `target` currency; `None` when the item has no
/// price, no base currency, or no target was given.
pub fn item_price(db: &Database, item: &Item, target: Option<&Currency>) -> Result<Option<f64>> {
    let base = match item.currency_id {
        Some(currency_id) => localization::currency_by_id(db, currency_id)?,
        None => None,
    };
    Ok(localization::converted_price(
        item.default_price,
        base.as_ref(),
        target,
    ))
}

/// Delete an item and everything it owns; media removal is best-effort.
pub fn delete_item(db: &Database, id: i64, media_root: Option<&Path>) -> Result<()> {
    let item = item_by_id(db, id)?.ok_or(Error::NotFound("item", id))?;

    db.with_tx(|tx| delete_item_in_tx(tx, id))?;

    if let Some(root) = media_root {
        media::remove_media_tree(root, &media::item_media_dir(item.category_id, id));
    }
    info!(id, "deleted item");
    Ok(())
}

fn delete_item_in_tx(tx: &Transaction, id: i64) -> Result<()> {
    tx.execute(
        "DELETE FROM item_parameter_names WHERE parameter_id IN
         (SELECT id FROM item_parameters WHERE item_id = ?1)",
        [id],
    )?;
    tx.execute("DELETE FROM item_parameters WHERE item_id = ?1", [id])?;
    tx.execute("DELETE FROM item_image_positions WHERE item_id = ?1", [id])?;
    records::delete_all_in_tx(tx, &ITEM_NAMES, id)?;
    records::delete_all_in_tx(tx, &ITEM_TEXTS, id)?;
    records::delete_all_in_tx(tx, &ITEM_SHORT_TEXTS, id)?;
    records::delete_all_in_tx(tx, &ITEM_SEO, id)?;
    tx.execute(
        "DELETE FROM audit_labels WHERE entity_kind = ?1 AND entity_id = ?2",
        params![EntityKind::Item.as_str(), id],
    )?;
    tx.execute("DELETE FROM items WHERE id = ?1", [id])?;
    Ok(())
}

// ==================== Item image positions ====================

/// One ordered image slot of an item. Exactly one live position per item
/// is the default image shown in listings.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemImagePosition {
    pub id: i64,
    pub item_id: i64,
    pub image: ImageRef,
    pub weight: i64,
    pub active: bool,
    pub default: bool,
}

/// Proposed state of one image position in a set save.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingImagePosition {
    pub id: Option<i64>,
    pub image: ImageRef,
    pub weight: Option<i64>,
    pub active: bool,
    pub default: bool,
    pub deleted: bool,
}

impl PendingImagePosition {
    pub fn new(image: ImageRef, default: bool) -> Self {
        Self {
            id: None,
            image,
            weight: None,
            active: true,
            default,
            deleted: false,
        }
    }

    fn flag(&self) -> crate::i18n::DefaultFlag {
        crate::i18n::DefaultFlag {
            default: self.default,
            deleted: self.deleted,
        }
    }
}

const ITEM_POSITIONS: OrderedSiblingSet = OrderedSiblingSet {
    table: "item_image_positions",
    scope_col: "item_id",
};

fn item_position_from_row(row: &Row) -> rusqlite::Result<ItemImagePosition> {
    Ok(ItemImagePosition {
        id: row.get(0)?,
        item_id: row.get(1)?,
        image: ImageRef {
            original: row.get(2)?,
            large: row.get(3)?,
            medium: row.get(4)?,
            small: row.get(5)?,
        },
        weight: row.get(6)?,
        active: row.get::<_, i64>(7)? != 0,
        default: row.get::<_, i64>(8)? != 0,
    })
}

/// Persist a proposed image-position set, all-or-nothing.
///
/// Image positions are not localized but share the default-uniqueness
/// rule with record sets: exactly one live position must be the default.
pub fn save_image_positions(
    db: &Database,
    item_id: i64,
    pending: &[PendingImagePosition],
) -> Result<()> {
    validate_default_uniqueness(pending.iter().map(|p| p.flag()))?;

    db.with_tx(|tx| {
        for position in pending {
            if position.deleted {
                if let Some(id) = position.id {
                    tx.execute("DELETE FROM item_image_positions WHERE id = ?1", [id])?;
                }
                continue;
            }
            match position.id {
                Some(id) => {
                    tx.execute(
                        "UPDATE item_image_positions SET image_original = ?1, image_large = ?2,
                         image_medium = ?3, image_small = ?4, active = ?5, is_default = ?6,
                         weight = COALESCE(?7, weight)
                         WHERE id = ?8",
                        params![
                            position.image.original,
                            position.image.large,
                            position.image.medium,
                            position.image.small,
                            position.active,
                            position.default,
                            position.weight,
                            id
                        ],
                    )?;
                }
                None => {
                    let weight = match position.weight {
                        Some(weight) => weight,
                        None => ITEM_POSITIONS.next_weight(tx, item_id)?,
                    };
                    tx.execute(
                        "INSERT INTO item_image_positions
                         (item_id, image_original, image_large, image_medium, image_small,
                          weight, active, is_default)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                        params![
                            item_id,
                            position.image.original,
                            position.image.large,
                            position.image.medium,
                            position.image.small,
                            weight,
                            position.active,
                            position.default
                        ],
                    )?;
                }
            }
        }
        tx.execute(
            "UPDATE items SET revision = revision + 1 WHERE id = ?1",
            [item_id],
        )?;
        Ok(())
    })
}

pub fn item_image_positions(
    db: &Database,
    item_id: i64,
    active_only: bool,
) -> Result<Vec<ItemImagePosition>> {
    let conn = db.lock();
    let sql = if active_only {
        "SELECT id, item_id, image_original, image_large, image_medium, image_small, weight, active, is_default
         FROM item_image_positions WHERE item_id = ?1 AND active = 1 ORDER BY weight, id"
    } else {
        "SELECT id, item_id, image_original, image_large, image_medium, image_small, weight, active, is_default
         FROM item_image_positions WHERE item_id = ?1 ORDER BY weight, id"
    };
    let mut stmt = conn.prepare(sql)?;
    let positions = stmt
        .query_map([item_id], item_position_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(positions)
}

/// The default image shown in listings, if any positions exist.
pub fn default_image(db: &Database, item_id: i64) -> Result<Option<ItemImagePosition>> {
    let position = db
        .lock()
        .query_row(
            "SELECT id, item_id, image_original, image_large, image_medium, image_small, weight, active, is_default
             FROM item_image_positions WHERE item_id = ?1 AND is_default = 1",
            [item_id],
            item_position_from_row,
        )
        .optional()?;
    Ok(position)
}

// ==================== Item parameters ====================

/// One ordered parameter of an item, with an untranslated default
/// name/value pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemParameter {
    pub id: i64,
    pub item_id: i64,
    pub default_name: String,
    pub default_value: String,
    pub weight: i64,
    pub first_image: Option<String>,
    pub second_image: Option<String>,
    pub revision: i64,
}

const PARAMETERS: OrderedSiblingSet = OrderedSiblingSet {
    table: "item_parameters",
    scope_col: "item_id",
};

fn parameter_from_row(row: &Row) -> rusqlite::Result<ItemParameter> {
    Ok(ItemParameter {
        id: row.get(0)?,
        item_id: row.get(1)?,
        default_name: row.get(2)?,
        default_value: row.get(3)?,
        weight: row.get(4)?,
        first_image: row.get(5)?,
        second_image: row.get(6)?,
        revision: row.get(7)?,
    })
}

pub fn add_parameter(
    db: &Database,
    item_id: i64,
    default_name: &str,
    default_value: &str,
    weight: Option<i64>,
) -> Result<i64> {
    db.with_tx(|tx| {
        let weight = match weight {
            Some(weight) => weight,
            None => PARAMETERS.next_weight(tx, item_id)?,
        };
        tx.execute(
            "INSERT INTO item_parameters (item_id, default_name, default_value, weight)
             VALUES (?1, ?2, ?3, ?4)",
            params![item_id, default_name, default_value, weight],
        )?;
        tx.execute(
            "UPDATE items SET revision = revision + 1 WHERE id = ?1",
            [item_id],
        )?;
        Ok(tx.last_insert_rowid())
    })
}

pub fn parameters(db: &Database, item_id: i64) -> Result<Vec<ItemParameter>> {
    let conn = db.lock();
    let mut stmt = conn.prepare(
        "SELECT id, item_id, default_name, default_value, weight, first_image, second_image, revision
         FROM item_parameters WHERE item_id = ?1 ORDER BY weight, id",
    )?;
    let parameters = stmt
        .query_map([item_id], parameter_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(parameters)
}

pub fn parameter_by_id(db: &Database, parameter_id: i64) -> Result<Option<ItemParameter>> {
    let parameter = db
        .lock()
        .query_row(
            "SELECT id, item_id, default_name, default_value, weight, first_image, second_image, revision
             FROM item_parameters WHERE id = ?1",
            [parameter_id],
            parameter_from_row,
        )
        .optional()?;
    Ok(parameter)
}

pub fn remove_parameter(db: &Database, parameter_id: i64, media_root: Option<&Path>) -> Result<()> {
    let parameter =
        parameter_by_id(db, parameter_id)?.ok_or(Error::NotFound("item parameter", parameter_id))?;
    let item = item_by_id(db, parameter.item_id)?
        .ok_or(Error::NotFound("item", parameter.item_id))?;

    db.with_tx(|tx| {
        records::delete_all_in_tx(tx, &ITEM_PARAMETER_NAMES, parameter_id)?;
        tx.execute("DELETE FROM item_parameters WHERE id = ?1", [parameter_id])?;
        tx.execute(
            "UPDATE items SET revision = revision + 1 WHERE id = ?1",
            [parameter.item_id],
        )?;
        Ok(())
    })?;

    if let Some(root) = media_root {
        media::remove_media_tree(
            root,
            &media::item_parameter_media_dir(item.category_id, item.id, &parameter.default_name),
        );
    }
    Ok(())
}

pub fn parameter_names(
    db: &Database,
    parameter_id: i64,
) -> Result<Localizable<ParameterNameData>> {
    records::load(db, &ITEM_PARAMETER_NAMES, parameter_id)
}

/// Persist a parameter's translated name/value pairs.
///
/// Parameter names carry no default flag: the fallback is the parameter's
/// untranslated default name. A translation in the item's own default
/// language is rejected; language uniqueness still holds.
pub fn save_parameter_names(
    db: &Database,
    parameter_id: i64,
    pending: &[PendingRecord<ParameterNameData>],
) -> Result<()> {
    let parameter =
        parameter_by_id(db, parameter_id)?.ok_or(Error::NotFound("item parameter", parameter_id))?;
    let item = item_by_id(db, parameter.item_id)?
        .ok_or(Error::NotFound("item", parameter.item_id))?;

    if pending
        .iter()
        .any(|record| !record.deleted && record.language == item.default_language)
    {
        return Err(ValidationError::ParameterLanguageConflict.into());
    }
    validate_language_uniqueness(pending)?;

    db.with_tx(|tx| records::write_set_in_tx(tx, &ITEM_PARAMETER_NAMES, parameter_id, pending))
}

/// Translated parameter name for a request language, falling back to the
/// untranslated default name.
pub fn parameter_display_name(
    db: &Database,
    parameter_id: i64,
    language: LanguageId,
) -> Result<String> {
    let parameter =
        parameter_by_id(db, parameter_id)?.ok_or(Error::NotFound("item parameter", parameter_id))?;
    let names = parameter_names(db, parameter_id)?;
    Ok(match names.get(language) {
        Some(record) => record.value.name.clone(),
        None => parameter.default_name,
    })
}

/// Translated parameter value, falling back to the untranslated default
/// value.
pub fn parameter_display_value(
    db: &Database,
    parameter_id: i64,
    language: LanguageId,
) -> Result<String> {
    let parameter =
        parameter_by_id(db, parameter_id)?.ok_or(Error::NotFound("item parameter", parameter_id))?;
    let names = parameter_names(db, parameter_id)?;
    Ok(match names.get(language) {
        Some(record) => record.value.value.clone(),
        None => parameter.default_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::localization::{create_language, save_currencies, PendingCurrency};

    fn name(value: &str) -> NameData {
        NameData {
            name: value.to_string(),
        }
    }

    fn text(value: &str) -> TextData {
        TextData {
            name: value.to_string(),
            body: format!("<p>{}</p>", value),
        }
    }

    fn test_db() -> (Database, LanguageId, LanguageId) {
        let db = Database::open_in_memory().unwrap();
        let en = create_language(&db, "English", "en").unwrap();
        let ru = create_language(&db, "Russian", "ru").unwrap();
        (db, en, ru)
    }

    fn new_item(db: &Database, en: LanguageId, category: i64, url: &str) -> i64 {
        create_item(
            db,
            &NewItem {
                default_price: None,
                currency_id: None,
                default_language: en,
                category_id: category,
                template: TemplateTag::Detail,
                active: true,
                new: false,
                top: false,
                stock: false,
                pending: false,
                code: None,
                url: url.to_string(),
            },
        )
        .unwrap()
    }

    // ==================== Category Tests ====================

    #[test]
    fn test_category_display_name_falls_back() {
        let (db, en, ru) = test_db();
        let category = create_category(&db, en, TemplateTag::Grid, "chairs").unwrap();
        save_category_names(
            &db,
            category,
            &[
                PendingRecord::new(en, true, name("Chairs")),
                PendingRecord::new(ru, false, name("Стулья")),
            ],
        )
        .unwrap();

        assert_eq!(category_display_name(&db, category, ru).unwrap(), "Стулья");
        assert_eq!(category_display_name(&db, category, 99).unwrap(), "Chairs");
    }

    #[test]
    fn test_category_text_seo_match_tracks_sets() {
        let (db, en, ru) = test_db();
        let category = create_category(&db, en, TemplateTag::Grid, "chairs").unwrap();
        save_category_texts(
            &db,
            category,
            &[
                PendingRecord::new(en, true, text("About")),
                PendingRecord::new(ru, false, text("Описание")),
            ],
        )
        .unwrap();
        save_category_seo(
            &db,
            category,
            &[
                PendingRecord::new(en, true, SeoData::default()),
                PendingRecord::new(ru, false, SeoData::default()),
            ],
        )
        .unwrap();
        assert!(category_text_seo_match(&db, category).unwrap());

        // Add a uk text without matching SEO: the sets diverge.
        let uk = create_language(&db, "Ukrainian", "uk").unwrap();
        let mut texts: Vec<PendingRecord<TextData>> =
            records::load_pending(&db, &CATEGORY_TEXTS, category).unwrap();
        texts.push(PendingRecord::new(uk, false, text("Опис")));
        save_category_texts(&db, category, &texts).unwrap();
        assert!(!category_text_seo_match(&db, category).unwrap());
    }

    #[test]
    fn test_category_gallery_list_is_ordered() {
        let (db, en, _) = test_db();
        let category = create_category(&db, en, TemplateTag::Grid, "chairs").unwrap();
        set_category_galleries(&db, category, &[30, 10, 20]).unwrap();
        assert_eq!(category_galleries(&db, category).unwrap(), vec![30, 10, 20]);

        set_category_galleries(&db, category, &[10]).unwrap();
        assert_eq!(category_galleries(&db, category).unwrap(), vec![10]);
    }

    #[test]
    fn test_duplicate_category_url_is_rejected() {
        let (db, en, _) = test_db();
        create_category(&db, en, TemplateTag::Grid, "chairs").unwrap();
        assert!(create_category(&db, en, TemplateTag::Grid, "chairs").is_err());
    }

    // ==================== Item Tests ====================

    #[test]
    fn test_item_pricing_requires_both_or_neither() {
        assert!(validate_item_pricing(None, None).is_ok());
        assert!(validate_item_pricing(Some(10.0), Some(1)).is_ok());
        assert_eq!(
            validate_item_pricing(Some(10.0), None),
            Err(ValidationError::IncompletePricing)
        );
        assert_eq!(
            validate_item_pricing(None, Some(1)),
            Err(ValidationError::IncompletePricing)
        );
    }

    #[test]
    fn test_item_price_conversion() {
        let (db, en, _) = test_db();
        save_currencies(
            &db,
            &[
                PendingCurrency {
                    id: None,
                    name: "US Dollar".to_string(),
                    short_name: "USD".to_string(),
                    coefficient: 1.0,
                    default: true,
                    deleted: false,
                },
                PendingCurrency {
                    id: None,
                    name: "Hryvnia".to_string(),
                    short_name: "UAH".to_string(),
                    coefficient: 40.0,
                    default: false,
                    deleted: false,
                },
            ],
        )
        .unwrap();
        let usd = localization::currency_by_code(&db, "USD").unwrap().unwrap();
        let uah = localization::currency_by_code(&db, "UAH").unwrap().unwrap();

        let category = create_category(&db, en, TemplateTag::Grid, "chairs").unwrap();
        let item_id = create_item(
            &db,
            &NewItem {
                default_price: Some(100.0),
                currency_id: Some(uah.id),
                default_language: en,
                category_id: category,
                template: TemplateTag::Detail,
                active: true,
                new: false,
                top: false,
                stock: false,
                pending: false,
                code: None,
                url: "chair-1".to_string(),
            },
        )
        .unwrap();
        let item = item_by_id(&db, item_id).unwrap().unwrap();

        assert_eq!(item_price(&db, &item, Some(&uah)).unwrap(), Some(100.0));
        assert_eq!(item_price(&db, &item, Some(&usd)).unwrap(), Some(4000.0));
        assert_eq!(item_price(&db, &item, None).unwrap(), None);
    }

    #[test]
    fn test_item_without_price_converts_to_none() {
        let (db, en, _) = test_db();
        let category = create_category(&db, en, TemplateTag::Grid, "chairs").unwrap();
        let item_id = new_item(&db, en, category, "chair-1");
        let item = item_by_id(&db, item_id).unwrap().unwrap();

        let usd = Currency {
            id: 0,
            name: "USD".to_string(),
            short_name: "USD".to_string(),
            coefficient: 1.0,
            default: true,
            first_image: None,
            second_image: None,
        };
        assert_eq!(item_price(&db, &item, Some(&usd)).unwrap(), None);
    }

    // ==================== Image Position Tests ====================

    #[test]
    fn test_image_positions_require_one_default() {
        let (db, en, _) = test_db();
        let category = create_category(&db, en, TemplateTag::Grid, "chairs").unwrap();
        let item_id = new_item(&db, en, category, "chair-1");

        let none_default = vec![
            PendingImagePosition::new(ImageRef::new("a.jpg"), false),
            PendingImagePosition::new(ImageRef::new("b.jpg"), false),
        ];
        assert!(save_image_positions(&db, item_id, &none_default).is_err());

        let one_default = vec![
            PendingImagePosition::new(ImageRef::new("a.jpg"), true),
            PendingImagePosition::new(ImageRef::new("b.jpg"), false),
        ];
        save_image_positions(&db, item_id, &one_default).unwrap();

        let default = default_image(&db, item_id).unwrap().unwrap();
        assert_eq!(default.image.original, "a.jpg");
    }

    #[test]
    fn test_fourth_image_position_gets_weight_three() {
        let (db, en, _) = test_db();
        let category = create_category(&db, en, TemplateTag::Grid, "chairs").unwrap();
        let item_id = new_item(&db, en, category, "chair-1");

        let mut positions = vec![
            PendingImagePosition::new(ImageRef::new("a.jpg"), true),
            PendingImagePosition::new(ImageRef::new("b.jpg"), false),
            PendingImagePosition::new(ImageRef::new("c.jpg"), false),
        ];
        save_image_positions(&db, item_id, &positions).unwrap();

        // Re-submit the saved rows plus one new position without a weight.
        let saved = item_image_positions(&db, item_id, false).unwrap();
        positions = saved
            .iter()
            .map(|p| PendingImagePosition {
                id: Some(p.id),
                image: p.image.clone(),
                weight: Some(p.weight),
                active: p.active,
                default: p.default,
                deleted: false,
            })
            .collect();
        positions.push(PendingImagePosition::new(ImageRef::new("d.jpg"), false));
        save_image_positions(&db, item_id, &positions).unwrap();

        let weights: Vec<i64> = item_image_positions(&db, item_id, false)
            .unwrap()
            .iter()
            .map(|p| p.weight)
            .collect();
        assert_eq!(weights, vec![0, 1, 2, 3]);
    }

    // ==================== Parameter Tests ====================

    #[test]
    fn test_parameters_are_ordered_and_unique_per_name() {
        let (db, en, _) = test_db();
        let category = create_category(&db, en, TemplateTag::Grid, "chairs").unwrap();
        let item_id = new_item(&db, en, category, "chair-1");

        add_parameter(&db, item_id, "color", "red", None).unwrap();
        add_parameter(&db, item_id, "material", "oak", None).unwrap();
        let weights: Vec<i64> = parameters(&db, item_id)
            .unwrap()
            .iter()
            .map(|p| p.weight)
            .collect();
        assert_eq!(weights, vec![0, 1]);

        // Same default name on the same item violates the schema.
        assert!(add_parameter(&db, item_id, "color", "blue", None).is_err());
    }

    #[test]
    fn test_parameter_translation_rejects_item_default_language() {
        let (db, en, ru) = test_db();
        let category = create_category(&db, en, TemplateTag::Grid, "chairs").unwrap();
        let item_id = new_item(&db, en, category, "chair-1");
        let parameter = add_parameter(&db, item_id, "color", "red", None).unwrap();

        let conflict = vec![PendingRecord::new(
            en,
            false,
            ParameterNameData {
                name: "colour".to_string(),
                value: "red".to_string(),
            },
        )];
        assert!(matches!(
            save_parameter_names(&db, parameter, &conflict).unwrap_err(),
            Error::Validation(ValidationError::ParameterLanguageConflict)
        ));

        let ok = vec![PendingRecord::new(
            ru,
            false,
            ParameterNameData {
                name: "цвет".to_string(),
                value: "красный".to_string(),
            },
        )];
        save_parameter_names(&db, parameter, &ok).unwrap();
    }

    #[test]
    fn test_parameter_display_falls_back_to_default_name() {
        let (db, en, ru) = test_db();
        let category = create_category(&db, en, TemplateTag::Grid, "chairs").unwrap();
        let item_id = new_item(&db, en, category, "chair-1");
        let parameter = add_parameter(&db, item_id, "color", "red", None).unwrap();
        save_parameter_names(
            &db,
            parameter,
            &[PendingRecord::new(
                ru,
                false,
                ParameterNameData {
                    name: "цвет".to_string(),
                    value: "красный".to_string(),
                },
            )],
        )
        .unwrap();

        assert_eq!(parameter_display_name(&db, parameter, ru).unwrap(), "цвет");
        // No en translation exists (and cannot): default name wins.
        assert_eq!(parameter_display_name(&db, parameter, en).unwrap(), "color");
        assert_eq!(
            parameter_display_value(&db, parameter, en).unwrap(),
            "red"
        );
    }

    // ==================== Cascade Tests ====================

    #[test]
    fn test_delete_item_cascades() {
        let (db, en, _) = test_db();
        let category = create_category(&db, en, TemplateTag::Grid, "chairs").unwrap();
        let item_id = new_item(&db, en, category, "chair-1");
        save_item_names(
            &db,
            item_id,
            &[PendingRecord::new(en, true, name("Chair"))],
        )
        .unwrap();
        let parameter = add_parameter(&db, item_id, "color", "red", None).unwrap();
        save_image_positions(
            &db,
            item_id,
            &[PendingImagePosition::new(ImageRef::new("a.jpg"), true)],
        )
        .unwrap();

        delete_item(&db, item_id, None).unwrap();
        assert!(item_by_id(&db, item_id).unwrap().is_none());
        assert!(item_names(&db, item_id).unwrap().is_empty());
        assert!(parameters(&db, item_id).unwrap().is_empty());
        assert!(parameter_names(&db, parameter).unwrap().is_empty());
        assert!(item_image_positions(&db, item_id, false).unwrap().is_empty());
    }

    #[test]
    fn test_delete_category_deletes_its_items() {
        let (db, en, _) = test_db();
        let category = create_category(&db, en, TemplateTag::Grid, "chairs").unwrap();
        let item_id = new_item(&db, en, category, "chair-1");

        delete_category(&db, category, None).unwrap();
        assert!(category_by_id(&db, category).unwrap().is_none());
        assert!(item_by_id(&db, item_id).unwrap().is_none());
    }
}
