//! Rendering-layer contracts.
//!
//! The core hands the rendering collaborator plain value objects and
//! template *identifiers*, never filesystem paths: the renderer maps a
//! [`TemplateTag`] to a concrete template itself. Cached render output is
//! keyed by (entity, id, revision) so saving one entity invalidates only
//! that entity's cached pages.

use crate::admin::EntityKind;
use crate::catalogue;
use crate::content::{SeoData, TextData};
use crate::error::{Error, Result};
use crate::i18n::LanguageId;
use crate::localization::{self, Currency};
use crate::media::ImageRef;
use crate::page;
use crate::store::Database;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use std::collections::HashMap;
use std::str::FromStr;

/// Identifier of a render target, resolved to a concrete template by the
/// rendering collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateTag {
    Default,
    Landing,
    Grid,
    List,
    Detail,
}

impl TemplateTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateTag::Default => "default",
            TemplateTag::Landing => "landing",
            TemplateTag::Grid => "grid",
            TemplateTag::List => "list",
            TemplateTag::Detail => "detail",
        }
    }
}

impl FromStr for TemplateTag {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self> {
        match tag {
            "default" => Ok(TemplateTag::Default),
            "landing" => Ok(TemplateTag::Landing),
            "grid" => Ok(TemplateTag::Grid),
            "list" => Ok(TemplateTag::List),
            "detail" => Ok(TemplateTag::Detail),
            other => Err(Error::UnknownTemplateTag(other.to_string())),
        }
    }
}

impl ToSql for TemplateTag {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TemplateTag {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let tag = value.as_str()?;
        tag.parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

// ==================== Render cache ====================

/// Cache of rendered output keyed by (entity, id, revision).
///
/// A stale entry for an entity is replaced when newer output is stored;
/// saving unrelated entities leaves existing entries untouched.
#[derive(Debug, Default)]
pub struct RenderCache {
    entries: HashMap<(EntityKind, i64), (i64, String)>,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached output for the entity at exactly this revision.
    pub fn get(&self, entity: EntityKind, id: i64, revision: i64) -> Option<&str> {
        match self.entries.get(&(entity, id)) {
            Some((cached_revision, rendered)) if *cached_revision == revision => {
                Some(rendered.as_str())
            }
            _ => None,
        }
    }

    /// Store rendered output, displacing whatever revision was cached for
    /// this entity before.
    pub fn put(&mut self, entity: EntityKind, id: i64, revision: i64, rendered: String) {
        self.entries.insert((entity, id), (revision, rendered));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ==================== Resolved views ====================

/// Everything a catalogue listing needs for one item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemCard {
    pub name: String,
    pub short_text: Option<String>,
    pub price: Option<f64>,
    pub image: Option<ImageRef>,
    pub template: TemplateTag,
}

/// Resolve an item's card for one request language.
///
/// The name is a mandatory kind: an item without any name record is a
/// `NoContent` error. Short text and the default image are optional and
/// come back as `None` when absent.
pub fn item_card(
    db: &Database,
    item_id: i64,
    language: LanguageId,
    target_currency: Option<&Currency>,
) -> Result<ItemCard> {
    let item = catalogue::item_by_id(db, item_id)?.ok_or(Error::NotFound("item", item_id))?;

    let names = catalogue::item_names(db, item_id)?;
    let name = names.resolve(language)?.value.name.clone();

    let short_text = match catalogue::item_short_texts(db, item_id)?.resolve(language) {
        Ok(record) => Some(record.value.body.clone()),
        Err(_) => None,
    };

    let base = match item.currency_id {
        Some(currency_id) => localization::currency_by_id(db, currency_id)?,
        None => None,
    };
    let price = localization::converted_price(item.default_price, base.as_ref(), target_currency);

    let image = catalogue::default_image(db, item_id)?.map(|position| position.image);

    Ok(ItemCard {
        name,
        short_text,
        price,
        image,
        template: item.template,
    })
}

/// A static page resolved for one request language.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub name: String,
    pub text: Option<TextData>,
    pub seo: Option<SeoData>,
    pub template: TemplateTag,
}

pub fn page_view(db: &Database, page_id: i64, language: LanguageId) -> Result<PageView> {
    let page = page::page_by_id(db, page_id)?.ok_or(Error::NotFound("page", page_id))?;

    let text = match page::texts(db, page_id)?.resolve(language) {
        Ok(record) => Some(record.value.clone()),
        Err(_) => None,
    };
    let seo = match page::seo(db, page_id)?.resolve(language) {
        Ok(record) => Some(record.value.clone()),
        Err(_) => None,
    };

    Ok(PageView {
        name: page.name,
        text,
        seo,
        template: page.template,
    })
}
