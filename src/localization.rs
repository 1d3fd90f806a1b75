//! Languages and currencies.
//!
//! Languages are the site's configured language set; the catalog in
//! `i18n::catalog` reads them as the coverage baseline. Currencies carry
//! a conversion coefficient relative to a base unit and a global
//! single-default invariant enforced at write time.

use crate::error::{CurrencyDefaultError, Error, Result};
use crate::i18n::LanguageId;
use crate::store::Database;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

/// A configured site language.
///
/// Immutable once referenced by content; the core does not support
/// deleting a language out from under existing records.
#[derive(Debug, Clone, PartialEq)]
pub struct Language {
    pub id: LanguageId,
    pub name: String,
    /// ISO 639-1 two-letter code (e.g. "en", "ru").
    pub short_name: String,
    pub first_image: Option<String>,
    pub second_image: Option<String>,
}

/// A configured currency with a conversion coefficient relative to the
/// base unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Currency {
    pub id: i64,
    pub name: String,
    /// Three-letter code (e.g. "USD").
    pub short_name: String,
    pub coefficient: f64,
    pub default: bool,
    pub first_image: Option<String>,
    pub second_image: Option<String>,
}

fn language_from_row(row: &Row) -> rusqlite::Result<Language> {
    Ok(Language {
        id: row.get(0)?,
        name: row.get(1)?,
        short_name: row.get(2)?,
        first_image: row.get(3)?,
        second_image: row.get(4)?,
    })
}

fn currency_from_row(row: &Row) -> rusqlite::Result<Currency> {
    Ok(Currency {
        id: row.get(0)?,
        name: row.get(1)?,
        short_name: row.get(2)?,
        coefficient: row.get(3)?,
        default: row.get::<_, i64>(4)? != 0,
        first_image: row.get(5)?,
        second_image: row.get(6)?,
    })
}

const LANGUAGE_COLS: &str = "id, name, short_name, first_image, second_image";
const CURRENCY_COLS: &str = "id, name, short_name, coefficient, is_default, first_image, second_image";

// ==================== Languages ====================

/// Add a language to the catalog.
pub fn create_language(db: &Database, name: &str, short_name: &str) -> Result<LanguageId> {
    let conn = db.lock();
    conn.execute(
        "INSERT INTO languages (name, short_name) VALUES (?1, ?2)",
        params![name, short_name],
    )?;
    let id = conn.last_insert_rowid();
    info!(name, short_name, id, "created language");
    Ok(id)
}

pub fn all_languages(db: &Database) -> Result<Vec<Language>> {
    let conn = db.lock();
    let mut stmt = conn.prepare(&format!(
        "SELECT {LANGUAGE_COLS} FROM languages ORDER BY id"
    ))?;
    let languages = stmt
        .query_map([], language_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(languages)
}

pub fn language_by_id(db: &Database, id: LanguageId) -> Result<Option<Language>> {
    let conn = db.lock();
    let language = conn
        .query_row(
            &format!("SELECT {LANGUAGE_COLS} FROM languages WHERE id = ?1"),
            [id],
            language_from_row,
        )
        .optional()?;
    Ok(language)
}

/// Look up a language by its two-letter code, the form the rendering
/// layer receives from the request.
pub fn language_by_code(db: &Database, short_name: &str) -> Result<Option<Language>> {
    let conn = db.lock();
    let language = conn
        .query_row(
            &format!("SELECT {LANGUAGE_COLS} FROM languages WHERE short_name = ?1"),
            [short_name],
            language_from_row,
        )
        .optional()?;
    Ok(language)
}

/// Like [`language_by_code`] but failing loudly for callers that require
/// the language to exist.
pub fn require_language_by_code(db: &Database, short_name: &str) -> Result<Language> {
    language_by_code(db, short_name)?.ok_or_else(|| Error::UnknownLanguage(short_name.to_string()))
}

// ==================== Currencies ====================

/// Proposed state of one currency in a currency-set save.
#[derive(Debug, Clone)]
pub struct PendingCurrency {
    pub id: Option<i64>,
    pub name: String,
    pub short_name: String,
    pub coefficient: f64,
    pub default: bool,
    pub deleted: bool,
}

/// Validate the global currency default invariant over a proposed set:
/// exactly one default among surviving currencies, unless the set is
/// empty.
pub fn validate_currency_defaults(pending: &[PendingCurrency]) -> Result<()> {
    let live: Vec<_> = pending.iter().filter(|c| !c.deleted).collect();
    if live.is_empty() {
        return Ok(());
    }
    match live.iter().filter(|c| c.default).count() {
        0 => Err(CurrencyDefaultError::NoDefault.into()),
        1 => Ok(()),
        _ => Err(CurrencyDefaultError::MultipleDefault.into()),
    }
}

/// Persist a proposed currency set, all-or-nothing. The default invariant
/// is checked inside the same transaction as the write it guards.
pub fn save_currencies(db: &Database, pending: &[PendingCurrency]) -> Result<()> {
    validate_currency_defaults(pending)?;
    db.with_tx(|tx| {
        for currency in pending {
            if currency.deleted {
                if let Some(id) = currency.id {
                    tx.execute("DELETE FROM currencies WHERE id = ?1", [id])?;
                }
                continue;
            }
            match currency.id {
                Some(id) => {
                    tx.execute(
                        "UPDATE currencies SET name = ?1, short_name = ?2, coefficient = ?3,
                         is_default = ?4 WHERE id = ?5",
                        params![
                            currency.name,
                            currency.short_name,
                            currency.coefficient,
                            currency.default,
                            id
                        ],
                    )?;
                }
                None => {
                    tx.execute(
                        "INSERT INTO currencies (name, short_name, coefficient, is_default)
                         VALUES (?1, ?2, ?3, ?4)",
                        params![
                            currency.name,
                            currency.short_name,
                            currency.coefficient,
                            currency.default
                        ],
                    )?;
                }
            }
        }
        Ok(())
    })
}

pub fn all_currencies(db: &Database) -> Result<Vec<Currency>> {
    let conn = db.lock();
    let mut stmt = conn.prepare(&format!(
        "SELECT {CURRENCY_COLS} FROM currencies ORDER BY id"
    ))?;
    let currencies = stmt
        .query_map([], currency_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(currencies)
}

pub fn currency_by_id(db: &Database, id: i64) -> Result<Option<Currency>> {
    currency_query(
        &db.lock(),
        &format!("SELECT {CURRENCY_COLS} FROM currencies WHERE id = ?1"),
        params![id],
    )
}

pub fn currency_by_code(db: &Database, short_name: &str) -> Result<Option<Currency>> {
    currency_query(
        &db.lock(),
        &format!("SELECT {CURRENCY_COLS} FROM currencies WHERE short_name = ?1"),
        params![short_name],
    )
}

/// The currency marked default, if any currency exists.
pub fn default_currency(db: &Database) -> Result<Option<Currency>> {
    currency_query(
        &db.lock(),
        &format!("SELECT {CURRENCY_COLS} FROM currencies WHERE is_default = 1"),
        params![],
    )
}

fn currency_query(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Option<Currency>> {
    let currency = conn.query_row(sql, params, currency_from_row).optional()?;
    Ok(currency)
}

// ==================== Price conversion ====================

/// Convert an item's base price into `target` currency.
///
/// Returns `None` when the price, the base currency or the target
/// currency is absent. Full floating-point precision, no rounding; any
/// rounding belongs to the presentation layer.
pub fn converted_price(
    default_price: Option<f64>,
    base: Option<&Currency>,
    target: Option<&Currency>,
) -> Option<f64> {
    let price = default_price?;
    let base = base?;
    let target = target?;
    Some(price * base.coefficient / target.coefficient)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn currency(code: &str, coefficient: f64, default: bool) -> Currency {
        Currency {
            id: 0,
            name: code.to_string(),
            short_name: code.to_string(),
            coefficient,
            default,
            first_image: None,
            second_image: None,
        }
    }

    fn pending(code: &str, coefficient: f64, default: bool) -> PendingCurrency {
        PendingCurrency {
            id: None,
            name: code.to_string(),
            short_name: code.to_string(),
            coefficient,
            default,
            deleted: false,
        }
    }

    // ==================== Language Tests ====================

    #[test]
    fn test_create_and_look_up_language() {
        let db = Database::open_in_memory().unwrap();
        let id = create_language(&db, "English", "en").unwrap();

        let by_code = language_by_code(&db, "en").unwrap().unwrap();
        assert_eq!(by_code.id, id);
        assert_eq!(by_code.name, "English");

        assert!(language_by_code(&db, "fr").unwrap().is_none());
    }

    #[test]
    fn test_require_language_by_code_fails_for_unknown() {
        let db = Database::open_in_memory().unwrap();
        let err = require_language_by_code(&db, "fr").unwrap_err();
        assert!(matches!(err, Error::UnknownLanguage(code) if code == "fr"));
    }

    #[test]
    fn test_duplicate_short_name_is_rejected_by_schema() {
        let db = Database::open_in_memory().unwrap();
        create_language(&db, "English", "en").unwrap();
        assert!(create_language(&db, "Engels", "en").is_err());
    }

    // ==================== Currency Invariant Tests ====================

    #[test]
    fn test_currency_set_requires_exactly_one_default() {
        let none = vec![pending("USD", 1.0, false), pending("EUR", 0.9, false)];
        assert!(matches!(
            validate_currency_defaults(&none).unwrap_err(),
            Error::Currency(CurrencyDefaultError::NoDefault)
        ));

        let two = vec![pending("USD", 1.0, true), pending("EUR", 0.9, true)];
        assert!(matches!(
            validate_currency_defaults(&two).unwrap_err(),
            Error::Currency(CurrencyDefaultError::MultipleDefault)
        ));

        let one = vec![pending("USD", 1.0, true), pending("EUR", 0.9, false)];
        assert!(validate_currency_defaults(&one).is_ok());
    }

    #[test]
    fn test_empty_currency_set_is_valid() {
        assert!(validate_currency_defaults(&[]).is_ok());
    }

    #[test]
    fn test_deleted_default_does_not_count() {
        let mut set = vec![pending("USD", 1.0, true), pending("EUR", 0.9, false)];
        set[0].deleted = true;
        assert!(matches!(
            validate_currency_defaults(&set).unwrap_err(),
            Error::Currency(CurrencyDefaultError::NoDefault)
        ));
    }

    #[test]
    fn test_save_currencies_round_trip() {
        let db = Database::open_in_memory().unwrap();
        save_currencies(
            &db,
            &[pending("USD", 1.0, true), pending("EUR", 0.92, false)],
        )
        .unwrap();

        let all = all_currencies(&db).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(default_currency(&db).unwrap().unwrap().short_name, "USD");
    }

    #[test]
    fn test_rejected_currency_save_writes_nothing() {
        let db = Database::open_in_memory().unwrap();
        let _ = save_currencies(&db, &[pending("USD", 1.0, false)]);
        assert!(all_currencies(&db).unwrap().is_empty());
    }

    // ==================== Price Conversion Tests ====================

    #[test]
    fn test_converted_price_happy_path() {
        let usd = currency("USD", 1.0, true);
        let eur = currency("EUR", 0.5, false);
        let price = converted_price(Some(10.0), Some(&usd), Some(&eur));
        assert_eq!(price, Some(20.0));
    }

    #[test]
    fn test_converted_price_identity_in_same_currency() {
        let usd = currency("USD", 1.0, true);
        assert_eq!(converted_price(Some(9.99), Some(&usd), Some(&usd)), Some(9.99));
    }

    #[test]
    fn test_converted_price_none_propagation() {
        let usd = currency("USD", 1.0, true);
        assert_eq!(converted_price(None, Some(&usd), Some(&usd)), None);
        assert_eq!(converted_price(Some(10.0), None, Some(&usd)), None);
        assert_eq!(converted_price(Some(10.0), Some(&usd), None), None);
    }
}
