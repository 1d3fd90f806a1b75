//! Prints language-coverage diagnostics for every content family: which
//! catalog languages each entity is missing, and whether text and SEO
//! sets agree where both exist.

use anyhow::Result;
use lingua_cms::config::Config;
use lingua_cms::i18n::{LanguageCatalog, LanguageId};
use lingua_cms::store::records::{
    RecordKind, BANNER_TEXTS, CATEGORY_NAMES, CATEGORY_SEO, CATEGORY_TEXTS, GALLERY_TEXTS,
    ITEM_SEO, ITEM_TEXTS, MENU_NODE_NAMES, PAGE_SEO, PAGE_TEXTS, STORAGE_VALUES,
};
use lingua_cms::store::Database;
use lingua_cms::{admin, catalogue, page};
use std::collections::BTreeSet;
use tracing::info;

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lingua_cms=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    let db = Database::open(&config.database_path)?;
    info!(path = %config.database_path, "checking language coverage");

    let catalog = LanguageCatalog::new(&db);
    let languages = catalog.all_languages()?;
    if languages.is_empty() {
        println!("No languages configured; nothing to check.");
        return Ok(());
    }
    println!(
        "Catalog: {}",
        languages
            .iter()
            .map(|language| language.short_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    report_kind(&db, "banner texts", &BANNER_TEXTS)?;
    report_kind(&db, "category names", &CATEGORY_NAMES)?;
    report_kind(&db, "category texts", &CATEGORY_TEXTS)?;
    report_kind(&db, "item texts", &ITEM_TEXTS)?;
    report_kind(&db, "gallery texts", &GALLERY_TEXTS)?;
    report_kind(&db, "menu node names", &MENU_NODE_NAMES)?;
    report_kind(&db, "storage values", &STORAGE_VALUES)?;
    report_kind(&db, "page texts", &PAGE_TEXTS)?;

    report_text_seo_match(&db)?;
    Ok(())
}

fn report_kind(db: &Database, label: &str, kind: &RecordKind) -> Result<()> {
    let incomplete =
        admin::classify_by_coverage(db, kind, admin::CoverageFilter::HasUnrealized)?;
    if incomplete.is_empty() {
        println!("{label}: OK");
        return Ok(());
    }

    println!("{label}: {} with unrealized languages", incomplete.len());
    let catalog = LanguageCatalog::new(db);
    for owner in incomplete {
        let missing: BTreeSet<LanguageId> = admin::unrealized_languages(db, kind, owner)?;
        let names = catalog.language_names(&missing)?;
        println!("  #{owner}: missing {}", names.join(", "));
    }
    Ok(())
}

fn report_text_seo_match(db: &Database) -> Result<()> {
    let (_, categories) = admin::partition_by_coverage_match(db, &CATEGORY_TEXTS, &CATEGORY_SEO)?;
    for id in categories {
        let url = catalogue::category_by_id(db, id)?
            .map(|category| category.url)
            .unwrap_or_default();
        println!("category {url}: text and SEO language sets differ");
    }

    let (_, items) = admin::partition_by_coverage_match(db, &ITEM_TEXTS, &ITEM_SEO)?;
    for id in items {
        let url = catalogue::item_by_id(db, id)?
            .map(|item| item.url)
            .unwrap_or_default();
        println!("item {url}: text and SEO language sets differ");
    }

    let (_, pages) = admin::partition_by_coverage_match(db, &PAGE_TEXTS, &PAGE_SEO)?;
    for id in pages {
        let name = page::page_by_id(db, id)?
            .map(|page| page.name)
            .unwrap_or_default();
        println!("page {name}: text and SEO language sets differ");
    }
    Ok(())
}
