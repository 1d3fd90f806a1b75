//! Environment configuration.

use crate::media::{SizeSet, SizeSpec};
use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file.
    pub database_path: String,

    /// Root directory of stored media, relative paths hang off this.
    pub media_root: String,

    /// Request-language code used when a visitor has no language of
    /// their own.
    pub default_language: String,

    /// Derived image sizes for galleries.
    pub gallery_sizes: SizeSet,

    /// Derived image sizes for catalogue item images.
    pub item_gallery_sizes: SizeSet,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "content.db".to_string()),
            media_root: std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string()),
            default_language: std::env::var("DEFAULT_LANGUAGE")
                .unwrap_or_else(|_| "en".to_string()),
            gallery_sizes: size_set_from_env("GALLERY", ("900x600", "600x400", "300x200"))?,
            item_gallery_sizes: size_set_from_env(
                "CATALOGUE_ITEM_GALLERY",
                ("800x800", "400x400", "200x200"),
            )?,
        })
    }
}

fn size_set_from_env(prefix: &str, defaults: (&str, &str, &str)) -> Result<SizeSet> {
    let parse = |suffix: &str, default: &str| -> Result<SizeSpec> {
        let var = format!("{}_{}", prefix, suffix);
        let raw = std::env::var(&var).unwrap_or_else(|_| default.to_string());
        SizeSpec::parse(&raw).with_context(|| format!("invalid size spec in {}", var))
    };
    Ok(SizeSet {
        large: parse("LARGE", defaults.0)?,
        medium: parse("MEDIUM", defaults.1)?,
        small: parse("SMALL", defaults.2)?,
    })
}
