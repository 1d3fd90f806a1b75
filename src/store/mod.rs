//! Persistence store.
//!
//! A thin handle over an embedded SQLite database. The schema is created
//! on open; all multi-row writes go through [`Database::with_tx`] so a
//! record-set save, its validation and its owner's revision bump commit
//! or roll back as one unit.

pub mod records;

use crate::error::Result;
use rusqlite::{Connection, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Shared database handle.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database at `path` and ensure the schema.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::create_schema(&conn)?;
        debug!(path, "opened content store");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory database, used by tests and previews.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::create_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    /// Run `f` inside a transaction; commit on `Ok`, roll back on `Err`.
    pub fn with_tx<R>(&self, f: impl FnOnce(&Transaction) -> Result<R>) -> Result<R> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    fn create_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS languages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                short_name TEXT NOT NULL UNIQUE,
                first_image TEXT,
                second_image TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_languages_short_name ON languages(short_name);

            CREATE TABLE IF NOT EXISTS currencies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                short_name TEXT NOT NULL UNIQUE,
                coefficient REAL NOT NULL,
                is_default INTEGER NOT NULL DEFAULT 0,
                first_image TEXT,
                second_image TEXT
            );

            CREATE TABLE IF NOT EXISTS banners (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                marker TEXT NOT NULL,
                revision INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS banner_image_positions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                banner_id INTEGER NOT NULL REFERENCES banners(id),
                image_original TEXT NOT NULL,
                image_large TEXT,
                image_medium TEXT,
                image_small TEXT,
                weight INTEGER NOT NULL,
                active INTEGER NOT NULL DEFAULT 1,
                revision INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                default_language INTEGER NOT NULL REFERENCES languages(id),
                template TEXT NOT NULL,
                url TEXT NOT NULL UNIQUE,
                first_image TEXT,
                second_image TEXT,
                revision INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS category_galleries (
                category_id INTEGER NOT NULL REFERENCES categories(id),
                gallery_id INTEGER NOT NULL REFERENCES galleries(id),
                weight INTEGER NOT NULL,
                UNIQUE(category_id, gallery_id)
            );

            CREATE TABLE IF NOT EXISTS items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                default_price REAL,
                currency_id INTEGER REFERENCES currencies(id),
                default_language INTEGER NOT NULL REFERENCES languages(id),
                category_id INTEGER NOT NULL REFERENCES categories(id),
                template TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1,
                is_new INTEGER NOT NULL DEFAULT 0,
                top INTEGER NOT NULL DEFAULT 0,
                stock INTEGER NOT NULL DEFAULT 0,
                pending INTEGER NOT NULL DEFAULT 0,
                code TEXT,
                url TEXT NOT NULL UNIQUE,
                revision INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS item_image_positions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                item_id INTEGER NOT NULL REFERENCES items(id),
                image_original TEXT NOT NULL,
                image_large TEXT,
                image_medium TEXT,
                image_small TEXT,
                weight INTEGER NOT NULL,
                active INTEGER NOT NULL DEFAULT 1,
                is_default INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS item_parameters (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                item_id INTEGER NOT NULL REFERENCES items(id),
                default_name TEXT NOT NULL,
                default_value TEXT NOT NULL,
                weight INTEGER NOT NULL,
                first_image TEXT,
                second_image TEXT,
                revision INTEGER NOT NULL DEFAULT 0,
                UNIQUE(default_name, item_id)
            );

            CREATE TABLE IF NOT EXISTS galleries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                marker TEXT NOT NULL,
                first_image TEXT,
                second_image TEXT,
                revision INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS gallery_image_positions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                gallery_id INTEGER NOT NULL REFERENCES galleries(id),
                image_original TEXT NOT NULL,
                image_large TEXT,
                image_medium TEXT,
                image_small TEXT,
                weight INTEGER NOT NULL,
                active INTEGER NOT NULL DEFAULT 1,
                revision INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS menu_nodes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                menu TEXT NOT NULL,
                parent_id INTEGER REFERENCES menu_nodes(id),
                url TEXT,
                first_image TEXT,
                second_image TEXT,
                revision INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS storage_keys (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                key TEXT NOT NULL UNIQUE,
                revision INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS page_categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS pages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                category_id INTEGER NOT NULL REFERENCES page_categories(id),
                default_language INTEGER NOT NULL REFERENCES languages(id),
                template TEXT NOT NULL,
                revision INTEGER NOT NULL DEFAULT 0,
                UNIQUE(name, category_id)
            );

            CREATE TABLE IF NOT EXISTS page_galleries (
                page_id INTEGER NOT NULL REFERENCES pages(id),
                gallery_id INTEGER NOT NULL REFERENCES galleries(id),
                weight INTEGER NOT NULL,
                UNIQUE(page_id, gallery_id)
            );

            CREATE TABLE IF NOT EXISTS audit_labels (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                entity_kind TEXT NOT NULL,
                entity_id INTEGER NOT NULL,
                author TEXT NOT NULL,
                last_editor TEXT,
                created_at TEXT NOT NULL,
                modified_at TEXT,
                UNIQUE(entity_kind, entity_id)
            );",
        )?;

        // Localized record tables all share one layout, driven by the kind
        // registry.
        for kind in records::ALL_RECORD_KINDS {
            conn.execute(
                &format!(
                    "CREATE TABLE IF NOT EXISTS {table} (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        {owner} INTEGER NOT NULL,
                        language_id INTEGER NOT NULL REFERENCES languages(id),
                        is_default INTEGER NOT NULL DEFAULT 0,
                        weight INTEGER,
                        payload TEXT NOT NULL,
                        UNIQUE({owner}, language_id)
                    )",
                    table = kind.table,
                    owner = kind.owner_col,
                ),
                [],
            )?;
        }

        Ok(())
    }
}
