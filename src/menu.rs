//! Navigation menus.
//!
//! Three menus (main, additional, extra) share one node family with a
//! discriminator column. Nodes form a tree through `parent_id`; the tree
//! is exposed as an arena of nodes with index-based child lists, never as
//! a self-referential object graph.

use crate::admin::EntityKind;
use crate::content::NameData;
use crate::error::{Error, Result};
use crate::i18n::{LanguageCatalog, LanguageId, Localizable, PendingRecord};
use crate::store::records::{self, MENU_NODE_NAMES};
use crate::store::Database;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{params, OptionalExtension, Row, ToSql};
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use tracing::info;

/// Which of the site's menus a node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuKind {
    Main,
    Additional,
    Extra,
}

impl MenuKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MenuKind::Main => "main",
            MenuKind::Additional => "additional",
            MenuKind::Extra => "extra",
        }
    }
}

impl FromStr for MenuKind {
    type Err = Error;

    fn from_str(kind: &str) -> Result<Self> {
        match kind {
            "main" => Ok(MenuKind::Main),
            "additional" => Ok(MenuKind::Additional),
            "extra" => Ok(MenuKind::Extra),
            other => Err(Error::UnknownMenuKind(other.to_string())),
        }
    }
}

impl ToSql for MenuKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for MenuKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let kind = value.as_str()?;
        kind.parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuNode {
    pub id: i64,
    pub menu: MenuKind,
    pub parent_id: Option<i64>,
    pub url: Option<String>,
    pub first_image: Option<String>,
    pub second_image: Option<String>,
    pub revision: i64,
}

const NODE_COLS: &str = "id, menu, parent_id, url, first_image, second_image, revision";

fn node_from_row(row: &Row) -> rusqlite::Result<MenuNode> {
    Ok(MenuNode {
        id: row.get(0)?,
        menu: row.get(1)?,
        parent_id: row.get(2)?,
        url: row.get(3)?,
        first_image: row.get(4)?,
        second_image: row.get(5)?,
        revision: row.get(6)?,
    })
}

// ==================== Nodes ====================

pub fn create_node(
    db: &Database,
    menu: MenuKind,
    parent_id: Option<i64>,
    url: Option<&str>,
) -> Result<i64> {
    let conn = db.lock();
    conn.execute(
        "INSERT INTO menu_nodes (menu, parent_id, url) VALUES (?1, ?2, ?3)",
        params![menu, parent_id, url],
    )?;
    let id = conn.last_insert_rowid();
    info!(menu = menu.as_str(), id, "created menu node");
    Ok(id)
}

pub fn node_by_id(db: &Database, id: i64) -> Result<Option<MenuNode>> {
    let node = db
        .lock()
        .query_row(
            &format!("SELECT {NODE_COLS} FROM menu_nodes WHERE id = ?1"),
            [id],
            node_from_row,
        )
        .optional()?;
    Ok(node)
}

/// Delete a node and its whole subtree, with every node's names.
pub fn delete_node(db: &Database, id: i64) -> Result<()> {
    let mut subtree = vec![id];
    let mut frontier = vec![id];
    while let Some(parent) = frontier.pop() {
        let children: Vec<i64> = {
            let conn = db.lock();
            let mut stmt = conn.prepare("SELECT id FROM menu_nodes WHERE parent_id = ?1")?;
            let result = stmt
                .query_map([parent], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            result
        };
        subtree.extend(&children);
        frontier.extend(children);
    }

    db.with_tx(|tx| {
        for node_id in &subtree {
            records::delete_all_in_tx(tx, &MENU_NODE_NAMES, *node_id)?;
            tx.execute(
                "DELETE FROM audit_labels WHERE entity_kind = ?1 AND entity_id = ?2",
                params![EntityKind::MenuNode.as_str(), node_id],
            )?;
            tx.execute("DELETE FROM menu_nodes WHERE id = ?1", [node_id])?;
        }
        Ok(())
    })?;
    info!(id, nodes = subtree.len(), "deleted menu subtree");
    Ok(())
}

// ==================== Names ====================

pub fn node_names(db: &Database, node_id: i64) -> Result<Localizable<NameData>> {
    records::load(db, &MENU_NODE_NAMES, node_id)
}

pub fn save_node_names(
    db: &Database,
    node_id: i64,
    pending: &[PendingRecord<NameData>],
) -> Result<()> {
    records::save_set(db, &MENU_NODE_NAMES, node_id, pending)
}

pub fn node_display_name(db: &Database, node_id: i64, language: LanguageId) -> Result<String> {
    let names = node_names(db, node_id)?;
    let record = names.resolve(language).map_err(Error::from)?;
    Ok(record.value.name.clone())
}

pub fn unrealized_name_languages(db: &Database, node_id: i64) -> Result<BTreeSet<LanguageId>> {
    let catalog = LanguageCatalog::new(db).all_language_ids()?;
    let realized = records::realized_language_ids(db, &MENU_NODE_NAMES, node_id)?;
    Ok(catalog.difference(&realized).copied().collect())
}

// ==================== Tree ====================

/// One menu's nodes as an arena: children are index lists into `nodes`,
/// siblings ordered by url then id.
#[derive(Debug)]
pub struct MenuTree {
    nodes: Vec<MenuNode>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
    by_id: HashMap<i64, usize>,
}

impl MenuTree {
    /// Load the full tree of one menu.
    ///
    /// A node whose parent no longer exists is treated as a root rather
    /// than dropped.
    pub fn load(db: &Database, menu: MenuKind) -> Result<Self> {
        let nodes: Vec<MenuNode> = {
            let conn = db.lock();
            let mut stmt = conn.prepare(&format!(
                "SELECT {NODE_COLS} FROM menu_nodes WHERE menu = ?1 ORDER BY url, id"
            ))?;
            let result = stmt
                .query_map([menu], node_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            result
        };

        let by_id: HashMap<i64, usize> = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id, index))
            .collect();
        let mut children = vec![Vec::new(); nodes.len()];
        let mut roots = Vec::new();
        for (index, node) in nodes.iter().enumerate() {
            match node.parent_id.and_then(|parent| by_id.get(&parent)) {
                Some(&parent_index) => children[parent_index].push(index),
                None => roots.push(index),
            }
        }

        Ok(Self {
            nodes,
            children,
            roots,
            by_id,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, node_id: i64) -> Option<&MenuNode> {
        self.by_id.get(&node_id).map(|&index| &self.nodes[index])
    }

    pub fn roots(&self) -> Vec<&MenuNode> {
        self.roots.iter().map(|&index| &self.nodes[index]).collect()
    }

    pub fn children(&self, node_id: i64) -> Vec<&MenuNode> {
        match self.by_id.get(&node_id) {
            Some(&index) => self.children[index]
                .iter()
                .map(|&child| &self.nodes[child])
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn parent(&self, node_id: i64) -> Option<&MenuNode> {
        self.get(node_id)
            .and_then(|node| node.parent_id)
            .and_then(|parent| self.get(parent))
    }

    /// Depth-first walk over the tree: (node, depth), roots first.
    pub fn depth_first(&self) -> Vec<(&MenuNode, usize)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(usize, usize)> = self
            .roots
            .iter()
            .rev()
            .map(|&index| (index, 0))
            .collect();
        while let Some((index, depth)) = stack.pop() {
            out.push((&self.nodes[index], depth));
            for &child in self.children[index].iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }
}
