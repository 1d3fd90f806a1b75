//! Weight assignment for ordered siblings.
//!
//! Children sharing a parent scope (image positions of one item, texts of
//! one category, parameters of one item) carry an integer weight used for
//! display order. When a child is saved without an explicit weight it is
//! appended: `max(existing) + 1`, or `0` for an empty scope.
//!
//! The weight is an ordering aid, not a uniqueness guarantee. Two
//! concurrent inserts into the same scope may both observe the same max
//! and tie; reads break ties by row id so display order stays stable
//! within a single read.

use crate::error::Result;
use rusqlite::Connection;

/// One ordered-children scope: a child table plus the column naming its
/// parent.
#[derive(Debug, Clone, Copy)]
pub struct OrderedSiblingSet {
    pub table: &'static str,
    pub scope_col: &'static str,
}

impl OrderedSiblingSet {
    /// Weight for a new child of `scope`, computed from the then-current
    /// persisted state. Must be called inside the save transaction.
    pub fn next_weight(&self, conn: &Connection, scope: i64) -> Result<i64> {
        let max: Option<i64> = conn.query_row(
            &format!(
                "SELECT MAX(weight) FROM {} WHERE {} = ?1",
                self.table, self.scope_col
            ),
            [scope],
            |row| row.get(0),
        )?;
        Ok(next_weight_from_max(max))
    }
}

/// The append policy itself: `max + 1`, or `0` when the scope is empty.
///
/// An existing maximum of `0` is a real maximum, so the next weight is `1`.
pub fn next_weight_from_max(max: Option<i64>) -> i64 {
    match max {
        Some(max) => max + 1,
        None => 0,
    }
}

/// Convenience over an iterator of existing weights.
pub fn next_weight<I>(existing: I) -> i64
where
    I: IntoIterator<Item = i64>,
{
    next_weight_from_max(existing.into_iter().max())
}
