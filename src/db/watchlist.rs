//! Watchlist entries and groups

use crate::db::models::{WatchlistEntry, WatchlistGroup};
use crate::error::{AppError, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

fn entry_from_row(row: &Row) -> rusqlite::Result<WatchlistEntry> {
    Ok(WatchlistEntry {
        id: row.get(0)?,
        item_id: row.get(1)?,
        group_id: row.get(2)?,
        target_price: row.get(3)?,
        alert_enabled: row.get::<_, i64>(4)? == 1,
        notes: row.get(5)?,
        added_at: row.get(6)?,
    })
}

/// Distinct item ids referenced by alert-enabled entries.
///
/// An item tracked by several entries appears once; this is the scan's
/// input set.
pub fn tracked_item_ids(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT DISTINCT item_id FROM watchlist WHERE alert_enabled = 1")?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

/// Add an item to the watchlist
pub fn add_entry(
    conn: &Connection,
    item_id: &str,
    group_id: i64,
    target_price: Option<i64>,
    notes: Option<&str>,
) -> Result<WatchlistEntry> {
    conn.execute(
        "INSERT INTO watchlist (item_id, group_id, target_price, notes) VALUES (?, ?, ?, ?)",
        params![item_id, group_id, target_price, notes],
    )?;
    let id = conn.last_insert_rowid();
    get_entry(conn, id)?
        .ok_or_else(|| AppError::Internal(format!("watchlist entry {} vanished after insert", id)))
}

pub fn get_entry(conn: &Connection, id: i64) -> Result<Option<WatchlistEntry>> {
    let entry = conn
        .query_row(
            "SELECT id, item_id, group_id, target_price, alert_enabled, notes, added_at
             FROM watchlist WHERE id = ?",
            [id],
            entry_from_row,
        )
        .optional()?;
    Ok(entry)
}

pub fn list_entries(conn: &Connection) -> Result<Vec<WatchlistEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, item_id, group_id, target_price, alert_enabled, notes, added_at
         FROM watchlist ORDER BY added_at DESC",
    )?;
    let rows = stmt.query_map([], entry_from_row)?;
    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?);
    }
    Ok(entries)
}

/// Update an entry's tracking parameters
pub fn update_entry(
    conn: &Connection,
    id: i64,
    target_price: Option<Option<i64>>,
    alert_enabled: Option<bool>,
    notes: Option<Option<String>>,
    group_id: Option<i64>,
) -> Result<WatchlistEntry> {
    let mut updates = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(t) = target_price {
        updates.push("target_price = ?");
        params.push(Box::new(t));
    }
    if let Some(a) = alert_enabled {
        updates.push("alert_enabled = ?");
        params.push(Box::new(a as i64));
    }
    if let Some(n) = notes {
        updates.push("notes = ?");
        params.push(Box::new(n));
    }
    if let Some(g) = group_id {
        updates.push("group_id = ?");
        params.push(Box::new(g));
    }

    if !updates.is_empty() {
        let sql = format!("UPDATE watchlist SET {} WHERE id = ?", updates.join(", "));
        params.push(Box::new(id));
        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;
    }

    get_entry(conn, id)?.ok_or_else(|| AppError::NotFound(format!("watchlist entry {}", id)))
}

pub fn remove_entry(conn: &Connection, id: i64) -> Result<bool> {
    let changed = conn.execute("DELETE FROM watchlist WHERE id = ?", [id])?;
    Ok(changed > 0)
}

// ========== Groups ==========

fn group_from_row(row: &Row) -> rusqlite::Result<WatchlistGroup> {
    Ok(WatchlistGroup {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
        sort_order: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub fn list_groups(conn: &Connection) -> Result<Vec<WatchlistGroup>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, color, sort_order, created_at
         FROM watchlist_groups ORDER BY sort_order, id",
    )?;
    let rows = stmt.query_map([], group_from_row)?;
    let mut groups = Vec::new();
    for row in rows {
        groups.push(row?);
    }
    Ok(groups)
}

pub fn create_group(conn: &Connection, name: &str, color: &str) -> Result<WatchlistGroup> {
    conn.execute(
        "INSERT INTO watchlist_groups (name, color, sort_order)
         VALUES (?, ?, (SELECT COALESCE(MAX(sort_order), 0) + 1 FROM watchlist_groups))",
        params![name, color],
    )?;
    let id = conn.last_insert_rowid();
    conn.query_row(
        "SELECT id, name, color, sort_order, created_at FROM watchlist_groups WHERE id = ?",
        [id],
        group_from_row,
    )
    .map_err(Into::into)
}
