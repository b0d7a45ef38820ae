//! Alert rows and the qualifying-entry query

use crate::db::models::Alert;
use crate::error::{AppError, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Watchlist entry joined with its cached item, already known to qualify
/// for an alert (alert enabled, target set, cached price at or below it).
#[derive(Debug, Clone)]
pub struct QualifyingEntry {
    pub watchlist_id: i64,
    pub item_id: String,
    pub target_price: i64,
    pub item_name: String,
    pub item_current_price: i64,
}

fn alert_from_row(row: &Row) -> rusqlite::Result<Alert> {
    Ok(Alert {
        id: row.get(0)?,
        watchlist_id: row.get(1)?,
        item_id: row.get(2)?,
        triggered_price: row.get(3)?,
        target_price: row.get(4)?,
        triggered_at: row.get(5)?,
        is_read: row.get::<_, i64>(6)? == 1,
        is_resolved: row.get::<_, i64>(7)? == 1,
    })
}

/// Entries whose cached price currently sits at or below their target.
///
/// Integer comparison only; prices never pass through floating point.
pub fn qualifying_entries(conn: &Connection) -> Result<Vec<QualifyingEntry>> {
    let mut stmt = conn.prepare(
        "SELECT w.id, w.item_id, w.target_price, i.name, i.current_price
         FROM watchlist w
         JOIN items i ON w.item_id = i.id
         WHERE w.alert_enabled = 1
           AND w.target_price IS NOT NULL
           AND i.current_price <= w.target_price",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(QualifyingEntry {
            watchlist_id: row.get(0)?,
            item_id: row.get(1)?,
            target_price: row.get(2)?,
            item_name: row.get(3)?,
            item_current_price: row.get(4)?,
        })
    })?;
    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?);
    }
    Ok(entries)
}

/// Whether an open (unresolved) alert already exists for the entry.
/// This is the dedup gate: at most one unresolved alert per entry.
pub fn has_unresolved_alert(conn: &Connection, watchlist_id: i64) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM alerts WHERE watchlist_id = ? AND is_resolved = 0)",
        [watchlist_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Create a new open alert for a target-price crossing
pub fn insert_alert(
    conn: &Connection,
    watchlist_id: i64,
    item_id: &str,
    triggered_price: i64,
    target_price: i64,
) -> Result<Alert> {
    conn.execute(
        "INSERT INTO alerts (watchlist_id, item_id, triggered_price, target_price)
         VALUES (?, ?, ?, ?)",
        params![watchlist_id, item_id, triggered_price, target_price],
    )?;
    let id = conn.last_insert_rowid();
    get_alert(conn, id)?
        .ok_or_else(|| AppError::Internal(format!("alert {} vanished after insert", id)))
}

pub fn get_alert(conn: &Connection, id: i64) -> Result<Option<Alert>> {
    let alert = conn
        .query_row(
            "SELECT id, watchlist_id, item_id, triggered_price, target_price, triggered_at, \
                    is_read, is_resolved
             FROM alerts WHERE id = ?",
            [id],
            alert_from_row,
        )
        .optional()?;
    Ok(alert)
}

pub fn list_alerts(conn: &Connection, unread_only: bool) -> Result<Vec<Alert>> {
    let sql = if unread_only {
        "SELECT id, watchlist_id, item_id, triggered_price, target_price, triggered_at, \
                is_read, is_resolved
         FROM alerts WHERE is_read = 0 ORDER BY triggered_at DESC"
    } else {
        "SELECT id, watchlist_id, item_id, triggered_price, target_price, triggered_at, \
                is_read, is_resolved
         FROM alerts ORDER BY triggered_at DESC"
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], alert_from_row)?;
    let mut alerts = Vec::new();
    for row in rows {
        alerts.push(row?);
    }
    Ok(alerts)
}

pub fn mark_alert_read(conn: &Connection, id: i64) -> Result<bool> {
    let changed = conn.execute("UPDATE alerts SET is_read = 1 WHERE id = ?", [id])?;
    Ok(changed > 0)
}

/// Resolve an alert. Resolution re-arms the entry: the next scan observing
/// a qualifying price creates a fresh alert, even if the price never rose
/// above target in between.
pub fn resolve_alert(conn: &Connection, id: i64) -> Result<bool> {
    let changed = conn.execute("UPDATE alerts SET is_resolved = 1 WHERE id = ?", [id])?;
    Ok(changed > 0)
}

pub fn delete_alert(conn: &Connection, id: i64) -> Result<bool> {
    let changed = conn.execute("DELETE FROM alerts WHERE id = ?", [id])?;
    Ok(changed > 0)
}
