//! Append-only price history

use crate::db::models::{DailyPricePoint, ItemStatus, PriceSnapshot};
use crate::error::Result;
use rusqlite::{params, Connection, Row};

fn snapshot_from_row(row: &Row) -> rusqlite::Result<PriceSnapshot> {
    let status: Option<String> = row.get(3)?;
    Ok(PriceSnapshot {
        id: row.get(0)?,
        item_id: row.get(1)?,
        price: row.get(2)?,
        status: status.map(|s| ItemStatus::parse(&s)),
        checked_at: row.get(4)?,
    })
}

/// Append one price fact for an item. Never updated or deleted.
pub fn insert_snapshot(
    conn: &Connection,
    item_id: &str,
    price: i64,
    status: ItemStatus,
) -> Result<()> {
    conn.execute(
        "INSERT INTO price_history (item_id, price, status) VALUES (?, ?, ?)",
        params![item_id, price, status.as_str()],
    )?;
    Ok(())
}

/// Raw snapshots for an item over the trailing window, oldest first
pub fn history_for_item(conn: &Connection, item_id: &str, days: u32) -> Result<Vec<PriceSnapshot>> {
    let mut stmt = conn.prepare(
        "SELECT id, item_id, price, status, checked_at
         FROM price_history
         WHERE item_id = ? AND checked_at >= datetime('now', ?)
         ORDER BY checked_at ASC",
    )?;
    let modifier = format!("-{} days", days);
    let rows = stmt.query_map(params![item_id, modifier], snapshot_from_row)?;
    let mut snapshots = Vec::new();
    for row in rows {
        snapshots.push(row?);
    }
    Ok(snapshots)
}

/// Per-day min/max/avg aggregates for chart rendering.
///
/// The average is cast to an integer so callers only ever see minor
/// currency units.
pub fn daily_price_summary(
    conn: &Connection,
    item_id: &str,
    days: u32,
) -> Result<Vec<DailyPricePoint>> {
    let mut stmt = conn.prepare(
        "SELECT date(checked_at) AS day,
                CAST(AVG(price) AS INTEGER),
                MIN(price),
                MAX(price)
         FROM price_history
         WHERE item_id = ? AND checked_at >= datetime('now', ?)
         GROUP BY day
         ORDER BY day ASC",
    )?;
    let modifier = format!("-{} days", days);
    let rows = stmt.query_map(params![item_id, modifier], |row| {
        Ok(DailyPricePoint {
            date: row.get(0)?,
            avg_price: row.get(1)?,
            min_price: row.get(2)?,
            max_price: row.get(3)?,
        })
    })?;
    let mut points = Vec::new();
    for row in rows {
        points.push(row?);
    }
    Ok(points)
}
