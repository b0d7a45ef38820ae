//! Key/value settings

use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension};

/// Default scan interval when the setting is missing or invalid
pub const DEFAULT_INTERVAL_MINUTES: u32 = 5;

/// Settings key the scheduler reads at start time
pub const CHECK_INTERVAL_KEY: &str = "check_interval_minutes";

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM settings WHERE key = ?", [key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}

pub fn list_settings(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare("SELECT key, value FROM settings ORDER BY key")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    let mut settings = Vec::new();
    for row in rows {
        settings.push(row?);
    }
    Ok(settings)
}

/// Upsert a batch of settings in one transaction
pub fn set_settings(conn: &mut Connection, updates: &[(&str, &str)]) -> Result<()> {
    let tx = conn.transaction()?;
    for (key, value) in updates {
        tx.execute(
            "INSERT INTO settings (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
            params![key, value],
        )?;
    }
    tx.commit()?;
    Ok(())
}

/// Scan interval in minutes. Missing, non-numeric, non-positive, or
/// out-of-range values silently fall back to the default.
pub fn check_interval_minutes(conn: &Connection) -> u32 {
    match get_setting(conn, CHECK_INTERVAL_KEY) {
        Ok(Some(value)) => match value.trim().parse::<u32>() {
            Ok(minutes) if minutes > 0 => minutes,
            _ => DEFAULT_INTERVAL_MINUTES,
        },
        _ => DEFAULT_INTERVAL_MINUTES,
    }
}
