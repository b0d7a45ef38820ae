//! SQLite database migrations

use crate::error::Result;
use rusqlite::Connection;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> Result<()> {
    // Create migrations table
    conn.execute(
        "CREATE TABLE IF NOT EXISTS migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    // Run each migration
    run_migration(conn, "001_items", CREATE_ITEMS_TABLE)?;
    run_migration(conn, "002_watchlist_groups", CREATE_WATCHLIST_GROUPS_TABLE)?;
    run_migration(conn, "003_watchlist", CREATE_WATCHLIST_TABLE)?;
    run_migration(conn, "004_price_history", CREATE_PRICE_HISTORY_TABLE)?;
    run_migration(conn, "005_alerts", CREATE_ALERTS_TABLE)?;
    run_migration(conn, "006_settings", CREATE_SETTINGS_TABLE)?;

    tracing::info!("Database migrations completed");
    Ok(())
}

fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<()> {
    // Check if migration already applied
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM migrations WHERE name = ?)",
        [name],
        |row| row.get(0),
    )?;

    if !exists {
        tracing::info!("Running migration: {}", name);
        conn.execute_batch(sql)?;
        conn.execute("INSERT INTO migrations (name) VALUES (?)", [name])?;
    }

    Ok(())
}

const CREATE_ITEMS_TABLE: &str = r#"
CREATE TABLE items (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    image_url TEXT,
    capture_urls TEXT NOT NULL DEFAULT '[]',
    serial_num TEXT,
    category TEXT NOT NULL DEFAULT 'item',
    rarity TEXT NOT NULL DEFAULT 'gold',
    hero TEXT,
    weapon TEXT,
    star_grid TEXT NOT NULL DEFAULT '[]',
    current_price INTEGER NOT NULL DEFAULT 0,
    seller_name TEXT,
    status TEXT NOT NULL DEFAULT 'normal',
    collect_count INTEGER NOT NULL DEFAULT 0,
    last_checked_at TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_items_category ON items(category);
"#;

const CREATE_WATCHLIST_GROUPS_TABLE: &str = r#"
CREATE TABLE watchlist_groups (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    color TEXT NOT NULL DEFAULT '#6366f1',
    sort_order INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);
INSERT OR IGNORE INTO watchlist_groups (id, name) VALUES (1, 'Default');
"#;

const CREATE_WATCHLIST_TABLE: &str = r#"
CREATE TABLE watchlist (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id TEXT NOT NULL REFERENCES items(id),
    group_id INTEGER NOT NULL DEFAULT 1 REFERENCES watchlist_groups(id),
    target_price INTEGER,
    alert_enabled INTEGER NOT NULL DEFAULT 1,
    notes TEXT,
    added_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(item_id)
);
CREATE INDEX IF NOT EXISTS idx_watchlist_alert ON watchlist(alert_enabled);
"#;

const CREATE_PRICE_HISTORY_TABLE: &str = r#"
CREATE TABLE price_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id TEXT NOT NULL REFERENCES items(id),
    price INTEGER NOT NULL,
    status TEXT,
    checked_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_price_history_item ON price_history(item_id, checked_at);
"#;

const CREATE_ALERTS_TABLE: &str = r#"
CREATE TABLE alerts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    watchlist_id INTEGER NOT NULL REFERENCES watchlist(id),
    item_id TEXT NOT NULL REFERENCES items(id),
    triggered_price INTEGER NOT NULL,
    target_price INTEGER NOT NULL,
    triggered_at TEXT NOT NULL DEFAULT (datetime('now')),
    is_read INTEGER NOT NULL DEFAULT 0,
    is_resolved INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_alerts_watchlist ON alerts(watchlist_id, is_resolved);
"#;

const CREATE_SETTINGS_TABLE: &str = r#"
CREATE TABLE settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
INSERT OR IGNORE INTO settings (key, value) VALUES ('check_interval_minutes', '5');
"#;
