//! SQLite store

pub mod models;
mod alerts;
mod items;
mod migrations;
mod price_history;
mod settings;
mod watchlist;

pub use alerts::QualifyingEntry;
pub use settings::{CHECK_INTERVAL_KEY, DEFAULT_INTERVAL_MINUTES};

use crate::error::Result;
use models::*;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;

/// SQLite database wrapper
pub struct Db {
    conn: Mutex<Connection>,
}

impl Db {
    /// Open (or create) the database and run migrations
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent access
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let db = Self {
            conn: Mutex::new(conn),
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// In-memory database for tests
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock();
        migrations::run_migrations(&conn)
    }

    // ========== Item Methods ==========

    /// Refresh the cached row for an item
    pub fn upsert_item(&self, item: &Item) -> Result<()> {
        let conn = self.conn.lock();
        items::upsert_item(&conn, item)
    }

    /// Get a cached item by id
    pub fn get_item(&self, id: &str) -> Result<Option<Item>> {
        let conn = self.conn.lock();
        items::get_item(&conn, id)
    }

    /// List cached items, newest first
    pub fn list_items(&self, limit: u32) -> Result<Vec<Item>> {
        let conn = self.conn.lock();
        items::list_items(&conn, limit)
    }

    /// Record one successful check: upsert the item cache and append a
    /// price snapshot in a single transaction. Either both rows land or
    /// neither does.
    pub fn record_check(&self, item: &Item) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        items::upsert_item(&tx, item)?;
        price_history::insert_snapshot(&tx, &item.id, item.current_price, item.status)?;
        tx.commit()?;
        Ok(())
    }

    // ========== Watchlist Methods ==========

    /// Distinct item ids with alert-enabled watchlist entries
    pub fn tracked_item_ids(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        watchlist::tracked_item_ids(&conn)
    }

    pub fn add_watchlist_entry(
        &self,
        item_id: &str,
        group_id: i64,
        target_price: Option<i64>,
        notes: Option<&str>,
    ) -> Result<WatchlistEntry> {
        let conn = self.conn.lock();
        watchlist::add_entry(&conn, item_id, group_id, target_price, notes)
    }

    pub fn get_watchlist_entry(&self, id: i64) -> Result<Option<WatchlistEntry>> {
        let conn = self.conn.lock();
        watchlist::get_entry(&conn, id)
    }

    pub fn list_watchlist_entries(&self) -> Result<Vec<WatchlistEntry>> {
        let conn = self.conn.lock();
        watchlist::list_entries(&conn)
    }

    pub fn update_watchlist_entry(
        &self,
        id: i64,
        target_price: Option<Option<i64>>,
        alert_enabled: Option<bool>,
        notes: Option<Option<String>>,
        group_id: Option<i64>,
    ) -> Result<WatchlistEntry> {
        let conn = self.conn.lock();
        watchlist::update_entry(&conn, id, target_price, alert_enabled, notes, group_id)
    }

    pub fn remove_watchlist_entry(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        watchlist::remove_entry(&conn, id)
    }

    pub fn list_watchlist_groups(&self) -> Result<Vec<WatchlistGroup>> {
        let conn = self.conn.lock();
        watchlist::list_groups(&conn)
    }

    pub fn create_watchlist_group(&self, name: &str, color: &str) -> Result<WatchlistGroup> {
        let conn = self.conn.lock();
        watchlist::create_group(&conn, name, color)
    }

    // ========== Price History Methods ==========

    pub fn price_history(&self, item_id: &str, days: u32) -> Result<Vec<PriceSnapshot>> {
        let conn = self.conn.lock();
        price_history::history_for_item(&conn, item_id, days)
    }

    pub fn daily_price_summary(&self, item_id: &str, days: u32) -> Result<Vec<DailyPricePoint>> {
        let conn = self.conn.lock();
        price_history::daily_price_summary(&conn, item_id, days)
    }

    // ========== Alert Methods ==========

    /// Watchlist entries whose cached price is at or below target
    pub fn qualifying_entries(&self) -> Result<Vec<QualifyingEntry>> {
        let conn = self.conn.lock();
        alerts::qualifying_entries(&conn)
    }

    pub fn has_unresolved_alert(&self, watchlist_id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        alerts::has_unresolved_alert(&conn, watchlist_id)
    }

    pub fn insert_alert(
        &self,
        watchlist_id: i64,
        item_id: &str,
        triggered_price: i64,
        target_price: i64,
    ) -> Result<Alert> {
        let conn = self.conn.lock();
        alerts::insert_alert(&conn, watchlist_id, item_id, triggered_price, target_price)
    }

    pub fn list_alerts(&self, unread_only: bool) -> Result<Vec<Alert>> {
        let conn = self.conn.lock();
        alerts::list_alerts(&conn, unread_only)
    }

    pub fn mark_alert_read(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        alerts::mark_alert_read(&conn, id)
    }

    pub fn resolve_alert(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        alerts::resolve_alert(&conn, id)
    }

    pub fn delete_alert(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        alerts::delete_alert(&conn, id)
    }

    // ========== Settings Methods ==========

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        settings::get_setting(&conn, key)
    }

    pub fn list_settings(&self) -> Result<Vec<(String, String)>> {
        let conn = self.conn.lock();
        settings::list_settings(&conn)
    }

    /// Upsert a batch of settings in one transaction
    pub fn set_settings(&self, updates: &[(&str, &str)]) -> Result<()> {
        let mut conn = self.conn.lock();
        settings::set_settings(&mut conn, updates)
    }

    /// Scan interval with silent fallback to the default
    pub fn check_interval_minutes(&self) -> u32 {
        let conn = self.conn.lock();
        settings::check_interval_minutes(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_item(id: &str, price: i64) -> Item {
        Item {
            id: id.to_string(),
            name: format!("Item {}", id),
            image_url: None,
            capture_urls: vec![],
            serial_num: None,
            category: ItemCategory::HeroSkin,
            rarity: ItemRarity::Gold,
            hero: None,
            weapon: None,
            star_grid: vec![],
            current_price: price,
            seller_name: None,
            status: ItemStatus::Normal,
            collect_count: 0,
            last_checked_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_migrations_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let db = Db::new(&dir.path().join("test.db")).unwrap();
        // Seeded defaults: interval setting and the default group
        assert_eq!(db.check_interval_minutes(), DEFAULT_INTERVAL_MINUTES);
        let groups = db.list_watchlist_groups().unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "Default");
    }

    #[test]
    fn test_upsert_item_overwrites_snapshot_fields() {
        let db = Db::open_in_memory().unwrap();
        db.upsert_item(&test_item("e1", 30000)).unwrap();

        let mut updated = test_item("e1", 25000);
        updated.status = ItemStatus::Draw;
        db.upsert_item(&updated).unwrap();

        let cached = db.get_item("e1").unwrap().unwrap();
        assert_eq!(cached.current_price, 25000);
        assert_eq!(cached.status, ItemStatus::Draw);
        assert!(cached.last_checked_at.is_some());
        assert_eq!(db.list_items(10).unwrap().len(), 1);
    }

    #[test]
    fn test_record_check_writes_both_rows() {
        let db = Db::open_in_memory().unwrap();
        db.record_check(&test_item("e1", 30000)).unwrap();
        db.record_check(&test_item("e1", 29000)).unwrap();

        assert_eq!(db.get_item("e1").unwrap().unwrap().current_price, 29000);
        let history = db.price_history("e1", 7).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].price, 30000);
        assert_eq!(history[1].price, 29000);
    }

    #[test]
    fn test_record_check_rolls_back_on_snapshot_failure() {
        let db = Db::open_in_memory().unwrap();
        db.record_check(&test_item("e1", 30000)).unwrap();

        // make the snapshot insert fail mid-transaction
        db.conn
            .lock()
            .execute_batch("ALTER TABLE price_history RENAME TO price_history_hidden")
            .unwrap();
        assert!(db.record_check(&test_item("e1", 25000)).is_err());
        db.conn
            .lock()
            .execute_batch("ALTER TABLE price_history_hidden RENAME TO price_history")
            .unwrap();

        // the failed pass left neither row: the item upsert was rolled back
        // and no snapshot was appended
        assert_eq!(db.get_item("e1").unwrap().unwrap().current_price, 30000);
        assert_eq!(db.price_history("e1", 7).unwrap().len(), 1);
    }

    #[test]
    fn test_tracked_ids_distinct_and_alert_gated() {
        let db = Db::open_in_memory().unwrap();
        db.upsert_item(&test_item("e1", 100)).unwrap();
        db.upsert_item(&test_item("e2", 200)).unwrap();
        db.add_watchlist_entry("e1", 1, Some(90), None).unwrap();
        let disabled = db.add_watchlist_entry("e2", 1, None, None).unwrap();
        db.update_watchlist_entry(disabled.id, None, Some(false), None, None)
            .unwrap();

        let ids = db.tracked_item_ids().unwrap();
        assert_eq!(ids, vec!["e1".to_string()]);
    }

    #[test]
    fn test_qualifying_entries_integer_boundary() {
        let db = Db::open_in_memory().unwrap();
        db.upsert_item(&test_item("e1", 35000)).unwrap();
        db.upsert_item(&test_item("e2", 35001)).unwrap();
        db.add_watchlist_entry("e1", 1, Some(35000), None).unwrap();
        db.add_watchlist_entry("e2", 1, Some(35000), None).unwrap();

        // price == target qualifies; one cent above does not
        let rows = db.qualifying_entries().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].item_id, "e1");
        assert_eq!(rows[0].item_current_price, 35000);
    }

    #[test]
    fn test_unresolved_alert_gate() {
        let db = Db::open_in_memory().unwrap();
        db.upsert_item(&test_item("e1", 100)).unwrap();
        let entry = db.add_watchlist_entry("e1", 1, Some(150), None).unwrap();

        assert!(!db.has_unresolved_alert(entry.id).unwrap());
        let alert = db.insert_alert(entry.id, "e1", 100, 150).unwrap();
        assert!(!alert.is_read);
        assert!(!alert.is_resolved);
        assert!(db.has_unresolved_alert(entry.id).unwrap());

        db.resolve_alert(alert.id).unwrap();
        assert!(!db.has_unresolved_alert(entry.id).unwrap());
    }

    #[test]
    fn test_settings_interval_fallback() {
        let db = Db::open_in_memory().unwrap();
        assert_eq!(db.check_interval_minutes(), 5);

        db.set_settings(&[(CHECK_INTERVAL_KEY, "10")]).unwrap();
        assert_eq!(db.check_interval_minutes(), 10);

        db.set_settings(&[(CHECK_INTERVAL_KEY, "not-a-number")])
            .unwrap();
        assert_eq!(db.check_interval_minutes(), DEFAULT_INTERVAL_MINUTES);

        db.set_settings(&[(CHECK_INTERVAL_KEY, "0")]).unwrap();
        assert_eq!(db.check_interval_minutes(), DEFAULT_INTERVAL_MINUTES);

        db.set_settings(&[(CHECK_INTERVAL_KEY, "-3")]).unwrap();
        assert_eq!(db.check_interval_minutes(), DEFAULT_INTERVAL_MINUTES);

        // past u32 range, not truncated into some arbitrary interval
        db.set_settings(&[(CHECK_INTERVAL_KEY, "4294967296")]).unwrap();
        assert_eq!(db.check_interval_minutes(), DEFAULT_INTERVAL_MINUTES);
    }

    #[test]
    fn test_set_settings_batch() {
        let db = Db::open_in_memory().unwrap();
        db.set_settings(&[
            ("notification_type", "bark"),
            ("notification_config", r#"{"url":"https://api.day.app/tok"}"#),
        ])
        .unwrap();

        assert_eq!(
            db.get_setting("notification_type").unwrap().as_deref(),
            Some("bark")
        );
        let all = db.list_settings().unwrap();
        assert!(all.len() >= 3);
    }

    #[test]
    fn test_daily_price_summary_integers() {
        let db = Db::open_in_memory().unwrap();
        db.record_check(&test_item("e1", 100)).unwrap();
        db.record_check(&test_item("e1", 101)).unwrap();

        let points = db.daily_price_summary("e1", 7).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].min_price, 100);
        assert_eq!(points[0].max_price, 101);
        // integer cast, never a float
        assert_eq!(points[0].avg_price, 100);
    }
}
