//! Monitoring core
//!
//! A scheduled scan pass re-checks every alert-enabled watchlist item,
//! persists price history, and hands off to the alert engine.

mod alerts;
mod scanner;
mod scheduler;

pub use scanner::scan_once;
pub use scheduler::{CheckOutcome, Monitor, MonitorStatus};

#[cfg(test)]
pub(crate) mod support {
    use crate::db::models::{Item, ItemCategory, ItemRarity, ItemStatus};
    use crate::db::Db;
    use crate::error::{AppError, Result};
    use crate::market::{CategoryPage, ItemFilters, ListingPage, Marketplace};
    use crate::notify::Notifier;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Scripted marketplace: fixed prices per id, optional failures and
    /// per-fetch latency
    pub struct MockMarket {
        prices: Mutex<HashMap<String, i64>>,
        failing: Mutex<HashSet<String>>,
        fetch_delay: Mutex<Option<std::time::Duration>>,
        pub calls: AtomicUsize,
    }

    impl MockMarket {
        pub fn new() -> Self {
            Self {
                prices: Mutex::new(HashMap::new()),
                failing: Mutex::new(HashSet::new()),
                fetch_delay: Mutex::new(None),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn set_price(&self, id: &str, price: i64) {
            self.prices.lock().insert(id.to_string(), price);
        }

        pub fn fail_for(&self, id: &str) {
            self.failing.lock().insert(id.to_string());
        }

        pub fn set_fetch_delay(&self, delay: std::time::Duration) {
            *self.fetch_delay.lock() = Some(delay);
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Marketplace for MockMarket {
        async fn get_item_by_id(&self, id: &str) -> Result<Option<Item>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = *self.fetch_delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.failing.lock().contains(id) {
                return Err(AppError::Market(format!("upstream failed for {}", id)));
            }
            Ok(self.prices.lock().get(id).map(|&price| Item {
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
            }))
        }

        async fn get_items_by_category(
            &self,
            _kind_id: u32,
            page: u32,
            _count: u32,
            _filters: Option<ItemFilters>,
        ) -> Result<CategoryPage> {
            Ok(CategoryPage {
                items: vec![],
                total: 0,
                page_count: page,
            })
        }

        async fn get_listings_by_type(
            &self,
            _type_id: &str,
            _search_type: &str,
            _page: u32,
            _count: u32,
            _order_by: &str,
        ) -> Result<ListingPage> {
            Ok(ListingPage {
                items: vec![],
                is_last_page: true,
            })
        }
    }

    pub struct Fixture {
        pub db: Arc<Db>,
        pub market: Arc<MockMarket>,
        pub notifier: Arc<Notifier>,
    }

    /// In-memory store, scripted market, unconfigured (log-only) notifier
    pub fn fixture() -> Fixture {
        let db = Arc::new(Db::open_in_memory().unwrap());
        let market = Arc::new(MockMarket::new());
        let notifier = Arc::new(Notifier::new(db.clone()).unwrap());
        Fixture {
            db,
            market,
            notifier,
        }
    }

    /// Seed a cached item plus a watchlist entry tracking it
    pub fn track_item(fixture: &Fixture, id: &str, cached_price: i64, target: Option<i64>) -> i64 {
        let item = Item {
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
            current_price: cached_price,
            seller_name: None,
            status: ItemStatus::Normal,
            collect_count: 0,
            last_checked_at: None,
            created_at: None,
            updated_at: None,
        };
        fixture.db.upsert_item(&item).unwrap();
        fixture
            .db
            .add_watchlist_entry(id, 1, target, None)
            .unwrap()
            .id
    }
}
