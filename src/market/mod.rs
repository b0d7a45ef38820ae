//! Marketplace client module

pub mod client;
pub mod types;

pub use client::MarketClient;

use crate::db::models::Item;
use crate::error::Result;
use async_trait::async_trait;

/// Search filters for category listings
#[derive(Debug, Clone, Default)]
pub struct ItemFilters {
    pub keyword: Option<String>,
    /// Minor currency units
    pub price_min: Option<i64>,
    /// Minor currency units
    pub price_max: Option<i64>,
}

/// One page of a category listing
#[derive(Debug, Clone)]
pub struct CategoryPage {
    pub items: Vec<Item>,
    pub total: i64,
    pub page_count: u32,
}

/// One page of per-listing results for an item type
#[derive(Debug, Clone)]
pub struct ListingPage {
    pub items: Vec<Item>,
    pub is_last_page: bool,
}

/// Upstream marketplace interface.
///
/// Implementations own rate limiting and format fallback; callers treat
/// every method as fallible per call.
#[async_trait]
pub trait Marketplace: Send + Sync {
    /// Resolve a single item by its upstream id. `Ok(None)` means the id
    /// could not be found within the bounded lookup budget.
    async fn get_item_by_id(&self, id: &str) -> Result<Option<Item>>;

    /// List items for one upstream kind id
    async fn get_items_by_category(
        &self,
        kind_id: u32,
        page: u32,
        count: u32,
        filters: Option<ItemFilters>,
    ) -> Result<CategoryPage>;

    /// Individual sale listings for an aggregate item type
    async fn get_listings_by_type(
        &self,
        type_id: &str,
        search_type: &str,
        page: u32,
        count: u32,
        order_by: &str,
    ) -> Result<ListingPage>;
}
