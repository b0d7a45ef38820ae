//! HTTP marketplace client
//!
//! Owns upstream pacing: a shared last-request watermark forces a minimum
//! delay between calls, across every caller. List fetches go through the
//! aggregate endpoint with a legacy-shape fallback, and id lookup is a
//! bounded sweep over the category/page space.

use crate::db::models::{Item, ItemCategory};
use crate::error::{AppError, Result};
use crate::market::types::*;
use crate::market::{CategoryPage, ItemFilters, ListingPage, Marketplace};
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://yjwujian.cbg.163.com";
const DEFAULT_REQUEST_DELAY_MS: u64 = 1000;
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Cap on the id-lookup sweep: pages scanned per kind id. Tunable; keeps
/// `get_item_by_id` from walking the whole marketplace.
pub const MAX_LOOKUP_PAGES: u32 = 10;
/// Page size used during the id-lookup sweep
pub const LOOKUP_PAGE_SIZE: u32 = 20;

/// Marketplace HTTP client
pub struct MarketClient {
    http: Client,
    base_url: String,
    min_delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl MarketClient {
    /// Client against the default upstream, honoring `MARKET_BASE_URL` and
    /// `MARKET_REQUEST_DELAY_MS` overrides.
    pub fn new() -> Result<Self> {
        let base_url =
            std::env::var("MARKET_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let delay_ms = std::env::var("MARKET_REQUEST_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_REQUEST_DELAY_MS);
        Self::with_config(base_url, Duration::from_millis(delay_ms))
    }

    pub fn with_config(base_url: String, min_delay: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36")
            .build()?;

        Ok(Self {
            http,
            base_url,
            min_delay,
            last_request: Mutex::new(None),
        })
    }

    /// Wait out the minimum inter-request delay. The lock is held across
    /// the sleep so concurrent callers queue up behind the watermark.
    async fn wait_for_slot(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_delay {
                tokio::time::sleep(self.min_delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    fn page_session_id() -> String {
        uuid::Uuid::new_v4().to_string().to_uppercase()
    }

    fn list_params(
        kind_id: u32,
        page: u32,
        count: u32,
        filters: &Option<ItemFilters>,
    ) -> Vec<(String, String)> {
        let mut params = vec![
            ("client_type".to_string(), "h5".to_string()),
            ("count".to_string(), count.to_string()),
            ("page".to_string(), page.to_string()),
            ("order_by".to_string(), "selling_time DESC".to_string()),
            ("query_onsale".to_string(), "1".to_string()),
            ("kindid".to_string(), kind_id.to_string()),
            ("exter".to_string(), "direct".to_string()),
            ("page_session_id".to_string(), Self::page_session_id()),
        ];
        if let Some(filters) = filters {
            if let Some(keyword) = &filters.keyword {
                params.push(("keyword".to_string(), keyword.clone()));
            }
            if let Some(min) = filters.price_min {
                params.push(("price_min".to_string(), min.to_string()));
            }
            if let Some(max) = filters.price_max {
                params.push(("price_max".to_string(), max.to_string()));
            }
        }
        params
    }

    /// Legacy list shape, used when the aggregate endpoint misbehaves
    async fn get_items_by_category_legacy(
        &self,
        kind_id: u32,
        page: u32,
        count: u32,
        filters: &Option<ItemFilters>,
    ) -> Result<CategoryPage> {
        self.wait_for_slot().await;

        let url = format!("{}/cgi/api/get_aggregate_equip_type_list", self.base_url);
        let response: LegacyListResponse = self
            .http
            .get(&url)
            .query(&Self::list_params(kind_id, page, count, filters))
            .send()
            .await?
            .json()
            .await?;

        if !response.result {
            let message = response
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "Failed to fetch items".to_string());
            return Err(AppError::Market(message));
        }

        let data = response
            .data
            .ok_or_else(|| AppError::Market("list response missing data".to_string()))?;
        let items = data.equip_list.iter().map(item_from_legacy).collect();

        Ok(CategoryPage {
            items,
            total: data.total_count,
            page_count: data.page_count,
        })
    }

    /// Detail endpoint; absent or malformed detail reads as not-found
    async fn get_item_detail(&self, id: &str) -> Result<Option<Item>> {
        self.wait_for_slot().await;

        let url = format!("{}/cgi/api/get_equip_detail", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("client_type", "h5"),
                ("equipid", id),
                ("gameid", "2"),
            ])
            .send()
            .await;

        let parsed: DetailResponse = match response {
            Ok(resp) => match resp.json().await {
                Ok(parsed) => parsed,
                Err(e) => {
                    debug!("Item detail parse failed for {}: {}", id, e);
                    return Ok(None);
                }
            },
            Err(e) => {
                debug!("Item detail fetch failed for {}: {}", id, e);
                return Ok(None);
            }
        };

        if !parsed.result {
            return Ok(None);
        }
        Ok(parsed
            .data
            .and_then(|d| d.equip)
            .map(|equip| item_from_legacy(&equip)))
    }

    /// Scan one kind id's pages for a matching item, within the lookup cap
    async fn sweep_kind_for_item(&self, kind_id: u32, id: &str) -> Option<Item> {
        for page in 1..=MAX_LOOKUP_PAGES {
            let result = match self
                .get_items_by_category(kind_id, page, LOOKUP_PAGE_SIZE, None)
                .await
            {
                Ok(result) => result,
                Err(e) => {
                    warn!("Lookup sweep failed (kind {}, page {}): {}", kind_id, page, e);
                    return None;
                }
            };

            if let Some(found) = result.items.into_iter().find(|item| item.id == id) {
                return Some(found);
            }
            if page >= result.page_count {
                return None;
            }
        }
        None
    }
}

#[async_trait]
impl Marketplace for MarketClient {
    async fn get_item_by_id(&self, id: &str) -> Result<Option<Item>> {
        // Cheap path first
        if let Some(item) = self.get_item_detail(id).await? {
            return Ok(Some(item));
        }

        // Bounded sweep across every category's kind ids
        for category in [
            ItemCategory::HeroSkin,
            ItemCategory::WeaponSkin,
            ItemCategory::Item,
        ] {
            for &kind_id in category.kind_ids() {
                if let Some(item) = self.sweep_kind_for_item(kind_id, id).await {
                    return Ok(Some(item));
                }
            }
        }

        Ok(None)
    }

    async fn get_items_by_category(
        &self,
        kind_id: u32,
        page: u32,
        count: u32,
        filters: Option<ItemFilters>,
    ) -> Result<CategoryPage> {
        self.wait_for_slot().await;

        let url = format!("{}/cgi/api/get_aggregate_equip_type_list", self.base_url);
        let request = self
            .http
            .get(&url)
            .query(&Self::list_params(kind_id, page, count, &filters));

        // Aggregate shape first; any failure falls back to the legacy shape
        let aggregate: std::result::Result<AggregateResponse, _> = match request.send().await {
            Ok(resp) => resp.json().await,
            Err(e) => {
                debug!("Aggregate list fetch failed (kind {}): {}", kind_id, e);
                return self
                    .get_items_by_category_legacy(kind_id, page, count, &filters)
                    .await;
            }
        };

        match aggregate {
            Ok(response) if matches!(response.status, 0 | 1 | 200) => {
                let items = response
                    .equip_type_list
                    .iter()
                    .map(|summary| item_from_aggregate(summary, kind_id))
                    .collect();
                Ok(CategoryPage {
                    items,
                    total: response.count,
                    page_count: if response.is_last_page { page } else { page + 1 },
                })
            }
            Ok(response) => {
                debug!(
                    "Aggregate list bad status {} (kind {}), trying legacy shape",
                    response.status, kind_id
                );
                self.get_items_by_category_legacy(kind_id, page, count, &filters)
                    .await
            }
            Err(e) => {
                debug!("Aggregate list parse failed (kind {}): {}", kind_id, e);
                self.get_items_by_category_legacy(kind_id, page, count, &filters)
                    .await
            }
        }
    }

    async fn get_listings_by_type(
        &self,
        type_id: &str,
        search_type: &str,
        page: u32,
        count: u32,
        order_by: &str,
    ) -> Result<ListingPage> {
        self.wait_for_slot().await;

        let url = format!("{}/cgi-bin/recommend.py", self.base_url);
        let form = [
            ("client_type", "h5"),
            ("act", "recommd_by_role"),
            ("equip_type", type_id),
            ("search_type", search_type),
            ("page", &page.to_string()),
            ("count", &count.to_string()),
            ("order_by", order_by),
        ];

        let response: ListingResponse = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await?
            .json()
            .await?;

        if response.status != 1 {
            return Err(AppError::Market(format!(
                "listing fetch failed: {}",
                response.status_code.unwrap_or_default()
            )));
        }

        let items = response
            .result
            .iter()
            .map(|raw| item_from_listing(raw, search_type))
            .collect();

        Ok(ListingPage {
            items,
            is_last_page: response.paging.is_last_page,
        })
    }
}
