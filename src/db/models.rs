//! Database models

use serde::{Deserialize, Serialize};

/// Item category on the marketplace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    HeroSkin,
    WeaponSkin,
    Item,
}

impl ItemCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemCategory::HeroSkin => "hero_skin",
            ItemCategory::WeaponSkin => "weapon_skin",
            ItemCategory::Item => "item",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "hero_skin" => ItemCategory::HeroSkin,
            "weapon_skin" => ItemCategory::WeaponSkin,
            _ => ItemCategory::Item,
        }
    }

    /// Upstream kind ids backing this category
    pub fn kind_ids(&self) -> &'static [u32] {
        match self {
            ItemCategory::HeroSkin => &[3],
            ItemCategory::WeaponSkin => &[4],
            ItemCategory::Item => &[5, 6],
        }
    }
}

/// Item rarity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemRarity {
    Gold,
    Red,
}

impl ItemRarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemRarity::Gold => "gold",
            ItemRarity::Red => "red",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "red" => ItemRarity::Red,
            _ => ItemRarity::Gold,
        }
    }
}

/// Listing status of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Normal,
    Draw,
    Sold,
    Delisted,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Normal => "normal",
            ItemStatus::Draw => "draw",
            ItemStatus::Sold => "sold",
            ItemStatus::Delisted => "delisted",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "draw" => ItemStatus::Draw,
            "sold" => ItemStatus::Sold,
            "delisted" => ItemStatus::Delisted,
            _ => ItemStatus::Normal,
        }
    }
}

/// Cached mirror of an upstream marketplace item.
///
/// Prices are integer minor currency units (cents); timestamps are SQLite
/// `CURRENT_TIMESTAMP` text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub capture_urls: Vec<String>,
    pub serial_num: Option<String>,
    pub category: ItemCategory,
    pub rarity: ItemRarity,
    pub hero: Option<String>,
    pub weapon: Option<String>,
    /// Star slot qualities, four slots, unknown slots are `None`
    pub star_grid: Vec<Option<i64>>,
    pub current_price: i64,
    pub seller_name: Option<String>,
    pub status: ItemStatus,
    pub collect_count: i64,
    pub last_checked_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Watchlist group model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistGroup {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub sort_order: i64,
    pub created_at: String,
}

/// Watchlist entry model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub id: i64,
    pub item_id: String,
    pub group_id: i64,
    pub target_price: Option<i64>,
    pub alert_enabled: bool,
    pub notes: Option<String>,
    pub added_at: String,
}

/// Append-only price history row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub id: i64,
    pub item_id: String,
    pub price: i64,
    pub status: Option<ItemStatus>,
    pub checked_at: String,
}

/// Per-day price aggregate for an item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPricePoint {
    pub date: String,
    pub avg_price: i64,
    pub min_price: i64,
    pub max_price: i64,
}

/// Target-price crossing record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub watchlist_id: i64,
    pub item_id: String,
    pub triggered_price: i64,
    pub target_price: i64,
    pub triggered_at: String,
    pub is_read: bool,
    pub is_resolved: bool,
}
