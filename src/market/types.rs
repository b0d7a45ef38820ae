//! Upstream wire types and transforms to the cached item model

use crate::db::models::{Item, ItemCategory, ItemRarity, ItemStatus};
use serde::{Deserialize, Deserializer};

// ============================================================================
// Flexible Deserialization Helpers
// ============================================================================

/// Deserialize an id that could be either a string or an integer
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrInt {
        String(String),
        Int(i64),
    }

    match StringOrInt::deserialize(deserializer)? {
        StringOrInt::String(s) => Ok(s),
        StringOrInt::Int(i) => Ok(i.to_string()),
    }
}

/// Deserialize a value that could be either a string or an integer
pub(crate) fn deserialize_string_or_int<'de, D>(
    deserializer: D,
) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrInt {
        String(String),
        Int(i64),
    }

    match StringOrInt::deserialize(deserializer)? {
        StringOrInt::String(s) => s.parse().map_err(serde::de::Error::custom),
        StringOrInt::Int(i) => Ok(i),
    }
}

/// Deserialize a flag that could be a bool or a 0/1 integer
pub(crate) fn deserialize_bool_or_int<'de, D>(
    deserializer: D,
) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrInt {
        Bool(bool),
        Int(i64),
    }

    match BoolOrInt::deserialize(deserializer)? {
        BoolOrInt::Bool(b) => Ok(b),
        BoolOrInt::Int(i) => Ok(i != 0),
    }
}

// ============================================================================
// Aggregate API Response Types
// ============================================================================

/// One equip type summary from the aggregate list endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct EquipTypeSummary {
    #[serde(deserialize_with = "deserialize_id")]
    pub equip_type: String,
    pub equip_type_name: String,
    #[serde(default)]
    pub equip_type_desc: String,
    pub min_price: i64,
    #[serde(default)]
    pub selling_count: i64,
    #[serde(default)]
    pub equip_type_list_img_url: Option<String>,
    #[serde(default)]
    pub equip_type_capture_url: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct AggregateResponse {
    #[serde(deserialize_with = "deserialize_string_or_int")]
    pub status: i64,
    #[serde(default)]
    pub equip_type_list: Vec<EquipTypeSummary>,
    #[serde(default)]
    pub count: i64,
    #[serde(default, deserialize_with = "deserialize_bool_or_int")]
    pub is_last_page: bool,
}

// ============================================================================
// Legacy List / Detail Response Types
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BaseEquipInfo {
    #[serde(default)]
    pub rarity: i64,
    #[serde(default)]
    pub star_grid: Vec<i64>,
    #[serde(default)]
    pub serial_num: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyItem {
    #[serde(deserialize_with = "deserialize_id")]
    pub equipid: String,
    #[serde(default)]
    pub kindid: u32,
    pub equip_name: String,
    pub unit_price: i64,
    #[serde(default)]
    pub seller_name: Option<String>,
    #[serde(default)]
    pub is_draw: i64,
    #[serde(default)]
    pub collect_count: i64,
    #[serde(default)]
    pub base_equip_info: Option<BaseEquipInfo>,
    #[serde(default)]
    pub game_ordersn: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LegacyListData {
    #[serde(default)]
    pub equip_list: Vec<LegacyItem>,
    #[serde(default)]
    pub total_count: i64,
    #[serde(default)]
    pub page_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct LegacyError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct LegacyListResponse {
    pub result: bool,
    #[serde(default)]
    pub data: Option<LegacyListData>,
    #[serde(default)]
    pub error: Option<LegacyError>,
}

#[derive(Debug, Deserialize)]
pub struct DetailData {
    #[serde(default)]
    pub equip: Option<LegacyItem>,
}

#[derive(Debug, Deserialize)]
pub struct DetailResponse {
    pub result: bool,
    #[serde(default)]
    pub data: Option<DetailData>,
}

// ============================================================================
// Listing (recommend) Response Types
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariationInfo {
    #[serde(default)]
    pub variation_quality: String,
    #[serde(default)]
    pub red_star_num: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingOtherInfo {
    #[serde(default)]
    pub basic_attrs: Vec<String>,
    #[serde(default)]
    pub capture_url: Option<Vec<String>>,
    #[serde(default)]
    pub variation_info: Option<VariationInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingItem {
    #[serde(deserialize_with = "deserialize_id")]
    pub equipid: String,
    pub format_equip_name: String,
    /// Minor currency units
    pub price: i64,
    #[serde(default)]
    pub collect_num: i64,
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub game_ordersn: Option<String>,
    #[serde(default)]
    pub other_info: Option<ListingOtherInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ListingPaging {
    #[serde(default, deserialize_with = "deserialize_bool_or_int")]
    pub is_last_page: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListingResponse {
    #[serde(deserialize_with = "deserialize_string_or_int")]
    pub status: i64,
    #[serde(default)]
    pub status_code: Option<String>,
    #[serde(default)]
    pub result: Vec<ListingItem>,
    pub paging: ListingPaging,
}

// ============================================================================
// Transforms
// ============================================================================

/// Map an upstream kind id to a category
pub fn category_from_kind_id(kind_id: u32) -> ItemCategory {
    match kind_id {
        3 => ItemCategory::HeroSkin,
        4 => ItemCategory::WeaponSkin,
        _ => ItemCategory::Item,
    }
}

/// Map a search type string to a category
pub fn category_from_search_type(search_type: &str) -> ItemCategory {
    match search_type {
        "1" | "role_skin" | "hero" => ItemCategory::HeroSkin,
        "2" | "weapon_skin" | "weapon" => ItemCategory::WeaponSkin,
        _ => ItemCategory::Item,
    }
}

const STAR_GRID_SLOTS: usize = 4;

/// Pad a raw slot quality list out to the four-slot grid
pub(crate) fn star_grid_from_slots(slots: &[i64]) -> Vec<Option<i64>> {
    let mut grid: Vec<Option<i64>> = slots.iter().copied().map(Some).collect();
    grid.truncate(STAR_GRID_SLOTS);
    grid.resize(STAR_GRID_SLOTS, None);
    grid
}

/// Parse a quality string like "5-5-3-1" into the four-slot grid.
/// Missing, zero, or unparsable segments read as empty slots.
pub(crate) fn star_grid_from_quality(quality: &str) -> Vec<Option<i64>> {
    let mut grid: Vec<Option<i64>> = quality
        .split('-')
        .map(|part| part.trim().parse::<i64>().ok().filter(|&q| q > 0))
        .collect();
    grid.truncate(STAR_GRID_SLOTS);
    grid.resize(STAR_GRID_SLOTS, None);
    grid
}

/// Pull rarity and a hero name out of the pipe-separated type description,
/// e.g. "红 | 殷紫萍". Rarity markers are upstream-language tokens.
pub(crate) fn parse_type_desc(desc: &str) -> (ItemRarity, Option<String>) {
    let parts: Vec<&str> = desc.split('|').map(str::trim).filter(|p| !p.is_empty()).collect();

    let rarity = if desc.contains('红') {
        ItemRarity::Red
    } else {
        ItemRarity::Gold
    };

    let rarity_token = |p: &str| matches!(p, "红" | "金" | "红色" | "金色");
    let hero = match parts.as_slice() {
        [first, second, ..] if rarity_token(first) => Some((*second).to_string()),
        [first, ..] if !rarity_token(first) => Some((*first).to_string()),
        _ => None,
    };

    (rarity, hero)
}

/// Build an `Item` from an aggregate equip type summary
pub fn item_from_aggregate(summary: &EquipTypeSummary, kind_id: u32) -> Item {
    let (rarity, hero) = parse_type_desc(&summary.equip_type_desc);

    Item {
        id: summary.equip_type.clone(),
        name: summary.equip_type_name.clone(),
        image_url: summary.equip_type_list_img_url.clone(),
        capture_urls: summary.equip_type_capture_url.clone().unwrap_or_default(),
        serial_num: None,
        category: category_from_kind_id(kind_id),
        rarity,
        hero,
        weapon: None,
        star_grid: vec![None; STAR_GRID_SLOTS],
        current_price: summary.min_price,
        seller_name: None,
        status: ItemStatus::Normal,
        collect_count: summary.selling_count,
        last_checked_at: None,
        created_at: None,
        updated_at: None,
    }
}

/// Build an `Item` from a legacy list or detail row
pub fn item_from_legacy(raw: &LegacyItem) -> Item {
    let base = raw.base_equip_info.clone().unwrap_or_default();

    Item {
        id: raw.equipid.clone(),
        name: raw.equip_name.clone(),
        image_url: None,
        capture_urls: vec![],
        serial_num: base.serial_num,
        category: category_from_kind_id(raw.kindid),
        rarity: if base.rarity == 1 {
            ItemRarity::Red
        } else {
            ItemRarity::Gold
        },
        hero: None,
        weapon: None,
        star_grid: star_grid_from_slots(&base.star_grid),
        current_price: raw.unit_price,
        seller_name: raw.seller_name.clone(),
        status: if raw.is_draw == 1 {
            ItemStatus::Draw
        } else {
            ItemStatus::Normal
        },
        collect_count: raw.collect_count,
        last_checked_at: None,
        created_at: None,
        updated_at: None,
    }
}

/// Build an `Item` from an individual sale listing
pub fn item_from_listing(raw: &ListingItem, search_type: &str) -> Item {
    let other = raw.other_info.clone().unwrap_or_default();

    // Serial number hides in basic_attrs, e.g. "编号: Y001573"
    let serial_num = other
        .basic_attrs
        .iter()
        .find(|attr| attr.contains("编号"))
        .and_then(|attr| attr.split(':').nth(1))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let rarity = match &other.variation_info {
        Some(v) if v.red_star_num > 0 => ItemRarity::Red,
        _ => ItemRarity::Gold,
    };

    let star_grid = star_grid_from_quality(
        other
            .variation_info
            .as_ref()
            .map(|v| v.variation_quality.as_str())
            .unwrap_or(""),
    );

    Item {
        id: raw.equipid.clone(),
        name: raw.format_equip_name.clone(),
        image_url: other.capture_url.as_ref().and_then(|u| u.first().cloned()),
        capture_urls: other.capture_url.unwrap_or_default(),
        serial_num,
        category: category_from_search_type(search_type),
        rarity,
        hero: None,
        weapon: None,
        star_grid,
        current_price: raw.price,
        seller_name: None,
        status: if raw.status == 2 {
            ItemStatus::Normal
        } else {
            ItemStatus::Sold
        },
        collect_count: raw.collect_num,
        last_checked_at: None,
        created_at: None,
        updated_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_parse_with_int_ids() {
        let json = r#"{
            "status": 1,
            "equip_type_list": [{
                "equip_type": 3402116,
                "equip_type_name": "通天狐妖",
                "equip_type_desc": "红 | 殷紫萍",
                "min_price": 128800,
                "selling_count": 12,
                "equip_type_list_img_url": "https://img.example/x.png",
                "equip_type_capture_url": ["https://img.example/1.png"]
            }],
            "count": 12,
            "is_last_page": 1
        }"#;

        let resp: AggregateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.status, 1);
        assert!(resp.is_last_page);

        let item = item_from_aggregate(&resp.equip_type_list[0], 3);
        assert_eq!(item.id, "3402116");
        assert_eq!(item.category, ItemCategory::HeroSkin);
        assert_eq!(item.rarity, ItemRarity::Red);
        assert_eq!(item.hero.as_deref(), Some("殷紫萍"));
        assert_eq!(item.current_price, 128800);
        assert_eq!(item.status, ItemStatus::Normal);
    }

    #[test]
    fn test_legacy_parse_draw_status() {
        let json = r#"{
            "result": true,
            "data": {
                "equip_list": [{
                    "equipid": "abc123",
                    "kindid": 4,
                    "equip_name": "雾切之回光",
                    "unit_price": 56000,
                    "seller_name": "seller",
                    "is_draw": 1,
                    "collect_count": 3,
                    "base_equip_info": {"rarity": 2, "star_grid": [5, 5, 3], "serial_num": "W0042"}
                }],
                "total_count": 1,
                "page_count": 1
            }
        }"#;

        let resp: LegacyListResponse = serde_json::from_str(json).unwrap();
        let data = resp.data.unwrap();
        let item = item_from_legacy(&data.equip_list[0]);
        assert_eq!(item.category, ItemCategory::WeaponSkin);
        assert_eq!(item.rarity, ItemRarity::Gold);
        assert_eq!(item.status, ItemStatus::Draw);
        assert_eq!(item.serial_num.as_deref(), Some("W0042"));
        // three known slot qualities pad out to the four-slot grid
        assert_eq!(item.star_grid, vec![Some(5), Some(5), Some(3), None]);
    }

    #[test]
    fn test_listing_parse_serial_and_sold() {
        let json = r#"{
            "status": 1,
            "result": [{
                "equipid": 99001,
                "format_equip_name": "通天狐妖·谪星",
                "price": 99900,
                "collect_num": 7,
                "status": 1,
                "other_info": {
                    "basic_attrs": ["编号: Y001573"],
                    "variation_info": {"variation_quality": "5-5-3-1", "red_star_num": 2}
                }
            }],
            "paging": {"is_last_page": true}
        }"#;

        let resp: ListingResponse = serde_json::from_str(json).unwrap();
        assert!(resp.paging.is_last_page);

        let item = item_from_listing(&resp.result[0], "role_skin");
        assert_eq!(item.id, "99001");
        assert_eq!(item.serial_num.as_deref(), Some("Y001573"));
        assert_eq!(item.rarity, ItemRarity::Red);
        assert_eq!(item.star_grid, vec![Some(5), Some(5), Some(3), Some(1)]);
        // listing status 2 is on sale, everything else reads as sold
        assert_eq!(item.status, ItemStatus::Sold);
        assert_eq!(item.category, ItemCategory::HeroSkin);
    }

    #[test]
    fn test_parse_type_desc_variants() {
        let (rarity, hero) = parse_type_desc("红 | 殷紫萍");
        assert_eq!(rarity, ItemRarity::Red);
        assert_eq!(hero.as_deref(), Some("殷紫萍"));

        let (rarity, hero) = parse_type_desc("金 | 阔刀");
        assert_eq!(rarity, ItemRarity::Gold);
        assert_eq!(hero.as_deref(), Some("阔刀"));

        let (rarity, hero) = parse_type_desc("");
        assert_eq!(rarity, ItemRarity::Gold);
        assert!(hero.is_none());
    }

    #[test]
    fn test_star_grid_from_quality_edge_cases() {
        assert_eq!(
            star_grid_from_quality("5-5-3-1"),
            vec![Some(5), Some(5), Some(3), Some(1)]
        );
        // zero and junk segments read as empty slots
        assert_eq!(
            star_grid_from_quality("5-0-x"),
            vec![Some(5), None, None, None]
        );
        assert_eq!(star_grid_from_quality(""), vec![None, None, None, None]);
    }

    #[test]
    fn test_kind_id_mapping() {
        assert_eq!(category_from_kind_id(3), ItemCategory::HeroSkin);
        assert_eq!(category_from_kind_id(4), ItemCategory::WeaponSkin);
        assert_eq!(category_from_kind_id(5), ItemCategory::Item);
        assert_eq!(category_from_kind_id(6), ItemCategory::Item);
        assert_eq!(category_from_kind_id(99), ItemCategory::Item);
    }
}
