//! Item cache access

use crate::db::models::{Item, ItemCategory, ItemRarity, ItemStatus};
use crate::error::Result;
use rusqlite::{params, Connection, Row};

const ITEM_COLUMNS: &str = "id, name, image_url, capture_urls, serial_num, category, rarity, \
     hero, weapon, star_grid, current_price, seller_name, status, collect_count, \
     last_checked_at, created_at, updated_at";

pub(crate) fn item_from_row(row: &Row) -> rusqlite::Result<Item> {
    let capture_urls: String = row.get(3)?;
    let category: String = row.get(5)?;
    let rarity: String = row.get(6)?;
    let star_grid: String = row.get(9)?;
    let status: String = row.get(12)?;

    Ok(Item {
        id: row.get(0)?,
        name: row.get(1)?,
        image_url: row.get(2)?,
        capture_urls: serde_json::from_str(&capture_urls).unwrap_or_default(),
        serial_num: row.get(4)?,
        category: ItemCategory::parse(&category),
        rarity: ItemRarity::parse(&rarity),
        hero: row.get(7)?,
        weapon: row.get(8)?,
        star_grid: serde_json::from_str(&star_grid).unwrap_or_default(),
        current_price: row.get(10)?,
        seller_name: row.get(11)?,
        status: ItemStatus::parse(&status),
        collect_count: row.get(13)?,
        last_checked_at: row.get(14)?,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

/// Insert or refresh the cached row for an item.
///
/// On conflict the snapshot fields are overwritten and `last_checked_at`
/// is bumped; `created_at` is preserved.
pub fn upsert_item(conn: &Connection, item: &Item) -> Result<()> {
    conn.execute(
        "INSERT INTO items (id, name, image_url, capture_urls, serial_num, category, rarity, \
                            hero, weapon, star_grid, current_price, seller_name, status, \
                            collect_count, last_checked_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, datetime('now'), datetime('now'))
         ON CONFLICT(id) DO UPDATE SET
             name = excluded.name,
             image_url = excluded.image_url,
             capture_urls = excluded.capture_urls,
             current_price = excluded.current_price,
             seller_name = excluded.seller_name,
             status = excluded.status,
             collect_count = excluded.collect_count,
             last_checked_at = datetime('now'),
             updated_at = datetime('now')",
        params![
            item.id,
            item.name,
            item.image_url,
            serde_json::to_string(&item.capture_urls)?,
            item.serial_num,
            item.category.as_str(),
            item.rarity.as_str(),
            item.hero,
            item.weapon,
            serde_json::to_string(&item.star_grid)?,
            item.current_price,
            item.seller_name,
            item.status.as_str(),
            item.collect_count,
        ],
    )?;
    Ok(())
}

/// Get a cached item by id
pub fn get_item(conn: &Connection, id: &str) -> Result<Option<Item>> {
    let mut stmt = conn.prepare(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?"))?;
    let mut rows = stmt.query_map([id], item_from_row)?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

/// List cached items, newest first
pub fn list_items(conn: &Connection, limit: u32) -> Result<Vec<Item>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM items ORDER BY updated_at DESC LIMIT ?"
    ))?;
    let rows = stmt.query_map([limit], item_from_row)?;
    let mut items = Vec::new();
    for row in rows {
        items.push(row?);
    }
    Ok(items)
}
