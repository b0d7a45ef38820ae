//! Watchlist scan pass

use crate::db::models::Item;
use crate::db::Db;
use crate::error::Result;
use crate::market::Marketplace;
use crate::monitor::alerts;
use crate::notify::Notifier;
use std::sync::Arc;
use tracing::{debug, warn};

/// Check one item: fetch the current upstream state, and on success
/// refresh the cache and append a price snapshot in one transaction.
///
/// `Ok(None)` (id not found upstream) leaves the store untouched, as does
/// any fetch error.
pub(crate) async fn check_item(
    db: &Db,
    market: &dyn Marketplace,
    item_id: &str,
) -> Result<Option<Item>> {
    let item = market.get_item_by_id(item_id).await?;
    if let Some(item) = &item {
        db.record_check(item)?;
    }
    Ok(item)
}

/// One full scan pass: re-check every alert-enabled watchlist item
/// sequentially, then run one alert engine evaluation.
///
/// The loop is deliberately serial; the marketplace client's request
/// watermark assumes one upstream call at a time. A failed item is logged
/// and skipped. The alert pass always runs, even when every check failed,
/// so cached prices are still re-evaluated against current targets.
///
/// Returns the number of items successfully checked.
pub async fn scan_once(
    db: &Arc<Db>,
    market: &Arc<dyn Marketplace>,
    notifier: &Arc<Notifier>,
) -> Result<usize> {
    let item_ids = db.tracked_item_ids()?;
    debug!("Scanning {} watchlist items", item_ids.len());

    let mut checked = 0;
    for item_id in &item_ids {
        match check_item(db, market.as_ref(), item_id).await {
            Ok(Some(_)) => checked += 1,
            Ok(None) => warn!("Item {} not found upstream", item_id),
            Err(e) => warn!("Failed to check item {}: {}", item_id, e),
        }
    }

    let new_alerts = alerts::evaluate(db, notifier)?;
    debug!(
        "Scan pass done: {}/{} items checked, {} new alerts",
        checked,
        item_ids.len(),
        new_alerts.len()
    );

    Ok(checked)
}
