//! Alert engine

use crate::db::models::Alert;
use crate::db::{Db, QualifyingEntry};
use crate::error::Result;
use crate::notify::{format_price, Notifier};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// One evaluation pass over the watchlist.
///
/// Every alert-enabled entry with a target and a cached price at or below
/// it gets exactly one unresolved alert; entries that already have one are
/// skipped, so repeated passes with unchanged data create nothing new.
/// Notification dispatch is spawned fire-and-forget and never affects the
/// alert row. Per-entry store failures are logged and the pass continues.
pub fn evaluate(db: &Arc<Db>, notifier: &Arc<Notifier>) -> Result<Vec<Alert>> {
    let candidates = db.qualifying_entries()?;

    let mut new_alerts = Vec::new();
    for entry in candidates {
        match trigger_entry(db, notifier, &entry) {
            Ok(Some(alert)) => new_alerts.push(alert),
            Ok(None) => {}
            Err(e) => warn!(
                "Alert evaluation failed for watchlist entry {}: {}",
                entry.watchlist_id, e
            ),
        }
    }

    if !new_alerts.is_empty() {
        info!("Triggered {} new alerts", new_alerts.len());
    }
    Ok(new_alerts)
}

fn trigger_entry(
    db: &Arc<Db>,
    notifier: &Arc<Notifier>,
    entry: &QualifyingEntry,
) -> Result<Option<Alert>> {
    // Dedup gate: one unresolved alert per entry. Resolution re-arms.
    if db.has_unresolved_alert(entry.watchlist_id)? {
        return Ok(None);
    }

    let alert = db.insert_alert(
        entry.watchlist_id,
        &entry.item_id,
        entry.item_current_price,
        entry.target_price,
    )?;

    let title = "Price alert".to_string();
    let body = format!(
        "{} dropped to ¥{}, below target ¥{}",
        entry.item_name,
        format_price(entry.item_current_price),
        format_price(entry.target_price)
    );
    let data = json!({ "alertId": alert.id, "itemId": entry.item_id });

    // Best-effort dispatch; the alert row is already committed
    let notifier = notifier.clone();
    tokio::spawn(async move {
        notifier.send(&title, &body, data).await;
    });

    Ok(Some(alert))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::support::{fixture, track_item};

    #[tokio::test]
    async fn test_pass_is_idempotent() {
        let f = fixture();
        let entry_id = track_item(&f, "e1", 30000, Some(35000));

        let first = evaluate(&f.db, &f.notifier).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].watchlist_id, entry_id);
        assert_eq!(first[0].triggered_price, 30000);
        assert_eq!(first[0].target_price, 35000);
        assert!(!first[0].is_read);
        assert!(!first[0].is_resolved);

        // same data, second pass: nothing new
        let second = evaluate(&f.db, &f.notifier).unwrap();
        assert!(second.is_empty());
        assert_eq!(f.db.list_alerts(false).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resolution_rearms_entry() {
        let f = fixture();
        track_item(&f, "e1", 30000, Some(35000));

        let first = evaluate(&f.db, &f.notifier).unwrap();
        assert_eq!(first.len(), 1);
        f.db.resolve_alert(first[0].id).unwrap();

        // price never left the qualifying range; resolution alone re-arms
        let second = evaluate(&f.db, &f.notifier).unwrap();
        assert_eq!(second.len(), 1);
        assert_ne!(second[0].id, first[0].id);

        let open: Vec<_> = f
            .db
            .list_alerts(false)
            .unwrap()
            .into_iter()
            .filter(|a| !a.is_resolved)
            .collect();
        assert_eq!(open.len(), 1);
    }

    #[tokio::test]
    async fn test_only_qualifying_entries_fire() {
        let f = fixture();
        track_item(&f, "above", 40000, Some(35000)); // price above target
        track_item(&f, "no_target", 100, None); // no target set
        let disabled = track_item(&f, "disabled", 100, Some(200));
        f.db.update_watchlist_entry(disabled, None, Some(false), None, None)
            .unwrap();
        let hit = track_item(&f, "hit", 35000, Some(35000)); // equality qualifies

        let alerts = evaluate(&f.db, &f.notifier).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].watchlist_id, hit);
    }

    #[tokio::test]
    async fn test_read_but_unresolved_still_gates() {
        let f = fixture();
        track_item(&f, "e1", 100, Some(200));

        let first = evaluate(&f.db, &f.notifier).unwrap();
        f.db.mark_alert_read(first[0].id).unwrap();

        // reading an alert does not re-arm; only resolution does
        let second = evaluate(&f.db, &f.notifier).unwrap();
        assert!(second.is_empty());
    }
}
