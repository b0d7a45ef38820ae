//! Scan scheduler
//!
//! Owns the single recurring timer driving scan passes. At most one timer
//! exists at a time; `start` while running is a no-op.

use crate::db::Db;
use crate::market::Marketplace;
use crate::monitor::scanner;
use crate::notify::Notifier;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Scheduler status report
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    pub running: bool,
    pub interval_minutes: u32,
}

/// Result of an on-demand scan
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub success: bool,
    pub checked_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

struct ActiveTimer {
    handle: JoinHandle<()>,
    /// Interval the timer was created with; setting changes need a restart
    interval_minutes: u32,
}

/// Price monitor controller
pub struct Monitor {
    db: Arc<Db>,
    market: Arc<dyn Marketplace>,
    notifier: Arc<Notifier>,
    timer: Mutex<Option<ActiveTimer>>,
}

impl Monitor {
    pub fn new(db: Arc<Db>, market: Arc<dyn Marketplace>, notifier: Arc<Notifier>) -> Self {
        Self {
            db,
            market,
            notifier,
            timer: Mutex::new(None),
        }
    }

    /// Start the recurring scan. Reads the interval from settings, runs one
    /// pass immediately, then repeats every interval. No-op when already
    /// running.
    pub fn start(&self) {
        let mut timer = self.timer.lock();
        if timer.is_some() {
            info!("Monitor already running");
            return;
        }

        let interval_minutes = self.db.check_interval_minutes();
        let db = self.db.clone();
        let market = self.market.clone();
        let notifier = self.notifier.clone();

        let handle = tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(Duration::from_secs(interval_minutes as u64 * 60));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                // first tick fires immediately: run-on-init
                ticker.tick().await;
                // each pass gets its own task: aborting the timer only
                // suppresses future ticks, a scan already underway finishes
                let db = db.clone();
                let market = market.clone();
                let notifier = notifier.clone();
                tokio::spawn(async move {
                    match scanner::scan_once(&db, &market, &notifier).await {
                        Ok(checked) => debug!("Scheduled scan checked {} items", checked),
                        Err(e) => warn!("Scheduled scan failed: {}", e),
                    }
                });
            }
        });

        *timer = Some(ActiveTimer {
            handle,
            interval_minutes,
        });
        info!("Monitor started (checking every {} minutes)", interval_minutes);
    }

    /// Cancel the timer. Future ticks stop; a scan pass already in flight
    /// runs to completion on its own task. No-op when already stopped.
    pub fn stop(&self) {
        let mut timer = self.timer.lock();
        if let Some(active) = timer.take() {
            active.handle.abort();
            info!("Monitor stopped");
        }
    }

    /// Stop then start, picking up a changed interval without a process
    /// restart.
    pub fn restart(&self) {
        self.stop();
        self.start();
    }

    /// Whether the timer is running, and the effective interval: the
    /// running timer's interval, or the currently configured setting when
    /// stopped.
    pub fn status(&self) -> MonitorStatus {
        let timer = self.timer.lock();
        match timer.as_ref() {
            Some(active) => MonitorStatus {
                running: true,
                interval_minutes: active.interval_minutes,
            },
            None => MonitorStatus {
                running: false,
                interval_minutes: self.db.check_interval_minutes(),
            },
        }
    }

    /// Run one scan pass immediately, independent of the recurring
    /// schedule. Per-item failures only lower the count; a top-level store
    /// failure surfaces as `success: false`.
    pub async fn check_now(&self) -> CheckOutcome {
        match scanner::scan_once(&self.db, &self.market, &self.notifier).await {
            Ok(checked_count) => CheckOutcome {
                success: true,
                checked_count,
                error: None,
            },
            Err(e) => CheckOutcome {
                success: false,
                checked_count: 0,
                error: Some(e.to_string()),
            },
        }
    }
}
