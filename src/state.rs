//! Application state management

use crate::db::Db;
use crate::error::Result;
use crate::market::{MarketClient, Marketplace};
use crate::monitor::Monitor;
use crate::notify::Notifier;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Application state shared across the host process
pub struct AppState {
    /// SQLite store
    pub db: Arc<Db>,

    /// Upstream marketplace client
    pub market: Arc<dyn Marketplace>,

    /// Best-effort notification sender
    pub notifier: Arc<Notifier>,

    /// Price monitor controller
    pub monitor: Monitor,

    /// Application data directory
    pub data_dir: PathBuf,
}

impl AppState {
    /// Create new application state rooted at the given data directory
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        tracing::info!("Data directory: {:?}", data_dir);

        let db = Arc::new(Db::new(&data_dir.join("skinwatch.db"))?);
        let market: Arc<dyn Marketplace> = Arc::new(MarketClient::new()?);
        let notifier = Arc::new(Notifier::new(db.clone())?);
        let monitor = Monitor::new(db.clone(), market.clone(), notifier.clone());

        Ok(Self {
            db,
            market,
            notifier,
            monitor,
            data_dir: data_dir.to_path_buf(),
        })
    }
}
