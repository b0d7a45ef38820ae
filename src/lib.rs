//! Skinwatch - Skin Marketplace Price Monitor
//!
//! Polls a third-party skin marketplace for item listings, caches prices in
//! SQLite, and fires notifications when watchlist targets are crossed.

pub mod db;
pub mod error;
pub mod market;
pub mod monitor;
pub mod notify;
pub mod state;

pub use error::{AppError, Result};
pub use state::AppState;
