//! Startup cleanup of expired data.

use crate::db::Database;
use tracing::{error, info};

/// Purge refresh tokens past their expiry. Runs once at startup.
pub async fn run_cleanup(db: &Database) {
    match db.tokens().delete_expired().await {
        Ok(count) if count > 0 => info!("Cleaned up {} expired tokens", count),
        Ok(_) => {}
        Err(e) => error!("Failed to clean up expired tokens: {}", e),
    }
}
