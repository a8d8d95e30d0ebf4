//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - Startup configuration banner

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::core::config;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the effective configuration at application startup
///
/// Flags missing pieces that would disable whole features (payment
/// webhook, announcements) so misconfiguration is visible immediately.
pub fn log_startup_configuration() {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("Configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    log::info!("Database: {}", config::DATABASE_PATH.as_str());
    log::info!(
        "Broadcast: role={}, limit={}, chunk={}, pacing={}s",
        config::broadcast::target_role().as_str(),
        *config::broadcast::AUDIENCE_LIMIT,
        config::broadcast::CHUNK_SIZE,
        config::broadcast::PACING_DELAY_SECS
    );

    match *config::payments::SECRET_KEY {
        Some(_) => log::info!("✅ PRODAMUS_SECRET_KEY set, payment webhook enabled on port {}", *config::WEBHOOK_PORT),
        None => log::warn!("⚠️  PRODAMUS_SECRET_KEY not set — payment webhook disabled"),
    }

    match *config::STRAPI_URL {
        Some(ref url) => log::info!("✅ STRAPI_URL: {}", url),
        None => log::warn!("⚠️  STRAPI_URL not set — announcements button will report no events"),
    }

    if config::PAYMENT_URL.is_none() {
        log::warn!("⚠️  PAYMENT_URL not set — «Оплатить» button will apologize instead of linking");
    }

    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
