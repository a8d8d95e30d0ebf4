use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Configuration constants for the bot
/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Database file path
/// Read from DATABASE_PATH environment variable
/// Default: database.sqlite
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "database.sqlite".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "app.log".to_string()));

/// Port for the payment webhook HTTP server
/// Read from PORT environment variable
/// Default: 5000
pub static WEBHOOK_PORT: Lazy<u16> = Lazy::new(|| {
    env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5000)
});

/// Base URL of the Strapi CMS that serves event announcements
/// Read from STRAPI_URL environment variable
/// Invalid URLs are rejected at startup, not at the first fetch
pub static STRAPI_URL: Lazy<Option<String>> = Lazy::new(|| {
    env::var("STRAPI_URL").ok().and_then(|value| {
        let trimmed = value.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return None;
        }
        match url::Url::parse(trimmed) {
            Ok(_) => Some(trimmed.to_string()),
            Err(e) => {
                log::warn!("STRAPI_URL '{}' не является корректным URL: {}", trimmed, e);
                None
            }
        }
    })
});

/// Payment link shown behind the «Оплатить» button
/// Read from PAYMENT_URL environment variable
pub static PAYMENT_URL: Lazy<Option<String>> = Lazy::new(|| {
    env::var("PAYMENT_URL")
        .ok()
        .and_then(|s| if s.trim().is_empty() { None } else { Some(s) })
});

/// Prodamus webhook configuration
pub mod payments {
    use once_cell::sync::Lazy;
    use std::env;

    /// Shared secret used to verify webhook signatures
    /// Read from PRODAMUS_SECRET_KEY environment variable
    /// The webhook server refuses to start without it
    pub static SECRET_KEY: Lazy<Option<String>> = Lazy::new(|| {
        env::var("PRODAMUS_SECRET_KEY")
            .ok()
            .and_then(|s| if s.trim().is_empty() { None } else { Some(s) })
    });
}

/// Broadcast configuration
pub mod broadcast {
    use once_cell::sync::Lazy;
    use std::env;

    use super::Duration;

    /// Recipients per chunk. Telegram allows ~30 messages per second to
    /// distinct chats, so one chunk per second stays under the ceiling.
    pub const CHUNK_SIZE: usize = 30;

    /// Delay between consecutive chunks
    pub const PACING_DELAY_SECS: u64 = 1;

    /// Fixed overhead added to the pre-flight time estimate (seconds)
    pub const ESTIMATE_OVERHEAD_SECS: u64 = 5;

    /// Telegram's hard limit on message text length (characters)
    pub const MAX_MESSAGE_LENGTH: usize = 4096;

    /// Pacing delay duration
    pub fn pacing_delay() -> Duration {
        Duration::from_secs(PACING_DELAY_SECS)
    }

    /// Audience size cap for a single broadcast
    /// Read from BROADCAST_LIMIT environment variable
    /// Default: 10000
    pub static AUDIENCE_LIMIT: Lazy<usize> = Lazy::new(|| {
        env::var("BROADCAST_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10_000)
    });

    /// Raw target role for broadcasts
    /// Read from ROLE_FOR_BROADCAST environment variable
    /// Default: "client"
    static TARGET_ROLE_RAW: Lazy<String> =
        Lazy::new(|| env::var("ROLE_FOR_BROADCAST").unwrap_or_else(|_| "client".to_string()));

    /// Gets the validated target role for broadcasts.
    ///
    /// Unknown values fall back to `Client` with a warning instead of
    /// silently matching zero users on a typo.
    pub fn target_role() -> crate::broadcast::BroadcastRole {
        use crate::broadcast::BroadcastRole;
        match BroadcastRole::parse(TARGET_ROLE_RAW.as_str()) {
            Some(role) => role,
            None => {
                log::warn!(
                    "Unknown ROLE_FOR_BROADCAST '{}', falling back to 'client'",
                    TARGET_ROLE_RAW.as_str()
                );
                BroadcastRole::Client
            }
        }
    }
}
