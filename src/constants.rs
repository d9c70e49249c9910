//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! To change the default API server, only edit this file.

/// Default backend API URL
///
/// This is the fallback URL when no environment variable is set.
/// For development: http://localhost:8080
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Default poll interval (seconds)
pub const DEFAULT_POLL_INTERVAL: u64 = 6;

/// Default maximum incidents fetched per poll
pub const DEFAULT_POLL_LIMIT: usize = 100;

/// Default push channel reconnect delay (seconds)
pub const DEFAULT_PUSH_RECONNECT: u64 = 3;

/// Default simulation driver interval (seconds)
pub const DEFAULT_SIM_INTERVAL: u64 = 5;

/// Default HTTP request timeout (seconds)
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 30;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Vigil Sync";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get backend API URL from environment or use default
pub fn get_api_url() -> String {
    std::env::var("VIGIL_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string())
}

/// Get poll interval from environment or use default
pub fn get_poll_interval() -> u64 {
    std::env::var("VIGIL_POLL_INTERVAL")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_POLL_INTERVAL)
}

/// Get poll limit from environment or use default
pub fn get_poll_limit() -> usize {
    std::env::var("VIGIL_POLL_LIMIT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_POLL_LIMIT)
}

/// Get push reconnect delay from environment or use default
pub fn get_push_reconnect() -> u64 {
    std::env::var("VIGIL_PUSH_RECONNECT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_PUSH_RECONNECT)
}

/// Get simulation interval from environment or use default
pub fn get_sim_interval() -> u64 {
    std::env::var("VIGIL_SIM_INTERVAL")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SIM_INTERVAL)
}

/// Check if offline/demo mode is enabled
pub fn is_offline_mode() -> bool {
    std::env::var("VIGIL_OFFLINE")
        .map(|s| s.to_lowercase() == "true" || s == "1")
        .unwrap_or(false)
}

/// Get the local responder name (used by the simulation driver to skip
/// incidents assigned to the local user)
pub fn get_responder_name() -> Option<String> {
    std::env::var("VIGIL_RESPONDER").ok().filter(|s| !s.is_empty())
}
