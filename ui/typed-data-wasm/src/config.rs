//! Page configuration read from `data-*` attributes on the `#app` root.
//!
//! `data-query-key`, `data-log-level`, `data-discovery-ms`. Unknown or
//! malformed values fall back to the defaults.

use tds_session::config::DEFAULT_QUERY_KEY;
use tracing::Level;
use web_sys::HtmlElement;

pub const DEFAULT_DISCOVERY_MS: u32 = 200;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageConfig {
    pub query_key: String,
    pub log_level: Level,
    /// How long to wait for EIP-6963 announcements before reconnecting.
    pub discovery_ms: u32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            query_key: DEFAULT_QUERY_KEY.to_owned(),
            log_level: Level::INFO,
            discovery_ms: DEFAULT_DISCOVERY_MS,
        }
    }
}

impl PageConfig {
    pub fn from_element(root: &HtmlElement) -> Self {
        Self::from_attrs(|name| root.get_attribute(name))
    }

    pub fn from_attrs(attr: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(key) = attr("data-query-key") {
            let key = key.trim();
            if !key.is_empty() {
                config.query_key = key.to_owned();
            }
        }
        if let Some(level) = attr("data-log-level").and_then(|v| v.trim().parse().ok()) {
            config.log_level = level;
        }
        if let Some(ms) = attr("data-discovery-ms").and_then(|v| v.trim().parse().ok()) {
            config.discovery_ms = ms;
        }

        config
    }
}
