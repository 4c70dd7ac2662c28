//! Warming engine configuration.
//!
//! Intended to be embedded in the host application's settings tree
//! (e.g. a `[warming]` table) and deserialized with serde defaults.

use std::time::Duration;

use serde::Deserialize;

// Default values for warming configuration
const DEFAULT_STARTUP_PAGES: u32 = 3;
const DEFAULT_STARTUP_PAGE_SIZE: u32 = 10;
const DEFAULT_TOP_VIEWED_LIMIT: u32 = 10;
const DEFAULT_REFRESH_LIMIT: u32 = 20;
const DEFAULT_CATEGORY_LIMIT: u32 = 20;
const DEFAULT_RELATED_QUERY_LIMIT: u32 = 5;
const DEFAULT_RELATED_WARM_LIMIT: usize = 3;
const DEFAULT_LOCALE: &str = "en";
const DEFAULT_PREFETCH_DELAY_MS: u64 = 100;
const DEFAULT_MIN_DELAY_MS: u64 = 20;
const DEFAULT_MAX_DELAY_MS: u64 = 2000;
const DEFAULT_REFRESH_RATE_MS: u64 = 300_000;
const DEFAULT_INITIAL_DELAY_MS: u64 = 30_000;

/// Configuration for the cache warming and prefetch engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WarmingConfig {
    /// Master switch. When false every workflow is a no-op.
    pub enabled: bool,
    /// Number of published-content pages warmed at startup.
    pub startup_pages: u32,
    /// Page size used when listing published content at startup.
    pub startup_page_size: u32,
    /// Number of top-viewed items warmed at startup.
    pub top_viewed_limit: u32,
    /// Number of popular items refreshed per scheduled cycle.
    pub refresh_limit: u32,
    /// Maximum items fetched by a manual warm-by-category.
    pub category_limit: u32,
    /// Items queried per related-tag prefetch.
    pub related_query_limit: u32,
    /// Items actually warmed per related-tag prefetch.
    pub related_warm_limit: usize,
    /// Locale used for the startup tag-index warm.
    pub default_locale: String,
    /// Seed for the adaptive prefetch delay.
    pub prefetch_delay_ms: u64,
    /// Lower bound for the adaptive prefetch delay.
    pub min_delay_ms: u64,
    /// Upper bound for the adaptive prefetch delay.
    pub max_delay_ms: u64,
    /// Interval between scheduled popular-content refreshes.
    pub refresh_rate_ms: u64,
    /// Delay before the first scheduled refresh fires.
    pub initial_delay_ms: u64,
}

impl Default for WarmingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            startup_pages: DEFAULT_STARTUP_PAGES,
            startup_page_size: DEFAULT_STARTUP_PAGE_SIZE,
            top_viewed_limit: DEFAULT_TOP_VIEWED_LIMIT,
            refresh_limit: DEFAULT_REFRESH_LIMIT,
            category_limit: DEFAULT_CATEGORY_LIMIT,
            related_query_limit: DEFAULT_RELATED_QUERY_LIMIT,
            related_warm_limit: DEFAULT_RELATED_WARM_LIMIT,
            default_locale: DEFAULT_LOCALE.to_string(),
            prefetch_delay_ms: DEFAULT_PREFETCH_DELAY_MS,
            min_delay_ms: DEFAULT_MIN_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            refresh_rate_ms: DEFAULT_REFRESH_RATE_MS,
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
        }
    }
}

impl WarmingConfig {
    /// Interval between scheduled refreshes as a `Duration`.
    pub fn refresh_rate(&self) -> Duration {
        Duration::from_millis(self.refresh_rate_ms)
    }

    /// Delay before the first scheduled refresh as a `Duration`.
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = WarmingConfig::default();
        assert!(config.enabled);
        assert_eq!(config.startup_pages, 3);
        assert_eq!(config.startup_page_size, 10);
        assert_eq!(config.top_viewed_limit, 10);
        assert_eq!(config.refresh_limit, 20);
        assert_eq!(config.category_limit, 20);
        assert_eq!(config.related_query_limit, 5);
        assert_eq!(config.related_warm_limit, 3);
        assert_eq!(config.default_locale, "en");
        assert_eq!(config.prefetch_delay_ms, 100);
        assert_eq!(config.min_delay_ms, 20);
        assert_eq!(config.max_delay_ms, 2000);
        assert_eq!(config.refresh_rate_ms, 300_000);
        assert_eq!(config.initial_delay_ms, 30_000);
    }

    #[test]
    fn duration_accessors() {
        let config = WarmingConfig::default();
        assert_eq!(config.refresh_rate(), Duration::from_secs(300));
        assert_eq!(config.initial_delay(), Duration::from_secs(30));
    }
}
