use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};

pub const METRIC_WARM_STARTUP_MS: &str = "tepore_warm_startup_ms";
pub const METRIC_REFRESH_MS: &str = "tepore_refresh_ms";
pub const METRIC_PREFETCH_MS: &str = "tepore_prefetch_ms";
pub const METRIC_TASK_ERROR_TOTAL: &str = "tepore_task_error_total";
pub const METRIC_ITEMS_WARMED_TOTAL: &str = "tepore_items_warmed_total";

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Register metric descriptions with the installed recorder.
///
/// Call once from the host's telemetry bootstrap; repeated calls are
/// no-ops.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_histogram!(
            METRIC_WARM_STARTUP_MS,
            Unit::Milliseconds,
            "Total startup warming latency in milliseconds."
        );
        describe_histogram!(
            METRIC_REFRESH_MS,
            Unit::Milliseconds,
            "Scheduled popular-content refresh latency in milliseconds."
        );
        describe_histogram!(
            METRIC_PREFETCH_MS,
            Unit::Milliseconds,
            "Access-triggered prefetch task latency in milliseconds, including the debounce delay."
        );
        describe_counter!(
            METRIC_TASK_ERROR_TOTAL,
            Unit::Count,
            "Total background warming failures, whole tasks and skipped items."
        );
        describe_counter!(
            METRIC_ITEMS_WARMED_TOTAL,
            Unit::Count,
            "Total artifacts successfully warmed across all workflows."
        );
    });
}
