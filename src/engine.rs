//! The warming engine.
//!
//! Coordinates the four background workflows over shared collaborators:
//!
//! 1. Startup warming: three parallel branches (published pages, tag
//!    index, top-viewed items) settle before the engine reports ready.
//! 2. Scheduled refresh: a periodic batch that invalidates and rebuilds
//!    popular entries, gated on startup completion.
//! 3. Access-triggered prefetch: a delayed, deduplicated warm of content
//!    related to a just-served item, feeding its cost back into the
//!    adaptive delay.
//! 4. Manual operations: warm-by-category and clear-and-rewarm.
//!
//! Workflows 1, 3, and 4 run fire-and-forget through the task runner;
//! the scheduled refresh blocks its own timer task so cycles never
//! overlap.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::WarmingConfig;
use crate::delay::AdaptiveDelay;
use crate::error::WarmError;
use crate::inflight::InFlightSet;
use crate::repo::{ArtifactBuilder, CacheStore, ContentItem, ContentRepository, tag_index_key};
use crate::runner::TaskRunner;
use crate::state::{EngineState, StartupRecord, WarmingStatus};
use crate::telemetry::{
    METRIC_ITEMS_WARMED_TOTAL, METRIC_PREFETCH_MS, METRIC_REFRESH_MS, METRIC_WARM_STARTUP_MS,
};

const TASK_STARTUP: &str = "warm_on_startup";
const TASK_STARTUP_PAGES: &str = "warm_startup_pages";
const TASK_TAG_INDEX: &str = "warm_tag_index";
const TASK_TOP_VIEWED: &str = "warm_top_viewed";
const TASK_REFRESH: &str = "refresh_popular";
const TASK_PREFETCH: &str = "prefetch_related";
const TASK_CATEGORY: &str = "warm_by_category";

/// Cache warming and adaptive prefetch engine.
///
/// One instance is shared (as an `Arc`) between the process bootstrap,
/// the request path, and admin handlers. All shared mutable state lives
/// in concurrency-safe primitives; no method blocks its caller except
/// [`refresh_popular`](Self::refresh_popular), which is intended to run
/// on its dedicated timer task.
pub struct WarmingEngine {
    config: WarmingConfig,
    repo: Arc<dyn ContentRepository>,
    builder: Arc<dyn ArtifactBuilder>,
    store: Arc<dyn CacheStore>,
    state: Arc<EngineState>,
    delay: Arc<AdaptiveDelay>,
    inflight: Arc<InFlightSet>,
    runner: TaskRunner,
}

impl WarmingEngine {
    pub fn new(
        config: WarmingConfig,
        repo: Arc<dyn ContentRepository>,
        builder: Arc<dyn ArtifactBuilder>,
        store: Arc<dyn CacheStore>,
    ) -> Self {
        let state = Arc::new(EngineState::new());
        let delay = Arc::new(AdaptiveDelay::new(&config));
        Self {
            runner: TaskRunner::new(state.clone()),
            inflight: Arc::new(InFlightSet::new()),
            config,
            repo,
            builder,
            store,
            state,
            delay,
        }
    }

    /// One-shot start call made by the process bootstrap once all
    /// collaborators are constructed: fires the startup warm in the
    /// background and spawns the periodic refresh timer.
    ///
    /// Returns the timer handle; abort it on shutdown.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let engine = self.clone();
        self.runner.spawn(TASK_STARTUP, async move {
            engine.warm_on_startup().await;
            Ok(())
        });
        self.spawn_periodic_refresh()
    }

    /// Run the startup warming branches and settle all of them.
    ///
    /// No-op when warming is disabled, or when another startup warm is
    /// still running. A failing branch never cancels its siblings; once
    /// every branch settles the engine reports ready.
    pub async fn warm_on_startup(&self) {
        if !self.config.enabled {
            debug!(target: "tepore::engine", "startup warming skipped: disabled");
            return;
        }
        if !self.state.begin_startup() {
            warn!(
                target: "tepore::engine",
                "startup warming skipped: previous run still in progress"
            );
            return;
        }

        let started = Instant::now();
        info!(
            target: "tepore::engine",
            pages = self.config.startup_pages,
            top_viewed = self.config.top_viewed_limit,
            "startup warming beginning"
        );

        let (pages, tags, top) = tokio::join!(
            self.settle(TASK_STARTUP_PAGES, self.warm_startup_pages()),
            self.settle(TASK_TAG_INDEX, self.warm_tag_index()),
            self.settle(TASK_TOP_VIEWED, self.warm_top_viewed()),
        );

        let elapsed = started.elapsed();
        self.state.finish_startup(StartupRecord {
            completed_at: OffsetDateTime::now_utc(),
            elapsed_ms: elapsed.as_millis() as u64,
        });
        histogram!(METRIC_WARM_STARTUP_MS).record(elapsed.as_secs_f64() * 1000.0);
        info!(
            target: "tepore::engine",
            page_items = pages,
            tag_indexes = tags,
            top_viewed = top,
            elapsed_ms = elapsed.as_millis() as u64,
            "startup warming complete"
        );
    }

    /// Isolate one startup branch: a listing failure settles the branch
    /// as a single counted error instead of cancelling its siblings.
    async fn settle<F>(&self, name: &'static str, branch: F) -> usize
    where
        F: Future<Output = Result<usize, WarmError>>,
    {
        match branch.await {
            Ok(warmed) => warmed,
            Err(err) => {
                self.state.record_error(name, "", &err);
                0
            }
        }
    }

    async fn warm_startup_pages(&self) -> Result<usize, WarmError> {
        let mut warmed = 0;
        for page in 1..=self.config.startup_pages {
            let items = self
                .repo
                .list_published(page, self.config.startup_page_size)
                .await?;
            if items.is_empty() {
                break;
            }
            warmed += self.warm_items(TASK_STARTUP_PAGES, &items).await;
        }
        Ok(warmed)
    }

    async fn warm_tag_index(&self) -> Result<usize, WarmError> {
        let key = tag_index_key(&self.config.default_locale);
        self.builder.build(&key).await?;
        counter!(METRIC_ITEMS_WARMED_TOTAL, "task" => TASK_TAG_INDEX).increment(1);
        Ok(1)
    }

    async fn warm_top_viewed(&self) -> Result<usize, WarmError> {
        let items = self.repo.list_top_viewed(self.config.top_viewed_limit).await?;
        Ok(self.warm_items(TASK_TOP_VIEWED, &items).await)
    }

    /// Build each item's artifact, skipping and counting failures.
    /// Returns the number warmed successfully.
    async fn warm_items(&self, task: &'static str, items: &[ContentItem]) -> usize {
        let mut warmed = 0;
        for item in items {
            match self.builder.build(&item.slug).await {
                Ok(_) => warmed += 1,
                Err(err) => self.state.record_error(task, &item.slug, &err),
            }
        }
        if warmed > 0 {
            counter!(METRIC_ITEMS_WARMED_TOTAL, "task" => task).increment(warmed as u64);
        }
        warmed
    }

    /// Refresh the cache entries of currently popular content.
    ///
    /// Inert until startup warming settles. Runs its batch to completion
    /// before returning, so the caller's timer never observes overlapping
    /// cycles. Returns the number of entries refreshed.
    pub async fn refresh_popular(&self) -> usize {
        if !self.config.enabled || !self.state.startup_complete() {
            debug!(
                target: "tepore::engine",
                enabled = self.config.enabled,
                startup_complete = self.state.startup_complete(),
                "popular refresh skipped: not ready"
            );
            return 0;
        }

        let started = Instant::now();
        let items = match self.repo.list_top_viewed(self.config.refresh_limit).await {
            Ok(items) => items,
            Err(err) => {
                self.state.record_error(TASK_REFRESH, "", &err);
                return 0;
            }
        };

        let mut refreshed = 0;
        for item in &items {
            if let Err(err) = self.refresh_item(&item.slug).await {
                self.state.record_error(TASK_REFRESH, &item.slug, &err);
                continue;
            }
            refreshed += 1;
        }

        if refreshed > 0 {
            counter!(METRIC_ITEMS_WARMED_TOTAL, "task" => TASK_REFRESH).increment(refreshed as u64);
        }
        histogram!(METRIC_REFRESH_MS).record(started.elapsed().as_secs_f64() * 1000.0);
        info!(
            target: "tepore::engine",
            attempted = items.len(),
            refreshed,
            "popular content refresh complete"
        );
        refreshed
    }

    async fn refresh_item(&self, key: &str) -> Result<(), WarmError> {
        self.store.invalidate(key).await?;
        self.builder.build(key).await?;
        Ok(())
    }

    /// Spawn the periodic refresh timer: first firing after the
    /// configured initial delay, then at the configured rate.
    pub fn spawn_periodic_refresh(self: &Arc<Self>) -> JoinHandle<()> {
        let engine = self.clone();
        let first = tokio::time::Instant::now() + engine.config.initial_delay();
        let period = engine
            .config
            .refresh_rate()
            .max(std::time::Duration::from_millis(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(first, period);
            loop {
                interval.tick().await;
                engine.refresh_popular().await;
            }
        })
    }

    /// Schedule a delayed prefetch of content related to a just-served
    /// item. Returns immediately; the request path is never blocked.
    ///
    /// The debounce delay keeps the prefetch from competing with the
    /// request that triggered it; the in-flight set collapses prefetch
    /// storms when many readers hit the same hot item at once.
    pub fn on_accessed(&self, key: &str, related_tags: &[String]) {
        if !self.config.enabled {
            return;
        }
        if !self.inflight.try_acquire(key) {
            debug!(target: "tepore::engine", key, "prefetch already in flight, skipping");
            return;
        }

        let delay = self.delay.current();
        let key = key.to_string();
        let tag = related_tags.first().cloned();
        let repo = self.repo.clone();
        let builder = self.builder.clone();
        let state = self.state.clone();
        let adaptive = self.delay.clone();
        let inflight = self.inflight.clone();
        let query_limit = self.config.related_query_limit;
        let warm_limit = self.config.related_warm_limit;

        self.runner.spawn(TASK_PREFETCH, async move {
            let started = Instant::now();
            tokio::time::sleep(delay).await;

            let result = prefetch_related(
                repo.as_ref(),
                builder.as_ref(),
                &state,
                &key,
                tag,
                query_limit,
                warm_limit,
            )
            .await;

            let elapsed = started.elapsed();
            adaptive.record_observation(elapsed);
            histogram!(METRIC_PREFETCH_MS).record(elapsed.as_secs_f64() * 1000.0);
            // Release must happen on every path or the key stays blocked.
            inflight.release(&key);
            result
        });
    }

    /// Manually warm up to `category_limit` items of a category.
    /// Returns the number of items attempted, not the number that
    /// succeeded; failures are skipped and counted as usual.
    pub async fn warm_by_category(&self, category: &str) -> Result<usize, WarmError> {
        if !self.config.enabled {
            debug!(target: "tepore::engine", category, "category warm skipped: disabled");
            return Ok(0);
        }

        let items = self
            .repo
            .list_by_category(category, self.config.category_limit, 0)
            .await?;
        let attempted = items.len();
        let warmed = self.warm_items(TASK_CATEGORY, &items).await;
        info!(
            target: "tepore::engine",
            category,
            attempted,
            warmed,
            "manual category warm complete"
        );
        Ok(attempted)
    }

    /// Invalidate the entire cache, then re-trigger startup warming in
    /// the background. Returns once invalidation completes; the engine
    /// re-enters the warming phase until the rewarm settles.
    pub async fn clear_and_rewarm(self: &Arc<Self>) -> Result<(), WarmError> {
        self.store.invalidate_all().await?;
        self.state.reset_startup();

        let engine = self.clone();
        self.runner.spawn(TASK_STARTUP, async move {
            engine.warm_on_startup().await;
            Ok(())
        });

        info!(target: "tepore::engine", "cache cleared, rewarm scheduled");
        Ok(())
    }

    /// Point-in-time snapshot for health and admin endpoints.
    pub fn status(&self) -> WarmingStatus {
        let record = self.state.startup_record();
        WarmingStatus {
            enabled: self.config.enabled,
            startup_complete: self.state.startup_complete(),
            in_flight: self.inflight.len(),
            errors: self.state.error_count(),
            startup_completed_at: record.map(|r| r.completed_at),
            startup_elapsed_ms: record.map(|r| r.elapsed_ms),
        }
    }

    /// The delay currently applied before scheduled prefetches.
    pub fn current_delay(&self) -> std::time::Duration {
        self.delay.current()
    }

    pub fn config(&self) -> &WarmingConfig {
        &self.config
    }
}

async fn prefetch_related(
    repo: &dyn ContentRepository,
    builder: &dyn ArtifactBuilder,
    state: &EngineState,
    origin: &str,
    tag: Option<String>,
    query_limit: u32,
    warm_limit: usize,
) -> Result<(), WarmError> {
    let Some(tag) = tag else {
        debug!(target: "tepore::engine", key = origin, "no related tags, nothing to prefetch");
        return Ok(());
    };

    let items = repo.list_by_category(&tag, query_limit, 0).await?;
    let mut warmed = 0u64;
    for item in items
        .iter()
        .filter(|item| item.slug != origin)
        .take(warm_limit)
    {
        match builder.build(&item.slug).await {
            Ok(_) => warmed += 1,
            Err(err) => state.record_error(TASK_PREFETCH, &item.slug, &err),
        }
    }

    if warmed > 0 {
        counter!(METRIC_ITEMS_WARMED_TOTAL, "task" => TASK_PREFETCH).increment(warmed);
    }
    debug!(
        target: "tepore::engine",
        key = origin,
        tag = %tag,
        warmed,
        "related prefetch complete"
    );
    Ok(())
}
