//! Tepore — cache warming and adaptive prefetch engine.
//!
//! Proactively and reactively populates a read-through cache of expensive
//! derived content artifacts (rendered article pages, tag listings,
//! popular-content lookups) for a content-serving backend:
//!
//! - **Startup warming**: three parallel branches run once at process
//!   readiness; the engine reports ready after all of them settle.
//! - **Scheduled refresh**: a periodic batch invalidates and rebuilds
//!   popular entries, gated on readiness.
//! - **Access-triggered prefetch**: after a request is served, related
//!   content is warmed in the background behind an adaptive debounce
//!   delay, deduplicated per key.
//! - **Manual operations**: warm-by-category and clear-and-rewarm for
//!   administrative triggers.
//!
//! The content repository, artifact builder, and cache store are
//! collaborator traits implemented by the host application. Warming
//! failures are invisible to end users: a missing entry falls through to
//! the host's uncached build path, so failures only cost latency.
//!
//! ## Configuration
//!
//! [`WarmingConfig`] deserializes with serde defaults, intended for a
//! `[warming]` table in the host's settings file:
//!
//! ```toml
//! [warming]
//! enabled = true
//! startup_pages = 3
//! refresh_rate_ms = 300000
//! # ... see config.rs for all options
//! ```

mod config;
mod delay;
mod engine;
mod error;
mod inflight;
mod repo;
mod runner;
mod state;
pub mod telemetry;

pub use config::WarmingConfig;
pub use delay::AdaptiveDelay;
pub use engine::WarmingEngine;
pub use error::WarmError;
pub use inflight::InFlightSet;
pub use repo::{Artifact, ArtifactBuilder, CacheStore, ContentItem, ContentRepository, tag_index_key};
pub use runner::TaskRunner;
pub use state::{EngineState, WarmingStatus};
