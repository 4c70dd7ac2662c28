//! Collaborator traits the engine consumes.
//!
//! The content repository, artifact builder, and cache store are owned by
//! the host application; the engine only depends on these contracts and is
//! handed trait objects at construction.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::WarmError;

/// A candidate content item returned by repository queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    /// Stable identifier, also the cache key of the item's artifact.
    pub slug: String,
    pub title: String,
}

impl ContentItem {
    pub fn new(slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
        }
    }
}

/// An expensive derived artifact produced by the build pipeline.
///
/// Opaque to the engine; the builder stores it into the cache itself and
/// returns it only so callers can observe size and key.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub key: String,
    pub bytes: Bytes,
}

/// Read access to warmable content.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// List published items, newest first. Pages are 1-based.
    async fn list_published(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<ContentItem>, WarmError>;

    /// List the `limit` most-viewed items.
    async fn list_top_viewed(&self, limit: u32) -> Result<Vec<ContentItem>, WarmError>;

    /// List items in a category (tag slugs are category keys).
    async fn list_by_category(
        &self,
        category: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ContentItem>, WarmError>;
}

/// Builds the cached value for a key and stores it through the cache.
#[async_trait]
pub trait ArtifactBuilder: Send + Sync {
    async fn build(&self, key: &str) -> Result<Artifact, WarmError>;
}

/// Invalidation primitives of the underlying cache store.
///
/// Eviction and TTL policy belong to the store; the engine only ever
/// removes entries so the builder can repopulate them.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn invalidate(&self, key: &str) -> Result<(), WarmError>;
    async fn invalidate_all(&self) -> Result<(), WarmError>;
}

/// Cache key of the rendered tag index for a locale.
pub fn tag_index_key(locale: &str) -> String {
    format!("tags:{locale}")
}
