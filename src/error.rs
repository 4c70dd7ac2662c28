use thiserror::Error;

/// Failures surfaced by warming collaborators.
///
/// No variant ever escapes a background task: the task runner boundary
/// swallows, logs, and counts. These types exist so batch loops can skip
/// individual items and so admin-facing operations can report cause.
#[derive(Debug, Error)]
pub enum WarmError {
    #[error("artifact build failed for `{key}`: {detail}")]
    Build { key: String, detail: String },
    #[error("cache store error: {detail}")]
    Store { detail: String },
    #[error("content repository error: {detail}")]
    Repository { detail: String },
}

impl WarmError {
    pub fn build(key: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        Self::Build {
            key: key.into(),
            detail: detail.to_string(),
        }
    }

    pub fn store(detail: impl std::fmt::Display) -> Self {
        Self::Store {
            detail: detail.to_string(),
        }
    }

    pub fn repository(detail: impl std::fmt::Display) -> Self {
        Self::Repository {
            detail: detail.to_string(),
        }
    }
}
