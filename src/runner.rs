//! Fire-and-forget background execution.
//!
//! Every background path of the engine routes through [`TaskRunner`]: the
//! task runs off the caller's path, failures are swallowed at this
//! boundary, logged with task identity, and counted on the shared error
//! counter. Warming is best-effort; a failed task only means the entry is
//! absent until the next trigger attempts it again.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::WarmError;
use crate::state::EngineState;

#[derive(Clone)]
pub struct TaskRunner {
    state: Arc<EngineState>,
}

impl TaskRunner {
    pub fn new(state: Arc<EngineState>) -> Self {
        Self { state }
    }

    /// Execute `task` without blocking the caller.
    ///
    /// The returned handle is detached by convention; it is exposed so
    /// tests and shutdown paths can await or abort specific tasks.
    pub fn spawn<F>(&self, name: &'static str, task: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<(), WarmError>> + Send + 'static,
    {
        let state = self.state.clone();
        tokio::spawn(async move {
            match task.await {
                Ok(()) => {
                    debug!(target: "tepore::runner", task = name, "background task completed");
                }
                Err(err) => {
                    state.record_error(name, "", &err);
                }
            }
        })
    }
}
