//! Background task supervision.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Owns the background tasks (bridge session, sweeper) and cancels them as
/// a group on shutdown. In-flight work is abandoned, not retried.
pub struct TaskGroup {
    token: CancellationToken,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl TaskGroup {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            handles: Vec::new(),
        }
    }

    /// The group's cancellation token; pass clones into spawned tasks.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Spawn a named task tracked by the group.
    pub fn spawn<F>(&mut self, name: &'static str, fut: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        debug!(task = name, "Spawning background task");
        self.handles.push((name, tokio::spawn(fut)));
    }

    /// Cancel everything and wait for the tasks to finish.
    pub async fn shutdown(self) {
        self.token.cancel();
        for (name, handle) in self.handles {
            if handle.await.is_err() {
                info!(task = name, "Background task aborted");
            } else {
                debug!(task = name, "Background task stopped");
            }
        }
    }
}

impl Default for TaskGroup {
    fn default() -> Self {
        Self::new()
    }
}
