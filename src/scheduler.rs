//! Trailing-edge debounce for background work.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

/// Runs only the most recently scheduled task, once the delay has passed
/// without another call to [`Debouncer::schedule`].
///
/// Each schedule takes a ticket. A task wakes after the delay and runs only
/// if its ticket is still current, so superseded tasks expire silently. A
/// task that has already started is never interrupted.
pub struct Debouncer {
    delay: Duration,
    runtime: Option<Handle>,
    generation: Arc<AtomicU64>,
    pending: Mutex<Option<(u64, JoinHandle<()>)>>,
}

impl Debouncer {
    /// Creates a debouncer bound to the current tokio runtime, if any.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            runtime: Handle::try_current().ok(),
            generation: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
        }
    }

    /// Quiet period before a scheduled task fires.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules `task`, superseding anything still waiting.
    ///
    /// Outside a tokio runtime the task is dropped.
    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Some(runtime) = self.runtime.clone().or_else(|| Handle::try_current().ok()) else {
            debug!("no async runtime available; dropping debounced task");
            return;
        };
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Arc::clone(&self.generation);
        let delay = self.delay;
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if generation.load(Ordering::SeqCst) == ticket {
                task.await;
            }
        });
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some((ticket, handle));
    }

    /// Expires whatever is waiting. Returns `true` if something was pending.
    pub fn cancel(&self) -> bool {
        let was_pending = self.is_pending();
        self.generation.fetch_add(1, Ordering::SeqCst);
        was_pending
    }

    /// Returns `true` while the latest task is waiting or running.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        let current = self.generation.load(Ordering::SeqCst);
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|(ticket, handle)| *ticket == current && !handle.is_finished())
    }
}
