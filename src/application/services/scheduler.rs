//! Cancellable repeating-task scheduler
//!
//! Polling runs as a spawned task that sleeps between ticks and invokes the
//! tick callback sequentially, so a new tick never starts before the previous
//! one has finished. Cancellation goes through the returned handle.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Whether the repeating task should keep running after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickFlow {
    Continue,
    Stop,
}

/// Handle to a scheduled repeating task
pub struct TaskHandle {
    cancelled: Arc<AtomicBool>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl TaskHandle {
    /// Cancel the task. Returns true only for the first call that actually
    /// cancelled anything; later calls are no-ops.
    pub fn cancel(&self) -> bool {
        let first = !self.cancelled.swap(true, Ordering::SeqCst);
        if first {
            if let Ok(mut join) = self.join.lock() {
                if let Some(task) = join.take() {
                    task.abort();
                }
            }
        }
        first
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Spawn a task that waits `interval`, then runs `tick` with a 1-based tick
/// number, repeating until the callback returns [`TickFlow::Stop`] or the
/// handle is cancelled.
pub fn spawn_repeating<F, Fut>(interval: Duration, mut tick: F) -> Arc<TaskHandle>
where
    F: FnMut(u32) -> Fut + Send + 'static,
    Fut: Future<Output = TickFlow> + Send,
{
    let cancelled = Arc::new(AtomicBool::new(false));
    let handle = Arc::new(TaskHandle {
        cancelled: Arc::clone(&cancelled),
        join: Mutex::new(None),
    });

    let task = tokio::spawn(async move {
        let mut number = 0u32;
        loop {
            tokio::time::sleep(interval).await;
            if cancelled.load(Ordering::SeqCst) {
                break;
            }
            number += 1;
            if tick(number).await == TickFlow::Stop {
                break;
            }
        }
    });

    if let Ok(mut join) = handle.join.lock() {
        *join = Some(task);
    }

    handle
}
