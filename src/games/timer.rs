use std::{
    future::Future,
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{task::AbortHandle, time::sleep};

/// Marker captured when an action is scheduled, compared again when it fires.
///
/// An action holding a stale epoch lost a race with [`TimerPool::cancel_all`]
/// (it was already past its sleep when the cancellation landed) and must not
/// touch game state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerEpoch(u64);

/// Owned set of outstanding delayed actions for a single minigame instance.
///
/// Every delayed effect a game wants (false cues, round pauses, freeze
/// expirations, render loops, the completion signal) is routed through the
/// instance's pool so that one [`TimerPool::cancel_all`] silences all of them
/// when a state-exiting transition runs, and unconditionally on teardown.
pub struct TimerPool {
    handles: Mutex<Vec<AbortHandle>>,
    epoch: AtomicU64,
}

impl TimerPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self {
            handles: Mutex::new(Vec::new()),
            epoch: AtomicU64::new(0),
        }
    }

    /// Current cancellation epoch, to be captured at scheduling time.
    pub fn epoch(&self) -> TimerEpoch {
        TimerEpoch(self.epoch.load(Ordering::SeqCst))
    }

    /// Whether `epoch` is still the live one (no cancellation happened since).
    pub fn is_current(&self, epoch: TimerEpoch) -> bool {
        self.epoch() == epoch
    }

    /// Run `action` after `delay` on the runtime clock, unless cancelled first.
    pub fn schedule<F>(&self, delay: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task = tokio::spawn(async move {
            sleep(delay).await;
            action.await;
        });
        self.track(task.abort_handle());
    }

    /// Spawn a long-running task (e.g. a render loop) owned by this pool.
    ///
    /// The task itself is responsible for exiting when its captured
    /// [`TimerEpoch`] goes stale; `cancel_all` aborts it regardless.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task = tokio::spawn(task);
        self.track(task.abort_handle());
    }

    /// Abort every outstanding action and invalidate all captured epochs.
    pub fn cancel_all(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let mut handles = self.handles();
        for handle in handles.drain(..) {
            handle.abort();
        }
    }

    /// Number of actions still scheduled or running.
    pub fn pending(&self) -> usize {
        let mut handles = self.handles();
        handles.retain(|handle| !handle.is_finished());
        handles.len()
    }

    fn track(&self, handle: AbortHandle) {
        let mut handles = self.handles();
        handles.retain(|existing| !existing.is_finished());
        handles.push(handle);
    }

    fn handles(&self) -> MutexGuard<'_, Vec<AbortHandle>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TimerPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    fn counter_action(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_action_fires_after_delay() {
        let pool = TimerPool::new();
        let fired = Arc::new(AtomicUsize::new(0));

        pool.schedule(Duration::from_millis(100), counter_action(&fired));

        sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(60)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(pool.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_silences_every_pending_action() {
        let pool = TimerPool::new();
        let fired = Arc::new(AtomicUsize::new(0));

        for delay in [100u64, 200, 300] {
            pool.schedule(Duration::from_millis(delay), counter_action(&fired));
        }
        assert_eq!(pool.pending(), 3);

        pool.cancel_all();
        assert_eq!(pool.pending(), 0);

        sleep(Duration::from_millis(500)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_invalidates_captured_epochs() {
        let pool = TimerPool::new();
        let epoch = pool.epoch();
        assert!(pool.is_current(epoch));

        pool.cancel_all();
        assert!(!pool.is_current(epoch));
        assert!(pool.is_current(pool.epoch()));
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_loop_is_aborted_by_cancel_all() {
        let pool = TimerPool::new();
        let ticks = Arc::new(AtomicUsize::new(0));

        let counter = ticks.clone();
        pool.spawn(async move {
            loop {
                sleep(Duration::from_millis(10)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        sleep(Duration::from_millis(35)).await;
        tokio::task::yield_now().await;
        let seen = ticks.load(Ordering::SeqCst);
        assert!(seen >= 3);

        pool.cancel_all();
        sleep(Duration::from_millis(100)).await;
        tokio::task::yield_now().await;
        assert_eq!(ticks.load(Ordering::SeqCst), seen);
    }
}
