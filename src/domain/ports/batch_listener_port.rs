//! Completion callback for batch downloads.

/// Receives one call per finished batch download.
///
/// The call carries no per-picture detail; listeners re-query the cache to
/// learn what arrived. Any `Fn() + Send + Sync` closure is a listener.
pub trait BatchListener: Send + Sync {
    /// Called after every picture captured by the batch has been attempted.
    fn on_batch_complete(&self);
}

impl<F> BatchListener for F
where
    F: Fn() + Send + Sync,
{
    fn on_batch_complete(&self) {
        self();
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Notify;

    /// Counts completions and wakes waiters on each one.
    #[derive(Default)]
    pub struct MockBatchListener {
        completed: AtomicUsize,
        notify: Notify,
    }

    impl MockBatchListener {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn completed(&self) -> usize {
            self.completed.load(Ordering::SeqCst)
        }

        /// Waits until at least `count` batches have completed.
        pub async fn wait_for(&self, count: usize) {
            loop {
                let notified = self.notify.notified();
                if self.completed() >= count {
                    return;
                }
                notified.await;
            }
        }
    }

    impl BatchListener for MockBatchListener {
        fn on_batch_complete(&self) {
            self.completed.fetch_add(1, Ordering::SeqCst);
            self.notify.notify_waiters();
        }
    }
}
