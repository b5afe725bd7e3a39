//! Fetches parked until enough data arrives or their wait runs out.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicI64, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::sync::{mpsc, watch, Notify};

use super::closed;
use crate::network::conn::ClientRequest;

#[derive(Debug)]
pub(crate) struct DeferredFetch {
    pub creq: ClientRequest,
    pub min_bytes: i64,
    pub watched: Vec<(String, i32)>,
    bytes: AtomicI64,
    cleaned: AtomicBool,
    cancel: Notify,
}

impl DeferredFetch {
    pub fn new(
        creq: ClientRequest,
        min_bytes: i64,
        have: i64,
        watched: Vec<(String, i32)>,
    ) -> Arc<Self> {
        Arc::new(Self {
            creq,
            min_bytes,
            watched,
            bytes: AtomicI64::new(have),
            cleaned: AtomicBool::new(false),
            cancel: Notify::new(),
        })
    }

    /// Counts newly appended bytes. True only for the append that makes the
    /// fetch satisfiable.
    pub fn add_bytes(&self, n: i64) -> bool {
        let before = self.bytes.fetch_add(n, Ordering::SeqCst);
        before < self.min_bytes && before + n >= self.min_bytes
    }

    /// Marks the fetch cleaned, returning false if it already was.
    pub fn try_clean(&self) -> bool {
        !self.cleaned.swap(true, Ordering::SeqCst)
    }

    pub fn cancel_timer(&self) {
        // stores a permit if the timer is not waiting yet
        self.cancel.notify_one();
    }
}

/// Sends the fetch back to the cluster once `wait` elapses.
pub(crate) fn start_timer(
    fetch: Arc<DeferredFetch>,
    wait: Duration,
    ready: mpsc::Sender<Arc<DeferredFetch>>,
    mut die: watch::Receiver<bool>,
) {
    super::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                tokio::select! {
                    _ = ready.send(fetch.clone()) => {}
                    _ = closed(&mut die) => {}
                }
            }
            _ = fetch.cancel.notified() => {}
            _ = closed(&mut die) => {}
        }
    });
}

/// Hands a satisfied fetch back to the cluster without blocking the caller.
pub(crate) fn wake(
    fetch: Arc<DeferredFetch>,
    ready: mpsc::Sender<Arc<DeferredFetch>>,
    mut die: watch::Receiver<bool>,
) {
    tracing::debug!(
        correlation_id = fetch.creq.header.correlation_id,
        "waking deferred fetch"
    );
    super::spawn(async move {
        tokio::select! {
            _ = ready.send(fetch) => {}
            _ = closed(&mut die) => {}
        }
    });
}

#[cfg(test)]
mod test {
    use std::time::Instant;

    use super::*;
    use crate::protocol::{FetchRequest, HeaderRequest, Request};

    fn fetch(min_bytes: i64, have: i64) -> Arc<DeferredFetch> {
        let (resp_tx, _resp_rx) = mpsc::channel(1);
        let creq = ClientRequest {
            node: 0,
            header: HeaderRequest::new(1, 4, 1, "rust"),
            request: Request::Fetch(FetchRequest::new(100, 1, 1024)),
            at: Instant::now(),
            resp_tx,
        };
        DeferredFetch::new(creq, min_bytes, have, vec![("rust".to_owned(), 0)])
    }

    #[test]
    fn wakes_once_when_threshold_crossed() {
        let fetch = fetch(10, 2);
        assert!(!fetch.add_bytes(3));
        assert!(fetch.add_bytes(5));
        assert!(!fetch.add_bytes(5));
    }

    #[test]
    fn cleaned_exactly_once() {
        let fetch = fetch(1, 0);
        assert!(fetch.try_clean());
        assert!(!fetch.try_clean());
        assert!(!fetch.try_clean());
    }

    #[tokio::test]
    async fn timer_fires_after_wait() {
        let (ready_tx, mut ready_rx) = mpsc::channel(1);
        let (_die_tx, die_rx) = watch::channel(false);
        let parked = fetch(1, 0);
        start_timer(parked.clone(), Duration::from_millis(10), ready_tx, die_rx);

        let fired = ready_rx.recv().await.unwrap();
        assert!(Arc::ptr_eq(&fired, &parked));
    }

    #[tokio::test]
    async fn cancelled_timer_never_fires() {
        let (ready_tx, mut ready_rx) = mpsc::channel(1);
        let (_die_tx, die_rx) = watch::channel(false);
        let parked = fetch(1, 0);
        parked.cancel_timer();
        start_timer(parked, Duration::from_millis(10), ready_tx, die_rx);

        // the sender is dropped with the finished timer task
        assert!(ready_rx.recv().await.is_none());
    }
}
