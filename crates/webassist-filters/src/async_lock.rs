//! Single-flight execution
//!
//! [`SingleFlight`] is an explicit, clonable permit: every clone shares one
//! lock, and [`SingleFlight::guard`] runs at most one body at a time across
//! all of them. Waiters are served in FIFO order. There is no timeout, so a
//! body that never finishes keeps every other caller waiting.
//!
//! [`AsyncLock`] is the filter form: it runs the rest of the request pipeline
//! inside `guard`.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use webassist_core::{ActionFilter, BoxFuture, Next, Request, Response};

/// Shared single-flight permit
#[derive(Debug, Clone, Default)]
pub struct SingleFlight {
    // A unit mutex is tokio's FIFO semaphore with a single permit
    permit: Arc<Mutex<()>>,
}

impl SingleFlight {
    /// Create a new, independent permit
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `body` while holding the permit
    ///
    /// The permit is released however the body ends: with a value, with an
    /// `Err`, by panicking, or by the returned future being dropped. The
    /// body's output is returned untouched.
    pub async fn guard<F>(&self, body: F) -> F::Output
    where
        F: Future,
    {
        let _permit = self.permit.lock().await;
        body.await
    }

    /// Whether some body currently holds the permit
    pub fn is_held(&self) -> bool {
        self.permit.try_lock().is_err()
    }

    /// Whether two handles share the same permit
    pub fn same_permit(&self, other: &SingleFlight) -> bool {
        Arc::ptr_eq(&self.permit, &other.permit)
    }
}

/// Filter that runs the remaining pipeline under a [`SingleFlight`]
///
/// Requests through every route sharing the same `SingleFlight` are handled
/// one at a time.
#[derive(Debug, Clone)]
pub struct AsyncLock {
    flight: SingleFlight,
}

impl AsyncLock {
    /// Guard requests with `flight`
    pub fn new(flight: SingleFlight) -> Self {
        Self { flight }
    }

    /// The permit this filter uses
    pub fn flight(&self) -> &SingleFlight {
        &self.flight
    }
}

impl ActionFilter for AsyncLock {
    fn call(&self, req: Request, next: Next) -> BoxFuture<Response> {
        let flight = self.flight.clone();
        Box::pin(async move { flight.guard(next(req)).await })
    }

    fn clone_box(&self) -> Box<dyn ActionFilter> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::join_all;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct Occupancy {
        current: AtomicUsize,
        max: AtomicUsize,
    }

    impl Occupancy {
        async fn visit(&self) {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.max.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.current.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn hundred_concurrent_callers_never_overlap() {
        let flight = SingleFlight::new();
        let occupancy = Arc::new(Occupancy::default());

        let tasks: Vec<_> = (0..100)
            .map(|_| {
                let flight = flight.clone();
                let occupancy = occupancy.clone();
                tokio::spawn(async move { flight.guard(occupancy.visit()).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(occupancy.max.load(Ordering::SeqCst), 1);
        assert_eq!(occupancy.current.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn error_is_returned_untouched_and_permit_released() {
        let flight = SingleFlight::new();
        let result: Result<(), &str> = flight.guard(async { Err("boom") }).await;
        assert_eq!(result, Err("boom"));
        assert!(!flight.is_held());
        assert_eq!(flight.guard(async { 7 }).await, 7);
    }

    #[tokio::test]
    async fn panic_releases_permit() {
        let flight = SingleFlight::new();
        let panicking = flight.clone();
        let joined = tokio::spawn(async move {
            panicking
                .guard(async {
                    panic!("body failed");
                })
                .await
        })
        .await;

        assert!(joined.is_err());
        assert!(!flight.is_held());
    }

    #[tokio::test]
    async fn dropped_future_releases_permit() {
        let flight = SingleFlight::new();
        let cancelled = tokio::time::timeout(
            Duration::from_millis(10),
            flight.guard(std::future::pending::<()>()),
        )
        .await;

        assert!(cancelled.is_err());
        assert!(!flight.is_held());
    }

    #[tokio::test]
    async fn stuck_body_blocks_other_callers() {
        let flight = SingleFlight::new();
        let stuck = flight.clone();
        let holder = tokio::spawn(async move { stuck.guard(std::future::pending::<()>()).await });

        while !flight.is_held() {
            tokio::task::yield_now().await;
        }
        let waiter = tokio::time::timeout(Duration::from_millis(50), flight.guard(async { 1 })).await;
        assert!(waiter.is_err());

        holder.abort();
        let _ = holder.await;
        assert_eq!(flight.guard(async { 2 }).await, 2);
    }

    #[tokio::test]
    async fn independent_flights_do_not_block_each_other() {
        let a = SingleFlight::new();
        let b = SingleFlight::new();
        assert!(!a.same_permit(&b));
        assert!(a.same_permit(&a.clone()));

        let nested = a.guard(b.guard(async { "both" })).await;
        assert_eq!(nested, "both");
    }

    #[tokio::test]
    async fn waiters_run_in_arrival_order() {
        let flight = SingleFlight::new();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let gate = flight.permit.clone().lock_owned().await;

        let mut tasks = Vec::new();
        for id in 0..5 {
            let flight = flight.clone();
            let order = order.clone();
            tasks.push(tokio::spawn(async move {
                flight.guard(async { order.lock().unwrap().push(id) }).await
            }));
            // let each waiter enqueue before the next one starts
            for _ in 0..10 {
                tokio::task::yield_now().await;
            }
        }

        drop(gate);
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    proptest! {
        #[test]
        fn k_interleaved_callers_never_overlap(k in 1usize..64) {
            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            let max = runtime.block_on(async move {
                let flight = SingleFlight::new();
                let occupancy = Arc::new(Occupancy::default());
                let calls = (0..k).map(|_| {
                    let flight = flight.clone();
                    let occupancy = occupancy.clone();
                    async move { flight.guard(occupancy.visit()).await }
                });
                join_all(calls).await;
                occupancy.max.load(Ordering::SeqCst)
            });
            prop_assert_eq!(max, 1);
        }
    }
}
