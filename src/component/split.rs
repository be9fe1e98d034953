//! Fan-out (`SplitComponent`).
//!
//! Wraps one producer stage and hands out N freshly created pseudo-stages,
//! each of which observes every value the producer emits, in production
//! order. Branches are plain [`AnalysisComponent`]s that share a channel the
//! split publishes into — there is no back-pointer from a branch to its
//! owner.

use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, OnceCell};

use crate::component::stage::{AnalysisComponent, AnalysisWork, FnWork, StageSink};
use crate::component::stream::DEFAULT_CAPACITY;

struct SplitInner<T: Clone + Send + 'static> {
    upstream: Arc<AnalysisComponent<T>>,
    senders: Mutex<Vec<mpsc::Sender<T>>>,
    capacity: usize,
    distributing: OnceCell<()>,
}

impl<T: Clone + Send + 'static> SplitInner<T> {
    async fn ensure_distributing(self: &Arc<Self>) {
        let this = self.clone();
        self.distributing
            .get_or_init(move || async move {
                let senders = this.senders.lock().unwrap().clone();
                let upstream = this.upstream.clone();
                tokio::spawn(distribute(upstream, senders));
            })
            .await;
    }
}

async fn distribute<T: Clone + Send + 'static>(
    upstream: Arc<AnalysisComponent<T>>,
    senders: Vec<mpsc::Sender<T>>,
) {
    while let Some(value) = upstream.next_result().await {
        for sender in &senders {
            // A saturated branch blocks the whole split; a branch whose
            // consumer has gone away is simply dropped from future
            // deliveries by virtue of `send` failing harmlessly.
            let _ = sender.send(value.clone()).await;
        }
    }
    // `senders` drops here, closing every branch's receiver.
}

/// Fans a single stage's output out to any number of independent consumer
/// branches. The split itself is a helper: it never appears as an
/// addressable element-producing stage, only its branches do.
pub struct SplitComponent<T: Clone + Send + 'static> {
    inner: Arc<SplitInner<T>>,
}

impl<T: Clone + Send + 'static> SplitComponent<T> {
    pub fn new(upstream: Arc<AnalysisComponent<T>>) -> Self {
        Self::with_capacity(upstream, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(upstream: Arc<AnalysisComponent<T>>, capacity: usize) -> Self {
        Self {
            inner: Arc::new(SplitInner {
                upstream,
                senders: Mutex::new(Vec::new()),
                capacity,
                distributing: OnceCell::new(),
            }),
        }
    }

    /// Creates a new pseudo-stage that will receive a copy of every value
    /// produced by the wrapped stage, in production order.
    ///
    /// Must be called before the first branch is started (i.e. while the
    /// pipeline is still being assembled) — once fan-out begins, the set of
    /// branches is fixed for the lifetime of the run.
    pub fn create_output_component(&self) -> AnalysisComponent<T> {
        let (tx, mut rx) = mpsc::channel(self.inner.capacity.max(1));
        self.inner.senders.lock().unwrap().push(tx);

        let inner = self.inner.clone();
        let work: Box<dyn AnalysisWork<T>> = Box::new(FnWork(move |mut sink: StageSink<T>| {
            async move {
                inner.ensure_distributing().await;
                while let Some(value) = rx.recv().await {
                    if !sink.add_result(value).await {
                        break;
                    }
                }
                Ok(())
            }
        }));

        AnalysisComponent::new(format!("{}_branch", self.inner.upstream.name()), work)
            .mark_internal_helper()
    }
}
