//! The result stream: a bounded, single-producer queue with end-of-stream
//! signalled by channel closure rather than a sentinel value.
//!
//! There is exactly one way to observe end-of-stream here (`next_result`
//! returning `None`) — no `Option<Option<T>>` double-wrapping. Because
//! [`ResultSink`] is moved into a stage's work closure and dropped when that
//! closure returns, adding a result after close is a compile-time
//! impossibility rather than a runtime check.

use tokio::sync::mpsc;

/// Default back-pressure capacity for a stage's output queue.
pub const DEFAULT_CAPACITY: usize = 100;

/// Producer-side handle. Only ever held by the work closure that computes a
/// stage's results.
pub struct ResultSink<T> {
    tx: mpsc::Sender<T>,
}

impl<T: Send + 'static> ResultSink<T> {
    /// Enqueues a value, blocking while the queue is saturated.
    ///
    /// Returns `false` if every consumer has already dropped its receiver —
    /// the caller may treat this as a cue to stop producing early, though it
    /// is not an error: a downstream stage failing and closing its own
    /// input early is a normal occurrence.
    pub async fn add_result(&self, value: T) -> bool {
        self.tx.send(value).await.is_ok()
    }
}

/// Consumer-side handle.
pub struct ResultSource<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> ResultSource<T> {
    /// Blocks until a result is available or the stream is closed. Once
    /// closed, always returns `None`.
    pub async fn next_result(&mut self) -> Option<T> {
        self.rx.recv().await
    }
}

/// Creates a linked producer/consumer pair with the given capacity.
pub fn bounded<T: Send + 'static>(capacity: usize) -> (ResultSink<T>, ResultSource<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ResultSink { tx }, ResultSource { rx })
}
