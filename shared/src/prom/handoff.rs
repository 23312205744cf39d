//! One-shot handoff of a decoded result set.
//!
//! A producer running the query publishes its [`QueryResults`] exactly once;
//! a consumer waits for it exactly once. Both halves are consumed by use, so
//! a second publish or a second read does not compile, and the channel is
//! released as soon as the read returns.

use super::result::QueryResults;
use thiserror::Error;
use tokio::sync::oneshot;

/// Errors that can occur while handing results between producer and consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HandoffError {
    /// The producer was dropped without publishing.
    #[error("Query results channel closed before results were published")]
    Closed,

    /// The consumer was dropped before results were published.
    #[error("Query results consumer is gone")]
    ConsumerGone,
}

/// Creates a connected producer/consumer pair.
///
/// # Example
///
/// ```
/// use shared::prom::{handoff, QueryResults};
///
/// let (publisher, pending) = handoff();
/// std::thread::spawn(move || {
///     publisher.publish(QueryResults::new("up", Vec::new())).unwrap();
/// });
///
/// let results = pending.blocking_wait().unwrap();
/// assert_eq!(results.query, "up");
/// ```
#[must_use]
pub fn handoff() -> (ResultsPublisher, PendingResults) {
    let (tx, rx) = oneshot::channel();
    (ResultsPublisher { tx }, PendingResults { rx })
}

/// Producing half of a result handoff.
#[derive(Debug)]
pub struct ResultsPublisher {
    tx: oneshot::Sender<QueryResults>,
}

impl ResultsPublisher {
    /// Publishes the results, consuming the publisher.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::ConsumerGone`] if the consumer was dropped.
    pub fn publish(self, results: QueryResults) -> Result<(), HandoffError> {
        self.tx
            .send(results)
            .map_err(|_| HandoffError::ConsumerGone)
    }
}

/// Consuming half of a result handoff.
#[derive(Debug)]
pub struct PendingResults {
    rx: oneshot::Receiver<QueryResults>,
}

impl PendingResults {
    /// Waits asynchronously for the results.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::Closed`] if the producer was dropped without
    /// publishing.
    pub async fn wait(self) -> Result<QueryResults, HandoffError> {
        self.rx.await.map_err(|_| HandoffError::Closed)
    }

    /// Blocks the current thread until the results are published.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::Closed`] if the producer was dropped without
    /// publishing.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context; use
    /// [`PendingResults::wait`] there instead.
    pub fn blocking_wait(self) -> Result<QueryResults, HandoffError> {
        self.rx.blocking_recv().map_err(|_| HandoffError::Closed)
    }
}
