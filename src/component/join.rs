//! Barrier (`JoinComponent`).
//!
//! A terminal helper stage over N inputs: starts each of them and blocks
//! until every one has reached end-of-stream. Exists so a branching
//! pipeline still has a single graph root.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use crate::component::stage::{AnalysisComponent, AnalysisWork, StageSink};
use crate::component::stream::DEFAULT_CAPACITY;

/// A stage whose only remaining obligation, from the join's point of view,
/// is to be driven to end-of-stream. Type-erases the element type so a
/// single `JoinComponent` can await inputs of different element types.
#[async_trait]
pub trait Awaitable: Send + Sync {
    async fn drain_to_completion(&self);
}

#[async_trait]
impl<T: Clone + Send + 'static> Awaitable for Arc<AnalysisComponent<T>> {
    async fn drain_to_completion(&self) {
        while self.next_result().await.is_some() {}
    }
}

struct JoinWork {
    inputs: Vec<Arc<dyn Awaitable>>,
}

#[async_trait]
impl AnalysisWork<()> for JoinWork {
    async fn run(self: Box<Self>, _sink: StageSink<()>) -> anyhow::Result<()> {
        join_all(self.inputs.iter().map(|input| input.drain_to_completion())).await;
        // `_sink` drops here without ever producing a value: the join's
        // output stream is immediately closed and empty.
        Ok(())
    }
}

/// Builds a join over the given inputs: a helper, terminal-shaped stage
/// that completes only after every input has reached end-of-stream.
pub fn join_component(inputs: Vec<Arc<dyn Awaitable>>) -> AnalysisComponent<()> {
    AnalysisComponent::with_capacity(
        "join",
        DEFAULT_CAPACITY,
        Box::new(JoinWork { inputs }),
    )
    .mark_internal_helper()
}
