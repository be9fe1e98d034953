//! Minimal demonstration stages used by the binary's default pipeline and
//! by the integration tests: `Simple` emits a fixed sequence of strings,
//! `Combined` reads two upstream stages in order and forwards everything
//! it sees. Neither is a concrete analysis — they exist to exercise the
//! runtime the way the end-to-end scenarios require.

use std::sync::Arc;

use crate::component::stage::{AnalysisComponent, FnWork, StageSink};

/// Emits `values` in order, then closes.
pub fn simple_stage(name: impl Into<String>, values: Vec<String>) -> AnalysisComponent<String> {
    let work = Box::new(FnWork(move |mut sink: StageSink<String>| async move {
        for value in values {
            if !sink.add_result(value).await {
                break;
            }
        }
        Ok(())
    }));
    AnalysisComponent::new(name, work)
}

/// Reads `first` to end-of-stream, then `second` to end-of-stream,
/// forwarding every value downstream in that order.
pub fn combined_stage(
    name: impl Into<String>,
    first: Arc<AnalysisComponent<String>>,
    second: Arc<AnalysisComponent<String>>,
) -> AnalysisComponent<String> {
    let work = Box::new(FnWork(move |mut sink: StageSink<String>| async move {
        while let Some(value) = first.next_result().await {
            if !sink.add_result(value).await {
                return Ok(());
            }
        }
        while let Some(value) = second.next_result().await {
            if !sink.add_result(value).await {
                return Ok(());
            }
        }
        Ok(())
    }));
    AnalysisComponent::new(name, work)
}
