//! Model sources: the three provider-backed pseudo-stages (variability,
//! build, code) plus the provider, cache and extractor abstractions they're
//! built from.

pub mod build;
pub mod cache;
pub mod code;
pub mod extractor;
pub mod provider;
pub mod variability;

use std::sync::Arc;

pub use build::build_model_component;
pub use cache::{AbstractCache, CacheRead, FileCache};
pub use code::code_model_component;
pub use extractor::{Extractor, FnExtractor};
pub use provider::{AbstractProvider, ProviderSettings};
pub use variability::variability_model_component;

use crate::component::stage::{AnalysisComponent, AnalysisWork, FnWork, StageSink};

/// Wraps a provider as a plain stage: drains its result stream and forwards
/// every value downstream, under the given display name.
fn model_source_component<T: Clone + Send + Sync + 'static>(
    name: &str,
    provider: Arc<AbstractProvider<T>>,
) -> AnalysisComponent<T> {
    let work: Box<dyn AnalysisWork<T>> = Box::new(FnWork(move |mut sink: StageSink<T>| async move {
        while let Some(value) = provider.next_result().await {
            if !sink.add_result(value).await {
                break;
            }
        }
        Ok(())
    }));
    AnalysisComponent::new(name, work)
}
