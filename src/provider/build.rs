//! Build-model source: a single-result provider over `source_tree`.

use std::sync::Arc;

use crate::component::AnalysisComponent;
use crate::provider::model_source_component;
use crate::provider::provider::AbstractProvider;

pub fn build_model_component<T: Clone + Send + Sync + 'static>(
    provider: Arc<AbstractProvider<T>>,
) -> AnalysisComponent<T> {
    model_source_component("BuildModel", provider)
}
