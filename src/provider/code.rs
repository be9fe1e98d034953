//! Code-model source: a multi-result provider over the enumerated source
//! files under `source_tree`, one result per file.

use std::sync::Arc;

use crate::component::AnalysisComponent;
use crate::provider::model_source_component;
use crate::provider::provider::AbstractProvider;

pub fn code_model_component<T: Clone + Send + Sync + 'static>(
    provider: Arc<AbstractProvider<T>>,
) -> AnalysisComponent<T> {
    model_source_component("CodeModel", provider)
}
