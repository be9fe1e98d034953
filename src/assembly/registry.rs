//! Reflective pipeline configurator: a registry keyed by stage-type name,
//! populated from `analysis.pipeline`, used to build a linear chain of
//! stages without writing a code-supplied assembler function.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::component::AnalysisComponent;
use crate::error::SetupError;
use crate::writer::WriterFactory;

pub type StageConstructor<T> = Arc<dyn Fn(AnalysisComponent<T>) -> AnalysisComponent<T> + Send + Sync>;

/// Maps a stage-type name to a function that wraps an upstream stage with a
/// new one. Registrations are instance-scoped (one registry per element
/// type in use), since Rust's static type system has no single global
/// registry spanning arbitrary, mutually incompatible element types.
pub struct StageRegistry<T: Clone + Send + Sync + 'static> {
    constructors: Mutex<HashMap<String, StageConstructor<T>>>,
}

impl<T: Clone + Send + Sync + 'static> Default for StageRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> StageRegistry<T> {
    pub fn new() -> Self {
        Self {
            constructors: Mutex::new(HashMap::new()),
        }
    }

    pub fn register(&self, name: impl Into<String>, constructor: StageConstructor<T>) {
        self.constructors.lock().unwrap().insert(name.into(), constructor);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.lock().unwrap().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    /// Pipes `source` through the named stage types in order. The terminal
    /// stage is whatever the last constructor returns.
    ///
    /// Every stage built along the way — `source` included, not just the
    /// terminal stage returned at the end — is checked against `log_set` and
    /// wired for intermediate-result mirroring if its name is in it,
    /// matching what a hand-assembled pipeline would do stage by stage.
    pub fn build_linear(
        &self,
        source: AnalysisComponent<T>,
        stage_types: &[String],
        log_set: &HashSet<String>,
        output_dir: &Path,
        writer_factory: &Arc<dyn WriterFactory<T>>,
    ) -> Result<AnalysisComponent<T>, SetupError> {
        let registry = self.constructors.lock().unwrap();
        let mut current =
            source.with_intermediate_log_if_configured(log_set, output_dir.to_path_buf(), writer_factory.clone());
        for stage_type in stage_types {
            let constructor = registry
                .get(stage_type)
                .ok_or_else(|| SetupError::UnknownStageType(stage_type.clone()))?;
            current = constructor(current)
                .with_intermediate_log_if_configured(log_set, output_dir.to_path_buf(), writer_factory.clone());
        }
        Ok(current)
    }
}
