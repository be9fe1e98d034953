//! Pipeline assembler (`PipelineAnalysis`): builds the DAG once, supplies
//! the three model sources to user stages as shared pseudo-components, runs
//! the terminal stage, and serializes its results.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use crate::component::split::SplitComponent;
use crate::component::stage::AnalysisComponent;
use crate::component::time::now_millis;
use crate::error::{IoError, PipelineError, SetupError};
use crate::provider::{
    build_model_component, code_model_component, variability_model_component, AbstractProvider,
};
use crate::writer::WriterFactory;

/// Owns the three model providers and lazily installs a fan-out the first
/// time any of them is requested by a user stage. Later requests return a
/// new consumer branch of the same underlying source (never a second
/// extraction).
pub struct PipelineAnalysis<VM, BM, CM>
where
    VM: Clone + Send + Sync + 'static,
    BM: Clone + Send + Sync + 'static,
    CM: Clone + Send + Sync + 'static,
{
    vm_provider: Arc<AbstractProvider<VM>>,
    bm_provider: Arc<AbstractProvider<BM>>,
    cm_provider: Arc<AbstractProvider<CM>>,
    vm_split: OnceLock<SplitComponent<VM>>,
    bm_split: OnceLock<SplitComponent<BM>>,
    cm_split: OnceLock<SplitComponent<CM>>,
    output_dir: PathBuf,
}

impl<VM, BM, CM> PipelineAnalysis<VM, BM, CM>
where
    VM: Clone + Send + Sync + 'static,
    BM: Clone + Send + Sync + 'static,
    CM: Clone + Send + Sync + 'static,
{
    pub fn new(
        vm_provider: Arc<AbstractProvider<VM>>,
        bm_provider: Arc<AbstractProvider<BM>>,
        cm_provider: Arc<AbstractProvider<CM>>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            vm_provider,
            bm_provider,
            cm_provider,
            vm_split: OnceLock::new(),
            bm_split: OnceLock::new(),
            cm_split: OnceLock::new(),
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &std::path::Path {
        &self.output_dir
    }

    /// Returns a new consumer view of the variability-model source. The
    /// first call installs the fan-out; every call after that is a cheap
    /// new branch over the same extraction.
    pub fn vm_component(&self) -> AnalysisComponent<VM> {
        let provider = self.vm_provider.clone();
        let split = self
            .vm_split
            .get_or_init(|| SplitComponent::new(Arc::new(variability_model_component(provider))));
        split.create_output_component()
    }

    pub fn bm_component(&self) -> AnalysisComponent<BM> {
        let provider = self.bm_provider.clone();
        let split = self
            .bm_split
            .get_or_init(|| SplitComponent::new(Arc::new(build_model_component(provider))));
        split.create_output_component()
    }

    pub fn cm_component(&self) -> AnalysisComponent<CM> {
        let provider = self.cm_provider.clone();
        let split = self
            .cm_split
            .get_or_init(|| SplitComponent::new(Arc::new(code_model_component(provider))));
        split.create_output_component()
    }

    /// Runs the pipeline to completion: drains `terminal`'s output through
    /// `writer_factory`, writing `<name>_result_<timestamp>.<ext>` into the
    /// output directory (created if missing). Returns the artifact path.
    pub async fn run<T: Clone + Send + 'static>(
        &self,
        terminal: AnalysisComponent<T>,
        writer_factory: Arc<dyn WriterFactory<T>>,
    ) -> Result<PathBuf, PipelineError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| SetupError::OutputDirUnusable {
                path: self.output_dir.display().to_string(),
                source,
            })?;

        let path = self.output_dir.join(format!(
            "{}_result_{}.{}",
            terminal.name(),
            now_millis(),
            writer_factory.extension()
        ));

        let mut writer = writer_factory.create(&path).map_err(|source| {
            tracing::error!(path = %path.display(), error = %source, "failed to open result writer");
            SetupError::OutputDirUnusable {
                path: path.display().to_string(),
                source,
            }
        })?;

        while let Some(value) = terminal.next_result().await {
            if let Err(e) = writer.write_record(&value) {
                let io_err = IoError {
                    path: path.display().to_string(),
                    source: e,
                };
                tracing::error!(error = %io_err, "failed to write result record");
            }
        }

        if let Err(e) = writer.close() {
            tracing::error!(path = %path.display(), error = %e, "failed to close result writer");
        }

        Ok(path)
    }

    /// Lists artifacts currently present in the output directory, for
    /// end-of-run reporting.
    pub fn list_output_artifacts(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&self.output_dir)? {
            entries.push(entry?.path());
        }
        entries.sort();
        Ok(entries)
    }
}
