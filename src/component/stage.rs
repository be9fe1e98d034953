//! The stage runtime (`AnalysisComponent`).
//!
//! A stage is a typed streaming worker: it runs a user-supplied
//! [`AnalysisWork`] once, producing zero or more results, and exposes them
//! one at a time through [`AnalysisComponent::next_result`]. The queue
//! plumbing lives in [`StageSink`]/[`ResultSource`], composed into the
//! stage as a value rather than in a base class — `AnalysisComponent` is a
//! concrete struct, not a trait every stage implements.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::component::stream::{bounded, ResultSink, ResultSource, DEFAULT_CAPACITY};
use crate::component::time::now_millis;
use crate::error::StageError;
use crate::writer::{ResultWriter, WriterFactory};

/// Lifecycle states a stage moves through exactly once, monotonically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Started,
    Running,
    Finished,
}

/// The body of a stage: reads whatever inputs it closed over, computes, and
/// writes results to `sink`. Runs exactly once, driven by `AnalysisComponent`.
#[async_trait]
pub trait AnalysisWork<T: Send + 'static>: Send + 'static {
    async fn run(self: Box<Self>, sink: StageSink<T>) -> anyhow::Result<()>;
}

/// Adapts a plain async closure into [`AnalysisWork`], for stages simple
/// enough not to need their own named type.
pub struct FnWork<F>(pub F);

#[async_trait]
impl<T, F, Fut> AnalysisWork<T> for FnWork<F>
where
    T: Send + 'static,
    F: FnOnce(StageSink<T>) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn run(self: Box<Self>, sink: StageSink<T>) -> anyhow::Result<()> {
        (self.0)(sink).await
    }
}

/// Lazily-opened mirror of a stage's output to
/// `<stageName>_intermediate_result_<timestamp>.<ext>`.
struct IntermediateLog<T> {
    factory: Arc<dyn WriterFactory<T>>,
    dir: PathBuf,
    stage_name: String,
    writer: Option<Box<dyn ResultWriter<T>>>,
}

impl<T> Drop for IntermediateLog<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T> IntermediateLog<T> {
    fn write(&mut self, value: &T) {
        if self.writer.is_none() {
            let path = self.dir.join(format!(
                "{}_intermediate_result_{}.{}",
                self.stage_name,
                now_millis(),
                self.factory.extension()
            ));
            match self.factory.create(&path) {
                Ok(w) => self.writer = Some(w),
                Err(e) => {
                    tracing::error!(stage = %self.stage_name, error = %e, "failed to open intermediate result writer");
                    return;
                }
            }
        }
        if let Some(w) = self.writer.as_mut() {
            if let Err(e) = w.write_record(value) {
                tracing::error!(stage = %self.stage_name, error = %e, "failed to write intermediate result");
            }
        }
    }

    fn close(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            if let Err(e) = w.close() {
                tracing::error!(stage = %self.stage_name, error = %e, "failed to close intermediate result writer");
            }
        }
    }
}

/// Producer-side handle passed to [`AnalysisWork::run`]. Wraps the raw
/// result queue with the (optional) intermediate-log mirror, so a stage's
/// work function never has to know whether it is being observed.
pub struct StageSink<T> {
    sink: ResultSink<T>,
    intermediate: Option<IntermediateLog<T>>,
}

impl<T: Clone + Send + 'static> StageSink<T> {
    /// Enqueues a value, mirroring it to the intermediate log first if one
    /// is configured. Blocks while the output queue is saturated.
    pub async fn add_result(&mut self, value: T) -> bool {
        if let Some(log) = self.intermediate.as_mut() {
            log.write(&value);
        }
        self.sink.add_result(value).await
    }
}

type Parts<T> = (ResultSink<T>, Box<dyn AnalysisWork<T>>, Option<IntermediateLog<T>>);

/// A single streaming stage. Construct with [`AnalysisComponent::new`], then
/// either call [`start`](Self::start) explicitly or simply call
/// [`next_result`](Self::next_result), which starts it implicitly.
pub struct AnalysisComponent<T: Clone + Send + 'static> {
    name: Arc<str>,
    internal_helper: bool,
    state: Arc<Mutex<Lifecycle>>,
    start_cell: Arc<OnceCell<()>>,
    parts: Arc<Mutex<Option<Parts<T>>>>,
    receiver: tokio::sync::Mutex<Option<ResultSource<T>>>,
}

impl<T: Clone + Send + 'static> AnalysisComponent<T> {
    pub fn new(name: impl Into<String>, work: Box<dyn AnalysisWork<T>>) -> Self {
        Self::with_capacity(name, DEFAULT_CAPACITY, work)
    }

    pub fn with_capacity(
        name: impl Into<String>,
        capacity: usize,
        work: Box<dyn AnalysisWork<T>>,
    ) -> Self {
        let (sink, source) = bounded(capacity);
        Self {
            name: Arc::from(name.into()),
            internal_helper: false,
            state: Arc::new(Mutex::new(Lifecycle::Created)),
            start_cell: Arc::new(OnceCell::new()),
            parts: Arc::new(Mutex::new(Some((sink, work, None)))),
            receiver: tokio::sync::Mutex::new(Some(source)),
        }
    }

    /// Marks this component a helper (split/fork/join): not surfaced to
    /// intermediate logging even if its name happens to match the
    /// configured set.
    pub fn mark_internal_helper(mut self) -> Self {
        self.internal_helper = true;
        self
    }

    /// Enables intermediate-result mirroring for this stage, as if its name
    /// were present in the `analysis.components.log` configuration set.
    pub fn with_intermediate_log(self, dir: PathBuf, factory: Arc<dyn WriterFactory<T>>) -> Self {
        if self.internal_helper {
            return self;
        }
        let mut guard = self.parts.lock().unwrap();
        if let Some((_, _, intermediate)) = guard.as_mut() {
            *intermediate = Some(IntermediateLog {
                factory,
                dir,
                stage_name: self.name.to_string(),
                writer: None,
            });
        }
        drop(guard);
        self
    }

    /// Applies [`with_intermediate_log`](Self::with_intermediate_log) only if
    /// this stage's name is present in `log_set` — the check every
    /// stage-construction path (the reflective registry, a hand-assembled
    /// pipeline) should run as it builds each stage, not just at the
    /// terminal stage returned at the end.
    pub fn with_intermediate_log_if_configured(
        self,
        log_set: &std::collections::HashSet<String>,
        dir: PathBuf,
        factory: Arc<dyn WriterFactory<T>>,
    ) -> Self {
        if log_set.contains(self.name()) {
            self.with_intermediate_log(dir, factory)
        } else {
            self
        }
    }

    /// Stable display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_internal_helper(&self) -> bool {
        self.internal_helper
    }

    pub fn state(&self) -> Lifecycle {
        *self.state.lock().unwrap()
    }

    /// Idempotent; transitions `Created -> Started` and spawns the worker
    /// task. Safe to call concurrently from multiple consumers.
    pub async fn start(&self) {
        let state = self.state.clone();
        let name = self.name.clone();
        let parts = self.parts.clone();
        self.start_cell
            .get_or_init(move || {
                let state = state.clone();
                let name = name.clone();
                let parts = parts.clone();
                async move {
                    *state.lock().unwrap() = Lifecycle::Started;
                    if let Some((sink, work, intermediate)) = parts.lock().unwrap().take() {
                        tokio::spawn(drive(name, state, sink, work, intermediate));
                    }
                }
            })
            .await;
    }

    /// Blocks until a result is available or the stream closes. Implicitly
    /// starts the stage.
    pub async fn next_result(&self) -> Option<T> {
        self.start().await;
        let mut guard = self.receiver.lock().await;
        match guard.as_mut() {
            Some(source) => source.next_result().await,
            None => None,
        }
    }
}

async fn drive<T: Clone + Send + 'static>(
    name: Arc<str>,
    state: Arc<Mutex<Lifecycle>>,
    sink: ResultSink<T>,
    work: Box<dyn AnalysisWork<T>>,
    intermediate: Option<IntermediateLog<T>>,
) {
    *state.lock().unwrap() = Lifecycle::Running;
    tracing::debug!(stage = %name, "stage running");

    // `work.run` consumes `stage_sink` by value and drops it on return,
    // closing the output queue exactly once.
    let stage_sink = StageSink { sink, intermediate };
    let result = work.run(stage_sink).await;

    if let Err(err) = result {
        let stage_err = StageError {
            stage: name.to_string(),
            message: err.to_string(),
        };
        tracing::error!(stage = %name, error = %stage_err, "stage work function failed");
    }

    *state.lock().unwrap() = Lifecycle::Finished;
    tracing::debug!(stage = %name, "stage finished");
}
