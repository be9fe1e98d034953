//! Provider supervision: runs an extractor over a target list, mediated by
//! a cache and a per-target timeout, exposing results and exceptions as two
//! independent streams.
//!
//! A provider started by more than one stage still extracts each target
//! exactly once — callers share a provider through a [`SplitComponent`],
//! the same fan-out mechanism a stage's output uses (see
//! `crate::component::split`); the supervision loop below has no notion of
//! multiple observers at all.
//!
//! [`SplitComponent`]: crate::component::SplitComponent

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{OnceCell, Semaphore};
use tokio::task::JoinSet;

use crate::component::stream::{bounded, ResultSink, ResultSource, DEFAULT_CAPACITY};
use crate::error::ExtractorError;
use crate::provider::cache::{AbstractCache, CacheRead};
use crate::provider::extractor::Extractor;

/// Per-kind knobs read from configuration: `*.provider.timeout`,
/// `*.provider.cache.read`, `*.provider.cache.write`, worker pool size.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub timeout: Duration,
    pub concurrency: usize,
    pub read_cache: bool,
    pub write_cache: bool,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            concurrency: 1,
            read_cache: false,
            write_cache: false,
        }
    }
}

struct Parts<T> {
    result_sink: ResultSink<T>,
    exception_sink: ResultSink<ExtractorError>,
}

/// Supervises a single extractor over a fixed target list. Idle until the
/// first call to [`start`](Self::start), [`next_result`](Self::next_result)
/// or [`next_exception`](Self::next_exception), then runs exactly once.
pub struct AbstractProvider<T: Clone + Send + Sync + 'static> {
    extractor: Arc<dyn Extractor<T>>,
    cache: Option<Arc<dyn AbstractCache<T>>>,
    settings: ProviderSettings,
    targets: Vec<String>,
    start_cell: OnceCell<()>,
    parts: Mutex<Option<Parts<T>>>,
    results: tokio::sync::Mutex<Option<ResultSource<T>>>,
    exceptions: tokio::sync::Mutex<Option<ResultSource<ExtractorError>>>,
}

impl<T: Clone + Send + Sync + 'static> AbstractProvider<T> {
    pub fn new(
        extractor: Arc<dyn Extractor<T>>,
        cache: Option<Arc<dyn AbstractCache<T>>>,
        settings: ProviderSettings,
        targets: Vec<String>,
    ) -> Arc<Self> {
        let (result_sink, result_source) = bounded(DEFAULT_CAPACITY);
        let (exception_sink, exception_source) = bounded(DEFAULT_CAPACITY);
        Arc::new(Self {
            extractor,
            cache,
            settings,
            targets,
            start_cell: OnceCell::new(),
            parts: Mutex::new(Some(Parts {
                result_sink,
                exception_sink,
            })),
            results: tokio::sync::Mutex::new(Some(result_source)),
            exceptions: tokio::sync::Mutex::new(Some(exception_source)),
        })
    }

    /// Idempotent; begins extraction on first call, a no-op afterwards.
    pub async fn start(self: &Arc<Self>) {
        let this = self.clone();
        self.start_cell
            .get_or_init(move || {
                let this = this.clone();
                async move {
                    if let Some(parts) = this.parts.lock().unwrap().take() {
                        tokio::spawn(run(this.clone(), parts));
                    }
                }
            })
            .await;
    }

    /// Blocks until a value is ready or the result stream is exhausted.
    /// Implicitly starts the provider.
    pub async fn next_result(self: &Arc<Self>) -> Option<T> {
        self.start().await;
        let mut guard = self.results.lock().await;
        match guard.as_mut() {
            Some(source) => source.next_result().await,
            None => None,
        }
    }

    /// Independent error stream; never duplicates a value already seen on
    /// [`next_result`](Self::next_result).
    pub async fn next_exception(self: &Arc<Self>) -> Option<ExtractorError> {
        self.start().await;
        let mut guard = self.exceptions.lock().await;
        match guard.as_mut() {
            Some(source) => source.next_result().await,
            None => None,
        }
    }
}

async fn process_target<T: Clone + Send + Sync + 'static>(
    provider: &Arc<AbstractProvider<T>>,
    target: &str,
) -> Result<T, ExtractorError> {
    if provider.settings.read_cache {
        if let Some(cache) = &provider.cache {
            match cache.read(target).await {
                CacheRead::Hit(value) => return Ok(value),
                CacheRead::Miss => {}
                CacheRead::Corrupted(err) => {
                    tracing::warn!(target, error = %err, "cache entry corrupted, treating as miss");
                }
            }
        }
    }

    let outcome = tokio::time::timeout(provider.settings.timeout, provider.extractor.extract(target)).await;
    let value = match outcome {
        Ok(Ok(value)) => value,
        Ok(Err(e)) => {
            return Err(ExtractorError::Failed {
                target: target.to_string(),
                message: e.to_string(),
            });
        }
        Err(_) => {
            return Err(ExtractorError::Timeout {
                target: target.to_string(),
                timeout_ms: provider.settings.timeout.as_millis() as u64,
            });
        }
    };

    if provider.settings.write_cache {
        if let Some(cache) = &provider.cache {
            if let Err(e) = cache.write(target, &value).await {
                tracing::error!(target, error = %e, "failed to write cache entry");
            }
        }
    }

    Ok(value)
}

async fn run<T: Clone + Send + Sync + 'static>(provider: Arc<AbstractProvider<T>>, parts: Parts<T>) {
    let Parts {
        result_sink,
        exception_sink,
    } = parts;

    // Pool size 1: strict target-enumeration order. Pool size N: completion
    // order, bounded by a semaphore rather than an unbounded spawn storm.
    if provider.settings.concurrency <= 1 {
        for target in &provider.targets {
            match process_target(&provider, target).await {
                Ok(value) => {
                    if !result_sink.add_result(value).await {
                        break;
                    }
                }
                Err(err) => {
                    tracing::error!(target = %target, error = %err, "extraction failed");
                    if !exception_sink.add_result(err).await {
                        break;
                    }
                }
            }
        }
    } else {
        let semaphore = Arc::new(Semaphore::new(provider.settings.concurrency));
        let mut tasks = JoinSet::new();
        for target in provider.targets.clone() {
            let provider = provider.clone();
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore is never closed");
                process_target(&provider, &target).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(value)) => {
                    if !result_sink.add_result(value).await {
                        break;
                    }
                }
                Ok(Err(err)) => {
                    tracing::error!(error = %err, "extraction failed");
                    if !exception_sink.add_result(err).await {
                        break;
                    }
                }
                Err(join_err) => {
                    tracing::error!(error = %join_err, "extraction task panicked");
                }
            }
        }
    }
}
