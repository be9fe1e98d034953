use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use analysis_pipeline::assembly::PipelineAnalysis;
use analysis_pipeline::component::{AnalysisComponent, FnWork, StageSink};
use analysis_pipeline::error::ExtractorError;
use analysis_pipeline::provider::{AbstractCache, AbstractProvider, Extractor, FileCache, FnExtractor, ProviderSettings};

/// Reads both consumer views of a shared variability-model source and
/// emits each name followed by the same name suffixed with `_M2`.
fn shared_source_stage(
    first: Arc<AnalysisComponent<Vec<String>>>,
    second: Arc<AnalysisComponent<Vec<String>>>,
) -> AnalysisComponent<String> {
    let work = Box::new(FnWork(move |mut sink: StageSink<String>| async move {
        let names = first.next_result().await.unwrap_or_default();
        let _ = second.next_result().await;
        for name in names {
            if !sink.add_result(name.clone()).await {
                break;
            }
            if !sink.add_result(format!("{name}_M2")).await {
                break;
            }
        }
        Ok(())
    }));
    AnalysisComponent::new("SharedSource", work)
}

#[tokio::test]
async fn shared_variability_source_is_extracted_exactly_once() {
    let invocations = Arc::new(AtomicUsize::new(0));
    let counter = invocations.clone();

    let extractor: Arc<dyn Extractor<Vec<String>>> = Arc::new(FnExtractor(move |_target: &str| {
        counter.fetch_add(1, Ordering::SeqCst);
        async move { Ok(vec!["Var_A".to_string(), "Var_B".to_string(), "Var_C".to_string()]) }
    }));

    let provider = AbstractProvider::new(extractor, None, ProviderSettings::default(), vec!["root".to_string()]);
    let bm_provider = AbstractProvider::new(
        Arc::new(FnExtractor(|_: &str| async { Ok(Vec::<String>::new()) })),
        None,
        ProviderSettings::default(),
        Vec::new(),
    );
    let cm_provider = AbstractProvider::new(
        Arc::new(FnExtractor(|_: &str| async { Ok(Vec::<String>::new()) })),
        None,
        ProviderSettings::default(),
        Vec::new(),
    );

    let dir = tempfile::tempdir().unwrap();
    let assembler: PipelineAnalysis<Vec<String>, Vec<String>, Vec<String>> =
        PipelineAnalysis::new(provider, bm_provider, cm_provider, dir.path().to_path_buf());

    let first = Arc::new(assembler.vm_component());
    let second = Arc::new(assembler.vm_component());
    let terminal = shared_source_stage(first, second);

    assembler
        .run(terminal, Arc::new(analysis_pipeline::writer::LineWriterFactory))
        .await
        .expect("run succeeds");

    let contents = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .find(|e| e.file_name().to_string_lossy().starts_with("SharedSource_result_"))
        .map(|e| std::fs::read_to_string(e.path()).unwrap())
        .expect("result file exists");

    assert_eq!(
        contents,
        "Var_A\nVar_A_M2\nVar_B\nVar_B_M2\nVar_C\nVar_C_M2\n"
    );
    assert_eq!(invocations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn per_target_timeout_is_recorded_as_an_exception_and_other_targets_complete() {
    let extractor: Arc<dyn Extractor<String>> = Arc::new(FnExtractor(|target: &str| {
        let target = target.to_string();
        async move {
            if target == "T2" {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            Ok(format!("model:{target}"))
        }
    }));

    let settings = ProviderSettings {
        timeout: Duration::from_millis(20),
        concurrency: 3,
        read_cache: false,
        write_cache: false,
    };
    let provider = AbstractProvider::new(
        extractor,
        None,
        settings,
        vec!["T1".to_string(), "T2".to_string(), "T3".to_string()],
    );

    let results_handle = {
        let provider = provider.clone();
        tokio::spawn(async move {
            let mut results = Vec::new();
            while let Some(value) = provider.next_result().await {
                results.push(value);
            }
            results
        })
    };
    let exceptions_handle = {
        let provider = provider.clone();
        tokio::spawn(async move {
            let mut exceptions = Vec::new();
            while let Some(err) = provider.next_exception().await {
                exceptions.push(err);
            }
            exceptions
        })
    };

    let mut results = results_handle.await.unwrap();
    let exceptions = exceptions_handle.await.unwrap();
    results.sort();

    assert_eq!(results, vec!["model:T1".to_string(), "model:T3".to_string()]);
    assert_eq!(exceptions.len(), 1);
    match &exceptions[0] {
        ExtractorError::Timeout { target, .. } => assert_eq!(target, "T2"),
        other => panic!("expected a timeout exception, got {other:?}"),
    }
}

#[tokio::test]
async fn cache_hit_bypasses_a_failing_extractor() {
    let cache_dir = tempfile::tempdir().unwrap();
    let cache: Arc<dyn AbstractCache<String>> = Arc::new(FileCache::new(cache_dir.path().to_path_buf()));
    cache
        .write("variability", &"cached-model".to_string())
        .await
        .expect("seed cache entry");

    let extractor: Arc<dyn Extractor<String>> =
        Arc::new(FnExtractor(|_: &str| async { anyhow::bail!("extractor always fails") }));

    let settings = ProviderSettings {
        timeout: Duration::from_secs(5),
        concurrency: 1,
        read_cache: true,
        write_cache: false,
    };
    let provider = AbstractProvider::new(extractor, Some(cache), settings, vec!["variability".to_string()]);

    let value = provider.next_result().await;
    assert_eq!(value, Some("cached-model".to_string()));

    let exception = provider.next_exception().await;
    assert!(exception.is_none(), "cache hit must never invoke the extractor");
}
