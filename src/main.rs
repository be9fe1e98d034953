use std::path::Path;
use std::sync::Arc;

use clap::Parser;

use analysis_pipeline::assembly::{PipelineAnalysis, StageRegistry};
use analysis_pipeline::component::{AnalysisComponent, FnWork, StageSink};
use analysis_pipeline::demo::{combined_stage, simple_stage};
use analysis_pipeline::logging;
use analysis_pipeline::provider::{AbstractCache, AbstractProvider, Extractor, FileCache, FnExtractor};
use analysis_pipeline::settings::{self, Config, LogLevel};
use analysis_pipeline::writer::{LineWriterFactory, WriterFactory};

/// Analysis pipeline: a composable, concurrent runtime for orchestrating
/// variability/build/code model providers and a DAG of analysis stages.
#[derive(Parser)]
#[command(name = "analysis-pipeline")]
#[command(author = "Keith Bugeja <keith.bugeja@um.edu.mt>")]
#[command(version = "0.1.0")]
#[command(about = "Composable, concurrent analysis pipeline runtime")]
#[command(long_about =
"------------------------------------------------------------
    Analysis Pipeline

    Orchestrates variability-model, build-model and code-model
    providers through a configurable DAG of streaming analysis
    stages, driven by a TOML configuration file.
------------------------------------------------------------")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "./config/pipeline.toml")]
    config: String,

    /// Log level override (error, warning, status, info, debug)
    #[arg(short, long)]
    log_level: Option<String>,

    /// List registered stage types
    #[arg(short = 'L', long)]
    list_stages: bool,
}

fn parse_log_level(raw: &str) -> LogLevel {
    match raw.to_lowercase().as_str() {
        "error" => LogLevel::Error,
        "warning" | "warn" => LogLevel::Warning,
        "status" => LogLevel::Status,
        "debug" | "trace" => LogLevel::Debug,
        _ => LogLevel::Info,
    }
}

fn default_config() -> Config {
    settings::load_config_from_str(
        r#"
        output_dir = "./output"
        source_tree = "./"
        cache_dir = "./.cache"
        log_level = "info"
        "#,
    )
    .expect("built-in default configuration is valid TOML")
}

/// Wraps `upstream` with a stage that forwards every value in uppercase.
/// Registered under `"uppercase"` as a worked example of the reflective
/// stage registry.
fn uppercase_constructor(upstream: AnalysisComponent<String>) -> AnalysisComponent<String> {
    let upstream = Arc::new(upstream);
    let work = Box::new(FnWork(move |mut sink: StageSink<String>| {
        let upstream = upstream.clone();
        async move {
            while let Some(value) = upstream.next_result().await {
                if !sink.add_result(value.to_uppercase()).await {
                    break;
                }
            }
            Ok(())
        }
    }));
    AnalysisComponent::new("Uppercase", work)
}

fn enumerate_targets(root: &Path) -> Vec<String> {
    std::fs::read_dir(root)
        .into_iter()
        .flatten()
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.path().display().to_string())
        .collect()
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = Cli::parse();

    let config = settings::load_config(&cli.config).unwrap_or_else(|e| {
        eprintln!(
            "warning: could not load '{}': {e}; using built-in defaults",
            cli.config
        );
        default_config()
    });

    let log_level = cli
        .log_level
        .as_deref()
        .map(parse_log_level)
        .unwrap_or(config.log_level);
    logging::init_logging(log_level);

    let registry: StageRegistry<String> = StageRegistry::new();
    registry.register("uppercase", Arc::new(uppercase_constructor));

    if cli.list_stages {
        println!("Registered stage types:");
        for name in registry.names() {
            println!("  - {name}");
        }
        return;
    }

    let vm_target = config.source_tree.display().to_string();
    let bm_target = config.source_tree.display().to_string();
    let cm_targets = enumerate_targets(&config.source_tree);

    let identity_extractor: Arc<dyn Extractor<String>> = Arc::new(FnExtractor(|target: &str| {
        let target = target.to_string();
        async move { Ok(format!("model:{target}")) }
    }));

    let cache: Option<Arc<dyn AbstractCache<String>>> =
        Some(Arc::new(FileCache::new(config.cache_dir.clone())));

    let vm_provider = AbstractProvider::new(
        identity_extractor.clone(),
        cache.clone(),
        config.variability.to_settings(1),
        vec![vm_target],
    );
    let bm_provider = AbstractProvider::new(
        identity_extractor.clone(),
        cache.clone(),
        config.build.to_settings(1),
        vec![bm_target],
    );
    let cm_provider = AbstractProvider::new(
        identity_extractor,
        cache,
        config.code.to_settings(config.code_concurrency),
        cm_targets,
    );

    // A provider's exception stream is independent of its result stream and
    // fills (capacity `DEFAULT_CAPACITY`) just like the result stream does;
    // if nothing drains it, a provider with more failing/timed-out targets
    // than capacity blocks its extraction loop forever. Each provider gets
    // its own draining task regardless of whether the built pipeline ends up
    // reading its results.
    for (label, provider) in [
        ("variability", vm_provider.clone()),
        ("build", bm_provider.clone()),
        ("code", cm_provider.clone()),
    ] {
        tokio::spawn(async move {
            while let Some(err) = provider.next_exception().await {
                tracing::error!(provider = label, error = %err, "extractor reported an exception");
            }
        });
    }

    let assembler: PipelineAnalysis<String, String, String> = PipelineAnalysis::new(
        vm_provider,
        bm_provider,
        cm_provider,
        config.output_dir.clone(),
    );

    let log_set = &config.analysis.components.log;
    let writer_factory: Arc<dyn WriterFactory<String>> = Arc::new(LineWriterFactory);

    let terminal = if config.analysis.pipeline.is_empty() {
        let simple_a = Arc::new(
            simple_stage(
                "SimpleA",
                vec!["ResultA1".into(), "ResultA2".into(), "ResultA3".into()],
            )
            .with_intermediate_log_if_configured(log_set, config.output_dir.clone(), writer_factory.clone()),
        );
        let simple_b = Arc::new(
            simple_stage(
                "SimpleB",
                vec!["ResultB1".into(), "ResultB2".into(), "ResultB3".into()],
            )
            .with_intermediate_log_if_configured(log_set, config.output_dir.clone(), writer_factory.clone()),
        );
        combined_stage("Combined", simple_a, simple_b)
            .with_intermediate_log_if_configured(log_set, config.output_dir.clone(), writer_factory.clone())
    } else {
        let source = simple_stage(
            "Simple",
            vec!["Result1".into(), "Result2".into(), "Result3".into()],
        );
        match registry.build_linear(
            source,
            &config.analysis.pipeline,
            log_set,
            &config.output_dir,
            &writer_factory,
        ) {
            Ok(terminal) => terminal,
            Err(e) => {
                tracing::error!(error = %e, "failed to assemble reflective pipeline");
                std::process::exit(1);
            }
        }
    };

    match assembler.run(terminal, writer_factory).await {
        Ok(path) => tracing::info!(path = %path.display(), "pipeline run complete"),
        Err(e) => {
            tracing::error!(error = %e, "pipeline run failed");
            std::process::exit(1);
        }
    }

    if let Ok(artifacts) = assembler.list_output_artifacts() {
        for artifact in artifacts {
            println!("{}", artifact.display());
        }
    }
}
