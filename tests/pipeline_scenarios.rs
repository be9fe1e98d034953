use std::fs;
use std::sync::Arc;

use analysis_pipeline::assembly::PipelineAnalysis;
use analysis_pipeline::demo::{combined_stage, simple_stage};
use analysis_pipeline::provider::{AbstractProvider, FnExtractor};
use analysis_pipeline::writer::LineWriterFactory;

fn empty_vm_provider() -> Arc<AbstractProvider<String>> {
    AbstractProvider::new(
        Arc::new(FnExtractor(|t: &str| {
            let t = t.to_string();
            async move { Ok(t) }
        })),
        None,
        Default::default(),
        Vec::new(),
    )
}

fn assembler(output_dir: &std::path::Path) -> PipelineAnalysis<String, String, String> {
    PipelineAnalysis::new(
        empty_vm_provider(),
        empty_vm_provider(),
        empty_vm_provider(),
        output_dir.to_path_buf(),
    )
}

fn single_result_file(dir: &std::path::Path, prefix: &str) -> String {
    let mut matches: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with(prefix))
        .collect();
    assert_eq!(matches.len(), 1, "expected exactly one file starting with '{prefix}'");
    fs::read_to_string(matches.remove(0).path()).unwrap()
}

#[tokio::test]
async fn simple_stage_writes_one_result_file() {
    let dir = tempfile::tempdir().unwrap();
    let assembler = assembler(dir.path());

    let terminal = simple_stage(
        "Simple",
        vec!["Result1".into(), "Result2".into(), "Result3".into()],
    );
    assembler
        .run(terminal, Arc::new(LineWriterFactory))
        .await
        .expect("run succeeds");

    let contents = single_result_file(dir.path(), "Simple_result_");
    assert_eq!(contents, "Result1\nResult2\nResult3\n");
}

#[tokio::test]
async fn combined_stage_reads_first_input_then_second_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let assembler = assembler(dir.path());

    let simple_a = Arc::new(simple_stage(
        "SimpleA",
        vec!["ResultA1".into(), "ResultA2".into(), "ResultA3".into()],
    ));
    let simple_b = Arc::new(simple_stage(
        "SimpleB",
        vec!["ResultB1".into(), "ResultB2".into(), "ResultB3".into()],
    ));
    let terminal = combined_stage("Combined", simple_a, simple_b);

    assembler
        .run(terminal, Arc::new(LineWriterFactory))
        .await
        .expect("run succeeds");

    let contents = single_result_file(dir.path(), "Combined_result_");
    assert_eq!(
        contents,
        "ResultA1\nResultA2\nResultA3\nResultB1\nResultB2\nResultB3\n"
    );
}

#[tokio::test]
async fn intermediate_log_mirrors_the_logged_stage_output() {
    let dir = tempfile::tempdir().unwrap();
    let assembler = assembler(dir.path());

    let simple = simple_stage("Simple", vec!["Result1".into(), "Result2".into(), "Result3".into()])
        .with_intermediate_log(dir.path().to_path_buf(), Arc::new(LineWriterFactory));
    let empty = Arc::new(simple_stage("Empty", Vec::new()));
    let terminal = combined_stage("Combined", Arc::new(simple), empty);

    assembler
        .run(terminal, Arc::new(LineWriterFactory))
        .await
        .expect("run succeeds");

    let result = single_result_file(dir.path(), "Combined_result_");
    assert_eq!(result, "Result1\nResult2\nResult3\n");

    let intermediate = single_result_file(dir.path(), "Simple_intermediate_result_");
    assert_eq!(intermediate, "Result1\nResult2\nResult3\n");
}
