mod common;

use std::io::Write;
use std::sync::Arc;

use common::{multi_policy, pipeline_with, text_file, ScriptedSource};
use lms_ingest::{
    decode_data_uri, download, DirectorySink, FileDescriptor, FileHandle, HandleSource,
    IngestionPipeline, Phase, PipelineConfig, Upload, ValidationPolicy,
};
use tempfile::{NamedTempFile, TempDir};

#[tokio::test(start_paused = true)]
async fn results_keep_submission_order_when_later_file_finishes_first() {
    let source = Arc::new(
        ScriptedSource::new()
            .delay("first.txt", 500)
            .delay("third.txt", 200),
    );
    let pipeline = pipeline_with(multi_policy(), Arc::clone(&source));
    pipeline
        .select(vec![
            text_file("first.txt", "one"),
            text_file("second.txt", "two"),
            text_file("third.txt", "three"),
        ])
        .expect("select");

    let upload = pipeline.ingest().await.expect("ingest").expect("non-empty");

    assert_eq!(source.completed(), ["second.txt", "third.txt", "first.txt"]);
    let Upload::Batch(files) = upload else {
        panic!("multi-file policy must yield a batch");
    };
    let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["first.txt", "second.txt", "third.txt"]);

    let (media_type, bytes) = decode_data_uri(&files[0].content).expect("valid data uri");
    assert_eq!(media_type, "text/plain");
    assert_eq!(&bytes[..], b"one");
}

#[tokio::test(start_paused = true)]
async fn single_file_policy_yields_single_record() {
    let pipeline = IngestionPipeline::new(ValidationPolicy::default(), Arc::new(HandleSource));
    let outcome = pipeline
        .select(vec![text_file("a.txt", "a"), text_file("b.txt", "b")])
        .expect("select");
    assert_eq!(outcome.accepted.len(), 1);
    assert!(outcome.rejected.is_empty());

    match pipeline.ingest().await.expect("ingest") {
        Some(Upload::Single(file)) => {
            assert_eq!(file.name, "a.txt");
            assert_eq!(file.size_bytes, 1);
        }
        other => panic!("expected a single record, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn success_leaves_terminal_phase_with_cleared_state() {
    let policy = multi_policy().with_allowed_types(["text/plain"]);
    let pipeline = pipeline_with(policy, Arc::new(ScriptedSource::new()));
    pipeline
        .select(vec![
            text_file("notes.txt", "notes"),
            FileDescriptor::from_bytes("photo.png", "image/png", vec![0u8; 4]),
        ])
        .expect("select");
    assert!(pipeline.last_error().is_some());

    pipeline.ingest().await.expect("ingest");

    let snapshot = pipeline.snapshot();
    assert_eq!(snapshot.phase, Phase::Succeeded);
    assert_eq!(snapshot.overall, 0);
    assert!(snapshot.per_file.is_empty());
    assert!(pipeline.selected().is_empty());
    assert!(pipeline.last_error().is_none());

    // A new selection starts over from the terminal phase.
    pipeline
        .select(vec![text_file("again.txt", "again")])
        .expect("select");
    assert_eq!(pipeline.phase(), Phase::Selecting);
}

#[tokio::test(start_paused = true)]
async fn stepped_progress_takes_ten_ticks_by_default() {
    let pipeline = IngestionPipeline::new(multi_policy(), Arc::new(HandleSource));
    pipeline
        .select(vec![text_file("a.txt", "a"), text_file("b.txt", "b")])
        .expect("select");

    let started = tokio::time::Instant::now();
    pipeline.ingest().await.expect("ingest");

    // Files progress concurrently, so two files take as long as one.
    assert_eq!(started.elapsed(), std::time::Duration::from_millis(1000));
}

#[tokio::test]
async fn transfer_mode_reads_files_from_disk() {
    let mut on_disk = NamedTempFile::new().expect("temp file");
    on_disk.write_all(&[42u8; 1000]).expect("write");

    let config = PipelineConfig::from_yaml(
        r#"
version: "1.0"
policy:
  max_size_bytes: 4096
progress:
  mode: transfer
  chunk_size: 64
"#,
    )
    .expect("valid config");
    let pipeline = IngestionPipeline::from_config(&config, Arc::new(HandleSource));

    let file = FileDescriptor::new(
        "lecture.bin",
        1000,
        "",
        FileHandle::Path(on_disk.path().to_path_buf()),
    );
    pipeline.select(vec![file]).expect("select");

    let Some(Upload::Single(encoded)) = pipeline.ingest().await.expect("ingest") else {
        panic!("expected a single record");
    };
    assert!(encoded.content.starts_with("data:application/octet-stream;base64,"));
    let (_, bytes) = decode_data_uri(&encoded.content).expect("valid data uri");
    assert_eq!(bytes.len(), 1000);
    assert!(bytes.iter().all(|&b| b == 42));
}

#[tokio::test(start_paused = true)]
async fn encoded_files_download_to_directory() {
    let pipeline = IngestionPipeline::new(multi_policy(), Arc::new(HandleSource));
    pipeline
        .select(vec![
            text_file("syllabus.txt", "Week 1: intro"),
            FileDescriptor::from_bytes("logo.png", "image/png", vec![0x89, b'P', b'N', b'G']),
        ])
        .expect("select");
    let files = pipeline
        .ingest()
        .await
        .expect("ingest")
        .expect("non-empty")
        .into_files();

    let dir = TempDir::new().expect("temp dir");
    let sink = DirectorySink::new(dir.path());
    for file in &files {
        download(file, &sink).await.expect("download");
    }

    let syllabus = std::fs::read(dir.path().join("syllabus.txt")).expect("syllabus written");
    assert_eq!(syllabus, b"Week 1: intro");
    let logo = std::fs::read(dir.path().join("logo.png")).expect("logo written");
    assert_eq!(logo, [0x89, b'P', b'N', b'G']);
}

#[test]
fn encoded_files_serialize_for_storage() {
    let file = lms_ingest::encode_file(&text_file("a.txt", "hi"), b"hi");
    let json = serde_json::to_string(&file).expect("serialize");
    assert!(json.contains(r#""content":"data:text/plain;base64,aGk=""#));
}
