use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use lms_ingest::{
    download, format_file_size, media_type_for_name, DirectorySink, FileDescriptor, FileHandle,
    FileKind, HandleSource, IngestionPipeline, Phase, PipelineConfig,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lms-ingest")]
#[command(author, version, about = "Validate and encode course files for upload")]
struct Cli {
    /// Files to ingest
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Path to YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Accept more than one file
    #[arg(short, long)]
    multiple: bool,

    /// Largest accepted file, in bytes
    #[arg(long)]
    max_size: Option<u64>,

    /// Accepted media type (repeatable)
    #[arg(long = "allow-type")]
    allow_types: Vec<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Also write decoded copies of the encoded files into this directory
    #[arg(short, long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if cli.multiple {
        config.policy.allow_multiple = true;
    }
    if let Some(max) = cli.max_size {
        config.policy.max_size_bytes = Some(max);
    }
    if !cli.allow_types.is_empty() {
        config.policy.allowed_types = Some(cli.allow_types.clone());
    }
    config.validate()?;

    init_tracing(&config.logging.level, cli.json_logs || config.logging.json);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(cli, config))
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli, config: PipelineConfig) -> Result<()> {
    let pipeline = IngestionPipeline::from_config(&config, Arc::new(HandleSource));

    let mut selection = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        selection.push(describe(path).await?);
    }

    let outcome = pipeline.select(selection)?;
    for violation in &outcome.rejected {
        eprintln!("rejected  {violation}");
    }
    if !outcome.rejected.is_empty() {
        if let Some(hint) = config.policy.hint() {
            eprintln!("          ({hint})");
        }
    }
    if outcome.accepted.is_empty() {
        bail!("no file passed validation");
    }
    for file in &outcome.accepted {
        eprintln!(
            "accepted  {} [{}] {}",
            file.name,
            FileKind::from_name(&file.name).label(),
            format_file_size(file.size_bytes)
        );
    }

    let mut progress = pipeline.subscribe();
    let watcher = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let snapshot = progress.borrow_and_update().clone();
            if snapshot.phase == Phase::Encoding {
                eprint!("\rencoding  {:>3}%", snapshot.overall);
            }
        }
    });
    let result = pipeline.ingest().await;
    watcher.abort();
    eprintln!();

    let files = result?.context("nothing to encode")?.into_files();

    if let Some(dir) = &cli.out {
        let sink = DirectorySink::new(dir);
        for file in &files {
            download(file, &sink)
                .await
                .with_context(|| format!("writing {} to {}", file.name, dir.display()))?;
        }
    }

    println!("{}", serde_json::to_string_pretty(&files)?);
    Ok(())
}

async fn describe(path: &Path) -> Result<FileDescriptor> {
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("cannot stat {}", path.display()))?;
    if !metadata.is_file() {
        bail!("{} is not a regular file", path.display());
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))?;

    let media_type = media_type_for_name(&name);
    let mut file = FileDescriptor::new(
        name,
        metadata.len(),
        media_type,
        FileHandle::Path(path.to_path_buf()),
    );
    if let Ok(modified) = metadata.modified() {
        file = file.with_last_modified(DateTime::<Utc>::from(modified));
    }
    Ok(file)
}
