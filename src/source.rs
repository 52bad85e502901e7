//! Environment capabilities: reading selected files and delivering downloads.
//!
//! The pipeline never touches the filesystem or a browser API directly. It
//! reads through a [`FileSource`] and, for the download helper, writes
//! through a [`DownloadSink`]. [`HandleSource`] and [`DirectorySink`] are the
//! stock implementations backed by memory and `tokio::fs`.
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use ingest::{EncodedFile, FileDescriptor, FileHandle};
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::encode::decode_data_uri;
use crate::error::{SinkError, SourceError};

/// Turns a [`FileDescriptor`]'s handle into its raw contents.
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Reads the whole file.
    async fn read(&self, file: &FileDescriptor) -> Result<Bytes, SourceError>;

    /// Reads the whole file, calling `on_chunk(read_so_far, total)` as data
    /// arrives. The default reads in one go and reports a single chunk.
    async fn read_chunked(
        &self,
        file: &FileDescriptor,
        _chunk_size: usize,
        on_chunk: &mut (dyn FnMut(u64, u64) + Send),
    ) -> Result<Bytes, SourceError> {
        let contents = self.read(file).await?;
        let len = contents.len() as u64;
        on_chunk(len, len);
        Ok(contents)
    }
}

/// Reads in-memory handles directly and path handles with `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HandleSource;

#[async_trait]
impl FileSource for HandleSource {
    async fn read(&self, file: &FileDescriptor) -> Result<Bytes, SourceError> {
        match &file.handle {
            FileHandle::Memory(bytes) => Ok(bytes.clone()),
            FileHandle::Path(path) => tokio::fs::read(path)
                .await
                .map(Bytes::from)
                .map_err(|source| SourceError::Io {
                    path: path.clone(),
                    source,
                }),
            other => Err(SourceError::Unreadable(format!(
                "unsupported handle {other:?} for {}",
                file.name
            ))),
        }
    }

    async fn read_chunked(
        &self,
        file: &FileDescriptor,
        chunk_size: usize,
        on_chunk: &mut (dyn FnMut(u64, u64) + Send),
    ) -> Result<Bytes, SourceError> {
        let chunk_size = chunk_size.max(1);
        match &file.handle {
            FileHandle::Memory(bytes) => {
                let total = bytes.len() as u64;
                let mut read = 0usize;
                while read < bytes.len() {
                    read = (read + chunk_size).min(bytes.len());
                    on_chunk(read as u64, total);
                    tokio::task::yield_now().await;
                }
                Ok(bytes.clone())
            }
            FileHandle::Path(path) => read_path_chunked(path, chunk_size, on_chunk).await,
            _ => self.read(file).await,
        }
    }
}

async fn read_path_chunked(
    path: &Path,
    chunk_size: usize,
    on_chunk: &mut (dyn FnMut(u64, u64) + Send),
) -> Result<Bytes, SourceError> {
    let io_err = |source: std::io::Error| SourceError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = tokio::fs::File::open(path).await.map_err(io_err)?;
    let total = reader.metadata().await.map_err(io_err)?.len();
    let mut contents = BytesMut::with_capacity(total as usize);
    let mut buf = vec![0u8; chunk_size];
    loop {
        let n = reader.read(&mut buf).await.map_err(io_err)?;
        if n == 0 {
            break;
        }
        contents.extend_from_slice(&buf[..n]);
        on_chunk(contents.len() as u64, total.max(contents.len() as u64));
    }
    Ok(contents.freeze())
}

/// Destination for downloaded files.
#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Stores `contents` under `name`.
    async fn deliver(&self, name: &str, contents: Bytes) -> Result<(), SinkError>;
}

/// Writes downloads into a directory, creating it if needed.
///
/// Only the final component of a download name is used, so names such as
/// `../notes.txt` land inside the directory as `notes.txt`.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where a download named `name` would be written.
    pub fn target_for(&self, name: &str) -> Result<PathBuf, SinkError> {
        let file_name = Path::new(name)
            .file_name()
            .ok_or_else(|| SinkError::InvalidName(name.to_string()))?;
        Ok(self.dir.join(file_name))
    }
}

#[async_trait]
impl DownloadSink for DirectorySink {
    async fn deliver(&self, name: &str, contents: Bytes) -> Result<(), SinkError> {
        let target = self.target_for(name)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| SinkError::Io {
                path: self.dir.clone(),
                source,
            })?;
        tokio::fs::write(&target, &contents)
            .await
            .map_err(|source| SinkError::Io {
                path: target.clone(),
                source,
            })?;
        debug!(path = %target.display(), bytes = contents.len(), "download_written");
        Ok(())
    }
}

/// Decodes an [`EncodedFile`] and hands its raw bytes to `sink`.
pub async fn download(file: &EncodedFile, sink: &dyn DownloadSink) -> Result<(), SinkError> {
    let (_, contents) = decode_data_uri(&file.content)?;
    sink.deliver(&file.name, contents).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_file;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[tokio::test]
    async fn memory_handle_reports_every_chunk() {
        let file = FileDescriptor::from_bytes("a.bin", "", vec![1u8; 10]);
        let mut seen = Vec::new();
        let bytes = HandleSource
            .read_chunked(&file, 4, &mut |read: u64, total: u64| seen.push((read, total)))
            .await
            .expect("memory read");

        assert_eq!(bytes.len(), 10);
        assert_eq!(seen, [(4, 10), (8, 10), (10, 10)]);
    }

    #[tokio::test]
    async fn path_handle_is_read_in_chunks() {
        let mut tmp = NamedTempFile::new().expect("temp file");
        tmp.write_all(&[9u8; 300]).expect("write");
        let file = FileDescriptor::new("disk.bin", 300, "", FileHandle::Path(tmp.path().into()));

        let mut last = (0, 0);
        let bytes = HandleSource
            .read_chunked(&file, 128, &mut |read: u64, total: u64| last = (read, total))
            .await
            .expect("disk read");

        assert_eq!(bytes.len(), 300);
        assert_eq!(last, (300, 300));
    }

    #[tokio::test]
    async fn missing_path_is_an_io_error() {
        let file = FileDescriptor::new(
            "gone.txt",
            1,
            "text/plain",
            FileHandle::Path("/definitely/not/here.txt".into()),
        );
        let err = HandleSource.read(&file).await.expect_err("missing file");
        assert!(matches!(err, SourceError::Io { .. }));
    }

    #[tokio::test]
    async fn download_writes_decoded_bytes() {
        let dir = TempDir::new().expect("temp dir");
        let sink = DirectorySink::new(dir.path().join("out"));
        let file = FileDescriptor::from_bytes("../report.txt", "text/plain", b"grades".to_vec());
        let encoded = encode_file(&file, b"grades");

        download(&encoded, &sink).await.expect("download");

        let written = std::fs::read(dir.path().join("out").join("report.txt")).expect("written");
        assert_eq!(written, b"grades");
    }

    #[test]
    fn target_rejects_names_without_file_component() {
        let sink = DirectorySink::new("/tmp");
        assert!(matches!(
            sink.target_for(".."),
            Err(SinkError::InvalidName(_))
        ));
    }
}
