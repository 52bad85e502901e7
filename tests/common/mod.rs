//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use lms_ingest::{
    FileDescriptor, FileSource, HandleSource, IngestionPipeline, SourceError, ValidationPolicy,
};

/// In-memory source with per-file read delays and failures, recording the
/// order in which reads complete.
#[derive(Default)]
pub struct ScriptedSource {
    delays: HashMap<String, Duration>,
    failures: HashMap<String, String>,
    completed: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delay(mut self, name: &str, millis: u64) -> Self {
        self.delays
            .insert(name.to_string(), Duration::from_millis(millis));
        self
    }

    pub fn fail(mut self, name: &str, message: &str) -> Self {
        self.failures.insert(name.to_string(), message.to_string());
        self
    }

    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileSource for ScriptedSource {
    async fn read(&self, file: &FileDescriptor) -> Result<Bytes, SourceError> {
        if let Some(delay) = self.delays.get(&file.name) {
            tokio::time::sleep(*delay).await;
        }
        self.completed.lock().unwrap().push(file.name.clone());
        if let Some(message) = self.failures.get(&file.name) {
            return Err(SourceError::Unreadable(message.clone()));
        }
        HandleSource.read(file).await
    }
}

pub fn text_file(name: &str, body: &str) -> FileDescriptor {
    FileDescriptor::from_bytes(name, "text/plain", body.as_bytes().to_vec())
}

pub fn multi_policy() -> ValidationPolicy {
    ValidationPolicy::default().with_allow_multiple(true)
}

pub fn pipeline_with(policy: ValidationPolicy, source: Arc<ScriptedSource>) -> IngestionPipeline {
    IngestionPipeline::new(policy, source)
}
