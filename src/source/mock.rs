//! Scriptable in-memory log source for tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{FollowOptions, LogSource, LogStream, SourceDescriptor, SourceError};

/// A `LogSource` whose listings and streams are scripted up front, so the
/// resolver and orchestrator are testable without a Docker daemon.
#[derive(Default)]
pub struct MockLogSource {
    all: Mutex<Vec<SourceDescriptor>>,
    all_error: Mutex<Option<String>>,
    by_service: Mutex<HashMap<String, Vec<SourceDescriptor>>>,
    service_errors: Mutex<HashMap<String, String>>,
    streams: Mutex<HashMap<String, VecDeque<(LogStream, LogStream)>>>,
    open_errors: Mutex<HashSet<String>>,
}

impl MockLogSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the result of `list_all`.
    pub fn set_all(&self, descriptors: Vec<SourceDescriptor>) {
        *self.all.lock().unwrap() = descriptors;
    }

    /// Make `list_all` fail with a backend error.
    pub fn fail_all(&self, message: &str) {
        *self.all_error.lock().unwrap() = Some(message.to_string());
    }

    /// Script the result of `list_by_service` for one name. Unscripted names
    /// return an empty list.
    pub fn service_returns(&self, name: &str, descriptors: Vec<SourceDescriptor>) {
        self.by_service
            .lock()
            .unwrap()
            .insert(name.to_string(), descriptors);
    }

    /// Make `list_by_service` fail for one name.
    pub fn service_fails(&self, name: &str, message: &str) {
        self.service_errors
            .lock()
            .unwrap()
            .insert(name.to_string(), message.to_string());
    }

    /// Queue a (stdout, stderr) stream pair for one container id. Each
    /// `open_follow` call pops the next queued pair.
    pub fn push_streams(&self, id: &str, stdout: LogStream, stderr: LogStream) {
        self.streams
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default()
            .push_back((stdout, stderr));
    }

    /// Make `open_follow` fail for one container id.
    pub fn fail_open(&self, id: &str) {
        self.open_errors.lock().unwrap().insert(id.to_string());
    }
}

#[async_trait]
impl LogSource for MockLogSource {
    async fn list_all(&self) -> Result<Vec<SourceDescriptor>, SourceError> {
        if let Some(message) = self.all_error.lock().unwrap().clone() {
            return Err(SourceError::Backend(message));
        }
        Ok(self.all.lock().unwrap().clone())
    }

    async fn list_by_service(&self, name: &str) -> Result<Vec<SourceDescriptor>, SourceError> {
        if let Some(message) = self.service_errors.lock().unwrap().get(name) {
            return Err(SourceError::Backend(message.clone()));
        }
        Ok(self
            .by_service
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_default())
    }

    async fn open_follow(
        &self,
        id: &str,
        _opts: &FollowOptions,
    ) -> Result<(LogStream, LogStream), SourceError> {
        if self.open_errors.lock().unwrap().contains(id) {
            return Err(SourceError::Backend(format!("no such container: {id}")));
        }
        self.streams
            .lock()
            .unwrap()
            .get_mut(id)
            .and_then(|queue| queue.pop_front())
            .ok_or_else(|| SourceError::Backend(format!("no scripted stream for {id}")))
    }
}
