//! Container log sources.
//!
//! The multiplexing engine only needs a set of opaque descriptors and a way
//! to open each one's two log streams; everything Docker-specific stays
//! behind the [`LogSource`] trait.

pub mod docker;
pub mod error;
pub mod mock;
pub mod resolve;

pub use docker::DockerSource;
pub use error::SourceError;
pub use mock::MockLogSource;
pub use resolve::resolve;

use async_trait::async_trait;
use tokio::io::AsyncRead;

/// One independently logging container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    /// Backend identity, unique per live container.
    pub id: String,
    /// Name used for tagging; typically the swarm task name.
    pub name: String,
}

/// Options forwarded to the backend's log-follow call.
#[derive(Debug, Clone, Default)]
pub struct FollowOptions {
    /// Keep streaming as new output arrives instead of stopping at the
    /// current end of the log.
    pub follow: bool,
    /// Limit the initial batch to the last N lines; empty means all.
    pub tail: String,
}

/// A live byte-readable log stream handle.
pub type LogStream = Box<dyn AsyncRead + Send + Unpin>;

/// Backend supplying containers and their log streams.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// List every running container.
    async fn list_all(&self) -> Result<Vec<SourceDescriptor>, SourceError>;

    /// List the running containers belonging to one named service.
    async fn list_by_service(&self, name: &str) -> Result<Vec<SourceDescriptor>, SourceError>;

    /// Open the (stdout, stderr) streams for one container's logs.
    async fn open_follow(
        &self,
        id: &str,
        opts: &FollowOptions,
    ) -> Result<(LogStream, LogStream), SourceError>;
}
