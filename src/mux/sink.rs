//! Mutex-serialized fan-in writer shared by all framing tasks.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// Serializes whole-buffer writes from concurrent producers onto one sink.
///
/// Each `write_line` call transfers all of its bytes under the lock, so
/// concurrent lines can interleave with each other only at line granularity,
/// never byte by byte. The sink does not buffer or reorder anything itself.
pub struct FanInSink<W> {
    inner: Mutex<W>,
}

impl<W: AsyncWrite + Unpin> FanInSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: Mutex::new(writer),
        }
    }

    /// Write `bytes` as one atomic unit.
    pub async fn write_line(&self, bytes: &[u8]) -> std::io::Result<()> {
        let mut writer = self.inner.lock().await;
        writer.write_all(bytes).await?;
        writer.flush().await
    }

    /// Unwrap the underlying writer. Intended for tests inspecting output.
    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}
