//! Stream multiplexing engine.
//!
//! Merges the log streams of many containers into two shared sinks. Each
//! container gets its own follower task; inside it, each stream side is
//! framed line by line and written through a mutex-serialized fan-in sink,
//! so lines from different containers interleave but never tear.

pub mod framer;
pub mod sink;
pub mod tag;

pub use framer::{frame_lines, FrameError};
pub use sink::FanInSink;
pub use tag::{paint, TagTable, PALETTE};

use std::sync::Arc;

use anyhow::{anyhow, Result};
use colored::Color;
use tokio::io::AsyncWrite;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::source::{FollowOptions, LogSource, SourceDescriptor};

/// Color applied to stderr-class lines.
const ERROR_COLOR: Color = Color::BrightRed;

/// Follow every descriptor's log streams until they end.
///
/// One task per descriptor opens the container's two streams and frames each
/// through its own subtask: stdout uncolored into `out_sink`, stderr in the
/// error color into `err_sink`. A failure to open any container's streams is
/// fatal to the whole run; a framing failure after streaming started only
/// ends that stream, siblings keep going. Returns once every follower has
/// completed; there is no overall timeout.
pub async fn run<W1, W2>(
    source: Arc<dyn LogSource>,
    descriptors: Vec<SourceDescriptor>,
    tags: Arc<TagTable>,
    opts: FollowOptions,
    out_sink: Arc<FanInSink<W1>>,
    err_sink: Arc<FanInSink<W2>>,
) -> Result<()>
where
    W1: AsyncWrite + Unpin + Send + 'static,
    W2: AsyncWrite + Unpin + Send + 'static,
{
    let mut followers = JoinSet::new();

    for descriptor in descriptors {
        let source = Arc::clone(&source);
        let tags = Arc::clone(&tags);
        let opts = opts.clone();
        let out_sink = Arc::clone(&out_sink);
        let err_sink = Arc::clone(&err_sink);

        followers.spawn(async move {
            follow_one(source, descriptor, tags, opts, out_sink, err_sink).await
        });
    }

    // Dropping the set on a fatal error aborts the remaining followers.
    while let Some(joined) = followers.join_next().await {
        joined.map_err(|err| anyhow!("follower task panicked: {err}"))??;
    }

    Ok(())
}

async fn follow_one<W1, W2>(
    source: Arc<dyn LogSource>,
    descriptor: SourceDescriptor,
    tags: Arc<TagTable>,
    opts: FollowOptions,
    out_sink: Arc<FanInSink<W1>>,
    err_sink: Arc<FanInSink<W2>>,
) -> Result<()>
where
    W1: AsyncWrite + Unpin + Send + 'static,
    W2: AsyncWrite + Unpin + Send + 'static,
{
    let (stdout, stderr) = source
        .open_follow(&descriptor.id, &opts)
        .await
        .map_err(|err| anyhow!("failed to open log stream for {}: {err}", descriptor.name))?;

    let tag = tags.tag(&descriptor.name).to_vec();

    let out_framer = tokio::spawn(frame_lines(stdout, tag.clone(), None, out_sink));
    let err_framer = tokio::spawn(frame_lines(stderr, tag, Some(ERROR_COLOR), err_sink));

    let (out_result, err_result) = tokio::join!(out_framer, err_framer);
    report_stream_end(&descriptor.name, "stdout", out_result);
    report_stream_end(&descriptor.name, "stderr", err_result);

    info!("stream {} exited", descriptor.name);
    Ok(())
}

fn report_stream_end(
    name: &str,
    side: &str,
    joined: Result<Result<(), FrameError>, tokio::task::JoinError>,
) {
    match joined {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!("{side} stream for {name} stopped: {err}"),
        Err(err) => warn!("{side} framer for {name} panicked: {err}"),
    }
}
