use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

use swarmtail::mux::{self, FanInSink, TagTable, PALETTE};
use swarmtail::source::{resolve, DockerSource, FollowOptions, LogSource};

/// Separator between a source tag and its log content.
const TAG_SEPARATOR: &str = " | ";

#[derive(Parser)]
#[command(name = "swarmtail")]
#[command(about = "Tail the logs of many Docker Swarm tasks as one color-tagged stream", version)]
struct Cli {
    /// Service names to match; every running container when empty
    services: Vec<String>,

    /// Follow log output
    #[arg(short, long)]
    follow: bool,

    /// Limit the initial output to the last N lines per task (default: all)
    #[arg(short, long, default_value = "")]
    tail: String,

    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    // Diagnostics go to stderr; stdout belongs to the merged log stream.
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli).await {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let source: Arc<dyn LogSource> =
        Arc::new(DockerSource::connect().context("unable to set up connection to docker")?);

    let descriptors = resolve(&source, &cli.services)
        .await
        .context("error retrieving container information")?;

    if descriptors.is_empty() {
        println!("No services meet the criteria");
        return Ok(());
    }

    let names: Vec<String> = descriptors.iter().map(|d| d.name.clone()).collect();
    let tags = Arc::new(TagTable::build(&names, TAG_SEPARATOR, &PALETTE));

    let opts = FollowOptions {
        follow: cli.follow,
        tail: cli.tail,
    };
    let out_sink = Arc::new(FanInSink::new(tokio::io::stdout()));
    let err_sink = Arc::new(FanInSink::new(tokio::io::stderr()));

    mux::run(source, descriptors, tags, opts, out_sink, err_sink).await
}
