//! Single-shot collector.
//!
//! Exit status: 0 when the local artifact was written, 1 when the run failed,
//! 2 when the artifact was written but the remote lookup failed.

use std::process::ExitCode;

use clap::Parser;

use rss_collector::artifact::ArtifactWriter;
use rss_collector::artifact::sink::ArtifactSink;
use rss_collector::config::{load_dotenv, CollectorArgs};
use rss_collector::ingest::registry::load_registry;
use rss_collector::logging::init_tracing;
use rss_collector::{Collector, FeedFetcher};

#[tokio::main]
async fn main() -> ExitCode {
    load_dotenv();
    let args = CollectorArgs::parse();
    init_tracing(&args.log_format);

    let registry = match load_registry(args.registry.as_deref()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let github = args.github_sink();
    if github.is_none() {
        tracing::info!("GITHUB_REPO/GITHUB_TOKEN not set; remote mirror disabled");
    }
    let collector = Collector {
        registry: &registry,
        fetcher: FeedFetcher::default()
            .with_timeout(args.timeout())
            .with_strategy(args.parser),
        writer: ArtifactWriter::new(&args.data_dir),
        limit: args.limit,
        sink: github.as_ref().map(|g| g as &dyn ArtifactSink),
        reporter: args.report_client(),
    };

    match collector.run(args.target.as_deref()).await {
        Ok(outcome) => {
            println!("{} ({} items)", outcome.path.display(), outcome.count);
            if let Some(e) = outcome.remote_error() {
                eprintln!("warning: {e}");
            }
            ExitCode::from(outcome.exit_code())
        }
        Err(e) => {
            tracing::error!(error = %e, "collection failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
