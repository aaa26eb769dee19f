//! RSS exporter: boots the Axum server in report or scrape mode.

use anyhow::Context;
use clap::Parser;

use rss_collector::api::{report_router, scrape_router, shutdown_signal, ScrapeState, ScrapeTarget};
use rss_collector::config::{load_dotenv, ExporterArgs, ExporterMode};
use rss_collector::ingest::registry::load_registry;
use rss_collector::logging::init_tracing;
use rss_collector::{FeedFetcher, Metrics};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    let args = ExporterArgs::parse();
    init_tracing(&args.log_format);

    let metrics = Metrics::new();
    let app = match args.mode {
        ExporterMode::Report => report_router(metrics),
        ExporterMode::Scrape => {
            let registry = load_registry(args.registry.as_deref())?;
            let target = ScrapeTarget::resolve(&registry, args.target.as_deref());
            if let ScrapeTarget::Unresolved(reason) = &target {
                tracing::warn!(%reason, "starting without a usable scrape target");
            }
            let fetcher = FeedFetcher::default()
                .with_timeout(args.timeout())
                .with_strategy(args.parser);
            scrape_router(ScrapeState::new(target, fetcher, args.limit, metrics))
        }
    };

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("binding {}", args.bind))?;
    tracing::info!(addr = %args.bind, mode = ?args.mode, "exporter listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
