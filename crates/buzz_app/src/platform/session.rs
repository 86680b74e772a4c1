//! One crawl session: set up the browser agent, crawl, save, release.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use buzz_core::{CrawlConfig, Post};
use buzz_engine::{
    export_posts, BrowserAgent, CancellationToken, CrawlError, CrawlReport, Crawler,
    ExportOptions, HtmlReplayAgent, LogProgressSink,
};
use buzz_logging::{buzz_error, buzz_info, buzz_warn};
use url::Url;

use super::webdriver::WebDriverAgent;
use crate::cli::Cli;

/// Time for the search results to render after navigation.
const PAGE_LOAD_WAIT: Duration = Duration::from_secs(3);

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.crawl_config();
    config.validate().context("refusing to start")?;
    let search_url = config.search_url()?;
    let export = cli.export_options();

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    buzz_info!(
        "searching '{}' for {} posts with at least {} likes",
        config.keyword,
        config.limit,
        config.like_threshold
    );

    let outcome = match &cli.replay {
        Some(dir) => crawl_replay(dir, &search_url, &config, &cancel).await?,
        None => crawl_browser(&cli, &search_url, &config, &cancel).await?,
    };
    save(outcome, &export)
}

async fn crawl_replay(
    dir: &Path,
    search_url: &Url,
    config: &CrawlConfig,
    cancel: &CancellationToken,
) -> anyhow::Result<Result<CrawlReport, CrawlError>> {
    let agent = HtmlReplayAgent::from_dir(dir)
        .with_context(|| format!("loading captured frames from {}", dir.display()))?
        .with_base_url(search_url.clone());
    buzz_info!("replaying {} captured frames from {}", agent.frame_count(), dir.display());
    Ok(crawl(&agent, config, cancel).await)
}

async fn crawl_browser(
    cli: &Cli,
    search_url: &Url,
    config: &CrawlConfig,
    cancel: &CancellationToken,
) -> anyhow::Result<Result<CrawlReport, CrawlError>> {
    let mut agent = WebDriverAgent::connect(&cli.webdriver_url, &cli.debugger_address)
        .await
        .context("could not attach to the browser")?;
    if let Some(dir) = &cli.capture {
        agent = agent.with_capture(dir.clone());
    }

    let outcome = match agent.goto(search_url.as_str()).await {
        Ok(()) => {
            tokio::time::sleep(PAGE_LOAD_WAIT).await;
            Ok(crawl(&agent, config, cancel).await)
        }
        Err(err) => Err(err),
    };

    if let Err(err) = agent.quit().await {
        buzz_warn!("failed to close the browser session: {}", err);
    }
    outcome.context("could not open the search page")
}

async fn crawl<A: BrowserAgent>(
    agent: &A,
    config: &CrawlConfig,
    cancel: &CancellationToken,
) -> Result<CrawlReport, CrawlError> {
    Crawler::new(config.clone())
        .run(agent, &LogProgressSink, cancel)
        .await
}

/// Persists whatever was collected, including the partial result of a
/// failed session, then reports the failure.
fn save(outcome: Result<CrawlReport, CrawlError>, export: &ExportOptions) -> anyhow::Result<()> {
    match outcome {
        Ok(report) => {
            buzz_info!(
                "{} after {} scrolls, {} posts examined",
                report.reason,
                report.iterations,
                report.seen
            );
            write_posts(&report.posts, export)
        }
        Err(CrawlError::Session { source, partial }) => {
            buzz_error!("browser session failed: {}", source);
            write_posts(&partial, export)?;
            Err(source).context("crawl aborted")
        }
        Err(err) => Err(err.into()),
    }
}

fn write_posts(posts: &[Post], export: &ExportOptions) -> anyhow::Result<()> {
    if let Some(path) = export_posts(posts, export).context("saving results")? {
        buzz_info!("results written to {}", path.display());
    }
    Ok(())
}

fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            buzz_warn!("interrupt received, stopping after the current scan");
            cancel.cancel();
        }
    });
}
