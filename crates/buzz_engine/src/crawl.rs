use buzz_core::{ConfigError, CrawlConfig, CrawlState, Post, ScrollVerdict, StopReason};
use buzz_logging::{buzz_debug, buzz_info, set_scroll_iteration, with_scroll_context};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::agent::{AgentError, BrowserAgent};
use crate::events::{CrawlEvent, ProgressSink};
use crate::extract::PostExtractor;

/// Result of a crawl that terminated normally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    /// Qualifying posts in acceptance order.
    pub posts: Vec<Post>,
    pub reason: StopReason,
    pub iterations: u32,
    /// Distinct post urls examined, qualifying or not.
    pub seen: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("invalid crawl configuration: {0}")]
    Config(#[from] ConfigError),
    /// The browser became unusable. Posts collected up to that point are kept.
    #[error("browser session failed with {} posts collected: {source}", .partial.len())]
    Session {
        source: AgentError,
        partial: Vec<Post>,
    },
}

#[derive(Debug, Default)]
struct ScanSummary {
    processed: usize,
    grew: bool,
}

/// The scroll / observe / accumulate loop for one search session.
#[derive(Debug, Clone)]
pub struct Crawler {
    config: CrawlConfig,
    extractor: PostExtractor,
}

impl Crawler {
    pub fn new(config: CrawlConfig) -> Self {
        let extractor = PostExtractor::new(config.extraction_retry);
        Self { config, extractor }
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Crawls the feed the agent currently shows until the target is reached,
    /// the feed is exhausted, the iteration ceiling is hit, or `cancel` fires.
    ///
    /// Log lines emitted inside the loop carry a `[scroll N]` prefix scoped to
    /// this call, so the future may be spawned on any runtime.
    pub async fn run<A: BrowserAgent>(
        &self,
        agent: &A,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<CrawlReport, CrawlError> {
        self.config.validate()?;

        let initial_height = match agent.document_height().await {
            Ok(height) => height,
            Err(source) => {
                return Err(CrawlError::Session {
                    source,
                    partial: Vec::new(),
                })
            }
        };
        buzz_info!(
            "crawl started (target: {}, likes >= {})",
            self.config.limit,
            self.config.like_threshold
        );

        let mut state = CrawlState::new(&self.config, initial_height);
        let outcome = with_scroll_context(self.drive(agent, &mut state, sink, cancel)).await;

        match outcome {
            Ok(reason) => {
                sink.emit(CrawlEvent::Finished {
                    reason,
                    collected: state.collected_count(),
                });
                Ok(CrawlReport {
                    iterations: state.iteration(),
                    seen: state.seen_count(),
                    reason,
                    posts: state.into_posts(),
                })
            }
            Err(source) => Err(CrawlError::Session {
                source,
                partial: state.into_posts(),
            }),
        }
    }

    async fn drive<A: BrowserAgent>(
        &self,
        agent: &A,
        state: &mut CrawlState,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<StopReason, AgentError> {
        loop {
            set_scroll_iteration(state.iteration() + 1);

            let nodes = agent.post_nodes().await?;
            if nodes.is_empty() {
                sink.emit(CrawlEvent::EmptyScan {
                    iteration: state.iteration() + 1,
                });
                sleep(self.config.scroll_wait).await;
                agent.scroll_by_viewport().await?;
                sleep(self.config.scroll_wait).await;
                state.record_empty_scan();
                if let Some(reason) = state.decide(cancel.is_cancelled()) {
                    return Ok(reason);
                }
                continue;
            }

            let scan = self.scan(agent, &nodes, state, sink).await;
            sink.emit(CrawlEvent::ScanCompleted {
                iteration: state.iteration() + 1,
                processed: scan.processed,
                grew: scan.grew,
                collected: state.collected_count(),
                limit: state.limit(),
            });

            if let Some(reason) = state.decide(cancel.is_cancelled()) {
                return Ok(reason);
            }

            agent.scroll_by(self.config.scroll_step_px).await?;
            sleep(self.config.scroll_wait).await;
            sleep(self.config.settle_wait).await;
            let height = agent.document_height().await?;

            match state.record_scroll(height, scan.grew) {
                ScrollVerdict::Exhausted => return Ok(StopReason::FeedExhausted),
                ScrollVerdict::Stalled { patience } => sink.emit(CrawlEvent::Stalled {
                    patience,
                    patience_limit: state.patience_limit(),
                }),
                ScrollVerdict::Extended { height } => buzz_debug!("feed extended to {}", height),
                ScrollVerdict::Live => buzz_debug!("height unchanged but new posts arrived"),
            }
        }
    }

    /// Extracts and offers every node in document order, stopping early once full.
    async fn scan<A: BrowserAgent>(
        &self,
        agent: &A,
        nodes: &[A::Node],
        state: &mut CrawlState,
        sink: &dyn ProgressSink,
    ) -> ScanSummary {
        let mut summary = ScanSummary::default();
        for node in nodes {
            let Some(post) = self.extractor.extract(agent, node).await else {
                continue;
            };
            let url = post.url.clone();
            let username = post.username.clone();
            let likes = post.like_count;

            let outcome = state.offer(post);
            if outcome.is_new() {
                summary.processed += 1;
            }
            if outcome.is_accepted() {
                summary.grew = true;
                sink.emit(CrawlEvent::PostAccepted {
                    url,
                    username,
                    likes,
                    collected: state.collected_count(),
                    limit: state.limit(),
                });
                if state.collected_count() >= state.limit() {
                    break;
                }
            }
        }
        summary
    }
}
