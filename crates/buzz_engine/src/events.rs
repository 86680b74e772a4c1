use buzz_core::StopReason;
use buzz_logging::{buzz_info, buzz_warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlEvent {
    PostAccepted {
        url: String,
        username: String,
        likes: u64,
        collected: usize,
        limit: usize,
    },
    ScanCompleted {
        iteration: u32,
        /// Posts seen for the first time in this scan.
        processed: usize,
        grew: bool,
        collected: usize,
        limit: usize,
    },
    /// The snapshot had no post containers; the page is probably still rendering.
    EmptyScan { iteration: u32 },
    Stalled { patience: u32, patience_limit: u32 },
    Finished { reason: StopReason, collected: usize },
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: CrawlEvent);
}

/// Reports progress through the workspace logger.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn emit(&self, event: CrawlEvent) {
        match event {
            CrawlEvent::PostAccepted {
                username,
                likes,
                collected,
                limit,
                ..
            } => {
                buzz_info!("collected {}/{} (likes: {}) - {}", collected, limit, likes, username);
            }
            CrawlEvent::ScanCompleted {
                processed,
                grew,
                collected,
                limit,
                ..
            } => {
                buzz_info!(
                    "processed {}, new qualifying: {}, total {}/{}",
                    processed,
                    if grew { "yes" } else { "no" },
                    collected,
                    limit
                );
            }
            CrawlEvent::EmptyScan { .. } => buzz_info!("no posts rendered yet"),
            CrawlEvent::Stalled {
                patience,
                patience_limit,
            } => {
                buzz_warn!(
                    "scrolling loaded nothing new (attempt {}/{})",
                    patience,
                    patience_limit
                );
            }
            CrawlEvent::Finished { reason, collected } => {
                buzz_info!("crawl finished ({}), {} posts collected", reason, collected);
            }
        }
    }
}
