use std::fmt;

use crate::{Accumulator, CrawlConfig, OfferOutcome, Post};

/// Why a crawl session ended. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    TargetReached,
    IterationCeiling,
    FeedExhausted,
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::TargetReached => write!(f, "target reached"),
            StopReason::IterationCeiling => write!(f, "iteration ceiling"),
            StopReason::FeedExhausted => write!(f, "feed exhausted"),
            StopReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Outcome of one scroll step, as judged from extent growth and post growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollVerdict {
    /// The document got longer.
    Extended { height: u64 },
    /// Same extent, but new posts were accepted during the preceding scan.
    Live,
    /// Neither signal moved.
    Stalled { patience: u32 },
    /// Stalled for `patience_limit` consecutive iterations.
    Exhausted,
}

/// Session-scoped crawl bookkeeping. Mutated once per loop iteration.
#[derive(Debug, Clone)]
pub struct CrawlState {
    accumulator: Accumulator,
    last_feed_height: u64,
    patience: u32,
    iteration: u32,
    max_iterations: u32,
    patience_limit: u32,
}

impl CrawlState {
    pub fn new(config: &CrawlConfig, initial_height: u64) -> Self {
        Self {
            accumulator: Accumulator::new(config.like_threshold, config.limit),
            last_feed_height: initial_height,
            patience: 0,
            iteration: 0,
            max_iterations: config.max_iterations,
            patience_limit: config.patience_limit,
        }
    }

    pub fn offer(&mut self, post: Post) -> OfferOutcome {
        self.accumulator.offer(post)
    }

    /// The Deciding step: whether the loop stops before the next scroll.
    pub fn decide(&self, cancelled: bool) -> Option<StopReason> {
        if self.accumulator.is_full() {
            Some(StopReason::TargetReached)
        } else if cancelled {
            Some(StopReason::Cancelled)
        } else if self.iteration >= self.max_iterations {
            Some(StopReason::IterationCeiling)
        } else {
            None
        }
    }

    /// An empty snapshot costs an iteration but leaves patience untouched.
    pub fn record_empty_scan(&mut self) {
        self.iteration += 1;
    }

    /// Applies the post-scroll measurement. `grew` is whether the scan before
    /// this scroll accepted at least one post.
    pub fn record_scroll(&mut self, new_height: u64, grew: bool) -> ScrollVerdict {
        self.iteration += 1;

        if new_height != self.last_feed_height {
            self.last_feed_height = new_height;
            self.patience = 0;
            return ScrollVerdict::Extended { height: new_height };
        }
        if grew {
            // Layout height can stall while recycled nodes still deliver new posts.
            self.patience = 0;
            return ScrollVerdict::Live;
        }

        self.patience += 1;
        if self.patience >= self.patience_limit {
            ScrollVerdict::Exhausted
        } else {
            ScrollVerdict::Stalled {
                patience: self.patience,
            }
        }
    }

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn patience(&self) -> u32 {
        self.patience
    }

    pub fn patience_limit(&self) -> u32 {
        self.patience_limit
    }

    pub fn last_feed_height(&self) -> u64 {
        self.last_feed_height
    }

    pub fn collected(&self) -> &[Post] {
        self.accumulator.collected()
    }

    pub fn collected_count(&self) -> usize {
        self.accumulator.len()
    }

    pub fn limit(&self) -> usize {
        self.accumulator.limit()
    }

    pub fn seen_count(&self) -> usize {
        self.accumulator.seen_count()
    }

    pub fn into_posts(self) -> Vec<Post> {
        self.accumulator.into_posts()
    }
}
