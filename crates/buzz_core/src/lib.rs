//! Buzz core: post model, count normalization, and the pure crawl bookkeeping.
mod accumulator;
mod config;
mod metrics;
mod post;
mod state;

pub use accumulator::{Accumulator, OfferOutcome};
pub use config::{
    search_url, ConfigError, CrawlConfig, RetryPolicy, DEFAULT_LIKE_THRESHOLD, DEFAULT_LIMIT,
    DEFAULT_MAX_ITERATIONS, DEFAULT_PATIENCE_LIMIT, DEFAULT_SCROLL_STEP_PX,
};
pub use metrics::{looks_like_count, normalize_count};
pub use post::{is_post_permalink, Post, HASHTAG_SEPARATOR, POST_COLUMNS, POST_PATH_MARKER};
pub use state::{CrawlState, ScrollVerdict, StopReason};
