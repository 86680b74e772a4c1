use std::time::Duration;

use url::Url;

pub const DEFAULT_LIMIT: usize = 100;
pub const DEFAULT_LIKE_THRESHOLD: u64 = 100;
pub const DEFAULT_MAX_ITERATIONS: u32 = 50;
pub const DEFAULT_PATIENCE_LIMIT: u32 = 5;
pub const DEFAULT_SCROLL_STEP_PX: u32 = 800;

const SEARCH_ENDPOINT: &str = "https://x.com/search";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("keyword must not be empty")]
    EmptyKeyword,
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("invalid search url: {0}")]
    SearchUrl(String),
}

/// Bounded retry: up to `max_attempts` tries with a fixed `delay` in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

/// Parameters of one crawl session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    pub keyword: String,
    /// Stop once this many qualifying posts are collected.
    pub limit: usize,
    /// Minimum like count for a post to be collected.
    pub like_threshold: u64,
    /// Hard ceiling on scroll iterations, empty rescans included.
    pub max_iterations: u32,
    /// Consecutive growth-free iterations tolerated before the feed counts as exhausted.
    pub patience_limit: u32,
    pub scroll_step_px: u32,
    /// Pause after each scroll so lazy content can render.
    pub scroll_wait: Duration,
    /// Extra pause before the document extent is measured.
    pub settle_wait: Duration,
    pub extraction_retry: RetryPolicy,
}

impl CrawlConfig {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            limit: DEFAULT_LIMIT,
            like_threshold: DEFAULT_LIKE_THRESHOLD,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            patience_limit: DEFAULT_PATIENCE_LIMIT,
            scroll_step_px: DEFAULT_SCROLL_STEP_PX,
            scroll_wait: Duration::from_secs(1),
            settle_wait: Duration::from_secs(1),
            extraction_retry: RetryPolicy::default(),
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_like_threshold(mut self, like_threshold: u64) -> Self {
        self.like_threshold = like_threshold;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_patience_limit(mut self, patience_limit: u32) -> Self {
        self.patience_limit = patience_limit;
        self
    }

    pub fn with_scroll_step(mut self, scroll_step_px: u32) -> Self {
        self.scroll_step_px = scroll_step_px;
        self
    }

    /// Sets every pacing wait, including the extraction retry delay.
    pub fn with_pacing(mut self, scroll_wait: Duration, settle_wait: Duration, retry_delay: Duration) -> Self {
        self.scroll_wait = scroll_wait;
        self.settle_wait = settle_wait;
        self.extraction_retry.delay = retry_delay;
        self
    }

    /// Rejects configurations that cannot start a session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keyword.trim().is_empty() {
            return Err(ConfigError::EmptyKeyword);
        }
        let zero_checks = [
            ("limit", self.limit == 0),
            ("like threshold", self.like_threshold == 0),
            ("max iterations", self.max_iterations == 0),
            ("patience limit", self.patience_limit == 0),
            ("scroll step", self.scroll_step_px == 0),
            ("extraction attempts", self.extraction_retry.max_attempts == 0),
        ];
        if let Some((field, _)) = zero_checks.into_iter().find(|(_, is_zero)| *is_zero) {
            return Err(ConfigError::Zero { field });
        }
        Ok(())
    }

    pub fn search_url(&self) -> Result<Url, ConfigError> {
        search_url(&self.keyword)
    }
}

/// Search results page for `keyword`, query-encoded.
pub fn search_url(keyword: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(SEARCH_ENDPOINT).map_err(|err| ConfigError::SearchUrl(err.to_string()))?;
    url.query_pairs_mut()
        .append_pair("q", keyword)
        .append_pair("src", "typeahead_click");
    Ok(url)
}
