use std::collections::HashSet;

use crate::Post;

/// What happened to a post handed to [`Accumulator::offer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferOutcome {
    /// Appended to the collected set.
    Accepted,
    /// Url already seen earlier in this session; nothing changed.
    Duplicate,
    /// Newly seen, but under the like threshold.
    BelowThreshold,
    /// Newly seen and qualifying, but the collection is already full.
    LimitReached,
}

impl OfferOutcome {
    pub fn is_accepted(self) -> bool {
        self == OfferOutcome::Accepted
    }

    /// True for every outcome except `Duplicate`.
    pub fn is_new(self) -> bool {
        self != OfferOutcome::Duplicate
    }
}

/// Deduplicating, threshold-filtering result set for one crawl session.
#[derive(Debug, Clone)]
pub struct Accumulator {
    like_threshold: u64,
    limit: usize,
    seen_urls: HashSet<String>,
    collected: Vec<Post>,
}

impl Accumulator {
    pub fn new(like_threshold: u64, limit: usize) -> Self {
        Self {
            like_threshold,
            limit,
            seen_urls: HashSet::new(),
            collected: Vec::new(),
        }
    }

    /// Dedup applies before the threshold: a post that misses the threshold is
    /// still marked seen and never re-evaluated.
    pub fn offer(&mut self, post: Post) -> OfferOutcome {
        if !self.seen_urls.insert(post.url.clone()) {
            return OfferOutcome::Duplicate;
        }
        if post.like_count < self.like_threshold {
            return OfferOutcome::BelowThreshold;
        }
        if self.is_full() {
            return OfferOutcome::LimitReached;
        }
        self.collected.push(post);
        OfferOutcome::Accepted
    }

    pub fn is_full(&self) -> bool {
        self.collected.len() >= self.limit
    }

    pub fn has_seen(&self, url: &str) -> bool {
        self.seen_urls.contains(url)
    }

    pub fn seen_count(&self) -> usize {
        self.seen_urls.len()
    }

    pub fn collected(&self) -> &[Post] {
        &self.collected
    }

    pub fn len(&self) -> usize {
        self.collected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collected.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn into_posts(self) -> Vec<Post> {
        self.collected
    }
}
