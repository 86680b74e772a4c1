#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use buzz_core::CrawlConfig;
use buzz_engine::{AgentError, BrowserAgent, CrawlEvent, ProgressSink, Role};

/// Crawl configuration with every pacing wait disabled.
pub fn fast_config() -> CrawlConfig {
    buzz_logging::initialize_for_tests();
    CrawlConfig::new("rust").with_pacing(Duration::ZERO, Duration::ZERO, Duration::ZERO)
}

#[derive(Default)]
pub struct TestSink {
    events: Arc<Mutex<Vec<CrawlEvent>>>,
}

impl TestSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<CrawlEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: CrawlEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// In-memory description of one rendered post.
#[derive(Debug, Clone)]
pub struct FakePost {
    pub permalink: Option<String>,
    pub has_time: bool,
    pub datetime: String,
    pub has_identity: bool,
    pub display_name: Option<String>,
    pub user_links: Vec<String>,
    pub body: Option<String>,
    pub hashtags: Vec<String>,
    pub likes: Option<Vec<String>>,
    pub reposts: Option<Vec<String>>,
    pub views: Option<Vec<String>>,
    /// Reading the timestamp fails with a non-transient error.
    pub malformed: bool,
}

fn spans(texts: &[&str]) -> Option<Vec<String>> {
    Some(texts.iter().map(|t| t.to_string()).collect())
}

impl FakePost {
    pub fn new(id: u32, likes: &str) -> Self {
        Self {
            permalink: Some(post_url(id)),
            has_time: true,
            datetime: "2025-10-01T09:00:00.000Z".to_string(),
            has_identity: true,
            display_name: Some(format!("User {id}")),
            user_links: vec![format!("User {id}"), format!("@user{id}")],
            body: Some(format!("post number {id}")),
            hashtags: Vec::new(),
            likes: spans(&["", likes]),
            reposts: spans(&["3"]),
            views: spans(&["1.2K"]),
            malformed: false,
        }
    }

    pub fn without_views(mut self) -> Self {
        self.views = None;
        self
    }

    pub fn with_permalink(mut self, href: &str) -> Self {
        self.permalink = Some(href.to_string());
        self
    }

    pub fn with_like_spans(mut self, texts: &[&str]) -> Self {
        self.likes = spans(texts);
        self
    }

    pub fn with_user_links(mut self, links: &[&str]) -> Self {
        self.user_links = links.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn with_hashtags(mut self, tags: &[&str]) -> Self {
        self.hashtags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn without_identity(mut self) -> Self {
        self.has_identity = false;
        self
    }

    pub fn without_body(mut self) -> Self {
        self.body = None;
        self
    }

    pub fn without_time(mut self) -> Self {
        self.has_time = false;
        self
    }

    pub fn malformed(mut self) -> Self {
        self.malformed = true;
        self
    }
}

pub fn post_url(id: u32) -> String {
    format!("https://x.com/user{id}/status/{id}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeNode {
    Post(usize),
    Time(usize),
    Permalink(usize),
    Identity(usize),
    DisplayName(usize),
    UserLink(usize, usize),
    Body(usize),
    Hashtag(usize, usize),
    Control(usize, Role),
    Span(usize, Role, usize),
}

#[derive(Debug, Default)]
struct Counters {
    scans: usize,
    heights: usize,
    scrolls: usize,
    viewport_scrolls: usize,
    timestamp_reads: HashMap<usize, u32>,
}

/// Agent that replays a script: the n-th snapshot returns `scans[n]` and the
/// n-th extent read returns `heights[n]`, repeating the last entry.
pub struct ScriptedAgent {
    posts: Vec<FakePost>,
    scans: Vec<Vec<usize>>,
    heights: Vec<u64>,
    stale_budget: Mutex<HashMap<usize, u32>>,
    fail_scan_at: Option<usize>,
    counters: Mutex<Counters>,
}

impl ScriptedAgent {
    pub fn new(posts: Vec<FakePost>) -> Self {
        let all = (0..posts.len()).collect();
        Self {
            posts,
            scans: vec![all],
            heights: vec![1_000],
            stale_budget: Mutex::new(HashMap::new()),
            fail_scan_at: None,
            counters: Mutex::new(Counters::default()),
        }
    }

    pub fn with_scans(mut self, scans: Vec<Vec<usize>>) -> Self {
        self.scans = scans;
        self
    }

    pub fn with_heights(mut self, heights: Vec<u64>) -> Self {
        self.heights = heights;
        self
    }

    /// The first `times` timestamp reads of post `index` report a stale node.
    pub fn with_stale_reads(self, index: usize, times: u32) -> Self {
        self.stale_budget.lock().unwrap().insert(index, times);
        self
    }

    /// The snapshot with this 0-based call number fails as a dead session.
    pub fn failing_scan_at(mut self, call: usize) -> Self {
        self.fail_scan_at = Some(call);
        self
    }

    pub fn node(&self, index: usize) -> FakeNode {
        FakeNode::Post(index)
    }

    pub fn scans(&self) -> usize {
        self.counters.lock().unwrap().scans
    }

    pub fn scrolls(&self) -> usize {
        self.counters.lock().unwrap().scrolls
    }

    pub fn viewport_scrolls(&self) -> usize {
        self.counters.lock().unwrap().viewport_scrolls
    }

    pub fn timestamp_reads(&self, index: usize) -> u32 {
        self.counters
            .lock()
            .unwrap()
            .timestamp_reads
            .get(&index)
            .copied()
            .unwrap_or(0)
    }

    fn control_spans(&self, index: usize, role: Role) -> Option<&Vec<String>> {
        let post = &self.posts[index];
        match role {
            Role::LikeControl => post.likes.as_ref(),
            Role::RepostControl => post.reposts.as_ref(),
            Role::ViewsControl => post.views.as_ref(),
            _ => None,
        }
    }

    fn read_timestamp(&self, index: usize) -> Result<Option<FakeNode>, AgentError> {
        *self
            .counters
            .lock()
            .unwrap()
            .timestamp_reads
            .entry(index)
            .or_default() += 1;

        let post = &self.posts[index];
        if post.malformed {
            return Err(AgentError::Malformed("broken markup".into()));
        }
        let mut budget = self.stale_budget.lock().unwrap();
        if let Some(left) = budget.get_mut(&index) {
            if *left > 0 {
                *left -= 1;
                return Err(AgentError::Stale(format!("post {index}")));
            }
        }
        Ok(post.has_time.then_some(FakeNode::Time(index)))
    }
}

#[async_trait]
impl BrowserAgent for ScriptedAgent {
    type Node = FakeNode;

    async fn post_nodes(&self) -> Result<Vec<FakeNode>, AgentError> {
        let mut counters = self.counters.lock().unwrap();
        let call = counters.scans;
        counters.scans += 1;
        if self.fail_scan_at == Some(call) {
            return Err(AgentError::Session("browser went away".into()));
        }
        let scan = &self.scans[call.min(self.scans.len() - 1)];
        Ok(scan.iter().map(|&i| FakeNode::Post(i)).collect())
    }

    async fn scroll_by(&self, _pixels: u32) -> Result<(), AgentError> {
        self.counters.lock().unwrap().scrolls += 1;
        Ok(())
    }

    async fn scroll_by_viewport(&self) -> Result<(), AgentError> {
        self.counters.lock().unwrap().viewport_scrolls += 1;
        Ok(())
    }

    async fn document_height(&self) -> Result<u64, AgentError> {
        let mut counters = self.counters.lock().unwrap();
        let call = counters.heights;
        counters.heights += 1;
        Ok(self.heights[call.min(self.heights.len() - 1)])
    }

    async fn find(&self, node: &FakeNode, role: Role) -> Result<Option<FakeNode>, AgentError> {
        let found = match (node, role) {
            (FakeNode::Post(i), Role::Timestamp) => return self.read_timestamp(*i),
            (FakeNode::Post(i), Role::UserIdentity) => {
                self.posts[*i].has_identity.then_some(FakeNode::Identity(*i))
            }
            (FakeNode::Identity(i), Role::DisplayName) => self.posts[*i]
                .display_name
                .as_ref()
                .map(|_| FakeNode::DisplayName(*i)),
            (FakeNode::Post(i), Role::Body) => {
                self.posts[*i].body.as_ref().map(|_| FakeNode::Body(*i))
            }
            (FakeNode::Post(i), control @ (Role::LikeControl | Role::RepostControl | Role::ViewsControl)) => self
                .control_spans(*i, control)
                .map(|_| FakeNode::Control(*i, control)),
            _ => None,
        };
        Ok(found)
    }

    async fn find_all(&self, node: &FakeNode, role: Role) -> Result<Vec<FakeNode>, AgentError> {
        let found = match (node, role) {
            (FakeNode::Identity(i), Role::UserLink) => (0..self.posts[*i].user_links.len())
                .map(|j| FakeNode::UserLink(*i, j))
                .collect(),
            (FakeNode::Post(i), Role::HashtagLink) => (0..self.posts[*i].hashtags.len())
                .map(|j| FakeNode::Hashtag(*i, j))
                .collect(),
            (FakeNode::Control(i, control), Role::TextSpan) => self
                .control_spans(*i, *control)
                .map(|spans| (0..spans.len()).map(|k| FakeNode::Span(*i, *control, k)).collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        Ok(found)
    }

    async fn ancestor(&self, node: &FakeNode, role: Role) -> Result<Option<FakeNode>, AgentError> {
        Ok(match (node, role) {
            (FakeNode::Time(i), Role::Permalink) => self.posts[*i]
                .permalink
                .as_ref()
                .map(|_| FakeNode::Permalink(*i)),
            _ => None,
        })
    }

    async fn attribute(&self, node: &FakeNode, name: &str) -> Result<Option<String>, AgentError> {
        Ok(match (node, name) {
            (FakeNode::Time(i), "datetime") => Some(self.posts[*i].datetime.clone()),
            (FakeNode::Permalink(i), "href") => self.posts[*i].permalink.clone(),
            _ => None,
        })
    }

    async fn text(&self, node: &FakeNode) -> Result<String, AgentError> {
        let text = match node {
            FakeNode::DisplayName(i) => self.posts[*i].display_name.clone(),
            FakeNode::UserLink(i, j) => self.posts[*i].user_links.get(*j).cloned(),
            FakeNode::Body(i) => self.posts[*i].body.clone(),
            FakeNode::Hashtag(i, j) => self.posts[*i].hashtags.get(*j).cloned(),
            FakeNode::Span(i, control, k) => self
                .control_spans(*i, *control)
                .and_then(|spans| spans.get(*k).cloned()),
            _ => None,
        };
        Ok(text.unwrap_or_default())
    }
}

/// One rendered post in the markup shape the live feed uses.
pub fn tweet_html(id: u32, likes: &str, views: Option<&str>) -> String {
    let analytics = views
        .map(|v| format!(r#"<a href="/user{id}/status/{id}/analytics" role="link"><div><span>{v}</span></div></a>"#))
        .unwrap_or_default();
    format!(
        r#"<article data-testid="tweet" role="article">
  <div data-testid="User-Name">
    <a role="link" href="/user{id}"><div><span>User {id}</span></div></a>
    <a role="link" href="/user{id}"><div><span>@user{id}</span></div></a>
    <a role="link" href="/user{id}/status/{id}"><time datetime="2025-10-0{d}T09:00:00.000Z">Oct {d}</time></a>
  </div>
  <div data-testid="tweetText"><span>post number {id} </span><a href="/hashtag/rust?src=hashtag_click">#rust</a></div>
  <div role="group">
    <button data-testid="reply"><div><span>4</span></div></button>
    <button data-testid="retweet"><div><span></span><span>12</span></div></button>
    <button data-testid="like"><div><span>{likes}</span></div></button>
    {analytics}
  </div>
</article>"#,
        d = id % 9 + 1,
    )
}

/// A captured page containing `articles`, with an optional recorded scroll height.
pub fn frame_html(articles: &[String], height: Option<u64>) -> String {
    let height = height
        .map(|h| format!(r#" data-scroll-height="{h}""#))
        .unwrap_or_default();
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>search</title></head><body{height}><main>{}</main></body></html>",
        articles.join("\n")
    )
}
