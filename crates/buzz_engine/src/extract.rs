use buzz_core::{is_post_permalink, looks_like_count, normalize_count, Post, RetryPolicy};
use buzz_logging::{buzz_debug, buzz_warn};

use crate::agent::{AgentError, BrowserAgent, Role};
use crate::retry::{retry, RetryError};

/// Reads one post node into a [`Post`], re-reading the node from scratch
/// when the document mutates underneath.
#[derive(Debug, Clone)]
pub struct PostExtractor {
    retry: RetryPolicy,
}

impl Default for PostExtractor {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl PostExtractor {
    pub fn new(retry: RetryPolicy) -> Self {
        Self { retry }
    }

    /// `None` for nodes that are not posts (ads, cards) and for nodes that
    /// could not be read consistently within the retry budget. Never fails.
    pub async fn extract<A: BrowserAgent>(&self, agent: &A, node: &A::Node) -> Option<Post> {
        let result = retry(self.retry, AgentError::is_transient, |_| {
            read_post(agent, node)
        })
        .await;

        match result {
            Ok(post) => post,
            Err(RetryError::Exhausted { attempts, last }) => {
                buzz_debug!("giving up on post after {} attempts: {}", attempts, last);
                None
            }
            Err(RetryError::Fatal { error, .. }) => {
                buzz_warn!("failed to read post: {}", error);
                None
            }
        }
    }
}

async fn read_post<A: BrowserAgent>(agent: &A, node: &A::Node) -> Result<Option<Post>, AgentError> {
    let time = agent
        .find(node, Role::Timestamp)
        .await?
        .ok_or_else(|| AgentError::NotFound("timestamp".into()))?;
    let published_at = agent.attribute(&time, "datetime").await?.unwrap_or_default();
    let permalink = agent
        .ancestor(&time, Role::Permalink)
        .await?
        .ok_or_else(|| AgentError::NotFound("permalink".into()))?;
    let url = agent.attribute(&permalink, "href").await?.unwrap_or_default();
    if !is_post_permalink(&url) {
        return Ok(None);
    }

    let (username, display_name) = read_author(agent, node).await?;
    let text = match agent.find(node, Role::Body).await? {
        Some(body) => agent.text(&body).await?,
        None => String::new(),
    };
    let hashtags = read_hashtags(agent, node).await?;

    Ok(Some(Post {
        url,
        username,
        display_name,
        published_at,
        text,
        like_count: read_metric(agent, node, Role::LikeControl).await?,
        repost_count: read_metric(agent, node, Role::RepostControl).await?,
        view_count: read_metric(agent, node, Role::ViewsControl).await?,
        hashtags,
    }))
}

/// Returns `(handle, display name)`, each empty when unresolvable.
async fn read_author<A: BrowserAgent>(
    agent: &A,
    node: &A::Node,
) -> Result<(String, String), AgentError> {
    let Some(identity) = agent.find(node, Role::UserIdentity).await? else {
        return Ok((String::new(), String::new()));
    };

    let display_name = match agent.find(&identity, Role::DisplayName).await? {
        Some(name) => agent.text(&name).await?,
        None => String::new(),
    };

    let links = agent.find_all(&identity, Role::UserLink).await?;
    let mut texts = Vec::with_capacity(links.len());
    for link in &links {
        let text = agent.text(link).await?;
        if text.starts_with('@') {
            return Ok((text, display_name));
        }
        texts.push(text);
    }
    // No "@handle" text: the handle link is conventionally the second one.
    let handle = texts.into_iter().nth(1).unwrap_or_default();
    Ok((handle, display_name))
}

async fn read_hashtags<A: BrowserAgent>(agent: &A, node: &A::Node) -> Result<Vec<String>, AgentError> {
    let mut tags = Vec::new();
    for link in agent.find_all(node, Role::HashtagLink).await? {
        let text = agent.text(&link).await?;
        if text.starts_with('#') {
            tags.push(text);
        }
    }
    Ok(tags)
}

/// A missing control counts as zero.
async fn read_metric<A: BrowserAgent>(agent: &A, node: &A::Node, control: Role) -> Result<u64, AgentError> {
    let Some(control) = agent.find(node, control).await? else {
        return Ok(0);
    };
    for span in agent.find_all(&control, Role::TextSpan).await? {
        let text = agent.text(&span).await?;
        if !text.is_empty() && looks_like_count(&text) {
            return Ok(normalize_count(&text));
        }
    }
    Ok(0)
}
