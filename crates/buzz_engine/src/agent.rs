use async_trait::async_trait;

/// Semantic roles the crawler looks up in a rendered feed. Agents resolve a
/// role to whatever query their document model understands; [`Role::css`]
/// is the shared selector table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// One post in the timeline.
    PostContainer,
    /// `<time>` element carrying the machine timestamp.
    Timestamp,
    /// Link enclosing the timestamp; its target is the post permalink.
    Permalink,
    /// Block with display name and handle.
    UserIdentity,
    DisplayName,
    UserLink,
    /// Post body text.
    Body,
    HashtagLink,
    LikeControl,
    RepostControl,
    /// Analytics link that shows the view count.
    ViewsControl,
    /// Text-bearing child of a metric control.
    TextSpan,
}

impl Role {
    pub const ALL: [Role; 12] = [
        Role::PostContainer,
        Role::Timestamp,
        Role::Permalink,
        Role::UserIdentity,
        Role::DisplayName,
        Role::UserLink,
        Role::Body,
        Role::HashtagLink,
        Role::LikeControl,
        Role::RepostControl,
        Role::ViewsControl,
        Role::TextSpan,
    ];

    pub fn css(self) -> &'static str {
        match self {
            Role::PostContainer => "article[data-testid='tweet']",
            Role::Timestamp => "time",
            Role::Permalink => "a[href]",
            Role::UserIdentity => "div[data-testid='User-Name']",
            Role::DisplayName => "a[role='link'] span",
            Role::UserLink => "a[role='link']",
            Role::Body => "div[data-testid='tweetText']",
            Role::HashtagLink => "a[href*='/hashtag/']",
            // The control switches test ids once the session user has engaged.
            Role::LikeControl => "button[data-testid='like'], button[data-testid='unlike']",
            Role::RepostControl => "button[data-testid='retweet'], button[data-testid='unretweet']",
            Role::ViewsControl => "a[href$='/analytics']",
            Role::TextSpan => "span",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    #[error("node not found: {0}")]
    NotFound(String),
    #[error("stale node: {0}")]
    Stale(String),
    #[error("unexpected document structure: {0}")]
    Malformed(String),
    #[error("browser session failed: {0}")]
    Session(String),
}

impl AgentError {
    /// The document mutated under a read; re-reading the node may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, AgentError::NotFound(_) | AgentError::Stale(_))
    }
}

/// Capability interface over a live, mutating rendered feed.
///
/// Expected absence is `Ok(None)` or an empty `Vec`. `Err` is reserved for
/// reads that raced a document mutation (`NotFound`, `Stale`) and for failures
/// of the browser itself.
#[async_trait]
pub trait BrowserAgent: Send + Sync {
    type Node: Clone + Send + Sync;

    /// All currently rendered post containers, in document order.
    async fn post_nodes(&self) -> Result<Vec<Self::Node>, AgentError>;

    async fn scroll_by(&self, pixels: u32) -> Result<(), AgentError>;

    async fn scroll_by_viewport(&self) -> Result<(), AgentError>;

    /// Current scrollable extent of the document.
    async fn document_height(&self) -> Result<u64, AgentError>;

    /// First descendant of `node` with `role`.
    async fn find(&self, node: &Self::Node, role: Role) -> Result<Option<Self::Node>, AgentError>;

    async fn find_all(&self, node: &Self::Node, role: Role) -> Result<Vec<Self::Node>, AgentError>;

    /// Nearest enclosing element with `role`.
    async fn ancestor(&self, node: &Self::Node, role: Role)
        -> Result<Option<Self::Node>, AgentError>;

    async fn attribute(&self, node: &Self::Node, name: &str) -> Result<Option<String>, AgentError>;

    /// Rendered text of `node`, trimmed.
    async fn text(&self, node: &Self::Node) -> Result<String, AgentError>;
}
