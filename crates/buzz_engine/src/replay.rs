use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use ego_tree::iter::Edge;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use crate::agent::{AgentError, BrowserAgent, Role};
use crate::decode::{decode_html, DecodeError};

/// Attribute on `<body>` that captured frames use to record the live scroll height.
pub const SCROLL_HEIGHT_ATTR: &str = "data-scroll-height";

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("failed to read frames from {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode frame {path:?}: {source}")]
    Decode { path: PathBuf, source: DecodeError },
    #[error("no .html frames found in {0:?}")]
    NoFrames(PathBuf),
}

/// A node handle valid only for the frame it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayNode {
    frame: usize,
    index: usize,
}

/// One captured page, parsed once into an owned preorder index.
///
/// Descendants of node `i` are exactly `i + 1..nodes[i].end`.
#[derive(Debug)]
struct Frame {
    nodes: Vec<FrameNode>,
    /// Preorder indexes each role's selector matches.
    matches: HashMap<Role, HashSet<usize>>,
    height: u64,
}

#[derive(Debug)]
struct FrameNode {
    parent: Option<usize>,
    end: usize,
    kind: NodeKind,
}

#[derive(Debug)]
enum NodeKind {
    Element { attrs: Vec<(String, String)> },
    Text(String),
    Other,
}

impl Frame {
    fn parse(source: &str) -> Self {
        let doc = Html::parse_document(source);
        let selectors: Vec<(Role, Selector)> = Role::ALL
            .iter()
            .filter_map(|&role| Selector::parse(role.css()).ok().map(|sel| (role, sel)))
            .collect();
        let mut matches: HashMap<Role, HashSet<usize>> = selectors
            .iter()
            .map(|(role, _)| (*role, HashSet::new()))
            .collect();

        let mut nodes: Vec<FrameNode> = Vec::new();
        let mut open: Vec<usize> = Vec::new();
        let mut recorded_height = None;
        for edge in doc.tree.root().traverse() {
            match edge {
                Edge::Open(node) => {
                    let index = nodes.len();
                    let kind = match node.value() {
                        Node::Element(el) => NodeKind::Element {
                            attrs: el
                                .attrs()
                                .map(|(name, value)| (name.to_string(), value.to_string()))
                                .collect(),
                        },
                        Node::Text(text) => NodeKind::Text((**text).to_string()),
                        _ => NodeKind::Other,
                    };
                    if let Some(el) = ElementRef::wrap(node) {
                        for (role, sel) in &selectors {
                            if sel.matches(&el) {
                                matches.entry(*role).or_default().insert(index);
                            }
                        }
                        if recorded_height.is_none() && el.value().name() == "body" {
                            recorded_height = el
                                .value()
                                .attr(SCROLL_HEIGHT_ATTR)
                                .and_then(|value| value.trim().parse().ok());
                        }
                    }
                    nodes.push(FrameNode {
                        parent: open.last().copied(),
                        end: index + 1,
                        kind,
                    });
                    open.push(index);
                }
                Edge::Close(_) => {
                    if let Some(index) = open.pop() {
                        nodes[index].end = nodes.len();
                    }
                }
            }
        }

        Self {
            nodes,
            matches,
            height: recorded_height.unwrap_or(source.len() as u64),
        }
    }

    fn matching(&self, role: Role) -> Result<&HashSet<usize>, AgentError> {
        self.matches
            .get(&role)
            .ok_or_else(|| AgentError::Malformed(format!("unusable selector for {role:?}")))
    }

    fn descendants(&self, index: usize, role: Role) -> Result<Vec<usize>, AgentError> {
        let matching = self.matching(role)?;
        Ok((index + 1..self.nodes[index].end)
            .filter(|candidate| matching.contains(candidate))
            .collect())
    }

    fn ancestor(&self, index: usize, role: Role) -> Result<Option<usize>, AgentError> {
        let matching = self.matching(role)?;
        let mut current = self.nodes[index].parent;
        while let Some(candidate) = current {
            if matching.contains(&candidate) {
                return Ok(Some(candidate));
            }
            current = self.nodes[candidate].parent;
        }
        Ok(None)
    }

    fn attribute(&self, index: usize, name: &str) -> Option<&str> {
        match &self.nodes[index].kind {
            NodeKind::Element { attrs } => attrs
                .iter()
                .find(|(attr, _)| attr == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    fn text(&self, index: usize) -> String {
        let mut text = String::new();
        for node in &self.nodes[index + 1..self.nodes[index].end] {
            if let NodeKind::Text(chunk) = &node.kind {
                text.push_str(chunk);
            }
        }
        text.trim().to_string()
    }
}

/// Offline [`BrowserAgent`] over a sequence of captured page sources.
///
/// Every scroll action advances to the next frame (the last one repeats), so
/// handles obtained before a scroll read as stale afterwards, the same way a
/// live feed re-renders under an open snapshot.
#[derive(Debug)]
pub struct HtmlReplayAgent {
    frames: Vec<Frame>,
    base_url: Option<Url>,
    cursor: AtomicUsize,
    scrolls: AtomicUsize,
}

impl HtmlReplayAgent {
    pub fn new(frames: Vec<String>) -> Self {
        Self {
            frames: frames.iter().map(|source| Frame::parse(source)).collect(),
            base_url: None,
            cursor: AtomicUsize::new(0),
            scrolls: AtomicUsize::new(0),
        }
    }

    /// Relative `href` attributes are resolved against `base_url`, as a
    /// browser's DOM property would report them.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Loads every `*.html` file in `dir`, ordered by file name.
    pub fn from_dir(dir: &Path) -> Result<Self, ReplayError> {
        let io_err = |source| ReplayError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(io_err)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("html"))
            .collect();
        if paths.is_empty() {
            return Err(ReplayError::NoFrames(dir.to_path_buf()));
        }
        paths.sort();

        let mut frames = Vec::with_capacity(paths.len());
        for path in paths {
            let bytes = fs::read(&path).map_err(|source| ReplayError::Io {
                path: path.clone(),
                source,
            })?;
            let decoded = decode_html(&bytes).map_err(|source| ReplayError::Decode { path, source })?;
            frames.push(decoded.html);
        }
        Ok(Self::new(frames))
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Scroll actions performed so far.
    pub fn scroll_count(&self) -> usize {
        self.scrolls.load(Ordering::Relaxed)
    }

    fn advance(&self) {
        self.scrolls.fetch_add(1, Ordering::Relaxed);
        let last = self.frames.len().saturating_sub(1);
        let _ = self
            .cursor
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |frame| {
                Some((frame + 1).min(last))
            });
    }

    fn current(&self) -> Result<(usize, &Frame), AgentError> {
        let index = self.cursor.load(Ordering::Relaxed);
        let frame = self
            .frames
            .get(index)
            .ok_or_else(|| AgentError::Session("no frames loaded".into()))?;
        Ok((index, frame))
    }

    /// The current frame, provided `node` was read from it.
    fn frame_of(&self, node: &ReplayNode) -> Result<&Frame, AgentError> {
        let (index, frame) = self.current()?;
        if node.frame != index {
            return Err(AgentError::Stale(format!(
                "node from frame {} read in frame {}",
                node.frame, index
            )));
        }
        if node.index >= frame.nodes.len() {
            return Err(AgentError::Stale("node no longer in document".into()));
        }
        Ok(frame)
    }

    fn handles(&self, frame: usize, indexes: Vec<usize>) -> Vec<ReplayNode> {
        indexes
            .into_iter()
            .map(|index| ReplayNode { frame, index })
            .collect()
    }

    fn resolve(&self, name: &str, value: String) -> String {
        match (&self.base_url, name) {
            (Some(base), "href") => base
                .join(&value)
                .map(|url| url.to_string())
                .unwrap_or(value),
            _ => value,
        }
    }
}

#[async_trait]
impl BrowserAgent for HtmlReplayAgent {
    type Node = ReplayNode;

    async fn post_nodes(&self) -> Result<Vec<ReplayNode>, AgentError> {
        let (index, frame) = self.current()?;
        Ok(self.handles(index, frame.descendants(0, Role::PostContainer)?))
    }

    async fn scroll_by(&self, _pixels: u32) -> Result<(), AgentError> {
        self.advance();
        Ok(())
    }

    async fn scroll_by_viewport(&self) -> Result<(), AgentError> {
        self.advance();
        Ok(())
    }

    async fn document_height(&self) -> Result<u64, AgentError> {
        Ok(self.current()?.1.height)
    }

    async fn find(&self, node: &ReplayNode, role: Role) -> Result<Option<ReplayNode>, AgentError> {
        Ok(self.find_all(node, role).await?.into_iter().next())
    }

    async fn find_all(&self, node: &ReplayNode, role: Role) -> Result<Vec<ReplayNode>, AgentError> {
        let frame = self.frame_of(node)?;
        Ok(self.handles(node.frame, frame.descendants(node.index, role)?))
    }

    async fn ancestor(&self, node: &ReplayNode, role: Role) -> Result<Option<ReplayNode>, AgentError> {
        let frame = self.frame_of(node)?;
        Ok(frame.ancestor(node.index, role)?.map(|index| ReplayNode {
            frame: node.frame,
            index,
        }))
    }

    async fn attribute(&self, node: &ReplayNode, name: &str) -> Result<Option<String>, AgentError> {
        let frame = self.frame_of(node)?;
        Ok(frame
            .attribute(node.index, name)
            .map(|value| self.resolve(name, value.to_string())))
    }

    async fn text(&self, node: &ReplayNode) -> Result<String, AgentError> {
        Ok(self.frame_of(node)?.text(node.index))
    }
}
