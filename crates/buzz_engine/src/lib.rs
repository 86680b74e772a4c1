//! Buzz engine: browser-facing crawl loop, post extraction, and result persistence.
mod agent;
mod crawl;
mod decode;
mod events;
mod export;
mod extract;
mod persist;
mod replay;
mod retry;

pub use agent::{AgentError, BrowserAgent, Role};
pub use crawl::{CrawlError, CrawlReport, Crawler};
pub use decode::{decode_html, DecodeError, DecodedHtml};
pub use events::{CrawlEvent, LogProgressSink, ProgressSink};
pub use export::{export_posts, render_csv, render_json, ExportError, ExportFormat, ExportOptions};
pub use extract::PostExtractor;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use replay::{HtmlReplayAgent, ReplayError, ReplayNode, SCROLL_HEIGHT_ATTR};
pub use retry::{retry, RetryError};
pub use tokio_util::sync::CancellationToken;
