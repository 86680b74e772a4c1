//! `BrowserAgent` over a WebDriver session attached to a running Chrome.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use buzz_engine::{AgentError, AtomicFileWriter, BrowserAgent, Role, SCROLL_HEIGHT_ATTR};
use buzz_logging::{buzz_debug, buzz_info, buzz_warn};
use serde_json::json;
use thirtyfour::prelude::*;
use thirtyfour::ChromiumLikeCapabilities;

pub struct WebDriverAgent {
    driver: WebDriver,
    capture: Option<FrameCapture>,
}

/// Writes the page source of each scan as `frame-NNNN.html`.
struct FrameCapture {
    writer: AtomicFileWriter,
    next: AtomicUsize,
}

impl WebDriverAgent {
    /// Attaches to the Chrome instance listening on `debugger_address`.
    pub async fn connect(webdriver_url: &str, debugger_address: &str) -> Result<Self, AgentError> {
        let mut caps = DesiredCapabilities::chrome();
        caps.set_debugger_address(debugger_address).map_err(map_error)?;
        let driver = WebDriver::new(webdriver_url, caps).await.map_err(map_error)?;
        buzz_info!("attached to browser at {}", debugger_address);
        Ok(Self {
            driver,
            capture: None,
        })
    }

    pub fn with_capture(mut self, dir: PathBuf) -> Self {
        self.capture = Some(FrameCapture {
            writer: AtomicFileWriter::new(dir),
            next: AtomicUsize::new(1),
        });
        self
    }

    pub async fn goto(&self, url: &str) -> Result<(), AgentError> {
        buzz_info!("opening {}", url);
        self.driver.goto(url).await.map_err(map_error)
    }

    pub async fn quit(self) -> Result<(), AgentError> {
        self.driver.quit().await.map_err(map_error)
    }

    async fn capture_frame(&self, capture: &FrameCapture) {
        let source = match self.driver.source().await {
            Ok(source) => source,
            Err(err) => {
                buzz_warn!("could not read page source for capture: {}", err);
                return;
            }
        };
        let source = match self.document_height().await {
            Ok(height) => source.replacen("<body", &format!("<body {}=\"{}\"", SCROLL_HEIGHT_ATTR, height), 1),
            Err(_) => source,
        };
        let index = capture.next.fetch_add(1, Ordering::Relaxed);
        let name = format!("frame-{index:04}.html");
        match capture.writer.write(&name, source.as_bytes()) {
            Ok(path) => buzz_debug!("captured {}", path.display()),
            Err(err) => buzz_warn!("could not save {}: {}", name, err),
        }
    }

    async fn scroll_script(&self, script: &str, args: Vec<serde_json::Value>) -> Result<(), AgentError> {
        self.driver.execute(script, args).await.map_err(map_error)?;
        Ok(())
    }
}

#[async_trait]
impl BrowserAgent for WebDriverAgent {
    type Node = WebElement;

    async fn post_nodes(&self) -> Result<Vec<WebElement>, AgentError> {
        if let Some(capture) = &self.capture {
            self.capture_frame(capture).await;
        }
        self.driver
            .find_all(By::Css(Role::PostContainer.css()))
            .await
            .map_err(map_error)
    }

    async fn scroll_by(&self, pixels: u32) -> Result<(), AgentError> {
        self.scroll_script("window.scrollBy(0, arguments[0]);", vec![json!(pixels)])
            .await
    }

    async fn scroll_by_viewport(&self) -> Result<(), AgentError> {
        self.scroll_script("window.scrollBy(0, window.innerHeight);", Vec::new())
            .await
    }

    async fn document_height(&self) -> Result<u64, AgentError> {
        let ret = self
            .driver
            .execute("return document.body.scrollHeight;", Vec::new())
            .await
            .map_err(map_error)?;
        ret.convert::<u64>().map_err(map_error)
    }

    async fn find(&self, node: &WebElement, role: Role) -> Result<Option<WebElement>, AgentError> {
        Ok(self.find_all(node, role).await?.into_iter().next())
    }

    async fn find_all(&self, node: &WebElement, role: Role) -> Result<Vec<WebElement>, AgentError> {
        node.find_all(By::Css(role.css())).await.map_err(map_error)
    }

    async fn ancestor(&self, node: &WebElement, role: Role) -> Result<Option<WebElement>, AgentError> {
        let xpath = ancestor_xpath(role)
            .ok_or_else(|| AgentError::Malformed(format!("no ancestor query for {role:?}")))?;
        let found = node.find_all(By::XPath(xpath)).await.map_err(map_error)?;
        Ok(found.into_iter().next())
    }

    async fn attribute(&self, node: &WebElement, name: &str) -> Result<Option<String>, AgentError> {
        // The href property is already resolved against the page url.
        let value = if name == "href" {
            node.prop(name).await
        } else {
            node.attr(name).await
        };
        value.map_err(map_error)
    }

    async fn text(&self, node: &WebElement) -> Result<String, AgentError> {
        let text = node.text().await.map_err(map_error)?;
        Ok(text.trim().to_string())
    }
}

/// Nearest enclosing element for roles the crawler looks up upwards.
fn ancestor_xpath(role: Role) -> Option<&'static str> {
    match role {
        Role::Permalink => Some("./ancestor::a[@href][1]"),
        Role::PostContainer => Some("./ancestor::article[@data-testid='tweet'][1]"),
        _ => None,
    }
}

fn map_error(err: WebDriverError) -> AgentError {
    let message = err.to_string();
    match err {
        WebDriverError::NoSuchElement(_) => AgentError::NotFound(message),
        WebDriverError::StaleElementReference(_) => AgentError::Stale(message),
        _ => AgentError::Session(message),
    }
}
