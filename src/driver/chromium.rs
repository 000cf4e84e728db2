//! chromiumoxide (Chrome DevTools Protocol) implementation of the driver traits.
//!
//! [`BrowserSession`] owns the browser process, its CDP event handler task and
//! the single page a run works in. It is opened at the start of a run and
//! closed on every exit path by the caller; dropping it without closing still
//! aborts the handler task.
//!
//! CDP reports failures as strings. [`classify`] turns the messages Chrome
//! uses for nodes that no longer exist into [`DriverError::StaleReference`],
//! so the pipeline can tell a re-rendered element apart from a missing one.

use super::{DriverError, DriverResult, Element, Page};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element as CdpElement;
use chromiumoxide::error::CdpError;
use futures::StreamExt;
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tracing::{debug, info, warn};

/// True when the element's centre point hits the element itself (or a child).
const HIT_TEST_JS: &str = r#"function() {
    const rect = this.getBoundingClientRect();
    const hit = document.elementFromPoint(rect.left + rect.width / 2, rect.top + rect.height / 2);
    return hit !== null && (hit === this || this.contains(hit));
}"#;

const CLEAR_VALUE_JS: &str = "function() { this.value = ''; }";

const IS_CONNECTED_JS: &str = "function() { return this.isConnected; }";

/// Substrings of CDP errors raised for nodes or objects that were re-rendered away.
const STALE_MARKERS: &[&str] = &[
    "could not find node with given id",
    "no node with given id",
    "node with given id does not belong to the document",
    "node is detached",
    "could not find object with given id",
    "cannot find context with specified id",
    "execution context was destroyed",
];

/// Map a chromiumoxide error onto the driver taxonomy.
pub fn classify(err: CdpError) -> DriverError {
    let message = err.to_string();
    let lower = message.to_lowercase();
    if STALE_MARKERS.iter().any(|marker| lower.contains(marker)) {
        DriverError::StaleReference
    } else {
        DriverError::Browser(message)
    }
}

/// How to start Chrome.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Run without a window.
    pub headless: bool,
    /// Executable to launch; chromiumoxide auto-detects one when `None`.
    pub chrome_path: Option<PathBuf>,
    /// Bound on each CDP request.
    pub request_timeout: Duration,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        LaunchOptions {
            headless: true,
            chrome_path: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// A running browser with one open page.
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: ChromiumPage,
}

impl BrowserSession {
    /// Launch Chrome and open a blank page.
    pub async fn launch(options: &LaunchOptions) -> Result<Self, Box<dyn Error>> {
        info!(headless = options.headless, "Launching browser");

        let mut builder = BrowserConfig::builder()
            .request_timeout(options.request_timeout)
            .window_size(1920, 1080)
            .arg("--disable-notifications")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &options.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| format!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config).await?;
        let handler = task::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "Browser handler event error");
                }
            }
            debug!("Browser event handler task completed");
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(e.into());
            }
        };
        info!("Browser ready");

        Ok(BrowserSession {
            browser,
            handler,
            page: ChromiumPage { inner: page },
        })
    }

    pub fn page(&self) -> &ChromiumPage {
        &self.page
    }

    /// Close the browser and wait for the process to exit.
    ///
    /// Failures are logged, not returned: closing runs on error paths too and
    /// must not mask the error that ended the run.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "Failed to close browser cleanly; killing it");
            if let Some(Err(e)) = self.browser.kill().await {
                warn!(error = %e, "Failed to kill browser process");
            }
        }
        if let Err(e) = self.browser.wait().await {
            warn!(error = %e, "Failed to wait for browser exit");
        }
        info!("Browser closed");
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[derive(Debug, Clone)]
pub struct ChromiumPage {
    inner: chromiumoxide::Page,
}

impl ChromiumPage {
    async fn evaluate_bool(&self, expression: String) -> DriverResult<bool> {
        self.inner
            .evaluate(expression)
            .await
            .map_err(classify)?
            .into_value::<bool>()
            .map_err(|e| DriverError::Browser(format!("unexpected script result: {e}")))
    }
}

/// JSON-encode `s` so it can be embedded in a script as a string literal.
fn js_string(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

impl Page for ChromiumPage {
    type Element = ChromiumElement;

    async fn goto(&self, url: &str) -> DriverResult<()> {
        self.inner.goto(url).await.map_err(classify)?;
        self.inner.wait_for_navigation().await.map_err(classify)?;
        Ok(())
    }

    async fn find_element(&self, selector: &str) -> DriverResult<ChromiumElement> {
        self.find_elements(selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::not_found(selector))
    }

    async fn find_elements(&self, selector: &str) -> DriverResult<Vec<ChromiumElement>> {
        let elements = self.inner.find_elements(selector).await.map_err(classify)?;
        Ok(elements
            .into_iter()
            .map(|inner| ChromiumElement { inner })
            .collect())
    }

    async fn is_visible(&self, selector: &str) -> DriverResult<bool> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({selector});
                if (!el) return false;
                const style = window.getComputedStyle(el);
                const rect = el.getBoundingClientRect();
                return style.display !== 'none' && style.visibility !== 'hidden'
                    && rect.width > 0 && rect.height > 0;
            }})()"#,
            selector = js_string(selector)
        );
        self.evaluate_bool(script).await
    }

    async fn contains_text(&self, text: &str) -> DriverResult<bool> {
        let script = format!(
            "(() => !!document.body && document.body.innerText.toLowerCase().includes({}))()",
            js_string(&text.to_lowercase())
        );
        self.evaluate_bool(script).await
    }
}

pub struct ChromiumElement {
    inner: CdpElement,
}

impl ChromiumElement {
    async fn call_js(&self, function: String) -> DriverResult<Option<serde_json::Value>> {
        let returns = self
            .inner
            .call_js_fn(function, false)
            .await
            .map_err(classify)?;
        Ok(returns.result.value)
    }
}

impl Element for ChromiumElement {
    async fn find_element(&self, selector: &str) -> DriverResult<ChromiumElement> {
        self.find_elements(selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::not_found(selector))
    }

    async fn find_elements(&self, selector: &str) -> DriverResult<Vec<ChromiumElement>> {
        let elements = self.inner.find_elements(selector).await.map_err(classify)?;
        Ok(elements
            .into_iter()
            .map(|inner| ChromiumElement { inner })
            .collect())
    }

    async fn text(&self) -> DriverResult<String> {
        let text = self.inner.inner_text().await.map_err(classify)?;
        Ok(text.unwrap_or_default().trim().to_string())
    }

    async fn property(&self, name: &str) -> DriverResult<Option<String>> {
        let function = format!(
            "function() {{ const v = this[{}]; return v == null ? null : String(v); }}",
            js_string(name)
        );
        let value = self.call_js(function).await?;
        Ok(value
            .as_ref()
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string))
    }

    async fn scroll_into_view(&self) -> DriverResult<()> {
        self.inner.scroll_into_view().await.map_err(classify)?;
        Ok(())
    }

    /// Click the element's centre, refusing when something else covers it.
    async fn click(&self) -> DriverResult<()> {
        self.inner.scroll_into_view().await.map_err(classify)?;
        let on_target = self
            .call_js(HIT_TEST_JS.to_string())
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if !on_target {
            return Err(DriverError::ClickIntercepted);
        }
        self.inner.click().await.map_err(classify)?;
        Ok(())
    }

    async fn type_text(&self, text: &str) -> DriverResult<()> {
        self.call_js(CLEAR_VALUE_JS.to_string()).await?;
        self.inner.focus().await.map_err(classify)?;
        self.inner.type_str(text).await.map_err(classify)?;
        Ok(())
    }

    /// Live CDP handles never become attached later, so a disconnected node
    /// is reported as stale rather than "not yet attached".
    async fn is_attached(&self) -> DriverResult<bool> {
        let connected = self
            .call_js(IS_CONNECTED_JS.to_string())
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if connected {
            Ok(true)
        } else {
            debug!("Element handle is no longer connected to the document");
            Err(DriverError::StaleReference)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_node_messages_are_stale() {
        for message in [
            "Could not find node with given id",
            "Node is detached from document",
            "Cannot find context with specified id",
        ] {
            let err = classify(CdpError::ChromeMessage(message.to_string()));
            assert!(err.is_stale(), "{message} should be stale");
        }
    }

    #[test]
    fn test_other_errors_are_browser_failures() {
        assert!(matches!(classify(CdpError::Timeout), DriverError::Browser(_)));
        assert!(matches!(
            classify(CdpError::ChromeMessage("Target closed".to_string())),
            DriverError::Browser(_)
        ));
    }
}
