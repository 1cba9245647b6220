pub mod error;
pub mod locator;

pub use error::{BrowserError, Result};
pub use locator::Locator;

use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const EXIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Launch options for a Chromium session.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    /// Chromium executable; chromiumoxide's detection is used when `None`.
    pub chrome_bin: Option<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_bin: None,
        }
    }
}

/// One Chromium process with a single page. The session is stateful: the
/// page keeps whatever content earlier interactions loaded.
///
/// Call `close()` when done. Dropping without closing leaves process cleanup
/// to chromiumoxide's `Browser` drop, which kills the child.
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
}

impl BrowserSession {
    pub async fn launch(options: &LaunchOptions) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled");
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(ref bin) = options.chrome_bin {
            builder = builder.chrome_executable(bin);
        }
        let config = builder.build().map_err(BrowserError::Launch)?;

        let (mut browser, mut events) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "CDP handler event error");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = browser.close().await {
                    warn!(error = %close_err, "Failed to close browser after page creation error");
                }
                handler.abort();
                return Err(BrowserError::Launch(e.to_string()));
            }
        };

        info!(headless = options.headless, "Browser session started");
        Ok(Self {
            browser,
            handler,
            page,
        })
    }

    /// Navigate the session's page and wait for the load to finish.
    pub async fn goto(&self, url: &str) -> Result<()> {
        info!(url, "Loading page");
        self.page.goto(url).await?;
        Ok(())
    }

    /// Current rendered DOM as HTML.
    pub async fn content(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    /// Number of elements currently matching `selector`.
    pub async fn count(&self, selector: &str) -> Result<usize> {
        let n: u64 = self.eval(locator::count_script(selector)).await?;
        Ok(n as usize)
    }

    /// Whether `locator` resolves to a rendered element.
    pub async fn is_visible(&self, locator: &Locator) -> Result<bool> {
        self.eval(locator.visibility_script()).await
    }

    /// Scroll `locator` into view and click it. `Ok(false)` when it is gone.
    pub async fn click(&self, locator: &Locator) -> Result<bool> {
        debug!(%locator, "Clicking element");
        self.eval(locator.click_script()).await
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, script: String) -> Result<T> {
        let result = self.page.evaluate(script).await?;
        Ok(result.into_value::<T>()?)
    }

    /// Close the browser and wait for the process and event handler to exit.
    ///
    /// If the CDP close fails the process is killed instead. Waiting for the
    /// exit is bounded by `EXIT_TIMEOUT` either way.
    pub async fn close(mut self) -> Result<()> {
        let closed = self.browser.close().await;
        if let Err(ref e) = closed {
            warn!(error = %e, "CDP close failed, killing browser process");
            if let Some(Err(kill_err)) = self.browser.kill().await {
                warn!(error = %kill_err, "Failed to kill browser process");
            }
        }
        match tokio::time::timeout(EXIT_TIMEOUT, self.browser.wait()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!(error = %e, "Browser process did not exit cleanly"),
            Err(_) => warn!(
                timeout_secs = EXIT_TIMEOUT.as_secs(),
                "Browser process still running after close"
            ),
        }
        self.handler.abort();
        info!("Browser session closed");
        closed.map(|_| ()).map_err(BrowserError::from)
    }
}
