use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use browser_client::{BrowserSession, Locator};
use harvest_common::{HarvestConfig, HarvestError};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{DriveOutcome, SourceDriver, StopReason};
use crate::dedup::Harvest;
use crate::extract::{PageUnit, PLAYER_ANCHOR_SELECTOR};

const POLL_INTERVAL: Duration = Duration::from_millis(500);
const RELEASE_TIMEOUT: Duration = Duration::from_secs(15);

// --- InteractiveSession trait ---

/// The browser operations the interactive loop needs.
#[async_trait]
pub trait InteractiveSession: Send {
    async fn navigate(&mut self, url: &str) -> Result<()>;
    async fn snapshot(&mut self) -> Result<String>;
    async fn count_matches(&mut self, selector: &str) -> Result<usize>;
    async fn control_visible(&mut self, control: &Locator) -> Result<bool>;
    /// Trigger the control. `Ok(false)` when it disappeared before the click.
    async fn trigger(&mut self, control: &Locator) -> Result<bool>;
    async fn release(self) -> Result<()>
    where
        Self: Sized;
}

#[async_trait]
impl InteractiveSession for BrowserSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        Ok(self.goto(url).await?)
    }

    async fn snapshot(&mut self) -> Result<String> {
        Ok(self.content().await?)
    }

    async fn count_matches(&mut self, selector: &str) -> Result<usize> {
        Ok(self.count(selector).await?)
    }

    async fn control_visible(&mut self, control: &Locator) -> Result<bool> {
        Ok(self.is_visible(control).await?)
    }

    async fn trigger(&mut self, control: &Locator) -> Result<bool> {
        Ok(self.click(control).await?)
    }

    async fn release(self) -> Result<()> {
        Ok(self.close().await?)
    }
}

// --- Settings ---

/// Advance-control strategies, tried in order.
pub fn default_advance_controls() -> Vec<Locator> {
    vec![
        Locator::css("button.load-more"),
        Locator::css(".load-more-btn"),
        Locator::css("#load-more"),
        Locator::css("button[onclick*='load']"),
        Locator::css("a.load-more"),
        Locator::css(".btn-load-more"),
        Locator::text("button", "Load More"),
        Locator::text("a", "Load More"),
    ]
}

#[derive(Debug, Clone)]
pub struct InteractiveSettings {
    pub listing_url: String,
    /// Elements whose count signals new content.
    pub marker_selector: String,
    pub controls: Vec<Locator>,
    pub max_attempts: u32,
    pub settle: Duration,
    pub wait_timeout: Duration,
    pub poll_interval: Duration,
    /// Ceiling on session shutdown; the harvest is returned either way.
    pub release_timeout: Duration,
}

impl InteractiveSettings {
    pub fn from_config(config: &HarvestConfig) -> Self {
        Self {
            listing_url: config.listing_url.clone(),
            marker_selector: PLAYER_ANCHOR_SELECTOR.to_string(),
            controls: default_advance_controls(),
            max_attempts: config.max_attempts,
            settle: config.settle,
            wait_timeout: config.wait_timeout,
            poll_interval: POLL_INTERVAL,
            release_timeout: RELEASE_TIMEOUT,
        }
    }
}

// --- InteractiveDriver ---

/// Loads the listing page and clicks "load more" until no control is found,
/// no new players appear, or the attempt ceiling is hit. Every snapshot is
/// absorbed, including the one after the last permitted click.
///
/// The session is released when `drive` returns, on every path. A release
/// that outlasts `release_timeout` is abandoned so the harvest still reaches
/// the sink.
pub struct InteractiveDriver<S> {
    session: Option<S>,
    settings: InteractiveSettings,
}

impl<S: InteractiveSession> InteractiveDriver<S> {
    pub fn new(session: S, settings: InteractiveSettings) -> Self {
        Self {
            session: Some(session),
            settings,
        }
    }
}

async fn run_loop<S: InteractiveSession>(
    settings: &InteractiveSettings,
    session: &mut S,
    harvest: &mut Harvest,
) -> DriveOutcome {
    let mut units = 0u32;
    let mut advances = 0u32;

    if let Err(e) = session.navigate(&settings.listing_url).await {
        warn!(url = settings.listing_url.as_str(), error = %e, "Failed to load listing page");
        return DriveOutcome::new(0, 0, StopReason::TransportError(e.to_string()));
    }
    tokio::time::sleep(settings.settle).await;

    loop {
        match session.snapshot().await {
            Ok(html) => {
                units += 1;
                let new = harvest.absorb_unit(&PageUnit::Html(html));
                info!(batch = units, new, total = harvest.len(), "Absorbed page snapshot");
            }
            Err(e) => {
                warn!(error = %e, "Failed to read page content, stopping");
                return DriveOutcome::new(units, advances, StopReason::TransportError(e.to_string()));
            }
        }

        if advances >= settings.max_attempts {
            info!(attempts = advances, "Load-more attempt ceiling reached");
            return DriveOutcome::new(units, advances, StopReason::AttemptCeiling);
        }

        let before = match session.count_matches(&settings.marker_selector).await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "Failed to count player anchors, stopping");
                return DriveOutcome::new(units, advances, StopReason::TransportError(e.to_string()));
            }
        };

        let Some(control) = find_control(settings, session).await else {
            info!("No more load-more control found, stopping");
            return DriveOutcome::new(units, advances, StopReason::Exhausted);
        };

        match session.trigger(&control).await {
            Ok(true) => {}
            Ok(false) => {
                info!(%control, "Load-more control vanished before click, stopping");
                return DriveOutcome::new(units, advances, StopReason::Exhausted);
            }
            Err(e) => {
                warn!(%control, error = %e, "Error clicking load-more control, stopping");
                return DriveOutcome::new(units, advances, StopReason::TransportError(e.to_string()));
            }
        }
        advances += 1;
        info!(attempt = advances, %control, "Clicked load-more control");

        if !wait_for_growth(settings, session, before).await {
            warn!(
                timeout_secs = settings.wait_timeout.as_secs_f64(),
                "Timed out waiting for new players"
            );
            if let Ok(html) = session.snapshot().await {
                units += 1;
                let new = harvest.absorb_unit(&PageUnit::Html(html));
                info!(batch = units, new, total = harvest.len(), "Absorbed final snapshot");
            }
            return DriveOutcome::new(units, advances, StopReason::NoGrowth);
        }
    }
}

async fn find_control<S: InteractiveSession>(
    settings: &InteractiveSettings,
    session: &mut S,
) -> Option<Locator> {
    for control in &settings.controls {
        match session.control_visible(control).await {
            Ok(true) => return Some(control.clone()),
            Ok(false) => {}
            Err(e) => debug!(%control, error = %e, "Control lookup failed"),
        }
    }
    None
}

/// Poll the marker count until it exceeds `before` or the timeout passes.
async fn wait_for_growth<S: InteractiveSession>(
    settings: &InteractiveSettings,
    session: &mut S,
    before: usize,
) -> bool {
    let deadline = Instant::now() + settings.wait_timeout;
    loop {
        match session.count_matches(&settings.marker_selector).await {
            Ok(n) if n > before => {
                debug!(before, after = n, "New players appeared");
                return true;
            }
            Ok(_) => {}
            Err(e) => debug!(error = %e, "Marker count failed while waiting"),
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(settings.poll_interval).await;
    }
}

#[async_trait]
impl<S: InteractiveSession> SourceDriver for InteractiveDriver<S> {
    fn name(&self) -> &str {
        "interactive"
    }

    async fn drive(&mut self, harvest: &mut Harvest) -> Result<DriveOutcome> {
        let mut session = self
            .session
            .take()
            .ok_or_else(|| HarvestError::Source("interactive session already used".to_string()))?;

        let outcome = run_loop(&self.settings, &mut session, harvest).await;

        match tokio::time::timeout(self.settings.release_timeout, session.release()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Failed to close browser session"),
            Err(_) => warn!(
                timeout_secs = self.settings.release_timeout.as_secs_f64(),
                "Browser session did not close in time, continuing"
            ),
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{listing_html, MockSession};
    use url::Url;

    fn settings(max_attempts: u32) -> InteractiveSettings {
        InteractiveSettings {
            listing_url: "https://www.bcci.tv/international/men/videos/player".to_string(),
            marker_selector: PLAYER_ANCHOR_SELECTOR.to_string(),
            controls: default_advance_controls(),
            max_attempts,
            settle: Duration::ZERO,
            wait_timeout: Duration::from_millis(40),
            poll_interval: Duration::from_millis(5),
            release_timeout: Duration::from_millis(50),
        }
    }

    fn harvest() -> Harvest {
        Harvest::new(Url::parse("https://www.bcci.tv").unwrap())
    }

    #[tokio::test]
    async fn missing_control_on_first_page_is_zero_iterations() {
        let session = MockSession::new(vec![listing_html(&["A", "B"])]);
        let released = session.released_flag();
        let mut driver = InteractiveDriver::new(session, settings(10));
        let mut harvest = harvest();

        let outcome = driver.drive(&mut harvest).await.unwrap();

        assert_eq!(outcome, DriveOutcome::new(1, 0, StopReason::Exhausted));
        assert_eq!(harvest.len(), 2);
        assert!(released.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn second_drive_is_an_error() {
        let mut driver = InteractiveDriver::new(MockSession::new(vec![listing_html(&["A"])]), settings(1));
        let mut harvest = harvest();
        driver.drive(&mut harvest).await.unwrap();
        assert!(driver.drive(&mut harvest).await.is_err());
    }
}
