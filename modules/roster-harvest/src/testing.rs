// Test fakes for the two driver seams.
//
// - MockSession (InteractiveSession): scripted sequence of listing snapshots;
//   each trigger of the advance control reveals the next one.
// - MockPages (PlayerPages): page number → scripted API response.
//
// Plus builders for listing HTML and API pages.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use browser_client::Locator;
use player_api_client::{ApiError, PlayerItem, PlayersPage};
use scraper::{Html, Selector};

use crate::driver::{InteractiveSession, PlayerPages};

fn slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Listing page with one player anchor per name, in order.
pub fn listing_html(names: &[&str]) -> String {
    let mut html = String::from("<html><body><div class=\"player-list\">");
    for name in names {
        html.push_str(&format!(
            r#"<a href="/international/men/players/{slug}" onclick="click_player(this)" data-player_name="{name}"><img src="/images/{slug}.png" alt="{name}"></a>"#,
            slug = slug(name),
        ));
    }
    html.push_str("</div></body></html>");
    html
}

/// Cumulative snapshots: snapshot `k` shows batches `0..=k`, the way a
/// "load more" listing grows.
pub fn growing_listing(batches: &[&[&str]]) -> Vec<String> {
    let mut shown: Vec<&str> = Vec::new();
    batches
        .iter()
        .map(|batch| {
            shown.extend_from_slice(batch);
            listing_html(&shown)
        })
        .collect()
}

/// API page with one item per name.
pub fn api_page(names: &[&str], has_more: Option<bool>) -> PlayersPage {
    PlayersPage {
        players: names
            .iter()
            .enumerate()
            .map(|(i, name)| PlayerItem {
                title: Some(name.to_string()),
                nid: Some(serde_json::Value::from(i as u64 + 1)),
                path: Some(format!("/players/{}", slug(name))),
                image: Some(format!("/images/{}.png", slug(name))),
                ..Default::default()
            })
            .collect(),
        has_more,
    }
}

// ---------------------------------------------------------------------------
// MockSession
// ---------------------------------------------------------------------------

/// Scripted browser session. The advance control (`#load-more` by default)
/// is visible while further snapshots remain.
pub struct MockSession {
    snapshots: Vec<String>,
    loaded: usize,
    control: Locator,
    stall: bool,
    fail_navigation: bool,
    hang_on_release: bool,
    snapshot_budget: Option<u32>,
    triggers: Arc<AtomicU32>,
    released: Arc<AtomicBool>,
}

impl MockSession {
    pub fn new(snapshots: Vec<String>) -> Self {
        Self {
            snapshots,
            loaded: 0,
            control: Locator::css("#load-more"),
            stall: false,
            fail_navigation: false,
            hang_on_release: false,
            snapshot_budget: None,
            triggers: Arc::new(AtomicU32::new(0)),
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_control(mut self, control: Locator) -> Self {
        self.control = control;
        self
    }

    /// Clicks succeed but the page never grows.
    pub fn stalling(mut self) -> Self {
        self.stall = true;
        self
    }

    pub fn failing_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    /// `release` never completes, like a browser that will not exit.
    pub fn hanging_release(mut self) -> Self {
        self.hang_on_release = true;
        self
    }

    /// Allow `n` successful snapshots, then fail every later one.
    pub fn failing_snapshot_after(mut self, n: u32) -> Self {
        self.snapshot_budget = Some(n);
        self
    }

    pub fn released_flag(&self) -> Arc<AtomicBool> {
        self.released.clone()
    }

    pub fn trigger_count(&self) -> Arc<AtomicU32> {
        self.triggers.clone()
    }

    fn current(&self) -> &str {
        self.snapshots
            .get(self.loaded)
            .map(String::as_str)
            .unwrap_or("<html></html>")
    }
}

#[async_trait]
impl InteractiveSession for MockSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        if self.fail_navigation {
            bail!("navigation to {url} failed: net::ERR_NAME_NOT_RESOLVED");
        }
        Ok(())
    }

    async fn snapshot(&mut self) -> Result<String> {
        if let Some(budget) = self.snapshot_budget.as_mut() {
            if *budget == 0 {
                bail!("target closed");
            }
            *budget -= 1;
        }
        Ok(self.current().to_string())
    }

    async fn count_matches(&mut self, selector: &str) -> Result<usize> {
        let selector = Selector::parse(selector).map_err(|e| anyhow!("bad selector: {e}"))?;
        let document = Html::parse_document(self.current());
        Ok(document.select(&selector).count())
    }

    async fn control_visible(&mut self, control: &Locator) -> Result<bool> {
        Ok(*control == self.control && self.loaded + 1 < self.snapshots.len())
    }

    async fn trigger(&mut self, control: &Locator) -> Result<bool> {
        if *control != self.control {
            return Ok(false);
        }
        self.triggers.fetch_add(1, Ordering::SeqCst);
        if !self.stall {
            self.loaded += 1;
        }
        Ok(true)
    }

    async fn release(self) -> Result<()> {
        if self.hang_on_release {
            std::future::pending::<()>().await;
        }
        self.released.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockPages
// ---------------------------------------------------------------------------

/// Page number → response. Unregistered pages fail with a network error.
/// Each scripted response is handed out once.
pub struct MockPages {
    responses: Mutex<HashMap<u32, player_api_client::Result<PlayersPage>>>,
    requested: Arc<Mutex<Vec<u32>>>,
}

impl MockPages {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn on_page(self, number: u32, page: PlayersPage) -> Self {
        self.responses.lock().unwrap().insert(number, Ok(page));
        self
    }

    pub fn on_error(self, number: u32, err: ApiError) -> Self {
        self.responses.lock().unwrap().insert(number, Err(err));
        self
    }

    /// Page numbers requested so far, in order.
    pub fn requested(&self) -> Arc<Mutex<Vec<u32>>> {
        self.requested.clone()
    }
}

impl Default for MockPages {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlayerPages for MockPages {
    async fn page(&self, number: u32) -> player_api_client::Result<PlayersPage> {
        self.requested.lock().unwrap().push(number);
        self.responses
            .lock()
            .unwrap()
            .remove(&number)
            .unwrap_or_else(|| Err(ApiError::Network(format!("no page {number} registered"))))
    }
}
