use anyhow::Result;
use async_trait::async_trait;
use player_api_client::{ApiError, PlayerApiClient, PlayersPage};
use tracing::{info, warn};

use super::{DriveOutcome, SourceDriver, StopReason};
use crate::dedup::Harvest;
use crate::extract::PageUnit;

// --- PlayerPages trait ---

/// Page-numbered access to the players endpoint (1-based).
#[async_trait]
pub trait PlayerPages: Send + Sync {
    async fn page(&self, number: u32) -> player_api_client::Result<PlayersPage>;
}

#[async_trait]
impl PlayerPages for PlayerApiClient {
    async fn page(&self, number: u32) -> player_api_client::Result<PlayersPage> {
        self.fetch_page(number).await
    }
}

// --- PaginatedDriver ---

/// Walks `page=1..` until the server says stop.
///
/// Stops on: request failure, non-JSON or undecodable body, an empty player
/// list, `has_more == false`, or the page ceiling. A page without `has_more`
/// keeps going until an empty page shows up, so either signal ends the loop.
pub struct PaginatedDriver<F> {
    pages: F,
    max_pages: u32,
}

impl<F: PlayerPages> PaginatedDriver<F> {
    pub fn new(pages: F, max_pages: u32) -> Self {
        Self { pages, max_pages }
    }
}

#[async_trait]
impl<F: PlayerPages> SourceDriver for PaginatedDriver<F> {
    fn name(&self) -> &str {
        "api"
    }

    async fn drive(&mut self, harvest: &mut Harvest) -> Result<DriveOutcome> {
        let mut units = 0u32;

        for number in 1..=self.max_pages {
            let page = match self.pages.page(number).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(page = number, error = %e, "Page fetch failed, stopping");
                    return Ok(DriveOutcome::new(units, units.saturating_sub(1), stop_for(e)));
                }
            };

            if page.players.is_empty() {
                info!(page = number, "Empty page, stopping");
                return Ok(DriveOutcome::new(units, units.saturating_sub(1), StopReason::Exhausted));
            }

            units += 1;
            let has_more = page.has_more;
            let new = harvest.absorb_unit(&PageUnit::Api(page));
            info!(page = number, new, total = harvest.len(), "Absorbed API page");

            if has_more == Some(false) {
                info!(page = number, "Server reports no more pages");
                return Ok(DriveOutcome::new(units, units - 1, StopReason::Exhausted));
            }
        }

        info!(max_pages = self.max_pages, "Page ceiling reached");
        Ok(DriveOutcome::new(units, units.saturating_sub(1), StopReason::PageCeiling))
    }
}

fn stop_for(err: ApiError) -> StopReason {
    if err.is_format() {
        StopReason::FormatError(err.to_string())
    } else {
        StopReason::TransportError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{api_page, MockPages};
    use url::Url;

    fn harvest() -> Harvest {
        Harvest::new(Url::parse("https://www.bcci.tv").unwrap())
    }

    #[tokio::test]
    async fn missing_has_more_runs_until_empty_page() {
        let pages = MockPages::new()
            .on_page(1, api_page(&["A", "B"], None))
            .on_page(2, api_page(&["C"], None))
            .on_page(3, api_page(&[], None));
        let requested = pages.requested();
        let mut driver = PaginatedDriver::new(pages, 50);
        let mut harvest = harvest();

        let outcome = driver.drive(&mut harvest).await.unwrap();

        assert_eq!(outcome.stop, StopReason::Exhausted);
        assert_eq!(outcome.units, 2);
        assert_eq!(harvest.len(), 3);
        assert_eq!(*requested.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn has_more_false_stops_without_extra_request() {
        let pages = MockPages::new()
            .on_page(1, api_page(&["A"], Some(true)))
            .on_page(2, api_page(&["B"], Some(false)))
            .on_page(3, api_page(&["C"], Some(false)));
        let requested = pages.requested();
        let mut driver = PaginatedDriver::new(pages, 50);
        let mut harvest = harvest();

        driver.drive(&mut harvest).await.unwrap();

        assert_eq!(*requested.lock().unwrap(), vec![1, 2]);
        assert_eq!(harvest.len(), 2);
    }

    #[tokio::test]
    async fn page_ceiling_bounds_the_loop() {
        let pages = MockPages::new()
            .on_page(1, api_page(&["A"], Some(true)))
            .on_page(2, api_page(&["B"], Some(true)))
            .on_page(3, api_page(&["C"], Some(true)));
        let mut driver = PaginatedDriver::new(pages, 2);
        let mut harvest = harvest();

        let outcome = driver.drive(&mut harvest).await.unwrap();

        assert_eq!(outcome.stop, StopReason::PageCeiling);
        assert_eq!(harvest.len(), 2);
    }

    #[tokio::test]
    async fn unbounded_ceiling_does_not_overflow_the_cursor() {
        let pages = MockPages::new()
            .on_page(1, api_page(&["A"], None))
            .on_page(2, api_page(&[], None));
        let requested = pages.requested();
        let mut driver = PaginatedDriver::new(pages, u32::MAX);
        let mut harvest = harvest();

        let outcome = driver.drive(&mut harvest).await.unwrap();

        assert_eq!(outcome.stop, StopReason::Exhausted);
        assert_eq!(*requested.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn zero_ceiling_requests_nothing() {
        let pages = MockPages::new().on_page(1, api_page(&["A"], Some(true)));
        let requested = pages.requested();
        let mut driver = PaginatedDriver::new(pages, 0);
        let mut harvest = harvest();

        let outcome = driver.drive(&mut harvest).await.unwrap();

        assert_eq!(outcome.stop, StopReason::PageCeiling);
        assert!(requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn content_type_mismatch_is_a_format_stop() {
        let pages = MockPages::new()
            .on_page(1, api_page(&["A"], Some(true)))
            .on_error(2, ApiError::ContentType("text/html".to_string()));
        let mut driver = PaginatedDriver::new(pages, 10);
        let mut harvest = harvest();

        let outcome = driver.drive(&mut harvest).await.unwrap();

        assert!(matches!(outcome.stop, StopReason::FormatError(_)));
        assert_eq!(harvest.len(), 1);
    }

    #[tokio::test]
    async fn first_page_failure_yields_empty_harvest() {
        let pages = MockPages::new().on_error(
            1,
            ApiError::Api {
                status: 503,
                message: "unavailable".to_string(),
            },
        );
        let mut driver = PaginatedDriver::new(pages, 10);
        let mut harvest = harvest();

        let outcome = driver.drive(&mut harvest).await.unwrap();

        assert!(matches!(outcome.stop, StopReason::TransportError(_)));
        assert_eq!(outcome.units, 0);
        assert!(harvest.is_empty());
    }
}
