use harvest_common::PlayerRecord;
use tracing::{info, warn};
use url::Url;

use crate::dedup::Harvest;
use crate::driver::{DriveOutcome, SourceDriver};
use crate::sink::{self, OutputFiles, SinkReport};
use crate::stats::HarvestStats;

/// Roster size the listing is known to reach once every "load more" is
/// followed. Fewer usually means the advance control was not found.
pub const EXPECTED_MIN_PLAYERS: usize = 34;

pub struct HarvestRun {
    pub records: Vec<PlayerRecord>,
    /// `None` when the driver itself failed.
    pub outcome: Option<DriveOutcome>,
    pub report: SinkReport,
    pub stats: HarvestStats,
}

/// Drive the source, then persist whatever was gathered. Persistence runs
/// even when the driver fails, so partial results always reach disk.
pub async fn run<D>(driver: &mut D, base_url: Url, files: &OutputFiles) -> HarvestRun
where
    D: SourceDriver + ?Sized,
{
    let mut harvest = Harvest::new(base_url);
    info!(driver = driver.name(), "Harvest starting");

    let outcome = match driver.drive(&mut harvest).await {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            warn!(driver = driver.name(), error = %e, "Driver failed, saving partial results");
            None
        }
    };

    let report = sink::persist(harvest.records(), files);
    let stats = HarvestStats::collect(driver.name(), outcome.as_ref(), &harvest, &report);
    info!(players = harvest.len(), "Harvest complete");

    HarvestRun {
        records: harvest.into_records(),
        outcome,
        report,
        stats,
    }
}

impl HarvestRun {
    pub fn below_expected(&self) -> bool {
        self.records.len() < EXPECTED_MIN_PLAYERS
    }

    /// First `limit` records with id and link, then a count of the rest.
    pub fn preview(&self, limit: usize) -> String {
        let mut out = String::new();
        for (i, record) in self.records.iter().take(limit).enumerate() {
            out.push_str(&format!("\n{}. {}\n", i + 1, record.name));
            out.push_str(&format!("   ID: {}\n", record.player_id.as_deref().unwrap_or("N/A")));
            out.push_str(&format!("   Link: {}\n", record.link.as_deref().unwrap_or("N/A")));
        }
        if self.records.len() > limit {
            out.push_str(&format!("\n... and {} more players\n", self.records.len() - limit));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{PaginatedDriver, StopReason};
    use crate::testing::{api_page, MockPages};

    #[tokio::test]
    async fn run_persists_union_of_pages() {
        let dir = tempfile::tempdir().unwrap();
        let files = OutputFiles::in_dir(dir.path());
        let pages = MockPages::new()
            .on_page(1, api_page(&["A", "B"], Some(true)))
            .on_page(2, api_page(&["B", "C"], Some(true)))
            .on_page(3, api_page(&[], Some(false)));
        let mut driver = PaginatedDriver::new(pages, 10);

        let run = run(&mut driver, Url::parse("https://www.bcci.tv").unwrap(), &files).await;

        let names: Vec<&str> = run.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);
        assert_eq!(run.outcome.as_ref().unwrap().stop, StopReason::Exhausted);
        assert_eq!(run.stats.duplicates, 1);
        assert_eq!(run.stats.files_written, 3);
        assert!(run.below_expected());
        assert!(files.csv.exists());
    }

    #[test]
    fn preview_truncates_after_limit() {
        let run = HarvestRun {
            records: (1..=12).map(|i| PlayerRecord::new(format!("Player {i}"))).collect(),
            outcome: None,
            report: SinkReport::default(),
            stats: HarvestStats::default(),
        };
        let preview = run.preview(10);
        assert!(preview.contains("10. Player 10\n   ID: N/A"));
        assert!(!preview.contains("Player 11"));
        assert!(preview.ends_with("... and 2 more players\n"));
    }
}
