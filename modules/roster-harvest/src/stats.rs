use crate::dedup::Harvest;
use crate::driver::DriveOutcome;
use crate::sink::SinkReport;

/// Stats from a harvest run.
#[derive(Debug, Default, Clone)]
pub struct HarvestStats {
    pub driver: String,
    pub page_units: u32,
    pub advances: u32,
    pub candidates: u32,
    pub duplicates: u32,
    pub players: u32,
    pub files_written: u32,
    pub files_failed: u32,
    pub stop: String,
}

impl HarvestStats {
    pub fn collect(
        driver: &str,
        outcome: Option<&DriveOutcome>,
        harvest: &Harvest,
        report: &SinkReport,
    ) -> Self {
        Self {
            driver: driver.to_string(),
            page_units: harvest.units(),
            advances: outcome.map_or(0, |o| o.advances),
            candidates: harvest.candidates(),
            duplicates: harvest.duplicates(),
            players: harvest.len() as u32,
            files_written: report.written().count() as u32,
            files_failed: report.failed().count() as u32,
            stop: outcome.map_or_else(|| "driver error".to_string(), |o| o.stop.to_string()),
        }
    }
}

impl std::fmt::Display for HarvestStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Harvest Complete ===")?;
        writeln!(f, "Driver:            {}", self.driver)?;
        writeln!(f, "Stopped because:   {}", self.stop)?;
        writeln!(f, "Page units:        {}", self.page_units)?;
        writeln!(f, "Advances:          {}", self.advances)?;
        writeln!(f, "Candidates:        {}", self.candidates)?;
        writeln!(f, "Duplicates:        {}", self.duplicates)?;
        writeln!(f, "Players found:     {}", self.players)?;
        write!(f, "Files written:     {}", self.files_written)?;
        if self.files_failed > 0 {
            write!(f, " ({} failed)", self.files_failed)?;
        }
        writeln!(f)
    }
}
