pub mod dedup;
pub mod driver;
pub mod extract;
pub mod run;
pub mod sink;
pub mod stats;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use dedup::{dedup_by_name, Harvest};
pub use driver::{DriveOutcome, DriverKind, SourceDriver, StopReason};
pub use extract::PageUnit;
pub use run::HarvestRun;
pub use sink::{OutputFiles, SinkReport};
pub use stats::HarvestStats;
