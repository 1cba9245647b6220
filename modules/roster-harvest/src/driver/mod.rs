// Source drivers: produce page units and feed them to the Harvest.
//
// InteractiveDriver: stateful browser session, repeated "load more" clicks.
// PaginatedDriver:   stateless page-cursor loop over the players API.
//
// Both stop gracefully on per-page failures and keep what was absorbed so far.
// Only a session that cannot start at all is an error, and that happens
// before a driver exists.

pub mod interactive;
pub mod paginated;

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;

use crate::dedup::Harvest;

pub use interactive::{InteractiveDriver, InteractiveSession, InteractiveSettings};
pub use paginated::{PaginatedDriver, PlayerPages};

#[async_trait]
pub trait SourceDriver: Send {
    fn name(&self) -> &str;

    /// Run the source to completion, absorbing every page unit into `harvest`.
    async fn drive(&mut self, harvest: &mut Harvest) -> Result<DriveOutcome>;
}

/// Which driver the run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DriverKind {
    /// Rendered listing page with "load more" interaction.
    Interactive,
    /// Paginated JSON endpoint.
    Api,
}

/// Why a driver loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Source signalled the end: no advance control, empty page, or
    /// `has_more == false`.
    Exhausted,
    /// An advance was triggered but no new content appeared in time.
    NoGrowth,
    AttemptCeiling,
    PageCeiling,
    TransportError(String),
    FormatError(String),
}

impl StopReason {
    pub fn is_error(&self) -> bool {
        matches!(self, StopReason::TransportError(_) | StopReason::FormatError(_))
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Exhausted => write!(f, "source exhausted"),
            StopReason::NoGrowth => write!(f, "no new content after advance"),
            StopReason::AttemptCeiling => write!(f, "attempt ceiling reached"),
            StopReason::PageCeiling => write!(f, "page ceiling reached"),
            StopReason::TransportError(e) => write!(f, "transport error: {e}"),
            StopReason::FormatError(e) => write!(f, "format error: {e}"),
        }
    }
}

/// Result of one driver run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveOutcome {
    /// Page units absorbed.
    pub units: u32,
    /// Load-more triggers or page-cursor advances performed.
    pub advances: u32,
    pub stop: StopReason,
}

impl DriveOutcome {
    pub(crate) fn new(units: u32, advances: u32, stop: StopReason) -> Self {
        Self {
            units,
            advances,
            stop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_and_format_stops_are_errors() {
        assert!(StopReason::TransportError("reset".into()).is_error());
        assert!(StopReason::FormatError("text/html".into()).is_error());
        assert!(!StopReason::Exhausted.is_error());
        assert!(!StopReason::NoGrowth.is_error());
        assert!(!StopReason::AttemptCeiling.is_error());
    }

    #[test]
    fn stop_reason_display() {
        assert_eq!(
            StopReason::TransportError("status 503".into()).to_string(),
            "transport error: status 503"
        );
        assert_eq!(StopReason::PageCeiling.to_string(), "page ceiling reached");
    }
}
