pub mod types;
pub mod config;
pub mod error;

pub use types::*;
pub use config::{HarvestConfig, DEFAULT_BASE_URL, DEFAULT_LISTING_URL};
pub use error::HarvestError;
