use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Column order of the tabular export.
pub const CSV_COLUMNS: [&str; 5] = ["name", "player_id", "link", "image_url", "alt_text"];

// --- PlayerRecord ---

/// One harvested player. `name` is the dedup key and is always non-empty once
/// a record leaves the extractor.
///
/// `extra` holds auxiliary source attributes (`data-*` attributes on the
/// listing anchor, unknown fields on API items). It is flattened on
/// serialization so the JSON export shows them as sibling keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl PlayerRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link: None,
            player_id: None,
            image_url: None,
            alt_text: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_player_id(mut self, id: impl Into<String>) -> Self {
        self.player_id = Some(id.into());
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// The five fixed tabular columns, in `CSV_COLUMNS` order. Missing
    /// optional fields render as empty cells.
    pub fn csv_row(&self) -> [&str; 5] {
        [
            self.name.as_str(),
            self.player_id.as_deref().unwrap_or(""),
            self.link.as_deref().unwrap_or(""),
            self.image_url.as_deref().unwrap_or(""),
            self.alt_text.as_deref().unwrap_or(""),
        ]
    }
}
