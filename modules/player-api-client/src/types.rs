use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page of the players endpoint: `{"players": [...], "has_more": bool}`.
///
/// `has_more` is optional; some deployments omit it and signal the end with
/// an empty `players` list instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayersPage {
    #[serde(default)]
    pub players: Vec<PlayerItem>,
    #[serde(default)]
    pub has_more: Option<bool>,
}

/// A single player item as the API returns it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerItem {
    #[serde(default)]
    pub title: Option<String>,
    /// Node id. Seen both as a JSON number and as a string.
    #[serde(default)]
    pub nid: Option<Value>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl PlayerItem {
    /// `nid` as a string, whichever JSON type it arrived as.
    pub fn nid_string(&self) -> Option<String> {
        match self.nid.as_ref()? {
            Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
