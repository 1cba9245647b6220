//! Persistence sink: JSON, CSV, and a plain-text list.
//!
//! Each format is written independently. A failure in one is recorded in the
//! `SinkReport` and does not stop the others. The JSON file is written even
//! for an empty record list (`[]`).

use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use harvest_common::{HarvestError, PlayerRecord, CSV_COLUMNS};
use tracing::{info, warn};

pub const JSON_FILE: &str = "bcci_all_players.json";
pub const CSV_FILE: &str = "bcci_all_players.csv";
pub const TEXT_FILE: &str = "bcci_players_list.txt";

const LIST_TITLE: &str = "BCCI.tv Players List";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Csv,
    Text,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => write!(f, "json"),
            Format::Csv => write!(f, "csv"),
            Format::Text => write!(f, "text"),
        }
    }
}

/// Output paths for one run.
#[derive(Debug, Clone)]
pub struct OutputFiles {
    pub json: PathBuf,
    pub csv: PathBuf,
    pub text: PathBuf,
}

impl OutputFiles {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            json: dir.join(JSON_FILE),
            csv: dir.join(CSV_FILE),
            text: dir.join(TEXT_FILE),
        }
    }
}

/// Outcome of one format's write.
#[derive(Debug)]
pub struct FormatWrite {
    pub format: Format,
    pub path: PathBuf,
    pub result: std::result::Result<(), HarvestError>,
}

#[derive(Debug, Default)]
pub struct SinkReport {
    pub writes: Vec<FormatWrite>,
}

impl SinkReport {
    pub fn written(&self) -> impl Iterator<Item = &FormatWrite> {
        self.writes.iter().filter(|w| w.result.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &FormatWrite> {
        self.writes.iter().filter(|w| w.result.is_err())
    }

    pub fn all_written(&self) -> bool {
        self.writes.iter().all(|w| w.result.is_ok())
    }

    pub fn get(&self, format: Format) -> Option<&FormatWrite> {
        self.writes.iter().find(|w| w.format == format)
    }
}

/// Write `records` in every format. Never fails as a whole.
pub fn persist(records: &[PlayerRecord], files: &OutputFiles) -> SinkReport {
    for path in [&files.json, &files.csv, &files.text] {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!(dir = %parent.display(), error = %e, "Failed to create output directory");
            }
        }
    }

    let writes = vec![
        attempt(Format::Json, &files.json, || write_json(records, &files.json)),
        attempt(Format::Csv, &files.csv, || write_csv(records, &files.csv)),
        attempt(Format::Text, &files.text, || write_text(records, &files.text)),
    ];
    SinkReport { writes }
}

fn attempt<F>(format: Format, path: &Path, write: F) -> FormatWrite
where
    F: FnOnce() -> Result<()>,
{
    let result = match write() {
        Ok(()) => {
            info!(%format, path = %path.display(), "Data saved");
            Ok(())
        }
        Err(e) => {
            warn!(%format, path = %path.display(), error = %format!("{e:#}"), "Failed to save data");
            Err(HarvestError::Persist {
                path: path.display().to_string(),
                message: format!("{e:#}"),
            })
        }
    };
    FormatWrite {
        format,
        path: path.to_path_buf(),
        result,
    }
}

/// Pretty-printed JSON array, all fields per record, UTF-8 unescaped.
pub fn write_json(records: &[PlayerRecord], path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records).context("serialize records")?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Fixed-column CSV with a header row. Missing fields are empty cells.
pub fn write_csv(records: &[PlayerRecord], path: &Path) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("create {}", path.display()))?;
    writer.write_record(CSV_COLUMNS)?;
    for record in records {
        writer.write_record(record.csv_row())?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_text(records: &[PlayerRecord], path: &Path) -> Result<()> {
    fs::write(path, render_text(records)).with_context(|| format!("write {}", path.display()))
}

/// Human-readable numbered list.
pub fn render_text(records: &[PlayerRecord]) -> String {
    let mut out = format!("{LIST_TITLE}\n{}\n\n", "=".repeat(50));
    for (i, record) in records.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, record.name));
        out.push_str(&format!("   Link: {}\n", record.link.as_deref().unwrap_or("N/A")));
        out.push_str(&format!("   ID: {}\n\n", record.player_id.as_deref().unwrap_or("N/A")));
    }
    out
}
