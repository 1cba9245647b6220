use std::collections::HashSet;

use harvest_common::PlayerRecord;
use tracing::debug;
use url::Url;

use crate::extract::PageUnit;

/// Keep the first record for each exact `name`, preserving first-seen order.
pub fn dedup_by_name<I>(records: I) -> Vec<PlayerRecord>
where
    I: IntoIterator<Item = PlayerRecord>,
{
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.name.clone()))
        .collect()
}

// --- Harvest accumulator ---

/// Accumulated output of one run: the ordered record list plus the seen-set
/// of names. Drivers feed page units in; the sink reads `records()` out.
#[derive(Debug)]
pub struct Harvest {
    base_url: Url,
    records: Vec<PlayerRecord>,
    seen: HashSet<String>,
    units: u32,
    candidates: u32,
    duplicates: u32,
}

impl Harvest {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            records: Vec::new(),
            seen: HashSet::new(),
            units: 0,
            candidates: 0,
            duplicates: 0,
        }
    }

    /// Extract and absorb one page unit. Returns the number of new records.
    pub fn absorb_unit(&mut self, unit: &PageUnit) -> usize {
        self.units += 1;
        let batch = unit.extract(&self.base_url);
        self.absorb(batch)
    }

    /// Append records whose name has not been seen yet. Later duplicates are
    /// discarded. Returns the number of records accepted.
    pub fn absorb(&mut self, batch: Vec<PlayerRecord>) -> usize {
        let mut accepted = 0;
        for record in batch {
            self.candidates += 1;
            if self.seen.contains(&record.name) {
                self.duplicates += 1;
                continue;
            }
            debug!(name = record.name.as_str(), "Found player");
            self.seen.insert(record.name.clone());
            self.records.push(record);
            accepted += 1;
        }
        accepted
    }

    pub fn records(&self) -> &[PlayerRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<PlayerRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_seen(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    /// Page units absorbed so far.
    pub fn units(&self) -> u32 {
        self.units
    }

    /// Named candidates offered, including duplicates.
    pub fn candidates(&self) -> u32 {
        self.candidates
    }

    pub fn duplicates(&self) -> u32 {
        self.duplicates
    }
}
