use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use std::collections::HashMap;

use crate::config::*;

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\d,.]+").unwrap());

/// Extracts a number from a raw dataset cell.
///
/// The cells of the factbook exports mix numbers with units and comments
/// ("$24.861 trillion (2021 est.)", "1.7% of GDP"): the first run of digits,
/// commas and dots that reads as a number is taken, without its commas.
/// Anything that cannot be read falls back to 0.
pub fn parse_lenient(raw: &str) -> f64 {
    parse_number(raw).unwrap_or(0.0)
}

fn parse_number(raw: &str) -> Option<f64> {
    NUMBER_RE
        .find_iter(raw)
        .find_map(|m| m.as_str().replace(',', "").parse::<f64>().ok())
}

/// The statistics of all the countries of a dataset.
///
/// Built once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct StatsRepository {
    // Country names, in the order of the dataset.
    names: Vec<String>,
    stats: HashMap<String, CountryStats>,
}

impl StatsRepository {
    /// Builds the repository from the textual records of a dataset.
    ///
    /// Arguments:
    /// * `header` the names of the columns
    /// * `rows` the records, aligned with the header. Short rows are accepted, the missing cells
    /// are treated as empty.
    /// * `mapping` the columns to read
    pub fn from_records(
        header: &[String],
        rows: &[Vec<String>],
        mapping: &ColumnMapping,
    ) -> Result<StatsRepository, BattleErrors> {
        let col_idx = |name: &str| {
            header
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| BattleErrors::MissingColumn(name.to_string()))
        };
        let country_idx = col_idx(mapping.country.as_str())?;
        let mut stat_idxs: Vec<usize> = Vec::new();
        for col in mapping.stat_columns() {
            stat_idxs.push(col_idx(col)?);
        }

        let mut names: Vec<String> = Vec::new();
        let mut stats: HashMap<String, CountryStats> = HashMap::new();
        for (lineno, row) in rows.iter().enumerate() {
            let name = match row.get(country_idx).map(|s| s.trim()) {
                Some(s) if !s.is_empty() => s.to_string(),
                _ => {
                    debug!("from_records: row {}: no country name, skipping", lineno);
                    continue;
                }
            };
            if stats.contains_key(&name) {
                warn!(
                    "from_records: row {}: duplicate country {:?}, keeping the first one",
                    lineno, name
                );
                continue;
            }
            let mut values: FeatureVector = [0.0; NUM_FEATURES];
            for (fidx, idx) in stat_idxs.iter().enumerate() {
                let raw = row.get(*idx).map(|s| s.as_str()).unwrap_or("");
                values[fidx] = match parse_number(raw) {
                    Some(x) => x,
                    None => {
                        if !raw.trim().is_empty() {
                            warn!(
                                "from_records: {}: could not read {} from {:?}, using 0",
                                name, FEATURE_NAMES[fidx], raw
                            );
                        }
                        0.0
                    }
                };
            }
            let cs = CountryStats::new(values[0], values[1], values[2], values[3], values[4]);
            debug!("from_records: {}: {:?}", name, cs);
            names.push(name.clone());
            stats.insert(name, cs);
        }
        info!("Loaded statistics for {} countries", names.len());
        Ok(StatsRepository { names, stats })
    }

    /// The statistics of the country with exactly this name.
    pub fn get_stats(&self, country_name: &str) -> Result<CountryStats, BattleErrors> {
        self.stats
            .get(country_name)
            .cloned()
            .ok_or_else(|| BattleErrors::NotFound(country_name.to_string()))
    }

    /// All the countries, in the order of the dataset.
    pub fn countries(&self) -> &[String] {
        self.names.as_slice()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
