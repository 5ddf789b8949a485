use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::CatalogError;
use super::tle::{Origin, Satellite, TwoLineElement};

/// One row of the flat satellite store (`Name,TLE1,TLE2`), shared between
/// the CSV files, the catalog fetcher, and the satellites API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TleRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "TLE1")]
    pub tle1: String,
    #[serde(rename = "TLE2")]
    pub tle2: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    User,
    Catalog,
    All,
}

/// Holds the user's satellites and the reference catalog.
#[derive(Debug, Default)]
pub struct TleStore {
    user: Vec<Satellite>,
    catalog: Vec<Satellite>,
}

impl TleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a user satellite. Rejected records never enter
    /// the store.
    pub fn ingest_user(
        &mut self,
        name: &str,
        line1: &str,
        line2: &str,
    ) -> Result<Satellite, CatalogError> {
        let tle = TwoLineElement::new(line1, line2)?;
        tle.elements()?;

        let satellite = Satellite {
            name: unique_name(&self.user, name),
            tle,
            origin: Origin::User,
        };
        self.user.push(satellite.clone());
        Ok(satellite)
    }

    /// Replace the catalog wholesale. Unparsable records are dropped, not
    /// fatal; returns the number kept.
    pub fn ingest_catalog(&mut self, records: impl IntoIterator<Item = TleRecord>) -> usize {
        self.catalog.clear();
        let mut dropped = 0usize;

        for record in records {
            match TwoLineElement::new(&record.tle1, &record.tle2) {
                Ok(tle) => {
                    let satellite = Satellite {
                        name: unique_name(&self.catalog, record.name.trim()),
                        tle,
                        origin: Origin::Catalog,
                    };
                    self.catalog.push(satellite);
                }
                Err(e) => {
                    log::debug!("dropping catalog record '{}': {}", record.name, e);
                    dropped += 1;
                }
            }
        }

        log::info!(
            "catalog ingested: {} kept, {} dropped",
            self.catalog.len(),
            dropped
        );
        self.catalog.len()
    }

    pub fn list(&self, scope: Scope) -> Vec<&Satellite> {
        match scope {
            Scope::User => self.user.iter().collect(),
            Scope::Catalog => self.catalog.iter().collect(),
            Scope::All => self.user.iter().chain(self.catalog.iter()).collect(),
        }
    }

    pub fn records(&self, scope: Scope) -> Vec<TleRecord> {
        self.list(scope)
            .into_iter()
            .map(|sat| TleRecord {
                name: sat.name.clone(),
                tle1: sat.tle.line1().to_string(),
                tle2: sat.tle.line2().to_string(),
            })
            .collect()
    }
}

/// Disambiguate duplicate names with `_1`, `_2`, ... so every entry stays
/// addressable by name within its collection.
fn unique_name(existing: &[Satellite], base: &str) -> String {
    if !existing.iter().any(|s| s.name == base) {
        return base.to_string();
    }
    let mut counter = 1;
    loop {
        let candidate = format!("{base}_{counter}");
        if !existing.iter().any(|s| s.name == candidate) {
            return candidate;
        }
        counter += 1;
    }
}

pub fn load_records(path: &Path) -> Result<Vec<TleRecord>, CatalogError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

pub fn save_records(path: &Path, records: &[TleRecord]) -> Result<(), CatalogError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
