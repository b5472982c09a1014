use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// A named collection of park ids. A bare string is accepted for lists
/// with a single park.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ParkEntry {
    /// A single park id
    One(String),
    /// Several park ids
    Many(Vec<String>),
}

impl ParkEntry {
    /// The entry's park ids, in file order.
    pub fn into_ids(self) -> Vec<String> {
        match self {
            ParkEntry::One(id) => vec![id],
            ParkEntry::Many(ids) => ids,
        }
    }
}

/// Loads the master list file: a JSON object mapping list names to park
/// ids.
pub fn load(path: &Path) -> anyhow::Result<HashMap<String, ParkEntry>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read master list {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Master list {} is not valid JSON", path.display()))
}

/// Resolves a named list to its park ids.
pub fn lookup(path: &Path, name: &str) -> anyhow::Result<Vec<String>> {
    let mut lists = load(path)?;
    let entry = lists
        .remove(name)
        .with_context(|| format!("No park list named '{}' in {}", name, path.display()))?;
    Ok(entry.into_ids())
}
