//! Per-page rotation state with sidecar persistence.
//!
//! The sidecar is a JSON object of stringified page index → degrees; pages
//! at 0° are omitted entirely.

use crate::store::StoreResult;
use log::warn;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Clockwise rotation per page, in degrees (90/180/270; absent = 0).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationMap {
    degrees: HashMap<usize, u16>,
}

impl RotationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load rotation state from `path`. Missing or unparsable files yield an
    /// empty map; entries that are not a multiple of 90 are dropped.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(err) => {
                warn!("failed to read rotation state from {}: {err}", path.display());
                return Self::default();
            }
        };
        let raw: HashMap<usize, u16> = match serde_json::from_str(&json) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("failed to parse rotation state in {}: {err}", path.display());
                return Self::default();
            }
        };
        let degrees = raw
            .into_iter()
            .filter_map(|(page, deg)| {
                let deg = deg % 360;
                if deg == 0 {
                    None
                } else if deg % 90 == 0 {
                    Some((page, deg))
                } else {
                    warn!("dropping invalid rotation {deg} for page {page}");
                    None
                }
            })
            .collect();
        Self { degrees }
    }

    /// Persist the map to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string(&self.degrees)?)?;
        Ok(())
    }

    /// Rotation for a page (0 when unset).
    pub fn get(&self, page: usize) -> u16 {
        self.degrees.get(&page).copied().unwrap_or(0)
    }

    /// Add `by` degrees (clockwise) to a page and return the new value.
    /// Pages back at 0° are removed from the map rather than stored.
    pub fn rotate(&mut self, page: usize, by: u16) -> u16 {
        let next = (self.get(page) + by) % 360;
        if next == 0 {
            self.degrees.remove(&page);
        } else {
            self.degrees.insert(page, next);
        }
        next
    }

    pub fn is_empty(&self) -> bool {
        self.degrees.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, u16)> + '_ {
        self.degrees.iter().map(|(&page, &deg)| (page, deg))
    }
}
