//! Table-of-contents sidecar, persisted independently of the source
//! document's embedded outline.
//!
//! Wire format: an ordered JSON array of `[level, title, page_number]` or
//! `[level, title, page_number, {"y": offset}]` entries, page numbers
//! 1-based on the wire.

use crate::store::StoreResult;
use log::warn;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;

/// One outline entry. `page` is 0-based in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct TocEntry {
    /// 1-based nesting depth.
    pub level: u32,
    pub title: String,
    pub page: usize,
    /// Optional vertical target offset within the page, in document points.
    pub dest_y: Option<f64>,
}

impl TocEntry {
    pub fn new(level: u32, title: impl Into<String>, page: usize) -> Self {
        Self {
            level,
            title: title.into(),
            page,
            dest_y: None,
        }
    }
}

/// An editable table of contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Toc {
    entries: Vec<TocEntry>,
}

impl Toc {
    pub fn new(entries: Vec<TocEntry>) -> Self {
        Self {
            entries: normalize(entries),
        }
    }

    /// Load the sidecar from `path`; empty on missing or unparsable files,
    /// malformed entries dropped individually.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(err) => {
                warn!("failed to read outline from {}: {err}", path.display());
                return Self::default();
            }
        };
        let raw: Vec<Value> = match serde_json::from_str(&json) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("failed to parse outline in {}: {err}", path.display());
                return Self::default();
            }
        };
        let entries = raw.iter().filter_map(parse_entry).collect();
        Self::new(entries)
    }

    /// Persist to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw: Vec<Value> = self
            .entries
            .iter()
            .map(|entry| match entry.dest_y {
                Some(y) => json!([entry.level, entry.title, entry.page + 1, { "y": y }]),
                None => json!([entry.level, entry.title, entry.page + 1]),
            })
            .collect();
        fs::write(path, serde_json::to_string_pretty(&raw)?)?;
        Ok(())
    }

    /// Merge the document's embedded outline with a saved sidecar: the saved
    /// version wins whenever it has any entries.
    pub fn merge(embedded: Vec<TocEntry>, saved: Toc) -> Toc {
        if saved.entries.is_empty() {
            Toc::new(embedded)
        } else {
            saved
        }
    }

    pub fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Rename the entry at `index`. Returns whether anything changed.
    pub fn rename(&mut self, index: usize, title: impl Into<String>) -> bool {
        let title = title.into();
        match self.entries.get_mut(index) {
            Some(entry) if entry.title != title => {
                entry.title = title;
                true
            }
            _ => false,
        }
    }

    /// Remove the entry at `index` together with its nested children (the
    /// following entries with a deeper level). Returns whether it existed.
    pub fn remove(&mut self, index: usize) -> bool {
        let Some(entry) = self.entries.get(index) else {
            return false;
        };
        let level = entry.level;
        let mut end = index + 1;
        while end < self.entries.len() && self.entries[end].level > level {
            end += 1;
        }
        self.entries.drain(index..end);
        self.entries = normalize(std::mem::take(&mut self.entries));
        true
    }

    /// Append a custom top-level entry.
    pub fn push_entry(&mut self, title: impl Into<String>, page: usize, dest_y: Option<f64>) {
        self.entries.push(TocEntry {
            level: 1,
            title: title.into(),
            page,
            dest_y,
        });
    }
}

fn parse_entry(value: &Value) -> Option<TocEntry> {
    let parts = value.as_array()?;
    let level = parts.first()?.as_u64()? as u32;
    let title = parts.get(1)?.as_str()?.to_string();
    let page_one_based = parts.get(2)?.as_u64()? as usize;
    let dest_y = parts
        .get(3)
        .and_then(|dest| dest.get("y"))
        .and_then(Value::as_f64)
        .filter(|y| *y >= 0.0);
    Some(TocEntry {
        level,
        title,
        page: page_one_based.saturating_sub(1),
        dest_y,
    })
}

/// Clamp levels so nesting starts at 1 and never jumps by more than one,
/// defensive against hand-edited or truncated files.
fn normalize(entries: Vec<TocEntry>) -> Vec<TocEntry> {
    let mut previous = 0u32;
    entries
        .into_iter()
        .map(|mut entry| {
            entry.level = entry.level.max(1).min(previous + 1);
            previous = entry.level;
            entry
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> Toc {
        Toc::new(vec![
            TocEntry::new(1, "Introduction", 0),
            TocEntry::new(2, "Background", 1),
            TocEntry::new(2, "Motivation", 2),
            TocEntry::new(1, "Methods", 4),
        ])
    }

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("toc_original.json");
        let mut toc = sample();
        toc.push_entry("Appendix", 9, Some(120.5));
        toc.save(&path).unwrap();

        let loaded = Toc::load(&path);
        assert_eq!(loaded, toc);
        assert_eq!(loaded.entries()[4].dest_y, Some(120.5));
    }

    #[test]
    fn test_wire_format_is_heterogeneous_array() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("toc.json");
        sample().save(&path).unwrap();

        let raw: Vec<Value> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        // Page numbers are 1-based on the wire.
        assert_eq!(raw[0], json!([1, "Introduction", 1]));
        assert_eq!(raw[3], json!([1, "Methods", 5]));
    }

    #[test]
    fn test_merge_saved_wins() {
        let embedded = vec![TocEntry::new(1, "From document", 0)];
        let saved = sample();
        assert_eq!(Toc::merge(embedded.clone(), saved.clone()), saved);
        assert_eq!(
            Toc::merge(embedded.clone(), Toc::default()),
            Toc::new(embedded)
        );
    }

    #[test]
    fn test_remove_takes_children() {
        let mut toc = sample();
        assert!(toc.remove(0));
        assert_eq!(toc.len(), 1);
        assert_eq!(toc.entries()[0].title, "Methods");
    }

    #[test]
    fn test_rename() {
        let mut toc = sample();
        assert!(toc.rename(0, "Intro"));
        assert!(!toc.rename(0, "Intro"));
        assert!(!toc.rename(99, "Nope"));
        assert_eq!(toc.entries()[0].title, "Intro");
    }

    #[test]
    fn test_level_jumps_are_clamped() {
        let toc = Toc::new(vec![
            TocEntry::new(1, "A", 0),
            TocEntry::new(4, "B", 1),
            TocEntry::new(0, "C", 2),
        ]);
        let levels: Vec<u32> = toc.entries().iter().map(|e| e.level).collect();
        assert_eq!(levels, vec![1, 2, 1]);
    }

    #[test]
    fn test_malformed_entries_dropped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("toc.json");
        fs::write(
            &path,
            r#"[[1, "Ok", 3], "garbage", [1, 2, 3], [2, "Also ok", 5]]"#,
        )
        .unwrap();
        let toc = Toc::load(&path);
        assert_eq!(toc.len(), 2);
        assert_eq!(toc.entries()[0].page, 2);
    }
}
