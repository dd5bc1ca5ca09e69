//! Sidecar persistence for brush strokes.
//!
//! One JSON file per logical document. Writes are best-effort at the engine
//! boundary: annotation loss must never take the session down, so callers
//! log failures and keep the in-memory set authoritative.

use crate::stroke::{Rgba, Stroke, StrokeGeometry, StrokeId};
use kurbo::Point;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Sidecar persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sidecar operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Wire format of one stroke: `points` and `path_data` are mutually
/// exclusive, the absent one is omitted.
#[derive(Debug, Serialize, Deserialize)]
struct StrokeRecord {
    id: StrokeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    points: Option<Vec<[f64; 2]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path_data: Option<Vec<Vec<[f64; 2]>>>,
    color: [u8; 4],
    width: f64,
    page_num: usize,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StrokeFile {
    #[serde(default)]
    strokes: Vec<StrokeRecord>,
}

fn to_record(stroke: &Stroke) -> StrokeRecord {
    let (points, path_data) = match &stroke.geometry {
        StrokeGeometry::Polyline(points) => {
            (Some(points.iter().map(|p| [p.x, p.y]).collect()), None)
        }
        StrokeGeometry::Shape(loops) => (
            None,
            Some(
                loops
                    .iter()
                    .map(|lp| lp.iter().map(|p| [p.x, p.y]).collect())
                    .collect(),
            ),
        ),
    };
    StrokeRecord {
        id: stroke.id,
        points,
        path_data,
        color: stroke.color.channels(),
        width: stroke.width,
        page_num: stroke.page,
    }
}

/// Rebuild a stroke from its record; `None` means the record is malformed
/// and gets dropped. `path_data` wins when both representations are present.
fn from_record(record: StrokeRecord) -> Option<Stroke> {
    let geometry = if let Some(raw_loops) = record.path_data {
        let loops: Vec<Vec<Point>> = raw_loops
            .into_iter()
            .filter(|lp| lp.len() >= 3)
            .map(|lp| lp.into_iter().map(|[x, y]| Point::new(x, y)).collect())
            .collect();
        if loops.is_empty() {
            return None;
        }
        StrokeGeometry::Shape(loops)
    } else if let Some(raw_points) = record.points {
        if raw_points.len() < 2 {
            return None;
        }
        StrokeGeometry::Polyline(raw_points.into_iter().map(|[x, y]| Point::new(x, y)).collect())
    } else {
        return None;
    };
    if !record.width.is_finite() || record.width <= 0.0 {
        return None;
    }
    Some(Stroke {
        id: record.id,
        page: record.page_num,
        color: Rgba::from_channels(record.color),
        width: record.width,
        geometry,
    })
}

/// Serialize the full stroke set to `path`, creating parent directories.
pub fn save_strokes(path: &Path, strokes: &[Stroke]) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = StrokeFile {
        strokes: strokes.iter().map(to_record).collect(),
    };
    fs::write(path, serde_json::to_string_pretty(&file)?)?;
    Ok(())
}

/// Load a stroke set from `path`. Missing or unreadable files yield an empty
/// set and malformed records are dropped individually; this never fails.
pub fn load_strokes(path: &Path) -> Vec<Stroke> {
    if !path.exists() {
        return Vec::new();
    }
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(err) => {
            warn!("failed to read annotations from {}: {err}", path.display());
            return Vec::new();
        }
    };
    let file: StrokeFile = match serde_json::from_str(&json) {
        Ok(file) => file,
        Err(err) => {
            warn!("failed to parse annotations in {}: {err}", path.display());
            return Vec::new();
        }
    };
    let total = file.strokes.len();
    let strokes: Vec<Stroke> = file.strokes.into_iter().filter_map(from_record).collect();
    if strokes.len() < total {
        warn!(
            "dropped {} malformed stroke record(s) from {}",
            total - strokes.len(),
            path.display()
        );
    }
    strokes
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn sample_stroke() -> Stroke {
        Stroke::new_polyline(
            2,
            Rgba::new(255, 0, 0, 128),
            18.0,
            vec![
                Point::new(10.0, 10.0),
                Point::new(50.0, 10.0),
                Point::new(50.0, 50.0),
            ],
        )
    }

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("marker.json");
        let stroke = sample_stroke();

        save_strokes(&path, std::slice::from_ref(&stroke)).unwrap();
        let loaded = load_strokes(&path);

        assert_eq!(loaded.len(), 1);
        let back = &loaded[0];
        assert_eq!(back.id, stroke.id);
        assert_eq!(back.page, 2);
        assert_eq!(back.color, stroke.color);
        assert_eq!(back.width, stroke.width);
        assert_eq!(back.as_polyline(), stroke.as_polyline());
    }

    #[test]
    fn test_round_trip_shape() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("marker.json");
        let mut stroke = sample_stroke();
        stroke.convert_to_shape();

        save_strokes(&path, std::slice::from_ref(&stroke)).unwrap();
        let loaded = load_strokes(&path);

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].as_shape(), stroke.as_shape());
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("analysis").join("doc").join("marker.json");
        save_strokes(&path, &[sample_stroke()]).unwrap();
        assert_eq!(load_strokes(&path).len(), 1);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        assert!(load_strokes(&dir.path().join("absent.json")).is_empty());
    }

    #[test]
    fn test_load_garbage_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("marker.json");
        fs::write(&path, "{not json").unwrap();
        assert!(load_strokes(&path).is_empty());
    }

    #[test]
    fn test_malformed_records_dropped_individually() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("marker.json");
        let json = serde_json::json!({
            "strokes": [
                {
                    "id": Uuid::new_v4(),
                    "points": [[0.0, 0.0], [10.0, 10.0]],
                    "color": [255, 255, 0, 100],
                    "width": 20.0,
                    "page_num": 0
                },
                {
                    // Degenerate single-point polyline: dropped.
                    "id": Uuid::new_v4(),
                    "points": [[0.0, 0.0]],
                    "color": [255, 255, 0, 100],
                    "width": 20.0,
                    "page_num": 0
                },
                {
                    // Empty loop list: dropped.
                    "id": Uuid::new_v4(),
                    "path_data": [[]],
                    "color": [255, 255, 0, 100],
                    "width": 20.0,
                    "page_num": 0
                }
            ]
        });
        fs::write(&path, json.to_string()).unwrap();
        assert_eq!(load_strokes(&path).len(), 1);
    }

    #[test]
    fn test_path_data_wins_over_points() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("marker.json");
        let json = serde_json::json!({
            "strokes": [{
                "id": Uuid::new_v4(),
                "points": [[0.0, 0.0], [10.0, 10.0]],
                "path_data": [[[0.0, 0.0], [5.0, 0.0], [5.0, 5.0]]],
                "color": [255, 255, 0, 100],
                "width": 20.0,
                "page_num": 0
            }]
        });
        fs::write(&path, json.to_string()).unwrap();
        let loaded = load_strokes(&path);
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].as_shape().is_some());
    }
}
