//! Brush interaction engine: draw and erase gestures, undo, persistence.

use crate::geom::{self, Capsule};
use crate::store;
use crate::stroke::{Rgba, Stroke, StrokeGeometry, StrokeId};
use kurbo::Point;
use log::warn;
use std::collections::HashMap;
use std::path::PathBuf;

pub const MIN_BRUSH_WIDTH: f64 = 1.0;
pub const MAX_BRUSH_WIDTH: f64 = 50.0;
pub const DEFAULT_BRUSH_WIDTH: f64 = 25.0;

/// Maximum number of undoable actions to keep.
const MAX_UNDO_ACTIONS: usize = 50;

/// Active brush tool. Only meaningful while the engine is enabled; together
/// with the enabled flag this forms the disabled/draw/erase switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrushTool {
    #[default]
    Draw,
    Erase,
}

/// Pre-gesture state of one stroke touched by an erase gesture.
#[derive(Debug)]
enum EraseRevert {
    /// The stroke survived with reduced geometry.
    Modified(Stroke),
    /// The stroke was erased to nothing and removed.
    Removed(Stroke),
}

#[derive(Debug)]
enum UndoAction {
    /// A draw commit added this stroke.
    Added(StrokeId),
    /// The whole stroke was deleted.
    Removed(Stroke),
    /// One erase gesture touched these strokes.
    Erased(Vec<EraseRevert>),
}

#[derive(Debug)]
struct ActiveStroke {
    page: usize,
    points: Vec<Point>,
}

/// The annotation engine for one open document.
///
/// All mutation happens on the interactive thread in response to pointer
/// events; committed changes are persisted to the annotation sidecar
/// best-effort (failures are logged, the in-memory set stays authoritative
/// for the session).
#[derive(Debug)]
pub struct BrushEngine {
    enabled: bool,
    tool: BrushTool,
    color: Rgba,
    width: f64,
    strokes: Vec<Stroke>,
    active: Option<ActiveStroke>,
    /// First-touch snapshots for the erase gesture in progress.
    erase_snapshots: HashMap<StrokeId, Stroke>,
    /// Strokes fully erased during the gesture in progress.
    erase_removed: Vec<StrokeId>,
    undo_stack: Vec<UndoAction>,
    sidecar: Option<PathBuf>,
}

impl Default for BrushEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl BrushEngine {
    pub fn new() -> Self {
        Self {
            enabled: false,
            tool: BrushTool::default(),
            color: Rgba::highlighter(),
            width: DEFAULT_BRUSH_WIDTH,
            strokes: Vec::new(),
            active: None,
            erase_snapshots: HashMap::new(),
            erase_removed: Vec::new(),
            undo_stack: Vec::new(),
            sidecar: None,
        }
    }

    /// Point the engine at a document's annotation sidecar and load it.
    /// Replaces any previously loaded stroke set.
    pub fn open_sidecar(&mut self, path: PathBuf) {
        self.strokes = store::load_strokes(&path);
        self.sidecar = Some(path);
        self.reset_gestures();
        self.undo_stack.clear();
    }

    /// Drop the current document's strokes and sidecar binding.
    pub fn close(&mut self) {
        self.strokes.clear();
        self.sidecar = None;
        self.reset_gestures();
        self.undo_stack.clear();
    }

    fn reset_gestures(&mut self) {
        self.active = None;
        self.erase_snapshots.clear();
        self.erase_removed.clear();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable annotation. Disabling cancels any gesture in
    /// progress without committing it.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.reset_gestures();
        }
    }

    pub fn tool(&self) -> BrushTool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: BrushTool) {
        self.tool = tool;
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    pub fn set_color(&mut self, color: Rgba) {
        self.color = color;
    }

    pub fn brush_width(&self) -> f64 {
        self.width
    }

    pub fn set_brush_width(&mut self, width: f64) {
        self.width = width.clamp(MIN_BRUSH_WIDTH, MAX_BRUSH_WIDTH);
    }

    /// Adjust the brush diameter, clamped into [1, 50].
    pub fn adjust_width(&mut self, delta: f64) {
        self.set_brush_width(self.width + delta);
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn stroke(&self, id: StrokeId) -> Option<&Stroke> {
        self.strokes.iter().find(|s| s.id == id)
    }

    /// Points of the stroke currently being drawn, for live preview.
    pub fn active_points(&self) -> Option<&[Point]> {
        self.active.as_ref().map(|a| a.points.as_slice())
    }

    pub fn is_drawing(&self) -> bool {
        self.active.is_some()
    }

    /// Begin a new stroke. No-op unless enabled and in draw mode.
    pub fn start_stroke(&mut self, page: usize, point: Point) {
        if !self.enabled || self.tool != BrushTool::Draw {
            return;
        }
        self.active = Some(ActiveStroke {
            page,
            points: vec![point],
        });
    }

    /// Append a point to the stroke in progress. No-op if none.
    pub fn extend_stroke(&mut self, point: Point) {
        if let Some(active) = &mut self.active {
            active.points.push(point);
        }
    }

    /// Finalize the stroke in progress. A tap with no drag (fewer than two
    /// points) is discarded silently.
    pub fn commit_stroke(&mut self) -> Option<StrokeId> {
        let active = self.active.take()?;
        if active.points.len() < 2 {
            return None;
        }
        let stroke = Stroke::new_polyline(active.page, self.color, self.width, active.points);
        let id = stroke.id;
        self.strokes.push(stroke);
        self.push_undo(UndoAction::Added(id));
        self.persist();
        Some(id)
    }

    /// Apply the eraser at `point` on `page`. With a `previous` sample the
    /// eraser region is the capsule swept between the two points, otherwise a
    /// circle of brush diameter. Changes are buffered per gesture; call
    /// [`BrushEngine::commit_erase`] on pointer release.
    pub fn erase_at(&mut self, page: usize, point: Point, previous: Option<Point>) {
        if !self.enabled || self.tool != BrushTool::Erase {
            return;
        }
        let radius = self.width / 2.0;
        let eraser = match previous {
            Some(prev) if prev != point => Capsule::new(prev, point, radius),
            _ => Capsule::circle(point, radius),
        };
        let eraser_bounds = eraser.bounds();

        let mut fully_erased = Vec::new();
        let Self {
            strokes,
            erase_snapshots,
            ..
        } = self;
        for stroke in strokes.iter_mut() {
            if stroke.page != page {
                continue;
            }
            // Bounding-box pre-filter before the exact intersection test.
            if stroke.bounds().intersect(eraser_bounds).area() <= 0.0 {
                continue;
            }
            if !stroke.hits_eraser(&eraser) {
                continue;
            }
            // First touch in this gesture: snapshot for undo, then convert a
            // raw polyline into its filled outline before subtracting.
            erase_snapshots
                .entry(stroke.id)
                .or_insert_with(|| stroke.clone());
            stroke.convert_to_shape();

            if let StrokeGeometry::Shape(loops) = &stroke.geometry {
                let step = geom::grid_step_for_width(stroke.width);
                let remaining = geom::subtract_capsule(loops, &eraser, step);
                if remaining.is_empty() {
                    fully_erased.push(stroke.id);
                } else {
                    stroke.geometry = StrokeGeometry::Shape(remaining);
                }
            }
        }

        for id in fully_erased {
            self.strokes.retain(|s| s.id != id);
            self.erase_removed.push(id);
        }
    }

    /// Commit the erase gesture in progress: persist every touched stroke in
    /// one batch write and record a single undo action for the gesture.
    /// Returns whether anything was touched.
    pub fn commit_erase(&mut self) -> bool {
        if self.erase_snapshots.is_empty() {
            return false;
        }
        let removed = std::mem::take(&mut self.erase_removed);
        let reverts = self
            .erase_snapshots
            .drain()
            .map(|(id, snapshot)| {
                if removed.contains(&id) {
                    EraseRevert::Removed(snapshot)
                } else {
                    EraseRevert::Modified(snapshot)
                }
            })
            .collect();
        self.push_undo(UndoAction::Erased(reverts));
        self.persist();
        true
    }

    /// Delete a whole stroke. Returns whether it existed.
    pub fn remove_stroke(&mut self, id: StrokeId) -> bool {
        let Some(index) = self.strokes.iter().position(|s| s.id == id) else {
            return false;
        };
        let stroke = self.strokes.remove(index);
        self.push_undo(UndoAction::Removed(stroke));
        self.persist();
        true
    }

    /// Revert the most recent committed action (add / remove / erase
    /// gesture) and re-persist. Returns whether an undo occurred.
    pub fn undo(&mut self) -> bool {
        let Some(action) = self.undo_stack.pop() else {
            return false;
        };
        match action {
            UndoAction::Added(id) => {
                self.strokes.retain(|s| s.id != id);
            }
            UndoAction::Removed(stroke) => {
                self.strokes.push(stroke);
            }
            UndoAction::Erased(reverts) => {
                for revert in reverts {
                    match revert {
                        EraseRevert::Modified(snapshot) => {
                            if let Some(stroke) =
                                self.strokes.iter_mut().find(|s| s.id == snapshot.id)
                            {
                                *stroke = snapshot;
                            } else {
                                self.strokes.push(snapshot);
                            }
                        }
                        EraseRevert::Removed(snapshot) => {
                            self.strokes.push(snapshot);
                        }
                    }
                }
            }
        }
        self.persist();
        true
    }

    /// Remove every stroke for the current document and persist the empty
    /// set. Not undoable.
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.reset_gestures();
        self.undo_stack.clear();
        self.persist();
    }

    fn push_undo(&mut self, action: UndoAction) {
        self.undo_stack.push(action);
        if self.undo_stack.len() > MAX_UNDO_ACTIONS {
            self.undo_stack.remove(0);
        }
    }

    fn persist(&self) {
        let Some(path) = &self.sidecar else {
            return;
        };
        if let Err(err) = store::save_strokes(path, &self.strokes) {
            warn!("failed to save annotations to {}: {err}", path.display());
        }
    }
}
