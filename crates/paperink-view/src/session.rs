//! Per-document session: wires the annotation engine, render pipeline,
//! sidecars and viewport together and routes gestures between them.
//!
//! All mutation happens here, on the interactive thread; background workers
//! only ever deliver completed bitmaps through the pipeline's channel.
//! Outward-facing results (extracted text, status) are queued as
//! [`SessionEvent`]s for the host to drain.

use crate::input::{self, Gesture, Modifiers, PointerButton, WheelAction};
use crate::selection::TextSelector;
use crate::viewport::{Viewport, ZOOM_STEP};
use image::RgbaImage;
use kurbo::{Point, Rect, Vec2};
use log::warn;
use paperink_core::{BrushEngine, BrushTool, RotationMap, Toc, TocEntry};
use paperink_render::{
    BASE_RENDER_SCALE, DocumentOpener, PageCache, PageEvent, PageLayout, PageSource, PageState,
    RenderPipeline, placeholder_sizes,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Everything the document-organization layer hands over per open request.
#[derive(Debug, Clone)]
pub struct OpenRequest {
    pub document_path: PathBuf,
    /// Directory of pre-rendered page images; also consulted when the
    /// source document cannot be opened.
    pub cache_dir: Option<PathBuf>,
    pub annotation_path: PathBuf,
    pub rotation_path: PathBuf,
    pub toc_path: PathBuf,
}

/// Outward-facing notifications, drained by the host shell.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A text selection completed; the receiving panel (translation, AI)
    /// is solely responsible for further action.
    TextExtracted(String),
    ZoomChanged(f64),
    /// Transient status line; failures never escalate beyond this.
    Status(String),
}

struct ActiveGesture {
    kind: Gesture,
    last_view: Point,
    /// Previous page-local sample of an erase drag, for the swept capsule.
    last_local: Option<(usize, Point)>,
}

/// One open document and its interaction state.
pub struct DocumentSession {
    viewport: Viewport,
    layout: PageLayout,
    pipeline: RenderPipeline,
    engine: BrushEngine,
    rotation: RotationMap,
    rotation_path: Option<PathBuf>,
    toc: Toc,
    toc_path: Option<PathBuf>,
    bitmaps: Vec<Option<RgbaImage>>,
    /// Interactive-thread handle for metadata and text extraction; render
    /// workers open their own.
    source: Option<Box<dyn PageSource>>,
    selector: TextSelector,
    gesture: Option<ActiveGesture>,
    events: Vec<SessionEvent>,
}

impl Default for DocumentSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentSession {
    pub fn new() -> Self {
        Self {
            viewport: Viewport::new(BASE_RENDER_SCALE),
            layout: PageLayout::default(),
            pipeline: RenderPipeline::new(),
            engine: BrushEngine::new(),
            rotation: RotationMap::new(),
            rotation_path: None,
            toc: Toc::default(),
            toc_path: None,
            bitmaps: Vec::new(),
            source: None,
            selector: TextSelector::new(),
            gesture: None,
            events: Vec::new(),
        }
    }

    /// Open a document: tear down the previous one, load every sidecar,
    /// place placeholders synchronously and start background rendering.
    /// Returns the page count for display (0 when nothing can be shown).
    pub fn open(&mut self, opener: Arc<dyn DocumentOpener>, request: OpenRequest) -> usize {
        self.close();

        let source = match opener.open() {
            Ok(source) => Some(source),
            Err(err) => {
                warn!(
                    "cannot open {}: {err}; falling back to cache",
                    request.document_path.display()
                );
                None
            }
        };
        let cache = request.cache_dir.as_ref().map(PageCache::new);
        let page_count = source
            .as_ref()
            .map(|s| s.page_count())
            .or_else(|| cache.as_ref().map(|c| c.page_count()))
            .unwrap_or(0);
        if page_count == 0 {
            self.events
                .push(SessionEvent::Status("no pages to display".to_string()));
            return 0;
        }

        // Placeholder geometry first, synchronously, so layout and
        // scrolling work before any bitmap is ready.
        let sizes = placeholder_sizes(
            source.as_deref(),
            cache.as_ref(),
            page_count,
            self.pipeline.scale(),
        );
        self.layout = PageLayout::from_sizes(&sizes);
        self.viewport.set_scene_size(self.layout.scene_size());
        self.bitmaps = vec![None; page_count];

        self.engine.open_sidecar(request.annotation_path);
        self.rotation = RotationMap::load(&request.rotation_path);
        self.rotation_path = Some(request.rotation_path);

        let embedded = source
            .as_ref()
            .and_then(|s| s.outline().ok())
            .unwrap_or_default()
            .into_iter()
            .map(|entry| TocEntry {
                level: entry.level,
                title: entry.title,
                page: entry.page,
                dest_y: entry.dest_y,
            })
            .collect();
        self.toc = Toc::merge(embedded, Toc::load(&request.toc_path));
        self.toc_path = Some(request.toc_path);

        self.pipeline.open(opener, cache, page_count);
        self.source = source;
        page_count
    }

    /// Tear the session down: cancel outstanding workers (bounded wait)
    /// before any page state is cleared.
    pub fn close(&mut self) {
        self.pipeline.close();
        self.engine.close();
        self.layout = PageLayout::default();
        self.bitmaps.clear();
        self.source = None;
        self.rotation = RotationMap::new();
        self.rotation_path = None;
        self.toc = Toc::default();
        self.toc_path = None;
        self.selector = TextSelector::new();
        self.gesture = None;
    }

    /// Drive the pipeline. The host calls this from its low-frequency
    /// (~5 ms) timer; it admits new render jobs and installs completed
    /// bitmaps in place of their placeholders.
    pub fn pump(&mut self) {
        self.pipeline.tick();
        for event in self.pipeline.drain_events() {
            match event {
                PageEvent::Ready { page, image } => self.install_bitmap(page, image),
                PageEvent::Failed { page } => {
                    self.events
                        .push(SessionEvent::Status(format!("page {} failed to render", page + 1)));
                }
            }
        }
    }

    fn install_bitmap(&mut self, page: usize, image: RgbaImage) {
        if page >= self.bitmaps.len() {
            return;
        }
        // Replay the persisted rotation as the bitmap first lands.
        let image = match self.rotation.get(page) {
            90 => image::imageops::rotate90(&image),
            180 => image::imageops::rotate180(&image),
            270 => image::imageops::rotate270(&image),
            _ => image,
        };
        // Placeholder dimensions may have been a guess (cache fallback);
        // relayout only when the real bitmap disagrees.
        let (w, h) = image.dimensions();
        let (w, h) = (f64::from(w), f64::from(h));
        let frame = self.layout.frame(page).copied().unwrap_or_default();
        if frame.width != w || frame.height != h {
            self.layout.set_page_size(page, w, h);
            self.layout.relayout();
            self.viewport.set_scene_size(self.layout.scene_size());
        }
        self.bitmaps[page] = Some(image);
    }

    // --- Pointer and wheel routing ---

    /// Pointer-down: decide one gesture from button + modifiers and keep it
    /// exclusive until release. Returns whether the event was consumed.
    pub fn pointer_pressed(
        &mut self,
        view_pos: Point,
        button: PointerButton,
        modifiers: Modifiers,
    ) -> bool {
        let Some(kind) = input::gesture_for(
            button,
            modifiers,
            self.engine.is_enabled(),
            self.engine.tool(),
        ) else {
            return false;
        };
        let scene = self.viewport.to_scene(view_pos);
        let mut last_local = None;
        match kind {
            Gesture::Pan => {}
            Gesture::Draw => {
                let (page, local) = self.viewport.scene_to_page(&self.layout, scene);
                self.engine.start_stroke(page, local);
            }
            Gesture::Erase => {
                let (page, local) = self.viewport.scene_to_page(&self.layout, scene);
                self.engine.erase_at(page, local, None);
                last_local = Some((page, local));
            }
            Gesture::SelectText => self.selector.begin(scene),
        }
        self.gesture = Some(ActiveGesture {
            kind,
            last_view: view_pos,
            last_local,
        });
        true
    }

    pub fn pointer_moved(&mut self, view_pos: Point) -> bool {
        let Some(kind) = self.gesture.as_ref().map(|g| g.kind) else {
            return false;
        };
        let scene = self.viewport.to_scene(view_pos);
        match kind {
            Gesture::Pan => {
                let last = self.gesture.as_ref().map(|g| g.last_view).unwrap_or(view_pos);
                self.viewport.pan_by(view_pos - last);
            }
            Gesture::Draw => {
                let (_, local) = self.viewport.scene_to_page(&self.layout, scene);
                self.engine.extend_stroke(local);
            }
            Gesture::Erase => {
                let (page, local) = self.viewport.scene_to_page(&self.layout, scene);
                // The swept capsule only makes sense within one page.
                let previous = self
                    .gesture
                    .as_ref()
                    .and_then(|g| g.last_local)
                    .filter(|(prev_page, _)| *prev_page == page)
                    .map(|(_, prev)| prev);
                self.engine.erase_at(page, local, previous);
                if let Some(gesture) = &mut self.gesture {
                    gesture.last_local = Some((page, local));
                }
            }
            Gesture::SelectText => self.selector.update(scene),
        }
        if let Some(gesture) = &mut self.gesture {
            gesture.last_view = view_pos;
        }
        true
    }

    pub fn pointer_released(&mut self, _view_pos: Point) -> bool {
        let Some(gesture) = self.gesture.take() else {
            return false;
        };
        match gesture.kind {
            Gesture::Pan => {}
            Gesture::Draw => {
                self.engine.commit_stroke();
            }
            Gesture::Erase => {
                self.engine.commit_erase();
            }
            Gesture::SelectText => {
                if let Some(scene_rect) = self.selector.take() {
                    self.extract_text(scene_rect);
                }
            }
        }
        true
    }

    /// Wheel event: ctrl zooms (clamped), shift adjusts the brush while
    /// annotation is enabled, otherwise scrolls.
    pub fn wheel(&mut self, view_pos: Point, delta_y: f64, modifiers: Modifiers) {
        match input::wheel_action(modifiers, self.engine.is_enabled()) {
            WheelAction::BrushSize => {
                self.engine.adjust_width(if delta_y > 0.0 { 1.0 } else { -1.0 });
            }
            WheelAction::Zoom => {
                let factor = if delta_y > 0.0 { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
                if self.viewport.zoom_at(view_pos, factor) {
                    self.events.push(SessionEvent::ZoomChanged(self.viewport.zoom()));
                }
            }
            WheelAction::Scroll => {
                self.viewport.pan_by(Vec2::new(0.0, delta_y));
            }
        }
    }

    /// Shift held/released: temporary draw↔erase switch while annotating.
    pub fn shift_key(&mut self, pressed: bool) {
        if !self.engine.is_enabled() {
            return;
        }
        if let Some(tool) = input::shift_override(self.engine.tool(), pressed) {
            self.engine.set_tool(tool);
        }
    }

    fn extract_text(&mut self, scene_rect: Rect) {
        let Some(source) = &self.source else {
            return;
        };
        let (page, top_left) = self
            .viewport
            .scene_to_page(&self.layout, Point::new(scene_rect.x0, scene_rect.y0));
        let (_, bottom_right) = self
            .viewport
            .scene_to_page(&self.layout, Point::new(scene_rect.x1, scene_rect.y1));
        let local_rect = Rect::new(top_left.x, top_left.y, bottom_right.x, bottom_right.y);
        match source.text_in_rect(page, local_rect) {
            Ok(text) if !text.is_empty() => {
                #[cfg(feature = "clipboard")]
                copy_to_clipboard(&text);
                self.events.push(SessionEvent::TextExtracted(text));
            }
            Ok(_) => {}
            Err(err) => warn!("text extraction failed on page {page}: {err}"),
        }
    }

    // --- Rotation ---

    /// Rotate the page at the viewport center by 90° clockwise: transform
    /// its bitmap in place, relayout, persist the rotation sidecar.
    pub fn rotate_current_page(&mut self) {
        let page = self.current_page();
        let Some(slot) = self.bitmaps.get_mut(page) else {
            return;
        };
        // Nothing rendered yet: the persisted rotation will be replayed
        // when the bitmap arrives.
        let Some(bitmap) = slot.take() else {
            self.rotation.rotate(page, 90);
            self.persist_rotation();
            return;
        };
        *slot = Some(image::imageops::rotate90(&bitmap));
        self.layout.swap_page_dimensions(page);
        self.layout.relayout();
        self.viewport.set_scene_size(self.layout.scene_size());
        self.rotation.rotate(page, 90);
        self.persist_rotation();
    }

    fn persist_rotation(&mut self) {
        if let Some(path) = &self.rotation_path {
            if let Err(err) = self.rotation.save(path) {
                warn!("failed to save rotation state to {}: {err}", path.display());
            }
        }
    }

    // --- TOC ---

    pub fn toc(&self) -> &Toc {
        &self.toc
    }

    /// Apply an edit to the TOC and persist it when the edit changed
    /// anything.
    pub fn edit_toc(&mut self, edit: impl FnOnce(&mut Toc) -> bool) -> bool {
        let changed = edit(&mut self.toc);
        if changed {
            if let Some(path) = &self.toc_path {
                if let Err(err) = self.toc.save(path) {
                    warn!("failed to save outline to {}: {err}", path.display());
                }
            }
        }
        changed
    }

    // --- Accessors and proxies ---

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    pub fn engine(&self) -> &BrushEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut BrushEngine {
        &mut self.engine
    }

    pub fn page_count(&self) -> usize {
        self.layout.len()
    }

    pub fn page_state(&self, page: usize) -> PageState {
        self.pipeline.page_state(page)
    }

    pub fn bitmap(&self, page: usize) -> Option<&RgbaImage> {
        self.bitmaps.get(page).and_then(Option::as_ref)
    }

    pub fn rotation(&self, page: usize) -> u16 {
        self.rotation.get(page)
    }

    /// Page under the viewport center.
    pub fn current_page(&self) -> usize {
        self.layout.page_at(self.viewport.visible_center().y)
    }

    pub fn scroll_to_page(&mut self, page: usize) {
        self.viewport.scroll_to_page(&self.layout, page);
    }

    pub fn set_annotation_enabled(&mut self, enabled: bool) {
        self.engine.set_enabled(enabled);
    }

    pub fn set_brush_tool(&mut self, tool: BrushTool) {
        self.engine.set_tool(tool);
    }

    pub fn undo(&mut self) -> bool {
        self.engine.undo()
    }

    pub fn clear_annotations(&mut self) {
        self.engine.clear();
    }

    /// Take the queued outward-facing events.
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(feature = "clipboard")]
fn copy_to_clipboard(text: &str) {
    let result = arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text));
    if let Err(err) = result {
        warn!("clipboard copy failed: {err}");
    }
}
