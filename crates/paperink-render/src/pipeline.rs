//! Background page-render pipeline.
//!
//! The interactive thread owns all state; workers only rasterize and emit.
//! At most one new job is admitted per `tick()` (the host drives ticks from
//! a ~5 ms timer), with a global cap on concurrent workers. Each worker
//! checks the disk cache, otherwise opens its own document handle,
//! rasterizes at the fixed oversampling scale, stores the result to the
//! cache fire-and-forget and emits the bitmap through a channel. Emits are
//! stamped with a document generation so anything racing a teardown is
//! dropped on the floor.

use crate::cache::PageCache;
use crate::cancel::CancelToken;
use crate::document::{DocumentOpener, PageSource};
use image::RgbaImage;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Global cap on concurrently rendering pages.
pub const MAX_CONCURRENT_WORKERS: usize = 3;

/// Fixed oversampling scale: pixels per document point.
pub const BASE_RENDER_SCALE: f64 = 2.5;

/// A4 fallback when neither document nor cache can tell us a page size.
const FALLBACK_PAGE_SIZE: (f64, f64) = (595.0, 842.0);

/// Bounded wait for workers to acknowledge a cancellation.
const TEARDOWN_WAIT: Duration = Duration::from_millis(100);

/// Render state of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageState {
    /// White rectangle shown, no bitmap yet.
    #[default]
    Placeholder,
    /// One worker in flight.
    Rendering,
    /// Bitmap delivered.
    Ready,
    /// Render failed; stays a placeholder, rest of the document unaffected.
    Failed,
}

/// Completed work delivered to the interactive thread.
#[derive(Debug)]
pub enum PageEvent {
    Ready { page: usize, image: RgbaImage },
    Failed { page: usize },
}

struct WorkerEmit {
    generation: u64,
    page: usize,
    image: Option<RgbaImage>,
}

pub struct RenderPipeline {
    opener: Option<Arc<dyn DocumentOpener>>,
    cache: Option<Arc<PageCache>>,
    scale: f64,
    /// Bumped per document; emits from older generations are ignored.
    generation: u64,
    states: Vec<PageState>,
    /// Dispatch cursor; pages are admitted in order.
    next_page: usize,
    workers: HashMap<usize, JoinHandle<()>>,
    token: CancelToken,
    tx: Sender<WorkerEmit>,
    rx: Receiver<WorkerEmit>,
}

impl Default for RenderPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPipeline {
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self {
            opener: None,
            cache: None,
            scale: BASE_RENDER_SCALE,
            generation: 0,
            states: Vec::new(),
            next_page: 0,
            workers: HashMap::new(),
            token: CancelToken::new(),
            tx,
            rx,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Start rendering a new document. Cancels and joins any outstanding
    /// workers from the previous document first.
    pub fn open(
        &mut self,
        opener: Arc<dyn DocumentOpener>,
        cache: Option<PageCache>,
        page_count: usize,
    ) {
        self.cancel_workers();
        self.generation += 1;
        self.token = CancelToken::new();
        self.opener = Some(opener);
        self.cache = cache.map(Arc::new);
        self.states = vec![PageState::Placeholder; page_count];
        self.next_page = 0;
    }

    /// Tear down the current document: cancel workers, wait briefly for
    /// them to acknowledge, drop all per-page state.
    pub fn close(&mut self) {
        self.cancel_workers();
        self.generation += 1;
        self.opener = None;
        self.cache = None;
        self.states.clear();
        self.next_page = 0;
    }

    fn cancel_workers(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        self.token.cancel();
        let deadline = Instant::now() + TEARDOWN_WAIT;
        for (page, handle) in self.workers.drain() {
            while !handle.is_finished() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(1));
            }
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                // Leave it detached; its emit is dropped by the generation
                // check in drain_events.
                debug!("render worker for page {page} outlived the teardown wait");
            }
        }
    }

    /// Admit at most one new render job, in page order, respecting the
    /// concurrency cap. Called from the host's low-frequency timer.
    pub fn tick(&mut self) {
        self.workers.retain(|_, handle| !handle.is_finished());

        let Some(opener) = &self.opener else {
            return;
        };
        if self.workers.len() >= MAX_CONCURRENT_WORKERS {
            return;
        }
        while self.next_page < self.states.len()
            && self.states[self.next_page] != PageState::Placeholder
        {
            self.next_page += 1;
        }
        if self.next_page >= self.states.len() {
            return;
        }

        let page = self.next_page;
        self.next_page += 1;
        self.states[page] = PageState::Rendering;

        let opener = Arc::clone(opener);
        let cache = self.cache.clone();
        let token = self.token.clone();
        let tx = self.tx.clone();
        let generation = self.generation;
        let scale = self.scale;
        let handle =
            thread::spawn(move || render_page_job(opener, cache, token, tx, generation, page, scale));
        self.workers.insert(page, handle);
    }

    /// Consume completed work on the interactive thread. Emits that raced a
    /// document teardown are ignored.
    pub fn drain_events(&mut self) -> Vec<PageEvent> {
        let mut events = Vec::new();
        while let Ok(emit) = self.rx.try_recv() {
            if emit.generation != self.generation {
                debug!("ignoring stale emit for page {}", emit.page);
                continue;
            }
            if emit.page >= self.states.len() {
                continue;
            }
            match emit.image {
                Some(image) => {
                    self.states[emit.page] = PageState::Ready;
                    events.push(PageEvent::Ready {
                        page: emit.page,
                        image,
                    });
                }
                None => {
                    self.states[emit.page] = PageState::Failed;
                    events.push(PageEvent::Failed { page: emit.page });
                }
            }
        }
        events
    }

    pub fn page_state(&self, page: usize) -> PageState {
        self.states.get(page).copied().unwrap_or_default()
    }

    pub fn states(&self) -> &[PageState] {
        &self.states
    }

    /// Number of workers currently in flight.
    pub fn in_flight(&self) -> usize {
        self.workers.len()
    }

    /// True once every page reached `Ready` or `Failed`.
    pub fn is_complete(&self) -> bool {
        self.workers.is_empty()
            && self
                .states
                .iter()
                .all(|s| matches!(s, PageState::Ready | PageState::Failed))
    }
}

impl Drop for RenderPipeline {
    fn drop(&mut self) {
        self.cancel_workers();
    }
}

/// One render job: runs on its own thread, owns its own document handle.
fn render_page_job(
    opener: Arc<dyn DocumentOpener>,
    cache: Option<Arc<PageCache>>,
    token: CancelToken,
    tx: Sender<WorkerEmit>,
    generation: u64,
    page: usize,
    scale: f64,
) {
    if token.is_cancelled() {
        return;
    }

    // Disk cache first.
    if let Some(cache) = &cache {
        if let Some(image) = cache.load(page) {
            if !token.is_cancelled() {
                let _ = tx.send(WorkerEmit {
                    generation,
                    page,
                    image: Some(image),
                });
            }
            return;
        }
    }

    let source = match opener.open() {
        Ok(source) => source,
        Err(err) => {
            warn!("page {page}: failed to open document handle: {err}");
            emit_failure(&token, &tx, generation, page);
            return;
        }
    };
    if token.is_cancelled() {
        return;
    }

    match source.render_page(page, scale) {
        Ok(image) => {
            if let Some(cache) = &cache {
                // Fire and forget: a failed write does not fail the render.
                if let Err(err) = cache.store(page, &image) {
                    warn!("page {page}: cache write failed: {err}");
                }
            }
            if !token.is_cancelled() {
                let _ = tx.send(WorkerEmit {
                    generation,
                    page,
                    image: Some(image),
                });
            }
        }
        Err(err) => {
            warn!("page {page}: render failed: {err}");
            emit_failure(&token, &tx, generation, page);
        }
    }
}

fn emit_failure(token: &CancelToken, tx: &Sender<WorkerEmit>, generation: u64, page: usize) {
    if !token.is_cancelled() {
        let _ = tx.send(WorkerEmit {
            generation,
            page,
            image: None,
        });
    }
}

/// Compute pixel dimensions for every page placeholder, synchronously, so
/// layout and scrolling are usable before any bitmap is ready. Falls back
/// to cached image headers, then to A4.
pub fn placeholder_sizes(
    source: Option<&dyn PageSource>,
    cache: Option<&PageCache>,
    page_count: usize,
    scale: f64,
) -> Vec<(f64, f64)> {
    (0..page_count)
        .map(|page| {
            if let Some(source) = source {
                if let Ok(size) = source.page_size(page) {
                    return (size.width * scale, size.height * scale);
                }
            }
            if let Some(cache) = cache {
                if let Some((w, h)) = cache.dimensions(page) {
                    return (w as f64, h as f64);
                }
            }
            (FALLBACK_PAGE_SIZE.0 * scale, FALLBACK_PAGE_SIZE.1 * scale)
        })
        .collect()
}
