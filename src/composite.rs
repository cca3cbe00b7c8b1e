//! Incremental compositing of the frame sequence into full-canvas rasters.
//!
//! Each cache entry holds the canvas exactly as it looks after frame *i* has been drawn and
//! before its own disposal is applied. A request for an uncached index replays forward from
//! the nearest cached predecessor (or from a blank canvas), applying the disposal of each
//! frame before drawing the next and caching every index visited on the way. Strictly
//! sequential playback therefore composites each frame exactly once, and random access
//! costs no more than the distance to the nearest cached neighbor.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use log::trace;

use crate::common::DisposalMethod;
use crate::document::{Document, Frame};
use crate::error::GifResult;
use crate::raster::{Raster, Rect, Rgba};

/// Canvas content of a frame's rectangle saved before the frame was drawn, so a
/// `RestorePrevious` disposal can undo it.
#[derive(Clone)]
struct SavedRegion {
    rect: Rect,
    pixels: Raster,
}

struct CacheEntry {
    /// Full canvas after the frame was drawn, before its disposal.
    canvas: Raster,
    /// Present iff the frame's disposal is `RestorePrevious`.
    restore: Option<SavedRegion>,
}

/// The frame compositing engine.
///
/// Owns its cache; the shared [`Document`] is only ever read. Each animation instance
/// should own its own `Compositor` — sharing the document is the supported pattern,
/// sharing a compositor is not.
pub struct Compositor {
    document: Arc<Document>,
    cache: BTreeMap<usize, CacheEntry>,
    /// Cache keys in production order, oldest first; drives eviction.
    produced: VecDeque<usize>,
    max_cached: Option<usize>,
    /// Stand-in canvas for documents without frames.
    blank: Option<Raster>,
}

impl Compositor {
    /// Creates an engine over a shared document.
    pub fn new(document: Arc<Document>) -> Compositor {
        Compositor {
            document,
            cache: BTreeMap::new(),
            produced: VecDeque::new(),
            max_cached: None,
            blank: None,
        }
    }

    /// The document this engine composites.
    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    /// Bounds the number of cached canvases; `None` removes the bound.
    ///
    /// Entries are evicted least-recently-produced first. Eviction only affects cost:
    /// previously evicted ranges are recomputed on demand with identical results.
    pub fn set_max_cached(&mut self, max: Option<usize>) {
        self.max_cached = max.map(|n| n.max(1));
        while let Some(limit) = self.max_cached {
            if self.cache.len() <= limit {
                break;
            }
            self.evict_oldest(None);
        }
    }

    /// Drops every cached canvas. Call when the source document is replaced; idempotent.
    pub fn invalidate(&mut self) {
        self.cache.clear();
        self.produced.clear();
        self.blank = None;
    }

    /// Replaces the document and drops all cached state derived from the old one.
    pub fn set_document(&mut self, document: Arc<Document>) {
        self.document = document;
        self.invalidate();
    }

    /// The composited canvas for `index`: everything the viewer would see after that frame
    /// has been drawn.
    ///
    /// An out-of-range index clamps to the last frame; for a document without frames the
    /// result is a blank canvas. The returned raster is a read-only view into the cache,
    /// identical across repeated calls regardless of any other lookups in between.
    pub fn get_composited(&mut self, index: usize) -> GifResult<&Raster> {
        let frame_count = self.document.frames().len();
        if frame_count == 0 {
            let canvas = match self.blank.take() {
                Some(canvas) => canvas,
                None => self.fresh_canvas()?,
            };
            return Ok(self.blank.insert(canvas));
        }
        let index = index.min(frame_count - 1);
        if !self.cache.contains_key(&index) {
            self.replay_to(index)?;
        }
        Ok(&self.cache[&index].canvas)
    }

    /// Eagerly composites every frame in one forward pass.
    pub fn build_all(&mut self) -> GifResult<()> {
        for index in 0..self.document.frames().len() {
            self.get_composited(index)?;
        }
        Ok(())
    }

    fn fresh_canvas(&self) -> GifResult<Raster> {
        Raster::new(
            u32::from(self.document.width()),
            u32::from(self.document.height()),
        )
    }

    /// Composites forward until `index` is cached.
    fn replay_to(&mut self, index: usize) -> GifResult<()> {
        let document = Arc::clone(&self.document);
        let frames = document.frames();
        let background = document.background_color();

        // Resume from the nearest cached predecessor, or from scratch.
        let (first, mut canvas, mut previous) = match self.cache.range(..=index).next_back() {
            Some((&cached, entry)) => (
                cached + 1,
                entry.canvas.clone(),
                Some((cached, entry.restore.clone())),
            ),
            None => (0, self.fresh_canvas()?, None),
        };
        trace!("replaying frames {first}..={index}");

        for current in first..=index {
            if let Some((prev_index, restore)) = previous.take() {
                settle(&mut canvas, &frames[prev_index], restore.as_ref(), background);
            }
            let frame = &frames[current];

            // Snapshot before drawing: RestorePrevious undoes this frame, not the one
            // before it.
            let restore = if frame.disposal() == DisposalMethod::RestorePrevious {
                let rect = frame.rect().intersect(canvas.bounds());
                Some(SavedRegion {
                    rect,
                    pixels: canvas.crop(rect)?,
                })
            } else {
                None
            };

            let pixels = frame.pixels();
            canvas.blit(
                pixels,
                pixels.bounds(),
                u32::from(frame.left()),
                u32::from(frame.top()),
                true,
            );

            previous = Some((current, restore.clone()));
            self.insert(
                current,
                CacheEntry {
                    canvas: canvas.clone(),
                    restore,
                },
            );
        }
        Ok(())
    }

    fn insert(&mut self, index: usize, entry: CacheEntry) {
        self.produced.retain(|&i| i != index);
        self.produced.push_back(index);
        self.cache.insert(index, entry);
        if let Some(limit) = self.max_cached {
            while self.cache.len() > limit {
                self.evict_oldest(Some(index));
            }
        }
    }

    fn evict_oldest(&mut self, keep: Option<usize>) {
        while let Some(oldest) = self.produced.pop_front() {
            if Some(oldest) == keep {
                // The entry being produced right now must survive; re-queue it.
                self.produced.push_back(oldest);
                continue;
            }
            if self.cache.remove(&oldest).is_some() {
                trace!("evicted composited frame {oldest}");
                return;
            }
        }
    }
}

/// Applies `frame`'s disposal to the canvas it was drawn on, producing the base for the
/// next frame.
fn settle(canvas: &mut Raster, frame: &Frame, restore: Option<&SavedRegion>, background: Rgba) {
    match frame.disposal() {
        DisposalMethod::Unspecified | DisposalMethod::DoNotDispose => {}
        DisposalMethod::RestoreBackground => {
            canvas.fill_rect(frame.rect(), background);
        }
        DisposalMethod::RestorePrevious => {
            if let Some(saved) = restore {
                canvas.blit(&saved.pixels, saved.pixels.bounds(), saved.rect.x, saved.rect.y, false);
            }
        }
    }
}
