//! Decoding, compositing and playback of animated GIF images.
//!
//! GIF (Graphics Interchange Format) stores an animation as a sequence of LZW-compressed,
//! palette-indexed images, each with its own placement, delay and disposal method. This
//! crate parses the byte stream into an immutable [`Document`], composites the frame
//! sequence into full-canvas rasters with an interval cache ([`Compositor`]), and maps
//! wall-clock time to presented frames ([`Player`]).
//!
//! # Related Links
//! * <http://www.w3.org/Graphics/GIF/spec-gif89a.txt> - The GIF Specification
//!
//! # Examples
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use gifplay::{Document, Player};
//!
//! # fn main() -> gifplay::GifResult<()> {
//! let bytes = std::fs::read("foo.gif").expect("read file");
//! let document = Arc::new(Document::from_bytes(&bytes)?);
//!
//! // Drive playback; the surface always holds the current composited frame.
//! let mut player = Player::new(document)?;
//! let events = player.advance(Duration::from_millis(16))?;
//! let _frame = player.surface();
//! # let _ = events;
//! # Ok(())
//! # }
//! ```
//!
//! One [`Document`] may be shared read-only across any number of players; every player
//! owns its own compositing cache and clock.

mod animation;
mod background;
mod common;
mod composite;
mod decoder;
mod document;
mod error;
mod lzw;
mod raster;

pub use crate::animation::{Delay, PlaybackEvent, PlaybackState, Player};
pub use crate::background::DecodeTask;
pub use crate::common::{DisposalMethod, Version};
pub use crate::composite::Compositor;
pub use crate::decoder::GifDecoder;
pub use crate::document::{Document, Frame, Repeat};
pub use crate::error::{
    DecodeErrorKind, FormatErrorKind, GifError, GifResult, ResourceErrorKind,
};
pub use crate::raster::{Raster, Rect, Rgb, Rgba};
