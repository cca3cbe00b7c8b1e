//! The in-memory representation of a parsed GIF.
//!
//! A [`Document`] owns an ordered sequence of [`Frame`]s plus the document-level metadata
//! from the logical screen descriptor and the application extension. Both types are
//! immutable once parsing has finished; the compositing engine and any number of playback
//! clocks only ever read them, which is what makes sharing one document across many players
//! sound.

use std::io::{Cursor, Read};

use crate::animation::Delay;
use crate::common::{DisposalMethod, Version};
use crate::decoder::GifDecoder;
use crate::error::GifResult;
use crate::raster::{Raster, Rect, Rgb, Rgba};

/// Number of times an animation plays through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Repeat {
    /// Play this many complete passes, then stop on the last frame.
    Finite(u16),
    /// Loop forever.
    Infinite,
}

impl Repeat {
    /// Maps the NETSCAPE2.0 loop count: 0 means infinite, anything else is the number of
    /// passes. A document without the extension plays once.
    pub(crate) fn from_netscape(count: u16) -> Repeat {
        if count == 0 {
            Repeat::Infinite
        } else {
            Repeat::Finite(count)
        }
    }
}

/// One decoded image unit of the animation.
///
/// The pixel buffer is full RGBA: color indices are already resolved through the frame's
/// color table and the transparent index is mapped to fully transparent pixels.
#[derive(Clone, Debug)]
pub struct Frame {
    left: u16,
    top: u16,
    delay: Delay,
    disposal: DisposalMethod,
    transparent: Option<u8>,
    interlaced: bool,
    pixels: Raster,
}

impl Frame {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        left: u16,
        top: u16,
        delay: Delay,
        disposal: DisposalMethod,
        transparent: Option<u8>,
        interlaced: bool,
        pixels: Raster,
    ) -> Frame {
        Frame {
            left,
            top,
            delay,
            disposal,
            transparent,
            interlaced,
            pixels,
        }
    }

    /// x offset within the canvas.
    pub fn left(&self) -> u16 {
        self.left
    }

    /// y offset within the canvas.
    pub fn top(&self) -> u16 {
        self.top
    }

    /// Width of this frame's rectangle.
    pub fn width(&self) -> u16 {
        self.pixels.width() as u16
    }

    /// Height of this frame's rectangle.
    pub fn height(&self) -> u16 {
        self.pixels.height() as u16
    }

    /// Display duration of this frame as declared by the stream.
    ///
    /// A declared zero is stored untouched; the playback clock applies its minimum-delay
    /// policy, not the parser.
    pub fn delay(&self) -> Delay {
        self.delay
    }

    /// How to prepare the canvas before the next frame is drawn.
    pub fn disposal(&self) -> DisposalMethod {
        self.disposal
    }

    /// The transparent color index, if the graphic control extension declared one.
    pub fn transparent(&self) -> Option<u8> {
        self.transparent
    }

    /// Whether the image data was stored interlaced.
    pub fn interlaced(&self) -> bool {
        self.interlaced
    }

    /// The decoded RGBA pixels of this frame alone, not composited.
    pub fn pixels(&self) -> &Raster {
        &self.pixels
    }

    /// The frame's rectangle in canvas coordinates. May extend past the canvas; the
    /// compositing engine clips.
    pub fn rect(&self) -> Rect {
        Rect::new(
            u32::from(self.left),
            u32::from(self.top),
            self.pixels.width(),
            self.pixels.height(),
        )
    }
}

/// A fully parsed GIF, immutable after parse.
#[derive(Clone, Debug)]
pub struct Document {
    version: Version,
    width: u16,
    height: u16,
    background_index: Option<u8>,
    global_palette: Option<Vec<Rgb>>,
    repeat: Repeat,
    frames: Vec<Frame>,
}

impl Document {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        version: Version,
        width: u16,
        height: u16,
        background_index: Option<u8>,
        global_palette: Option<Vec<Rgb>>,
        repeat: Repeat,
        frames: Vec<Frame>,
    ) -> Document {
        Document {
            version,
            width,
            height,
            background_index,
            global_palette,
            repeat,
            frames,
        }
    }

    /// Parses a complete GIF byte buffer.
    pub fn from_bytes(bytes: &[u8]) -> GifResult<Document> {
        GifDecoder::new(Cursor::new(bytes)).read_document()
    }

    /// Parses a GIF from a reader holding the complete stream.
    pub fn from_reader<R: Read>(r: R) -> GifResult<Document> {
        GifDecoder::new(r).read_document()
    }

    /// Format version from the signature.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Canvas width from the logical screen descriptor.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Canvas height from the logical screen descriptor.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Background color index into the global color table.
    ///
    /// Only present when the stream declared a global color table.
    pub fn background_index(&self) -> Option<u8> {
        self.background_index
    }

    /// The global color table, if present.
    pub fn global_palette(&self) -> Option<&[Rgb]> {
        self.global_palette.as_deref()
    }

    /// The background color a `RestoreBackground` disposal clears to.
    ///
    /// Resolved through the global color table; fully transparent when the document has no
    /// global table or the index lies outside it.
    pub fn background_color(&self) -> Rgba {
        match (self.background_index, self.global_palette.as_deref()) {
            (Some(index), Some(palette)) => palette
                .get(usize::from(index))
                .map_or(Rgba::TRANSPARENT, |&rgb| Rgba::from(rgb)),
            _ => Rgba::TRANSPARENT,
        }
    }

    /// How many passes the animation plays.
    pub fn repeat(&self) -> Repeat {
        self.repeat
    }

    /// The ordered frame sequence. May be empty for a degenerate but well-formed file.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// The declared delay of every frame in order.
    pub fn delays(&self) -> impl Iterator<Item = Delay> + '_ {
        self.frames.iter().map(Frame::delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn netscape_loop_count_mapping() {
        assert_eq!(Repeat::from_netscape(0), Repeat::Infinite);
        assert_eq!(Repeat::from_netscape(2), Repeat::Finite(2));
    }
}
