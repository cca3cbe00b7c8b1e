//! The top-level GIF grammar: signature, logical screen descriptor, color tables and the
//! block loop.
//!
//! The parser consumes the whole stream up to the trailer and hands back an immutable
//! [`Document`]; on any failure the error is the only thing returned. Graphic control
//! extensions are held until the next image block consumes them, the NETSCAPE2.0
//! application extension contributes the loop count, and every other extension is skipped
//! by consuming its length-prefixed sub-blocks.

use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, trace};

use crate::animation::Delay;
use crate::common::{AnyExtension, Block, DisposalMethod, Extension, Version};
use crate::document::{Document, Frame, Repeat};
use crate::error::{DecodeErrorKind, FormatErrorKind, GifError, GifResult};
use crate::lzw;
use crate::raster::{Raster, Rgb, Rgba};

/// Row scheduling of the four interlace passes: (first row, row step).
const INTERLACE_PASSES: [(u16, u16); 4] = [(0, 8), (4, 8), (2, 4), (1, 2)];

/// Metadata carried by a graphic control extension until an image block consumes it.
#[derive(Clone, Copy, Default)]
struct GraphicControl {
    delay_cs: u16,
    disposal: DisposalMethod,
    transparent: Option<u8>,
}

/// The GIF format parser.
pub struct GifDecoder<R> {
    r: R,
    width: u16,
    height: u16,
    background_index: Option<u8>,
    global_palette: Option<Vec<Rgb>>,
    repeat: Repeat,
    pending_control: Option<GraphicControl>,
    frames: Vec<Frame>,
}

impl<R: Read> GifDecoder<R> {
    /// Creates a decoder reading the complete stream from `r`.
    pub fn new(r: R) -> GifDecoder<R> {
        GifDecoder {
            r,
            width: 0,
            height: 0,
            background_index: None,
            global_palette: None,
            repeat: Repeat::Finite(1),
            pending_control: None,
            frames: Vec::new(),
        }
    }

    /// Parses the stream up to the trailer and returns the document.
    pub fn read_document(mut self) -> GifResult<Document> {
        let version = self.read_header()?;
        self.read_logical_screen_descriptor()?;
        loop {
            let introducer = self.r.read_u8()?;
            match Block::from_u8(introducer) {
                Some(Block::Image) => self.read_image()?,
                Some(Block::Extension) => self.read_extension()?,
                Some(Block::Trailer) => break,
                None => {
                    return Err(GifError::format(FormatErrorKind::UnknownIntroducer(
                        introducer,
                    )))
                }
            }
        }
        debug!(
            "decoded GIF{}: {}x{} canvas, {} frames, repeat {:?}",
            version,
            self.width,
            self.height,
            self.frames.len(),
            self.repeat
        );
        Ok(Document::from_parts(
            version,
            self.width,
            self.height,
            self.background_index,
            self.global_palette,
            self.repeat,
            self.frames,
        ))
    }

    fn read_header(&mut self) -> GifResult<Version> {
        let mut signature = [0u8; 6];
        self.r.read_exact(&mut signature)?;
        match &signature {
            b"GIF87a" => Ok(Version::V87a),
            b"GIF89a" => Ok(Version::V89a),
            _ => Err(GifError::format(FormatErrorKind::BadSignature)),
        }
    }

    fn read_logical_screen_descriptor(&mut self) -> GifResult<()> {
        self.width = self.r.read_u16::<LittleEndian>()?;
        self.height = self.r.read_u16::<LittleEndian>()?;
        let fields = self.r.read_u8()?;
        let background = self.r.read_u8()?;
        let _aspect_ratio = self.r.read_u8()?;

        if fields & 0x80 != 0 {
            let entries = 1usize << ((fields & 0x07) + 1);
            self.global_palette = Some(self.read_color_table(entries)?);
            // The background index is only meaningful relative to the global table.
            self.background_index = Some(background);
        }
        trace!(
            "logical screen {}x{}, global palette: {}",
            self.width,
            self.height,
            self.global_palette.as_ref().map_or(0, Vec::len)
        );
        Ok(())
    }

    fn read_color_table(&mut self, entries: usize) -> GifResult<Vec<Rgb>> {
        let mut buf = vec![0u8; entries * 3];
        self.r.read_exact(&mut buf)?;
        Ok(buf
            .chunks_exact(3)
            .map(|rgb| Rgb([rgb[0], rgb[1], rgb[2]]))
            .collect())
    }

    /// One length-prefixed sub-block; empty for the terminator.
    fn read_block(&mut self) -> GifResult<Vec<u8>> {
        let len = self.r.read_u8()?;
        let mut buf = vec![0u8; usize::from(len)];
        self.r.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Concatenates sub-blocks until the zero-length terminator.
    fn read_sub_blocks(&mut self) -> GifResult<Vec<u8>> {
        let mut data = Vec::new();
        loop {
            let block = self.read_block()?;
            if block.is_empty() {
                return Ok(data);
            }
            data.extend_from_slice(&block);
        }
    }

    fn skip_sub_blocks(&mut self) -> GifResult<()> {
        loop {
            if self.read_block()?.is_empty() {
                return Ok(());
            }
        }
    }

    fn read_image(&mut self) -> GifResult<()> {
        let left = self.r.read_u16::<LittleEndian>()?;
        let top = self.r.read_u16::<LittleEndian>()?;
        let width = self.r.read_u16::<LittleEndian>()?;
        let height = self.r.read_u16::<LittleEndian>()?;
        let fields = self.r.read_u8()?;
        let interlaced = fields & 0x40 != 0;

        let local_palette = if fields & 0x80 != 0 {
            let entries = 1usize << ((fields & 0x07) + 1);
            Some(self.read_color_table(entries)?)
        } else {
            None
        };

        let min_code_size = self.r.read_u8()?;
        if min_code_size > 8 {
            return Err(GifError::format(FormatErrorKind::InvalidMinCodeSize(
                min_code_size,
            )));
        }

        let data = self.read_sub_blocks()?;
        let control = self.pending_control.take().unwrap_or_default();
        let pixel_count = usize::from(width) * usize::from(height);
        let pixels = {
            // The color table must be known before the pixel indices are decoded.
            let palette = local_palette
                .as_deref()
                .or(self.global_palette.as_deref())
                .ok_or_else(|| GifError::decode(DecodeErrorKind::MissingColorTable))?;
            let indices = lzw::decode(&data, min_code_size, pixel_count)?;
            expand_frame(
                &indices,
                palette,
                control.transparent,
                width,
                height,
                interlaced,
            )?
        };

        trace!(
            "frame {} at ({left}, {top}), {width}x{height}, disposal {:?}",
            self.frames.len(),
            control.disposal
        );
        self.frames.push(Frame::from_parts(
            left,
            top,
            Delay::from_centis(control.delay_cs),
            control.disposal,
            control.transparent,
            interlaced,
            pixels,
        ));
        Ok(())
    }

    fn read_extension(&mut self) -> GifResult<()> {
        let label = AnyExtension(self.r.read_u8()?);
        match label.known() {
            Some(Extension::Control) => self.read_graphic_control(),
            Some(Extension::Application) => self.read_application_extension(),
            Some(Extension::Comment) | Some(Extension::Text) | None => {
                trace!("skipping extension 0x{:02X}", label.0);
                self.skip_sub_blocks()
            }
        }
    }

    fn read_graphic_control(&mut self) -> GifResult<()> {
        let data = self.read_sub_blocks()?;
        if data.len() != 4 {
            return Err(GifError::format(FormatErrorKind::MalformedGraphicControl));
        }
        let fields = data[0];
        let delay_cs = u16::from_le_bytes([data[1], data[2]]);
        let transparent = (fields & 0x01 != 0).then_some(data[3]);
        // Held until the next image block consumes it; a later control extension before
        // that image overrides this one.
        self.pending_control = Some(GraphicControl {
            delay_cs,
            disposal: DisposalMethod::from_bits((fields & 0x1C) >> 2),
            transparent,
        });
        Ok(())
    }

    fn read_application_extension(&mut self) -> GifResult<()> {
        let ident = self.read_block()?;
        if ident == b"NETSCAPE2.0" {
            loop {
                let sub = self.read_block()?;
                if sub.is_empty() {
                    return Ok(());
                }
                if sub.len() == 3 && sub[0] == 1 {
                    let count = u16::from_le_bytes([sub[1], sub[2]]);
                    self.repeat = Repeat::from_netscape(count);
                    debug!("netscape loop count {count}");
                }
            }
        }
        if ident.is_empty() {
            return Ok(());
        }
        self.skip_sub_blocks()
    }
}

/// Resolves decoded indices into an RGBA raster, honoring transparency and interlacing.
fn expand_frame(
    indices: &[u8],
    palette: &[Rgb],
    transparent: Option<u8>,
    width: u16,
    height: u16,
    interlaced: bool,
) -> GifResult<Raster> {
    let mut raster = Raster::new(u32::from(width), u32::from(height))?;
    let rows = row_order(height, interlaced);
    for (src_row, dest_row) in rows.into_iter().enumerate() {
        for x in 0..usize::from(width) {
            let index = indices[src_row * usize::from(width) + x];
            let pixel = if transparent == Some(index) {
                Rgba::TRANSPARENT
            } else {
                let rgb = palette
                    .get(usize::from(index))
                    .ok_or_else(|| GifError::decode(DecodeErrorKind::IndexOutOfRange(index)))?;
                Rgba::from(*rgb)
            };
            raster.put_pixel(x as u32, u32::from(dest_row), pixel);
        }
    }
    Ok(raster)
}

/// Canvas row receiving the n-th decoded row. A pure write-order transform; the LZW data
/// itself is unaffected by interlacing.
fn row_order(height: u16, interlaced: bool) -> Vec<u16> {
    if !interlaced {
        return (0..height).collect();
    }
    INTERLACE_PASSES
        .iter()
        .flat_map(|&(first, step)| (first..height).step_by(usize::from(step)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interlace_row_schedule() {
        assert_eq!(
            row_order(10, true),
            vec![0, 8, 4, 2, 6, 1, 3, 5, 7, 9]
        );
        assert_eq!(row_order(4, false), vec![0, 1, 2, 3]);
    }

    #[test]
    fn interlace_schedule_is_a_permutation() {
        let mut rows = row_order(37, true);
        rows.sort_unstable();
        assert_eq!(rows, (0..37).collect::<Vec<_>>());
    }
}
