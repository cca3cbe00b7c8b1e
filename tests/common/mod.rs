#![allow(dead_code)] // each test binary uses a different subset of the helpers

//! Hand-rolled GIF streams for the integration tests.
//!
//! The builder emits a minimal but fully valid encoding: every pixel index is written as a
//! literal code with a clear code in front of it, so the dictionary never grows and the
//! code width stays at `min_code_size + 1` bits throughout. Wasteful, but trivially
//! correct, and any conforming decoder accepts it.

/// One image block plus its graphic control extension.
pub struct FrameSpec {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub indices: Vec<u8>,
    pub delay_cs: u16,
    pub disposal: u8,
    pub transparent: Option<u8>,
    pub interlaced: bool,
    pub local_palette: Option<Vec<[u8; 3]>>,
}

impl FrameSpec {
    pub fn new(left: u16, top: u16, width: u16, height: u16, indices: Vec<u8>) -> FrameSpec {
        assert_eq!(indices.len(), usize::from(width) * usize::from(height));
        FrameSpec {
            left,
            top,
            width,
            height,
            indices,
            delay_cs: 0,
            disposal: 0,
            transparent: None,
            interlaced: false,
            local_palette: None,
        }
    }

    pub fn delay_cs(mut self, centis: u16) -> FrameSpec {
        self.delay_cs = centis;
        self
    }

    pub fn disposal(mut self, method: u8) -> FrameSpec {
        self.disposal = method;
        self
    }

    pub fn transparent(mut self, index: u8) -> FrameSpec {
        self.transparent = Some(index);
        self
    }

    /// Marks the image as interlaced. `indices` must already be in file row order.
    pub fn interlaced(mut self) -> FrameSpec {
        self.interlaced = true;
        self
    }

    pub fn local_palette(mut self, colors: &[[u8; 3]]) -> FrameSpec {
        self.local_palette = Some(colors.to_vec());
        self
    }
}

/// Assembles a complete GIF89a byte stream.
pub struct GifBuilder {
    width: u16,
    height: u16,
    global_palette: Vec<[u8; 3]>,
    background_index: u8,
    loop_count: Option<u16>,
    comments: Vec<Vec<u8>>,
    frames: Vec<FrameSpec>,
}

impl GifBuilder {
    pub fn new(width: u16, height: u16) -> GifBuilder {
        GifBuilder {
            width,
            height,
            global_palette: Vec::new(),
            background_index: 0,
            loop_count: None,
            comments: Vec::new(),
            frames: Vec::new(),
        }
    }

    pub fn global_palette(mut self, colors: &[[u8; 3]]) -> GifBuilder {
        self.global_palette = colors.to_vec();
        self
    }

    pub fn background_index(mut self, index: u8) -> GifBuilder {
        self.background_index = index;
        self
    }

    /// Adds a NETSCAPE2.0 application extension with the given loop count.
    pub fn loop_count(mut self, count: u16) -> GifBuilder {
        self.loop_count = Some(count);
        self
    }

    /// Adds a comment extension before the first image; decoders must skip it.
    pub fn comment(mut self, text: &str) -> GifBuilder {
        self.comments.push(text.as_bytes().to_vec());
        self
    }

    pub fn frame(mut self, frame: FrameSpec) -> GifBuilder {
        self.frames.push(frame);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"GIF89a");
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        if self.global_palette.is_empty() {
            out.extend_from_slice(&[0x00, 0x00, 0x00]);
        } else {
            let (size_bits, padded) = palette_size_bits(self.global_palette.len());
            out.push(0x80 | size_bits);
            out.push(self.background_index);
            out.push(0x00);
            write_palette(&mut out, &self.global_palette, padded);
        }
        for text in &self.comments {
            out.extend_from_slice(&[0x21, 0xFE]);
            write_sub_blocks(&mut out, text);
        }
        if let Some(count) = self.loop_count {
            out.extend_from_slice(&[0x21, 0xFF, 0x0B]);
            out.extend_from_slice(b"NETSCAPE2.0");
            out.push(0x03);
            out.push(0x01);
            out.extend_from_slice(&count.to_le_bytes());
            out.push(0x00);
        }
        for frame in &self.frames {
            self.write_frame(&mut out, frame);
        }
        out.push(0x3B);
        out
    }

    fn write_frame(&self, out: &mut Vec<u8>, frame: &FrameSpec) {
        // Graphic control extension.
        out.extend_from_slice(&[0x21, 0xF9, 0x04]);
        let mut fields = (frame.disposal & 0x07) << 2;
        if frame.transparent.is_some() {
            fields |= 0x01;
        }
        out.push(fields);
        out.extend_from_slice(&frame.delay_cs.to_le_bytes());
        out.push(frame.transparent.unwrap_or(0));
        out.push(0x00);

        // Image descriptor.
        out.push(0x2C);
        out.extend_from_slice(&frame.left.to_le_bytes());
        out.extend_from_slice(&frame.top.to_le_bytes());
        out.extend_from_slice(&frame.width.to_le_bytes());
        out.extend_from_slice(&frame.height.to_le_bytes());
        let palette_len = frame
            .local_palette
            .as_ref()
            .map(Vec::len)
            .unwrap_or(self.global_palette.len());
        let mut fields = 0u8;
        if frame.interlaced {
            fields |= 0x40;
        }
        if let Some(local) = &frame.local_palette {
            let (size_bits, padded) = palette_size_bits(local.len());
            out.push(fields | 0x80 | size_bits);
            write_palette(out, local, padded);
        } else {
            out.push(fields);
        }

        let min_code_size = min_code_size_for(palette_len);
        out.push(min_code_size);
        let compressed = lzw_literal_encode(min_code_size, &frame.indices);
        write_sub_blocks(out, &compressed);
    }
}

/// `(size_bits, padded_len)` for a color table of `len` entries.
fn palette_size_bits(len: usize) -> (u8, usize) {
    let padded = len.next_power_of_two().max(2);
    ((padded.trailing_zeros() - 1) as u8, padded)
}

fn min_code_size_for(palette_len: usize) -> u8 {
    let padded = palette_len.next_power_of_two().max(2);
    (padded.trailing_zeros() as u8).max(2)
}

fn write_palette(out: &mut Vec<u8>, colors: &[[u8; 3]], padded: usize) {
    for color in colors {
        out.extend_from_slice(color);
    }
    for _ in colors.len()..padded {
        out.extend_from_slice(&[0, 0, 0]);
    }
}

fn write_sub_blocks(out: &mut Vec<u8>, data: &[u8]) {
    for chunk in data.chunks(255) {
        out.push(chunk.len() as u8);
        out.extend_from_slice(chunk);
    }
    out.push(0x00);
}

/// LSB-first bit packer for LZW codes.
struct BitWriter {
    out: Vec<u8>,
    buf: u32,
    bits: u8,
}

impl BitWriter {
    fn new() -> BitWriter {
        BitWriter {
            out: Vec::new(),
            buf: 0,
            bits: 0,
        }
    }

    fn write(&mut self, code: u16, width: u8) {
        self.buf |= u32::from(code) << self.bits;
        self.bits += width;
        while self.bits >= 8 {
            self.out.push(self.buf as u8);
            self.buf >>= 8;
            self.bits -= 8;
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.bits > 0 {
            self.out.push(self.buf as u8);
        }
        self.out
    }
}

/// Encodes every index as a literal, resetting the dictionary in front of each one so the
/// code width never changes.
fn lzw_literal_encode(min_code_size: u8, indices: &[u8]) -> Vec<u8> {
    let clear = 1u16 << min_code_size;
    let end = clear + 1;
    let width = min_code_size + 1;
    let mut w = BitWriter::new();
    for &index in indices {
        assert!(u16::from(index) < clear, "index does not fit the code size");
        w.write(clear, width);
        w.write(u16::from(index), width);
    }
    w.write(end, width);
    w.finish()
}

// Palette colors shared by the test files.
pub const RED: [u8; 3] = [0xFF, 0x00, 0x00];
pub const GREEN: [u8; 3] = [0x00, 0xFF, 0x00];
pub const BLUE: [u8; 3] = [0x00, 0x00, 0xFF];
pub const WHITE: [u8; 3] = [0xFF, 0xFF, 0xFF];

/// The fully opaque RGBA value of a palette color.
pub fn opaque(color: [u8; 3]) -> gifplay::Rgba {
    gifplay::Rgba([color[0], color[1], color[2], 0xFF])
}
