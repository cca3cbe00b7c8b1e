//! Decompression of the variable-width LZW scheme used for GIF image data.
//!
//! The decoder works on the already reassembled sub-block payload and produces the flat
//! index-per-pixel buffer for one image. The dictionary is kept as prefix/suffix tables
//! rather than owned sequences, so decoding allocates only the output and a small unwind
//! stack.

use crate::error::{DecodeErrorKind, GifError, GifResult};

/// Codes are at most 12 bits wide.
const MAX_CODE_SIZE: u8 = 12;
const TABLE_SIZE: usize = 1 << MAX_CODE_SIZE;

/// Reads bit groups from a byte slice, least significant bit first.
pub(crate) struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    buf: u32,
    bits: u8,
}

impl<'a> BitReader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> BitReader<'a> {
        BitReader {
            data,
            pos: 0,
            buf: 0,
            bits: 0,
        }
    }

    /// Returns the next `n` bits, or `None` once the data is exhausted.
    pub(crate) fn read_bits(&mut self, n: u8) -> Option<u16> {
        debug_assert!(n as usize <= 16);
        while self.bits < n {
            let byte = *self.data.get(self.pos)?;
            self.buf |= u32::from(byte) << self.bits;
            self.pos += 1;
            self.bits += 8;
        }
        let value = (self.buf & ((1 << n) - 1)) as u16;
        self.buf >>= n;
        self.bits -= n;
        Some(value)
    }
}

/// Decodes `data` into exactly `expected` color indices.
///
/// Decoding stops at the end-of-information code or once `expected` indices have been
/// produced, whichever comes first; trailing bytes are ignored. Running out of codes
/// before `expected` indices exist is a [`DecodeErrorKind::ShortPixelData`] error.
pub(crate) fn decode(data: &[u8], min_code_size: u8, expected: usize) -> GifResult<Vec<u8>> {
    debug_assert!(min_code_size <= 8);
    let clear_code = 1u16 << min_code_size;
    let end_code = clear_code + 1;

    let mut prefix = vec![0u16; TABLE_SIZE];
    let mut suffix = vec![0u8; TABLE_SIZE];
    let mut first = vec![0u8; TABLE_SIZE];
    for i in 0..clear_code {
        suffix[i as usize] = i as u8;
        first[i as usize] = i as u8;
    }

    let mut code_size = min_code_size + 1;
    let mut next_code = end_code + 1;
    let mut prev: Option<u16> = None;

    let mut reader = BitReader::new(data);
    let mut out = Vec::with_capacity(expected);
    let mut stack = Vec::with_capacity(TABLE_SIZE);

    while out.len() < expected {
        let code = reader
            .read_bits(code_size)
            .ok_or_else(|| GifError::decode(DecodeErrorKind::ShortPixelData))?;

        if code == clear_code {
            code_size = min_code_size + 1;
            next_code = end_code + 1;
            prev = None;
            continue;
        }
        if code == end_code {
            break;
        }

        // Unwind the sequence for this code onto the stack, newest symbol first. The KwKwK
        // case is the one code that may legally reference the entry about to be assigned.
        let mut cur = code;
        if code >= next_code {
            let p = match prev {
                Some(p) if code == next_code && next_code < TABLE_SIZE as u16 => p,
                _ => return Err(GifError::decode(DecodeErrorKind::InvalidCode)),
            };
            stack.push(first[p as usize]);
            cur = p;
        }
        while cur >= clear_code {
            stack.push(suffix[cur as usize]);
            cur = prefix[cur as usize];
        }
        stack.push(cur as u8);

        let first_symbol = *stack.last().expect("stack holds at least the literal");
        while let Some(symbol) = stack.pop() {
            out.push(symbol);
        }

        if let Some(p) = prev {
            if next_code < TABLE_SIZE as u16 {
                prefix[next_code as usize] = p;
                suffix[next_code as usize] = first_symbol;
                first[next_code as usize] = first[p as usize];
                next_code += 1;
                if next_code == 1 << code_size && code_size < MAX_CODE_SIZE {
                    code_size += 1;
                }
            }
        }
        prev = Some(code);
    }

    if out.len() < expected {
        return Err(GifError::decode(DecodeErrorKind::ShortPixelData));
    }
    out.truncate(expected);
    Ok(out)
}
