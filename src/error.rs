//! Contains detailed error representation.
//!
//! See the main [`GifError`] which contains a variant for each specialized error type. The
//! subtypes used in each variant can be roughly inspected through their respective `kind`
//! fields, which work similar to `std::io::Error::kind`.

use std::fmt;
use std::io;

use snafu::Snafu;

/// The generic error type for GIF operations.
///
/// This high level enum allows, by variant matching, a rough separation of concerns between
/// the byte stream, the compressed image data, and the environment. A failed parse never
/// exposes a partially constructed [`Document`](crate::Document); the error is the only
/// result.
#[derive(Snafu, Debug)]
pub enum GifError {
    /// The byte stream violated the GIF grammar.
    ///
    /// The signature was wrong, a block or sub-block declared a length that runs past the end
    /// of the buffer, or a block introducer was not one of image, extension or trailer.
    #[snafu(display("format error: {kind}"))]
    Format {
        /// What was wrong with the stream.
        kind: FormatErrorKind,
    },

    /// The compressed image data could not be decoded.
    ///
    /// The LZW stream was inconsistent, or an image referenced a color table that does not
    /// exist.
    #[snafu(display("decode error: {kind}"))]
    Decode {
        /// What was wrong with the image data.
        kind: DecodeErrorKind,
    },

    /// Completing the operation would have required more resources than available.
    #[snafu(display("resource error: {kind}"))]
    Resource {
        /// Which resource was exhausted or lost.
        kind: ResourceErrorKind,
    },

    /// An error occurred while reading from the underlying stream.
    #[snafu(display("io error: {source}"))]
    Io {
        /// The underlying error.
        source: io::Error,
    },
}

/// Details how the byte stream violated the format.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormatErrorKind {
    /// The first six bytes were not `GIF87a` or `GIF89a`.
    BadSignature,
    /// The stream ended inside a block or declared length.
    UnexpectedEof,
    /// A block introducer byte was not image (0x2C), extension (0x21) or trailer (0x3B).
    UnknownIntroducer(u8),
    /// A graphic control extension did not carry exactly four data bytes.
    MalformedGraphicControl,
    /// The minimum LZW code size exceeds the eight bits an index can occupy.
    InvalidMinCodeSize(u8),
}

/// Details how the image data was inconsistent.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeErrorKind {
    /// An LZW code referenced a dictionary entry that was never assigned.
    InvalidCode,
    /// The LZW stream ended before the declared pixel count was produced.
    ShortPixelData,
    /// An image block has neither a local nor a global color table.
    MissingColorTable,
    /// A pixel index lies outside the color table that applies to its frame.
    IndexOutOfRange(u8),
}

/// Details which resource was exhausted.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResourceErrorKind {
    /// A surface allocation would overflow the address space.
    AllocationTooLarge(u64),
    /// The background decode worker went away without delivering a result.
    WorkerLost,
    /// The background decode worker could not be started.
    WorkerSpawn,
}

impl fmt::Display for FormatErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatErrorKind::BadSignature => f.write_str("GIF signature not found"),
            FormatErrorKind::UnexpectedEof => f.write_str("unexpected end of stream"),
            FormatErrorKind::UnknownIntroducer(b) => {
                write!(f, "unknown block introducer 0x{b:02X}")
            }
            FormatErrorKind::MalformedGraphicControl => {
                f.write_str("graphic control extension has wrong length")
            }
            FormatErrorKind::InvalidMinCodeSize(n) => {
                write!(f, "invalid minimum code size {n}")
            }
        }
    }
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeErrorKind::InvalidCode => f.write_str("invalid code in LZW stream"),
            DecodeErrorKind::ShortPixelData => {
                f.write_str("image data ended before all pixels were decoded")
            }
            DecodeErrorKind::MissingColorTable => f.write_str("no color table for image"),
            DecodeErrorKind::IndexOutOfRange(idx) => {
                write!(f, "color index {idx} outside of color table")
            }
        }
    }
}

impl fmt::Display for ResourceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceErrorKind::AllocationTooLarge(bytes) => {
                write!(f, "allocation of {bytes} bytes is too large")
            }
            ResourceErrorKind::WorkerLost => f.write_str("decode worker lost"),
            ResourceErrorKind::WorkerSpawn => f.write_str("decode worker could not be spawned"),
        }
    }
}

impl GifError {
    pub(crate) fn format(kind: FormatErrorKind) -> GifError {
        GifError::Format { kind }
    }

    pub(crate) fn decode(kind: DecodeErrorKind) -> GifError {
        GifError::Decode { kind }
    }

    pub(crate) fn resource(kind: ResourceErrorKind) -> GifError {
        GifError::Resource { kind }
    }
}

impl From<io::Error> for GifError {
    fn from(err: io::Error) -> GifError {
        // The input is a preloaded buffer, so running off its end is a framing problem of
        // the stream rather than an environment failure.
        if err.kind() == io::ErrorKind::UnexpectedEof {
            GifError::format(FormatErrorKind::UnexpectedEof)
        } else {
            GifError::Io { source: err }
        }
    }
}

/// Result of a GIF decoding, compositing or playback operation.
pub type GifResult<T> = Result<T, GifError>;
