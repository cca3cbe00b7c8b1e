//! Wire-level vocabulary shared between the parser and the compositing engine.

use std::fmt;

/// GIF format version, taken from the last three bytes of the signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Version {
    /// The original 1987 specification.
    V87a,
    /// The 1989 revision which added extension blocks.
    V89a,
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Version::V87a => "87a",
            Version::V89a => "89a",
        })
    }
}

/// Known block introducers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Block {
    /// Image separator (0x2C).
    Image,
    /// Extension introducer (0x21).
    Extension,
    /// Trailer (0x3B).
    Trailer,
}

impl Block {
    pub(crate) fn from_u8(b: u8) -> Option<Block> {
        match b {
            0x2C => Some(Block::Image),
            0x21 => Some(Block::Extension),
            0x3B => Some(Block::Trailer),
            _ => None,
        }
    }
}

/// An extension label, known or not.
///
/// Unknown labels are carried as-is so their sub-blocks can be skipped without reflecting on
/// what they might contain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct AnyExtension(pub u8);

/// Known GIF extensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Extension {
    /// Plain text extension (0x01).
    Text,
    /// Graphic control extension (0xF9).
    Control,
    /// Comment extension (0xFE).
    Comment,
    /// Application extension (0xFF).
    Application,
}

impl AnyExtension {
    pub(crate) fn known(self) -> Option<Extension> {
        match self.0 {
            0x01 => Some(Extension::Text),
            0xF9 => Some(Extension::Control),
            0xFE => Some(Extension::Comment),
            0xFF => Some(Extension::Application),
            _ => None,
        }
    }
}

/// Method to prepare the canvas before the next frame is drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisposalMethod {
    /// The decoder is not required to take any action.
    #[default]
    Unspecified,
    /// Leave the frame in place; the next frame draws on top of it.
    DoNotDispose,
    /// Clear the frame's rectangle before the next frame is drawn.
    RestoreBackground,
    /// Restore the canvas content from before this frame was drawn.
    RestorePrevious,
}

impl DisposalMethod {
    /// Maps the three disposal bits of a graphic control extension.
    ///
    /// The reserved values 4 through 7 decode as `Unspecified`, matching how viewers treat
    /// them in the wild.
    pub(crate) fn from_bits(bits: u8) -> DisposalMethod {
        match bits {
            1 => DisposalMethod::DoNotDispose,
            2 => DisposalMethod::RestoreBackground,
            3 => DisposalMethod::RestorePrevious,
            _ => DisposalMethod::Unspecified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_dispatch() {
        assert_eq!(Block::from_u8(0x2C), Some(Block::Image));
        assert_eq!(Block::from_u8(0x21), Some(Block::Extension));
        assert_eq!(Block::from_u8(0x3B), Some(Block::Trailer));
        assert_eq!(Block::from_u8(0x00), None);
    }

    #[test]
    fn reserved_disposal_bits_are_unspecified() {
        for bits in 4..8 {
            assert_eq!(DisposalMethod::from_bits(bits), DisposalMethod::Unspecified);
        }
    }
}
