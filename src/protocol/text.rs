//! # Text Styling Commands
//!
//! Alignment, emphasis and character size for the legacy printer.
//!
//! ```text
//! Left aligned (default)    |LEFT TEXT
//! Center aligned            |  CENTER TEXT
//! Right aligned             |      RIGHT TEXT
//! ```
//!
//! Alignment applies to the physical line. It has no bearing on the order
//! characters are sent in: right-to-left text still has to be reversed by
//! the caller (see [`crate::ir::bidi`]).

use super::commands::{ESC, GS};
use serde::{Deserialize, Serialize};

// ============================================================================
// TEXT ALIGNMENT
// ============================================================================

/// Text alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left = 0,
    Center = 1,
    Right = 2,
}

/// # Set Text Alignment (ESC a n)
///
/// | Format  | Bytes     |
/// |---------|-----------|
/// | ASCII   | ESC a n   |
/// | Hex     | 1B 61 n   |
///
/// - `n = 0`: left (default)
/// - `n = 1`: center
/// - `n = 2`: right
///
/// ```
/// use kabala::protocol::text::{align, Alignment};
///
/// assert_eq!(align(Alignment::Center), vec![0x1B, 0x61, 0x01]);
/// ```
pub fn align(alignment: Alignment) -> Vec<u8> {
    vec![ESC, b'a', alignment as u8]
}

// ============================================================================
// EMPHASIS
// ============================================================================

/// # Bold On/Off (ESC E n)
///
/// | Format  | Bytes     |
/// |---------|-----------|
/// | Hex     | 1B 45 n   |
///
/// Only the lowest bit of `n` is significant on the device.
pub fn bold(enabled: bool) -> Vec<u8> {
    vec![ESC, b'E', enabled as u8]
}

// ============================================================================
// CHARACTER SIZE
// ============================================================================

/// Character scale, 1×1 through 8×8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextScale {
    pub width: u8,
    pub height: u8,
}

impl Default for TextScale {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl TextScale {
    pub const NORMAL: Self = Self {
        width: 1,
        height: 1,
    };
    pub const DOUBLE: Self = Self {
        width: 2,
        height: 2,
    };

    /// Pack into the `GS !` parameter byte: width-1 in the high nibble,
    /// height-1 in the low nibble. Multipliers are clamped to 1..=8.
    pub fn to_byte(self) -> u8 {
        let w = self.width.clamp(1, 8) - 1;
        let h = self.height.clamp(1, 8) - 1;
        (w << 4) | h
    }
}

/// # Select Character Size (GS ! n)
///
/// | Format  | Bytes     |
/// |---------|-----------|
/// | Hex     | 1D 21 n   |
///
/// ```
/// use kabala::protocol::text::{size, TextScale};
///
/// assert_eq!(size(TextScale::DOUBLE), vec![0x1D, 0x21, 0x11]);
/// assert_eq!(size(TextScale { width: 1, height: 2 }), vec![0x1D, 0x21, 0x01]);
/// ```
pub fn size(scale: TextScale) -> Vec<u8> {
    vec![GS, b'!', scale.to_byte()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align() {
        assert_eq!(align(Alignment::Left), vec![0x1B, 0x61, 0x00]);
        assert_eq!(align(Alignment::Center), vec![0x1B, 0x61, 0x01]);
        assert_eq!(align(Alignment::Right), vec![0x1B, 0x61, 0x02]);
    }

    #[test]
    fn test_bold() {
        assert_eq!(bold(true), vec![0x1B, 0x45, 0x01]);
        assert_eq!(bold(false), vec![0x1B, 0x45, 0x00]);
    }

    #[test]
    fn test_size_nibbles() {
        assert_eq!(size(TextScale::NORMAL), vec![0x1D, 0x21, 0x00]);
        assert_eq!(
            size(TextScale {
                width: 3,
                height: 2
            }),
            vec![0x1D, 0x21, 0x21]
        );
        assert_eq!(
            size(TextScale {
                width: 8,
                height: 8
            }),
            vec![0x1D, 0x21, 0x77]
        );
    }

    #[test]
    fn test_size_clamps() {
        let scale = TextScale {
            width: 0,
            height: 12,
        };
        assert_eq!(scale.to_byte(), 0x07);
    }
}
