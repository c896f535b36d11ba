//! # Downloaded Bit Image Commands
//!
//! The legacy printer takes images in two steps: `GS *` uploads a bitmap
//! into its single download slot, then `GS /` prints whatever the slot holds.
//!
//! ## Define Bitmap (GS * x y d1...dk)
//!
//! ```text
//! 1D 2A xx yy d1 d2 ... dk        k = xx * yy * 8
//! ```
//!
//! - `xx`: width in bytes (8 dots per byte)
//! - `yy`: height in slices (8 rows per slice)
//!
//! The device reads exactly `k` bytes after the header as image data. A
//! payload that is one byte short swallows the next command byte; one byte
//! long leaves a stray byte that is parsed as a command. Both corrupt every
//! command after it, which is why [`define_bitmap`] refuses to build a
//! mismatched command.
//!
//! ## Bit Packing
//!
//! How the `k` bytes map to dots is selected by
//! [`EncodingMode`](crate::render::encoder::EncodingMode); see
//! [`crate::render::encoder`].

use super::commands::GS;
use crate::error::{KabalaError, Result};
use serde::{Deserialize, Serialize};

/// Length of the `GS * xx yy` header in front of bitmap data.
pub const DEFINE_HEADER_LEN: usize = 4;

/// Opcode prefix of the define-bitmap command.
pub const DEFINE_BITMAP: [u8; 2] = [GS, b'*'];

/// Opcode prefix of the print-defined-bitmap command.
pub const PRINT_BITMAP: [u8; 2] = [GS, b'/'];

/// Payload length for a bitmap of `width_bytes × height_slices`.
#[inline]
pub const fn payload_len(width_bytes: u8, height_slices: u8) -> usize {
    width_bytes as usize * height_slices as usize * 8
}

/// # Define Bitmap (GS * xx yy d...)
///
/// ```
/// use kabala::protocol::graphics;
///
/// let data = vec![0u8; 44 * 10 * 8];
/// let cmd = graphics::define_bitmap(44, 10, &data).unwrap();
/// assert_eq!(&cmd[0..4], &[0x1D, 0x2A, 0x2C, 0x0A]);
/// assert_eq!(cmd.len(), 4 + 3520);
/// ```
pub fn define_bitmap(width_bytes: u8, height_slices: u8, data: &[u8]) -> Result<Vec<u8>> {
    let expected = payload_len(width_bytes, height_slices);
    if data.len() != expected {
        return Err(KabalaError::EncodingSizeMismatch {
            expected,
            actual: data.len(),
        });
    }

    let mut cmd = Vec::with_capacity(DEFINE_HEADER_LEN + data.len());
    cmd.extend_from_slice(&DEFINE_BITMAP);
    cmd.push(width_bytes);
    cmd.push(height_slices);
    cmd.extend_from_slice(data);
    Ok(cmd)
}

/// Scale mode for `GS /`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum BitmapScale {
    #[default]
    Normal = 0,
    DoubleWidth = 1,
    DoubleHeight = 2,
    Quadruple = 3,
}

/// # Print Defined Bitmap (GS / m)
///
/// Prints the most recently defined bitmap.
#[inline]
pub fn print_bitmap(scale: BitmapScale) -> Vec<u8> {
    vec![GS, b'/', scale as u8]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_header() {
        let data = vec![0xFF; 8];
        let cmd = define_bitmap(1, 1, &data).unwrap();
        assert_eq!(&cmd[0..4], &[0x1D, 0x2A, 0x01, 0x01]);
        assert_eq!(&cmd[4..], &data[..]);
    }

    #[test]
    fn test_define_rejects_short_payload() {
        let data = vec![0u8; 3519];
        let err = define_bitmap(44, 10, &data).unwrap_err();
        assert!(matches!(
            err,
            KabalaError::EncodingSizeMismatch {
                expected: 3520,
                actual: 3519
            }
        ));
    }

    #[test]
    fn test_define_rejects_long_payload() {
        let data = vec![0u8; 9];
        assert!(define_bitmap(1, 1, &data).is_err());
    }

    #[test]
    fn test_print_bitmap() {
        assert_eq!(print_bitmap(BitmapScale::Normal), vec![0x1D, 0x2F, 0x00]);
        assert_eq!(print_bitmap(BitmapScale::Quadruple), vec![0x1D, 0x2F, 0x03]);
    }

    #[test]
    fn test_payload_len() {
        assert_eq!(payload_len(44, 10), 3520);
        assert_eq!(payload_len(0, 10), 0);
    }
}
