//! # Bitmap Encoder
//!
//! Packs a [`MonochromeCanvas`] into the byte stream that follows a
//! `GS * xx yy` header.
//!
//! ## Candidate Layouts
//!
//! The byte layout the device expects was never pinned down with certainty,
//! so every layout that was tried against the hardware is a variant of
//! [`EncodingMode`]. Each variant is pure data: a [`Traversal`] saying which
//! dots go into which byte and in what order, and a [`BitOrder`] saying which
//! bit the first of those dots lands in. One packing loop serves them all.
//!
//! ```text
//! Row          byte = 8 horizontal dots of one row
//!              rows top→bottom, bytes left→right
//!
//! Column       byte = 8 vertical dots of one column within a slice
//!              byte-columns left→right, slices top→bottom,
//!              8 dot columns per byte-column
//!
//! Interleaved  like Row, but all even rows first, then all odd rows
//!              (or odd first)
//!
//! MSB: first dot → 0x80        LSB: first dot → 0x01
//! ```
//!
//! ## Length
//!
//! Every mode emits `width_bytes * height_slices * 8` bytes, where
//! `height_slices = ceil(height / 8)`. Canvases whose height is not a
//! multiple of 8 are padded with white rows to the next full slice, so the
//! number always matches the `yy` parameter of the define command.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::canvas::MonochromeCanvas;
use crate::error::{KabalaError, Result};
use crate::protocol::graphics;

/// Which dots are gathered into each byte, and in which order bytes are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    Row,
    Column,
    Interleaved { odd_first: bool },
}

/// Where the first dot of a byte goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOrder {
    Msb,
    Lsb,
}

impl BitOrder {
    /// Bit mask for the `i`-th dot (0..8) of a byte.
    #[inline]
    pub const fn mask(self, i: usize) -> u8 {
        match self {
            Self::Msb => 0x80 >> i,
            Self::Lsb => 0x01 << i,
        }
    }
}

/// CLI-level ordering choice; combined with an LSB flag into an [`EncodingMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordering {
    Row,
    Column,
    Slice,
    SliceOdd,
}

/// Candidate bit/byte layouts for bitmap data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncodingMode {
    #[default]
    RowMajorMsb,
    RowMajorLsb,
    ColumnMajorMsb,
    ColumnMajorLsb,
    SliceInterleavedEvenFirst,
    SliceInterleavedOddFirst,
}

impl EncodingMode {
    /// Every candidate, in a stable order.
    pub const ALL: [Self; 6] = [
        Self::RowMajorMsb,
        Self::RowMajorLsb,
        Self::ColumnMajorMsb,
        Self::ColumnMajorLsb,
        Self::SliceInterleavedEvenFirst,
        Self::SliceInterleavedOddFirst,
    ];

    pub const fn traversal(self) -> Traversal {
        match self {
            Self::RowMajorMsb | Self::RowMajorLsb => Traversal::Row,
            Self::ColumnMajorMsb | Self::ColumnMajorLsb => Traversal::Column,
            Self::SliceInterleavedEvenFirst => Traversal::Interleaved { odd_first: false },
            Self::SliceInterleavedOddFirst => Traversal::Interleaved { odd_first: true },
        }
    }

    pub const fn bit_order(self) -> BitOrder {
        match self {
            Self::RowMajorLsb | Self::ColumnMajorLsb => BitOrder::Lsb,
            _ => BitOrder::Msb,
        }
    }

    /// Combine an ordering and an LSB flag. Interleaved layouts only exist
    /// MSB-first.
    pub fn from_ordering(ordering: Ordering, lsb: bool) -> Result<Self> {
        match (ordering, lsb) {
            (Ordering::Row, false) => Ok(Self::RowMajorMsb),
            (Ordering::Row, true) => Ok(Self::RowMajorLsb),
            (Ordering::Column, false) => Ok(Self::ColumnMajorMsb),
            (Ordering::Column, true) => Ok(Self::ColumnMajorLsb),
            (Ordering::Slice, false) => Ok(Self::SliceInterleavedEvenFirst),
            (Ordering::SliceOdd, false) => Ok(Self::SliceInterleavedOddFirst),
            (Ordering::Slice | Ordering::SliceOdd, true) => Err(KabalaError::InvalidCommand(
                "Interleaved slice ordering is MSB-only; drop --lsb".to_string(),
            )),
        }
    }

    /// The ordering this mode was built from.
    pub const fn ordering(self) -> Ordering {
        match self {
            Self::RowMajorMsb | Self::RowMajorLsb => Ordering::Row,
            Self::ColumnMajorMsb | Self::ColumnMajorLsb => Ordering::Column,
            Self::SliceInterleavedEvenFirst => Ordering::Slice,
            Self::SliceInterleavedOddFirst => Ordering::SliceOdd,
        }
    }

    /// Same traversal, least significant bit first.
    pub fn with_lsb(self) -> Result<Self> {
        Self::from_ordering(self.ordering(), true)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::RowMajorMsb => "row-major-msb",
            Self::RowMajorLsb => "row-major-lsb",
            Self::ColumnMajorMsb => "column-major-msb",
            Self::ColumnMajorLsb => "column-major-lsb",
            Self::SliceInterleavedEvenFirst => "slice-interleaved-even-first",
            Self::SliceInterleavedOddFirst => "slice-interleaved-odd-first",
        }
    }
}

impl fmt::Display for EncodingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EncodingMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| format!("Unknown encoding mode '{}'", s))
    }
}

// ============================================================================
// BYTE CELLS
// ============================================================================

/// Direction the 8 dots of one byte run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
}

/// One output byte: 8 dots starting at `(x, y)` along `axis`.
#[derive(Debug, Clone, Copy)]
struct Cell {
    x: usize,
    y: usize,
    axis: Axis,
}

impl Cell {
    #[inline]
    fn dot(self, i: usize) -> (usize, usize) {
        match self.axis {
            Axis::Horizontal => (self.x + i, self.y),
            Axis::Vertical => (self.x, self.y + i),
        }
    }
}

/// Output byte order for a `width_bytes × height_slices` bitmap.
fn cells(traversal: Traversal, width_bytes: usize, height_slices: usize) -> Vec<Cell> {
    let rows = height_slices * 8;
    let mut out = Vec::with_capacity(width_bytes * rows);
    let row_cells = |y: usize, out: &mut Vec<Cell>| {
        for bx in 0..width_bytes {
            out.push(Cell {
                x: bx * 8,
                y,
                axis: Axis::Horizontal,
            });
        }
    };

    match traversal {
        Traversal::Row => {
            for y in 0..rows {
                row_cells(y, &mut out);
            }
        }
        Traversal::Column => {
            for bx in 0..width_bytes {
                for slice in 0..height_slices {
                    for dx in 0..8 {
                        out.push(Cell {
                            x: bx * 8 + dx,
                            y: slice * 8,
                            axis: Axis::Vertical,
                        });
                    }
                }
            }
        }
        Traversal::Interleaved { odd_first } => {
            let parities = if odd_first { [1, 0] } else { [0, 1] };
            for parity in parities {
                for y in (parity..rows).step_by(2) {
                    row_cells(y, &mut out);
                }
            }
        }
    }
    out
}

// ============================================================================
// ENCODE / DECODE
// ============================================================================

/// Expected encoded length for a canvas: `width_bytes * height_slices * 8`.
#[inline]
pub fn expected_len(canvas: &MonochromeCanvas) -> usize {
    canvas.width_bytes() * canvas.height_slices() * 8
}

/// Encode a canvas under `mode`. Pure and deterministic.
///
/// ```
/// use kabala::render::canvas::MonochromeCanvas;
/// use kabala::render::encoder::{encode, EncodingMode};
///
/// let canvas = MonochromeCanvas::from_fn(8, 8, |x, y| y == 0 && x == 0);
/// assert_eq!(encode(&canvas, EncodingMode::RowMajorMsb)[0], 0x80);
/// assert_eq!(encode(&canvas, EncodingMode::RowMajorLsb)[0], 0x01);
/// ```
pub fn encode(canvas: &MonochromeCanvas, mode: EncodingMode) -> Vec<u8> {
    let order = mode.bit_order();
    let data: Vec<u8> = cells(
        mode.traversal(),
        canvas.width_bytes(),
        canvas.height_slices(),
    )
    .into_iter()
    .map(|cell| {
        (0..8).fold(0u8, |byte, i| {
            let (x, y) = cell.dot(i);
            if canvas.get(x, y) {
                byte | order.mask(i)
            } else {
                byte
            }
        })
    })
    .collect();

    trace!(mode = %mode, len = data.len(), "encoded bitmap");
    data
}

/// Inverse of [`encode`]: unpack `data` into a `width × height` canvas.
///
/// Used to render captured payloads back into pixels and for PNG previews.
/// Dots in padding (beyond `width`/`height`) are dropped.
pub fn decode(
    data: &[u8],
    width: usize,
    height: usize,
    mode: EncodingMode,
) -> Result<MonochromeCanvas> {
    let width_bytes = width.div_ceil(8);
    let height_slices = height.div_ceil(8);
    let expected = width_bytes * height_slices * 8;
    if data.len() != expected {
        return Err(KabalaError::EncodingSizeMismatch {
            expected,
            actual: data.len(),
        });
    }

    let order = mode.bit_order();
    let mut pixels = vec![false; width * height];
    for (cell, &byte) in cells(mode.traversal(), width_bytes, height_slices)
        .into_iter()
        .zip(data)
    {
        for i in 0..8 {
            let (x, y) = cell.dot(i);
            if x < width && y < height && byte & order.mask(i) != 0 {
                pixels[y * width + x] = true;
            }
        }
    }

    MonochromeCanvas::from_pixels(width, height, pixels).ok_or(
        KabalaError::EncodingSizeMismatch {
            expected: width * height,
            actual: 0,
        },
    )
}

// ============================================================================
// RASTER BLOCK
// ============================================================================

/// An encoded bitmap ready to follow a `GS * xx yy` header.
///
/// Invariant: `data.len() == width_bytes * height_slices * 8`. Both
/// constructors check it, so a block that exists is safe to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterBlock {
    width_bytes: u8,
    height_slices: u8,
    mode: EncodingMode,
    data: Vec<u8>,
}

impl RasterBlock {
    /// Wrap already-encoded data (for example from the asset cache).
    pub fn new(width_bytes: u8, height_slices: u8, mode: EncodingMode, data: Vec<u8>) -> Result<Self> {
        let expected = graphics::payload_len(width_bytes, height_slices);
        if data.len() != expected {
            return Err(KabalaError::EncodingSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width_bytes,
            height_slices,
            mode,
            data,
        })
    }

    /// Encode a canvas and check the result against the define-command formula.
    pub fn from_canvas(canvas: &MonochromeCanvas, mode: EncodingMode) -> Result<Self> {
        let (width_bytes, height_slices) = block_dimensions(canvas)?;
        Self::new(width_bytes, height_slices, mode, encode(canvas, mode))
    }

    #[inline]
    pub fn width_bytes(&self) -> u8 {
        self.width_bytes
    }

    #[inline]
    pub fn height_slices(&self) -> u8 {
        self.height_slices
    }

    #[inline]
    pub fn mode(&self) -> EncodingMode {
        self.mode
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn expected_len(&self) -> usize {
        graphics::payload_len(self.width_bytes, self.height_slices)
    }

    /// Re-check the length invariant.
    pub fn validate(&self) -> Result<()> {
        if self.data.len() == self.expected_len() {
            Ok(())
        } else {
            Err(KabalaError::EncodingSizeMismatch {
                expected: self.expected_len(),
                actual: self.data.len(),
            })
        }
    }

    /// `GS * xx yy` followed by the data.
    pub fn to_command(&self) -> Result<Vec<u8>> {
        graphics::define_bitmap(self.width_bytes, self.height_slices, &self.data)
    }
}

/// `(width_bytes, height_slices)` as the single-byte parameters of `GS *`.
pub fn block_dimensions(canvas: &MonochromeCanvas) -> Result<(u8, u8)> {
    dimensions_for(canvas.width(), canvas.height())
}

/// Same as [`block_dimensions`] for a canvas of `width × height` dots that
/// has not been built yet.
pub fn dimensions_for(width: usize, height: usize) -> Result<(u8, u8)> {
    let width_bytes = u8::try_from(width.div_ceil(8)).map_err(|_| {
        KabalaError::InvalidCommand(format!(
            "Bitmap too wide: {} bytes (max 255)",
            width.div_ceil(8)
        ))
    })?;
    let height_slices = u8::try_from(height.div_ceil(8)).map_err(|_| {
        KabalaError::InvalidCommand(format!(
            "Bitmap too tall: {} slices (max 255)",
            height.div_ceil(8)
        ))
    })?;
    Ok((width_bytes, height_slices))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 8x8 canvas with the left half of row 1 black. Every mode encodes it
    /// differently.
    fn calibration_image() -> MonochromeCanvas {
        MonochromeCanvas::from_fn(8, 8, |x, y| y == 1 && x < 4)
    }

    #[test]
    fn test_length_formula_all_modes() {
        let canvas = MonochromeCanvas::test_pattern(352, 80);
        for mode in EncodingMode::ALL {
            assert_eq!(encode(&canvas, mode).len(), 44 * 10 * 8, "{}", mode);
        }
    }

    #[test]
    fn test_partial_slice_is_padded() {
        let canvas = MonochromeCanvas::filled(10, 9, true);
        for mode in EncodingMode::ALL {
            assert_eq!(encode(&canvas, mode).len(), 2 * 2 * 8, "{}", mode);
        }
    }

    #[test]
    fn test_all_white_is_zero() {
        let canvas = MonochromeCanvas::new(352, 80);
        for mode in EncodingMode::ALL {
            assert!(encode(&canvas, mode).iter().all(|&b| b == 0), "{}", mode);
        }
    }

    #[test]
    fn test_all_black_is_ff() {
        let canvas = MonochromeCanvas::filled(64, 16, true);
        for mode in EncodingMode::ALL {
            assert!(encode(&canvas, mode).iter().all(|&b| b == 0xFF), "{}", mode);
        }
    }

    #[test]
    fn test_calibration_image_row_major() {
        let data = encode(&calibration_image(), EncodingMode::RowMajorMsb);
        assert_eq!(data, vec![0x00, 0xF0, 0, 0, 0, 0, 0, 0]);
        let data = encode(&calibration_image(), EncodingMode::RowMajorLsb);
        assert_eq!(data, vec![0x00, 0x0F, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_calibration_image_column_major() {
        let data = encode(&calibration_image(), EncodingMode::ColumnMajorMsb);
        assert_eq!(data, vec![0x40, 0x40, 0x40, 0x40, 0, 0, 0, 0]);
        let data = encode(&calibration_image(), EncodingMode::ColumnMajorLsb);
        assert_eq!(data, vec![0x02, 0x02, 0x02, 0x02, 0, 0, 0, 0]);
    }

    #[test]
    fn test_calibration_image_interleaved() {
        // even rows 0,2,4,6 then odd rows 1,3,5,7
        let data = encode(&calibration_image(), EncodingMode::SliceInterleavedEvenFirst);
        assert_eq!(data, vec![0, 0, 0, 0, 0xF0, 0, 0, 0]);
        let data = encode(&calibration_image(), EncodingMode::SliceInterleavedOddFirst);
        assert_eq!(data, vec![0xF0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_ordering_round_trip() {
        for mode in EncodingMode::ALL {
            let lsb = mode.bit_order() == BitOrder::Lsb;
            assert_eq!(EncodingMode::from_ordering(mode.ordering(), lsb).unwrap(), mode);
        }
    }

    #[test]
    fn test_with_lsb_keeps_traversal() {
        assert_eq!(
            EncodingMode::ColumnMajorMsb.with_lsb().unwrap(),
            EncodingMode::ColumnMajorLsb
        );
        assert_eq!(EncodingMode::RowMajorMsb.with_lsb().unwrap(), EncodingMode::RowMajorLsb);
        assert_eq!(EncodingMode::RowMajorLsb.with_lsb().unwrap(), EncodingMode::RowMajorLsb);
        assert!(EncodingMode::SliceInterleavedOddFirst.with_lsb().is_err());
    }

    #[test]
    fn test_modes_are_distinguishable() {
        let encodings: Vec<Vec<u8>> = EncodingMode::ALL
            .iter()
            .map(|&m| encode(&calibration_image(), m))
            .collect();
        for i in 0..encodings.len() {
            for j in (i + 1)..encodings.len() {
                assert_ne!(encodings[i], encodings[j]);
            }
        }
    }

    #[test]
    fn test_column_major_byte_order() {
        // 16x16: one dot at (9, 8) -> byte-column 1, slice 1, dot column 1
        let canvas = MonochromeCanvas::from_fn(16, 16, |x, y| x == 9 && y == 8);
        let data = encode(&canvas, EncodingMode::ColumnMajorMsb);
        // index = bx * (slices * 8) + slice * 8 + dx = 1*16 + 8 + 1
        assert_eq!(data[25], 0x80);
        assert_eq!(data.iter().filter(|&&b| b != 0).count(), 1);
    }

    #[test]
    fn test_single_black_row_scenario() {
        let canvas = MonochromeCanvas::from_fn(352, 80, |_, y| y == 17);
        let block = RasterBlock::from_canvas(&canvas, EncodingMode::RowMajorMsb).unwrap();
        assert_eq!(block.width_bytes(), 44);
        assert_eq!(block.height_slices(), 10);
        assert_eq!(block.data().len(), 3520);
        assert_eq!(block.data().iter().filter(|&&b| b != 0).count(), 44);
        assert!(block.data()[17 * 44..18 * 44].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_decode_inverts_encode() {
        let canvas = MonochromeCanvas::test_pattern(37, 21);
        for mode in EncodingMode::ALL {
            let data = encode(&canvas, mode);
            assert_eq!(decode(&data, 37, 21, mode).unwrap(), canvas, "{}", mode);
        }
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        assert!(decode(&[0u8; 7], 8, 8, EncodingMode::RowMajorMsb).is_err());
    }

    #[test]
    fn test_block_rejects_mismatch() {
        let err = RasterBlock::new(44, 10, EncodingMode::RowMajorMsb, vec![0; 3521]).unwrap_err();
        assert!(matches!(
            err,
            KabalaError::EncodingSizeMismatch {
                expected: 3520,
                actual: 3521
            }
        ));
    }

    #[test]
    fn test_block_too_wide() {
        let canvas = MonochromeCanvas::new(8 * 256, 8);
        assert!(matches!(
            RasterBlock::from_canvas(&canvas, EncodingMode::RowMajorMsb),
            Err(KabalaError::InvalidCommand(_))
        ));
    }

    #[test]
    fn test_block_command_header() {
        let canvas = MonochromeCanvas::new(352, 80);
        let block = RasterBlock::from_canvas(&canvas, EncodingMode::ColumnMajorMsb).unwrap();
        let cmd = block.to_command().unwrap();
        assert_eq!(&cmd[..4], &[0x1D, 0x2A, 0x2C, 0x0A]);
        assert_eq!(cmd.len(), 4 + 3520);
    }

    #[test]
    fn test_from_ordering() {
        assert_eq!(
            EncodingMode::from_ordering(Ordering::Column, true).unwrap(),
            EncodingMode::ColumnMajorLsb
        );
        assert_eq!(
            EncodingMode::from_ordering(Ordering::SliceOdd, false).unwrap(),
            EncodingMode::SliceInterleavedOddFirst
        );
        assert!(EncodingMode::from_ordering(Ordering::Slice, true).is_err());
    }

    #[test]
    fn test_mode_names_parse() {
        for mode in EncodingMode::ALL {
            assert_eq!(mode.name().parse::<EncodingMode>().unwrap(), mode);
        }
        assert!("diagonal".parse::<EncodingMode>().is_err());
    }

    #[test]
    fn test_deterministic() {
        let canvas = MonochromeCanvas::test_pattern(352, 80);
        assert_eq!(
            encode(&canvas, EncodingMode::ColumnMajorLsb),
            encode(&canvas, EncodingMode::ColumnMajorLsb)
        );
    }
}
