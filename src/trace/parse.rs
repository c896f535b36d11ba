//! # Capture Trace Parsing
//!
//! Capture files are hex dumps of bytes a working installation sent to the
//! printer, usually annotated by hand:
//!
//! ```text
//! 1B 40            init
//! 1D 2A 2C 0A      define 44 x 10
//! 00 00 00 ...
//! ```
//!
//! Every whitespace-separated token that is exactly two hex digits is a
//! byte; every other token is skipped. Annotations never fail a parse.

use std::path::Path;

use tracing::debug;

use crate::error::{KabalaError, Result};
use crate::protocol::commands::{ESC, GS};
use crate::protocol::graphics::{self, DEFINE_HEADER_LEN};

/// Opcodes recognised in a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Initialize,
    SelectCodepage,
    SelectAlignment,
    Bold,
    CharacterSize,
    FeedLines,
    DefineBitmap,
    PrintBitmap,
    Cut,
}

impl Opcode {
    pub const ALL: [Self; 9] = [
        Self::Initialize,
        Self::SelectCodepage,
        Self::SelectAlignment,
        Self::Bold,
        Self::CharacterSize,
        Self::FeedLines,
        Self::DefineBitmap,
        Self::PrintBitmap,
        Self::Cut,
    ];

    /// Two-byte prefix.
    pub const fn prefix(self) -> [u8; 2] {
        match self {
            Self::Initialize => [ESC, b'@'],
            Self::SelectCodepage => [ESC, b't'],
            Self::SelectAlignment => [ESC, b'a'],
            Self::Bold => [ESC, b'E'],
            Self::CharacterSize => [GS, b'!'],
            Self::FeedLines => [ESC, b'd'],
            Self::DefineBitmap => graphics::DEFINE_BITMAP,
            Self::PrintBitmap => graphics::PRINT_BITMAP,
            Self::Cut => [GS, b'V'],
        }
    }

    /// Fixed parameter bytes after the prefix (bitmap data not included).
    pub const fn param_len(self) -> usize {
        match self {
            Self::Initialize => 0,
            Self::DefineBitmap => 2,
            _ => 1,
        }
    }
}

/// An opcode occurrence at a byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub offset: usize,
    pub opcode: Opcode,
}

/// Parse a hex dump into bytes.
///
/// ```
/// use kabala::trace::parse_hex_trace;
///
/// assert_eq!(parse_hex_trace("1D 2A 2C 0A ff 00"), vec![0x1D, 0x2A, 0x2C, 0x0A, 0xFF, 0x00]);
/// assert_eq!(parse_hex_trace("1B 40 init 0x1B zz 0A"), vec![0x1B, 0x40, 0x0A]);
/// ```
pub fn parse_hex_trace(text: &str) -> Vec<u8> {
    parse_counting(text).0
}

fn parse_counting(text: &str) -> (Vec<u8>, usize) {
    let mut bytes = Vec::new();
    let mut skipped = 0;
    for token in text.split_whitespace() {
        match parse_token(token) {
            Some(b) => bytes.push(b),
            None => skipped += 1,
        }
    }
    (bytes, skipped)
}

fn parse_token(token: &str) -> Option<u8> {
    if token.len() == 2 && token.bytes().all(|b| b.is_ascii_hexdigit()) {
        u8::from_str_radix(token, 16).ok()
    } else {
        None
    }
}

/// First offset at or after `from` where `pattern` occurs.
///
/// An empty pattern never matches.
pub fn locate(bytes: &[u8], pattern: &[u8], from: usize) -> Option<usize> {
    if pattern.is_empty() || from >= bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(pattern.len())
        .position(|w| w == pattern)
        .map(|pos| from + pos)
}

/// Byte range of the bitmap data that follows a define-bitmap opcode.
///
/// Reads `xx` and `yy` right after the opcode and returns
/// `(start, start + xx * yy * 8)`. The range may run past the end of a
/// truncated capture; slicing it is the caller's check.
pub fn bitmap_block_extent(bytes: &[u8], opcode_offset: usize) -> Result<(usize, usize)> {
    let header = bytes
        .get(opcode_offset..opcode_offset + DEFINE_HEADER_LEN)
        .ok_or_else(|| {
            KabalaError::TraceParse(format!(
                "Define-bitmap header at offset {} is truncated",
                opcode_offset
            ))
        })?;
    if header[..2] != graphics::DEFINE_BITMAP {
        return Err(KabalaError::TraceParse(format!(
            "No define-bitmap opcode at offset {} (found {:02X} {:02X})",
            opcode_offset, header[0], header[1]
        )));
    }
    let start = opcode_offset + DEFINE_HEADER_LEN;
    Ok((start, start + graphics::payload_len(header[2], header[3])))
}

/// Bitmap data found in a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapPayload<'a> {
    pub opcode_offset: usize,
    pub width_bytes: u8,
    pub height_slices: u8,
    pub start: usize,
    pub end: usize,
    pub print_offset: usize,
    pub data: &'a [u8],
}

/// A parsed capture file with its opcode index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureTrace {
    bytes: Vec<u8>,
    markers: Vec<Marker>,
    skipped_tokens: usize,
}

impl CaptureTrace {
    /// Parse hex dump text.
    pub fn parse(text: &str) -> Self {
        let (bytes, skipped_tokens) = parse_counting(text);
        let markers = index_markers(&bytes);
        debug!(
            bytes = bytes.len(),
            markers = markers.len(),
            skipped_tokens,
            "parsed capture trace"
        );
        Self {
            bytes,
            markers,
            skipped_tokens,
        }
    }

    /// Index raw bytes directly (for example an assembled payload).
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let markers = index_markers(&bytes);
        Self {
            bytes,
            markers,
            skipped_tokens: 0,
        }
    }

    /// Read and parse a capture file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::parse(&text))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Tokens that were not two hex digits.
    pub fn skipped_tokens(&self) -> usize {
        self.skipped_tokens
    }

    /// Markers for one opcode, in offset order.
    pub fn markers_of(&self, opcode: Opcode) -> impl Iterator<Item = &Marker> {
        self.markers.iter().filter(move |m| m.opcode == opcode)
    }

    /// Raw pattern search, see [`locate`].
    pub fn locate(&self, pattern: &[u8], from: usize) -> Option<usize> {
        locate(&self.bytes, pattern, from)
    }

    /// See [`bitmap_block_extent`].
    pub fn bitmap_block_extent(&self, opcode_offset: usize) -> Result<(usize, usize)> {
        bitmap_block_extent(&self.bytes, opcode_offset)
    }

    /// The first bitmap definition and the print trigger after it.
    ///
    /// Fails if either marker is missing or the data is truncated.
    pub fn bitmap_payload(&self) -> Result<BitmapPayload<'_>> {
        let define = self
            .markers_of(Opcode::DefineBitmap)
            .next()
            .ok_or_else(|| {
                KabalaError::TraceParse("Define-bitmap opcode (1D 2A) not found".to_string())
            })?;
        let (start, end) = self.bitmap_block_extent(define.offset)?;
        let data = self.bytes.get(start..end).ok_or_else(|| {
            KabalaError::TraceParse(format!(
                "Bitmap data truncated: needs bytes {}..{}, capture has {}",
                start,
                end,
                self.bytes.len()
            ))
        })?;
        let print = self
            .markers_of(Opcode::PrintBitmap)
            .find(|m| m.offset >= end)
            .ok_or_else(|| {
                KabalaError::TraceParse(
                    "Print-bitmap opcode (1D 2F) not found after bitmap data".to_string(),
                )
            })?;

        Ok(BitmapPayload {
            opcode_offset: define.offset,
            width_bytes: self.bytes[define.offset + 2],
            height_slices: self.bytes[define.offset + 3],
            start,
            end,
            print_offset: print.offset,
            data,
        })
    }
}

/// Walk the bytes like the device's command parser would: opcodes and their
/// parameters are consumed whole, bitmap data is skipped, anything else is
/// text. Opcode-like bytes inside bitmap data are therefore never indexed.
fn index_markers(bytes: &[u8]) -> Vec<Marker> {
    let mut markers = Vec::new();
    let mut i = 0;
    while i + 1 < bytes.len() {
        let prefix = [bytes[i], bytes[i + 1]];
        let Some(opcode) = Opcode::ALL.into_iter().find(|op| op.prefix() == prefix) else {
            i += 1;
            continue;
        };
        markers.push(Marker { offset: i, opcode });
        i += 2 + opcode.param_len();
        if opcode == Opcode::DefineBitmap
            && let Ok((_, end)) = bitmap_block_extent(bytes, i - 4)
        {
            i = end;
        }
    }
    markers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scenario() {
        let bytes = parse_hex_trace("1D 2A 2C 0A ff 00");
        assert_eq!(bytes, vec![0x1D, 0x2A, 0x2C, 0x0A, 0xFF, 0x00]);
        assert_eq!(locate(&bytes, &[0x1D, 0x2A], 0), Some(0));
        assert_eq!(bitmap_block_extent(&bytes, 0).unwrap(), (4, 4 + 44 * 10 * 8));
    }

    #[test]
    fn test_malformed_tokens_skipped() {
        let trace = CaptureTrace::parse("1B 40 # init\n0x1D 1D 2F 00 GG 123 f");
        assert_eq!(trace.bytes(), &[0x1B, 0x40, 0x1D, 0x2F, 0x00]);
        assert_eq!(trace.skipped_tokens(), 6);
    }

    #[test]
    fn test_locate_from_offset() {
        let bytes = [0x1D, 0x2F, 0x00, 0x1D, 0x2F, 0x01];
        assert_eq!(locate(&bytes, &[0x1D, 0x2F], 0), Some(0));
        assert_eq!(locate(&bytes, &[0x1D, 0x2F], 1), Some(3));
        assert_eq!(locate(&bytes, &[0x1D, 0x2F], 4), None);
        assert_eq!(locate(&bytes, &[], 0), None);
        assert_eq!(locate(&bytes, &[0x1D], 99), None);
    }

    #[test]
    fn test_locate_is_deterministic() {
        let bytes = parse_hex_trace("00 1B 40 1D 2A 01 01 00 00 00 00 00 00 00 00 1D 2F 00");
        let first = locate(&bytes, &[0x1D, 0x2A], 0);
        for _ in 0..5 {
            assert_eq!(locate(&bytes, &[0x1D, 0x2A], 0), first);
        }
        assert_eq!(first, Some(3));
    }

    #[test]
    fn test_extent_requires_opcode() {
        let bytes = parse_hex_trace("1B 40 01 01");
        assert!(matches!(
            bitmap_block_extent(&bytes, 0),
            Err(KabalaError::TraceParse(_))
        ));
        assert!(bitmap_block_extent(&bytes, 3).is_err());
    }

    #[test]
    fn test_index_skips_bitmap_data() {
        // Bitmap data contains 1D 2F, which must not be indexed as a print trigger
        let trace = CaptureTrace::parse("1B 40 1D 2A 01 01 1D 2F 00 00 00 00 00 00 1D 2F 00 1D 56 31");
        let opcodes: Vec<(usize, Opcode)> =
            trace.markers().iter().map(|m| (m.offset, m.opcode)).collect();
        assert_eq!(
            opcodes,
            vec![
                (0, Opcode::Initialize),
                (2, Opcode::DefineBitmap),
                (14, Opcode::PrintBitmap),
                (17, Opcode::Cut),
            ]
        );
    }

    #[test]
    fn test_feed_count_not_read_as_opcode() {
        // ESC d 0x1D followed by text starting with '*'
        let trace = CaptureTrace::parse("1B 40 1B 64 1D 2A 41 1D 56 31");
        let opcodes: Vec<(usize, Opcode)> =
            trace.markers().iter().map(|m| (m.offset, m.opcode)).collect();
        assert_eq!(
            opcodes,
            vec![
                (0, Opcode::Initialize),
                (2, Opcode::FeedLines),
                (7, Opcode::Cut),
            ]
        );
        assert_eq!(trace.markers_of(Opcode::DefineBitmap).count(), 0);
    }

    #[test]
    fn test_bitmap_payload() {
        let trace = CaptureTrace::parse("1B 40 1D 2A 01 01 01 02 03 04 05 06 07 08 1D 2F 00");
        let payload = trace.bitmap_payload().unwrap();
        assert_eq!(payload.width_bytes, 1);
        assert_eq!(payload.height_slices, 1);
        assert_eq!((payload.start, payload.end), (6, 14));
        assert_eq!(payload.data, &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(payload.print_offset, 14);
    }

    #[test]
    fn test_missing_define_marker() {
        let trace = CaptureTrace::parse("1B 40 1D 2F 00");
        let err = trace.bitmap_payload().unwrap_err();
        assert!(err.to_string().contains("1D 2A"));
    }

    #[test]
    fn test_missing_print_marker() {
        let trace = CaptureTrace::parse("1D 2A 01 01 00 00 00 00 00 00 00 00 1D 56 31");
        let err = trace.bitmap_payload().unwrap_err();
        assert!(err.to_string().contains("1D 2F"));
    }

    #[test]
    fn test_truncated_payload() {
        let trace = CaptureTrace::parse("1D 2A 2C 0A ff 00");
        assert!(matches!(
            trace.bitmap_payload(),
            Err(KabalaError::TraceParse(_))
        ));
    }
}
