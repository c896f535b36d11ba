//! # Printer Control Commands
//!
//! Basic ESC/POS control codes observed in captures of the legacy receipt
//! printer: initialization, line feeds and the paper cutter.
//!
//! ## Escape Sequence Structure
//!
//! Commands follow these patterns:
//! - Single byte: `LF`
//! - Two bytes: `ESC @`
//! - With one parameter byte: `ESC d n`, `GS V m`
//!
//! Every command the device accepts is listed in the table below. Nothing
//! outside this table is ever emitted.
//!
//! | Name | Bytes | Parameters |
//! |------|-------|------------|
//! | Initialize | `1B 40` | none |
//! | Select codepage | `1B 74 nn` | table id |
//! | Select alignment | `1B 61 nn` | 0 left, 1 center, 2 right |
//! | Bold on/off | `1B 45 nn` | 0 / 1 |
//! | Character size | `1D 21 nn` | width/height nibbles |
//! | Define bitmap | `1D 2A xx yy d…` | width bytes, 8-row slices |
//! | Print defined bitmap | `1D 2F mm` | scale mode |
//! | Cut | `1D 56 nn` | `30` full, `31` partial |

// ============================================================================
// ESCAPE SEQUENCE CONSTANTS
// ============================================================================

/// ESC (Escape) - command prefix byte for text and control commands
pub const ESC: u8 = 0x1B;

/// GS (Group Separator) - command prefix for graphics, size and cutter
pub const GS: u8 = 0x1D;

/// LF (Line Feed) - print the line buffer and advance one line
pub const LF: u8 = 0x0A;

// ============================================================================
// INITIALIZATION
// ============================================================================

/// # Initialize Printer (ESC @)
///
/// Resets the printer to its power-on state: alignment left, bold off,
/// character size 1×1, codepage back to the device default. The downloaded
/// bitmap slot is cleared as well, so a bitmap must be defined again after
/// every initialize.
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC @ |
/// | Hex     | 1B 40 |
///
/// ```
/// use kabala::protocol::commands;
///
/// assert_eq!(commands::init(), vec![0x1B, 0x40]);
/// ```
#[inline]
pub fn init() -> Vec<u8> {
    vec![ESC, b'@']
}

// ============================================================================
// PAPER FEED
// ============================================================================

/// Line feed (LF). Prints the buffered line and advances one line.
#[inline]
pub fn line_feed() -> Vec<u8> {
    vec![LF]
}

/// # Print and Feed n Lines (ESC d n)
///
/// | Format  | Bytes    |
/// |---------|----------|
/// | ASCII   | ESC d n  |
/// | Hex     | 1B 64 n  |
///
/// The legacy print scripts feed a few lines before cutting so the last
/// printed row clears the cutter blade.
#[inline]
pub fn feed_lines(n: u8) -> Vec<u8> {
    vec![ESC, b'd', n]
}

// ============================================================================
// CUTTER CONTROL
// ============================================================================

/// Cutter mode parameter for `GS V`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CutMode {
    /// Full cut (`0x30`)
    Full = 0x30,
    /// Partial cut, leaves a small hinge (`0x31`)
    #[default]
    Partial = 0x31,
}

/// # Cut Paper (GS V m)
///
/// | Format  | Bytes    |
/// |---------|----------|
/// | ASCII   | GS V m   |
/// | Hex     | 1D 56 m  |
///
/// ```
/// use kabala::protocol::commands::{self, CutMode};
///
/// assert_eq!(commands::cut(CutMode::Partial), vec![0x1D, 0x56, 0x31]);
/// ```
#[inline]
pub fn cut(mode: CutMode) -> Vec<u8> {
    vec![GS, b'V', mode as u8]
}

/// Full cut (`1D 56 30`)
#[inline]
pub fn cut_full() -> Vec<u8> {
    cut(CutMode::Full)
}

/// Partial cut (`1D 56 31`)
#[inline]
pub fn cut_partial() -> Vec<u8> {
    cut(CutMode::Partial)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init() {
        assert_eq!(init(), vec![0x1B, 0x40]);
    }

    #[test]
    fn test_cut_full() {
        assert_eq!(cut_full(), vec![0x1D, 0x56, 0x30]);
    }

    #[test]
    fn test_cut_partial() {
        assert_eq!(cut_partial(), vec![0x1D, 0x56, 0x31]);
    }

    #[test]
    fn test_feed_lines() {
        assert_eq!(feed_lines(0), vec![0x1B, 0x64, 0x00]);
        assert_eq!(feed_lines(4), vec![0x1B, 0x64, 0x04]);
    }

    #[test]
    fn test_line_feed() {
        assert_eq!(line_feed(), vec![0x0A]);
    }
}
