//! # Right-to-Left Text Helpers
//!
//! The printer has no bidirectional text support: it lays bytes out left to
//! right, always. Hebrew therefore has to arrive already in visual order.
//!
//! The assembler only knows one rule: reverse segments tagged RTL. Splitting
//! a mixed line ("תלמיד: 42 נקודות") into direction runs and putting those
//! runs in visual order is the caller's job, and [`split_directional_runs`]
//! does it.
//!
//! ```text
//! logical   [RTL "תלמיד: "] [LTR "42"] [RTL " נקודות"]
//! visual    [RTL " נקודות"] [LTR "42"] [RTL "תלמיד: "]    (run order reversed)
//! printed   "תודוקנ 42 :דימלת"                            (RTL runs reversed)
//! ```
//!
//! Mirrored glyphs (brackets) are not swapped.

use crate::protocol::codepage::Codepage;

use super::ops::{Direction, TextSegment};

/// Reverse a string character by character. Applying it twice returns the input.
pub fn reverse_rtl(s: &str) -> String {
    s.chars().rev().collect()
}

/// Strong direction of a character, `None` for neutrals (spaces, punctuation).
fn strong_direction(ch: char) -> Option<Direction> {
    match ch {
        '\u{0590}'..='\u{05FF}' | '\u{FB1D}'..='\u{FB4F}' => Some(Direction::Rtl),
        c if c.is_alphanumeric() => Some(Direction::Ltr),
        _ => None,
    }
}

/// Paragraph direction: the direction of the first strong character, LTR
/// when there is none.
pub fn base_direction(line: &str) -> Direction {
    line.chars()
        .find_map(strong_direction)
        .unwrap_or(Direction::Ltr)
}

/// Split a logical-order line into direction runs, returned in visual
/// (left-to-right) order.
///
/// The paragraph direction is taken from the first strong character. A
/// neutral between two runs of the same direction joins them; any other
/// neutral takes the paragraph direction.
pub fn split_directional_runs(line: &str, codepage: Codepage) -> Vec<TextSegment> {
    let chars: Vec<char> = line.chars().collect();
    let strong: Vec<Option<Direction>> = chars.iter().map(|&c| strong_direction(c)).collect();
    let base = base_direction(line);

    let resolved: Vec<Direction> = (0..chars.len())
        .map(|i| match strong[i] {
            Some(d) => d,
            None => {
                let before = strong[..i].iter().rev().flatten().next();
                let after = strong[i + 1..].iter().flatten().next();
                match (before, after) {
                    (Some(a), Some(b)) if a == b => *a,
                    _ => base,
                }
            }
        })
        .collect();

    let mut runs: Vec<TextSegment> = Vec::new();
    for (&ch, &direction) in chars.iter().zip(&resolved) {
        match runs.last_mut() {
            Some(run) if run.direction == direction => run.content.push(ch),
            _ => runs.push(TextSegment {
                content: ch.to_string(),
                direction,
                codepage,
            }),
        }
    }

    if base == Direction::Rtl {
        runs.reverse();
    }
    runs
}

/// Bytes a line prints as once split and encoded; concatenation of the
/// visual-order segments.
pub fn visual_line(line: &str) -> String {
    split_directional_runs(line, Codepage::Pc862)
        .iter()
        .map(|segment| segment.visual().into_owned())
        .collect()
}
