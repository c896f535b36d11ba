//! # Document Entries
//!
//! A [`ReceiptDocument`] is an ordered list of [`Entry`] values: control
//! sequences, text segments and raster blocks. Insertion order is emission
//! order. Nothing downstream reorders, merges or drops entries.

use std::borrow::Cow;

use crate::protocol::codepage::{self, Codepage};
use crate::protocol::commands::{self, CutMode};
use crate::protocol::graphics::{self, BitmapScale};
use crate::protocol::text::{self, Alignment, TextScale};
use crate::render::encoder::RasterBlock;

use super::bidi::{reverse_rtl, split_directional_runs};

/// A fixed opcode from the device's command table, with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSequence {
    /// `1B 40`
    Initialize,
    /// `1B 74 nn`
    SelectCodepage(Codepage),
    /// `1B 61 nn`
    SelectAlignment(Alignment),
    /// `1B 45 nn`
    Bold(bool),
    /// `1D 21 nn`
    CharacterSize(TextScale),
    /// `1D 2F mm`
    PrintBitmap(BitmapScale),
    /// `1D 56 nn`
    Cut(CutMode),
    /// `0A`
    LineFeed,
    /// `1B 64 n`
    FeedLines(u8),
}

impl ControlSequence {
    /// Exact command bytes.
    pub fn to_bytes(self) -> Vec<u8> {
        match self {
            Self::Initialize => commands::init(),
            Self::SelectCodepage(cp) => codepage::select(cp),
            Self::SelectAlignment(a) => text::align(a),
            Self::Bold(on) => text::bold(on),
            Self::CharacterSize(scale) => text::size(scale),
            Self::PrintBitmap(scale) => graphics::print_bitmap(scale),
            Self::Cut(mode) => commands::cut(mode),
            Self::LineFeed => commands::line_feed(),
            Self::FeedLines(n) => commands::feed_lines(n),
        }
    }
}

/// Reading direction of a text segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

/// A run of text in one direction and one codepage.
///
/// The device prints every byte left to right. A segment tagged
/// [`Direction::Rtl`] is reversed character by character before encoding;
/// an LTR segment is sent as written. Mixed lines must be split into
/// segments first (see [`super::bidi::split_directional_runs`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSegment {
    pub content: String,
    pub direction: Direction,
    pub codepage: Codepage,
}

impl TextSegment {
    pub fn ltr(content: impl Into<String>, codepage: Codepage) -> Self {
        Self {
            content: content.into(),
            direction: Direction::Ltr,
            codepage,
        }
    }

    pub fn rtl(content: impl Into<String>, codepage: Codepage) -> Self {
        Self {
            content: content.into(),
            direction: Direction::Rtl,
            codepage,
        }
    }

    /// Text in the order it is sent to the device.
    pub fn visual(&self) -> Cow<'_, str> {
        match self.direction {
            Direction::Ltr => Cow::Borrowed(&self.content),
            Direction::Rtl => Cow::Owned(reverse_rtl(&self.content)),
        }
    }

    /// Device bytes for this segment.
    pub fn encode(&self) -> Vec<u8> {
        self.codepage.encode(&self.visual())
    }
}

/// One document entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Control(ControlSequence),
    Text(TextSegment),
    Raster(RasterBlock),
}

impl From<ControlSequence> for Entry {
    fn from(c: ControlSequence) -> Self {
        Self::Control(c)
    }
}

impl From<TextSegment> for Entry {
    fn from(t: TextSegment) -> Self {
        Self::Text(t)
    }
}

impl From<RasterBlock> for Entry {
    fn from(r: RasterBlock) -> Self {
        Self::Raster(r)
    }
}

/// Device state the assembler tracks while walking a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblerState {
    pub alignment: Alignment,
    pub codepage: Codepage,
    pub bold: bool,
    pub text_scale: TextScale,
}

impl Default for AssemblerState {
    /// Power-on state, also restored by `Initialize`.
    fn default() -> Self {
        Self {
            alignment: Alignment::Left,
            codepage: Codepage::Pc437,
            bold: false,
            text_scale: TextScale::NORMAL,
        }
    }
}

/// An ordered print job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiptDocument {
    pub entries: Vec<Entry>,
}

impl ReceiptDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Create a document that starts with `Initialize`.
    pub fn with_init() -> Self {
        Self {
            entries: vec![Entry::Control(ControlSequence::Initialize)],
        }
    }

    /// Append any entry.
    pub fn push(&mut self, entry: impl Into<Entry>) -> &mut Self {
        self.entries.push(entry.into());
        self
    }

    /// Append a control sequence.
    pub fn control(&mut self, c: ControlSequence) -> &mut Self {
        self.push(c)
    }

    /// Append a left-to-right segment.
    pub fn ltr(&mut self, content: impl Into<String>, codepage: Codepage) -> &mut Self {
        self.push(TextSegment::ltr(content, codepage))
    }

    /// Append a right-to-left segment.
    pub fn rtl(&mut self, content: impl Into<String>, codepage: Codepage) -> &mut Self {
        self.push(TextSegment::rtl(content, codepage))
    }

    /// Append a logical-order line split into direction runs, then a line feed.
    pub fn line(&mut self, text: &str, codepage: Codepage) -> &mut Self {
        for segment in split_directional_runs(text, codepage) {
            self.push(segment);
        }
        self.push(ControlSequence::LineFeed)
    }

    /// Append a bitmap definition immediately followed by its print trigger.
    pub fn bitmap(&mut self, block: RasterBlock, scale: BitmapScale) -> &mut Self {
        self.push(block);
        self.push(ControlSequence::PrintBitmap(scale))
    }

    /// Append all entries of another document.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = Entry>) -> &mut Self {
        self.entries.extend(entries);
        self
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }
}

impl FromIterator<Entry> for ReceiptDocument {
    fn from_iter<T: IntoIterator<Item = Entry>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ReceiptDocument {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a ReceiptDocument {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
