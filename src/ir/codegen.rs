//! # Code Generation
//!
//! Converts a [`ReceiptDocument`] to device bytes in a single pass.

use tracing::{debug, warn};

use super::ops::{AssemblerState, ControlSequence, Entry, ReceiptDocument, TextSegment};
use crate::error::Result;
use crate::render::encoder::RasterBlock;

/// Sequential document-to-bytes translator.
///
/// Tracks alignment, codepage, bold and text scale as control entries pass
/// by. The state never causes extra bytes to be emitted; it exists so text
/// sent under the wrong codepage can be reported.
#[derive(Debug, Clone, Default)]
pub struct Assembler {
    state: AssemblerState,
}

impl Assembler {
    /// Start from the power-on state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current tracked device state.
    pub fn state(&self) -> &AssemblerState {
        &self.state
    }

    /// Translate every entry in document order.
    ///
    /// Fails without returning partial output if any raster block violates
    /// its length invariant.
    pub fn assemble(&mut self, document: &ReceiptDocument) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for entry in document {
            self.emit(entry, &mut out)?;
        }
        debug!(entries = document.len(), bytes = out.len(), "assembled document");
        Ok(out)
    }

    fn emit(&mut self, entry: &Entry, out: &mut Vec<u8>) -> Result<()> {
        match entry {
            Entry::Control(control) => {
                self.apply(*control);
                out.extend(control.to_bytes());
            }
            Entry::Text(segment) => {
                self.emit_text(segment, out);
            }
            Entry::Raster(block) => {
                self.emit_raster(block, out)?;
            }
        }
        Ok(())
    }

    fn apply(&mut self, control: ControlSequence) {
        match control {
            ControlSequence::Initialize => self.state = AssemblerState::default(),
            ControlSequence::SelectCodepage(cp) => self.state.codepage = cp,
            ControlSequence::SelectAlignment(a) => self.state.alignment = a,
            ControlSequence::Bold(on) => self.state.bold = on,
            ControlSequence::CharacterSize(scale) => self.state.text_scale = scale,
            ControlSequence::PrintBitmap(_)
            | ControlSequence::Cut(_)
            | ControlSequence::LineFeed
            | ControlSequence::FeedLines(_) => {}
        }
    }

    fn emit_text(&self, segment: &TextSegment, out: &mut Vec<u8>) {
        if segment.codepage != self.state.codepage {
            warn!(
                segment = %segment.codepage,
                selected = %self.state.codepage,
                "text segment codepage differs from the selected device codepage"
            );
        }
        out.extend(segment.encode());
    }

    fn emit_raster(&self, block: &RasterBlock, out: &mut Vec<u8>) -> Result<()> {
        block.validate()?;
        out.extend(block.to_command()?);
        Ok(())
    }
}

impl ReceiptDocument {
    /// Compile the document to device bytes, starting from the power-on state.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Assembler::new().assemble(self)
    }
}
