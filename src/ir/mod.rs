//! # Document Representation and Assembly
//!
//! A print job is a [`ReceiptDocument`]: an ordered list of control
//! sequences, text segments and raster blocks. The [`Assembler`] walks it
//! once, front to back, and emits device bytes.
//!
//! ```text
//! ┌──────────────┐     ┌────────────────────┐     ┌───────────┐     ┌─────────┐
//! │ caller       │ ──► │  ReceiptDocument   │ ──► │ Assembler │ ──► │ bytes   │
//! │ (bidi split) │     │   (Vec<Entry>)     │     │           │     │         │
//! └──────────────┘     └────────────────────┘     └───────────┘     └─────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use kabala::ir::{ControlSequence, ReceiptDocument};
//! use kabala::protocol::codepage::Codepage;
//! use kabala::protocol::commands::CutMode;
//!
//! let mut doc = ReceiptDocument::with_init();
//! doc.control(ControlSequence::SelectCodepage(Codepage::Pc862))
//!     .rtl("בדיקה", Codepage::Pc862)
//!     .control(ControlSequence::LineFeed)
//!     .control(ControlSequence::Cut(CutMode::Partial));
//!
//! let bytes = doc.to_bytes().unwrap();
//! assert_eq!(&bytes[5..10], &[0x84, 0x97, 0x89, 0x83, 0x81]);
//! ```

pub mod bidi;
mod codegen;
mod ops;

pub use codegen::Assembler;
pub use ops::*;
