//! # Capture Trace Tooling
//!
//! Offline analysis of hex dumps captured from a known-working printer.
//! Nothing here is on the print path: it exists to find and check the
//! opcode layout used by [`crate::protocol`] and the bitmap layout chosen
//! from [`crate::render::encoder::EncodingMode`].
//!
//! - [`parse`]: hex dump → bytes, opcode index, bitmap extent
//! - [`calibrate`]: which encoding modes reproduce a captured bitmap
//!
//! ```
//! use kabala::trace::CaptureTrace;
//!
//! let trace = CaptureTrace::parse("1B 40 1D 2A 01 01 00 00 00 00 00 00 00 00 1D 2F 00");
//! let payload = trace.bitmap_payload().unwrap();
//! assert_eq!(payload.data.len(), 8);
//! ```

pub mod calibrate;
pub mod parse;

pub use parse::{
    BitmapPayload, CaptureTrace, Marker, Opcode, bitmap_block_extent, locate, parse_hex_trace,
};
