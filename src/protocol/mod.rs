//! # Legacy ESC/POS Protocol
//!
//! Low-level command builders for the one command set the legacy receipt
//! printer was observed to accept. Every builder returns the exact bytes of
//! one command.
//!
//! ## Module Structure
//!
//! - [`commands`]: initialize, line feed, cut
//! - [`text`]: alignment, bold, character size
//! - [`codepage`]: codepage selection and single-byte text encoding
//! - [`graphics`]: define/print downloaded bitmap
//!
//! ## Usage Example
//!
//! ```
//! use kabala::protocol::{codepage::{self, Codepage}, commands, graphics, text};
//!
//! let mut data = Vec::new();
//! data.extend(commands::init());
//! data.extend(codepage::select(Codepage::Pc862));
//! data.extend(text::align(text::Alignment::Center));
//! data.extend(Codepage::Pc862.encode("OK"));
//! data.extend(commands::line_feed());
//!
//! let bitmap = vec![0u8; 2 * 1 * 8];
//! data.extend(graphics::define_bitmap(2, 1, &bitmap).unwrap());
//! data.extend(graphics::print_bitmap(graphics::BitmapScale::Normal));
//! data.extend(commands::cut_partial());
//! ```
//!
//! The byte layout was recovered from capture traces of a working device;
//! see [`crate::trace`] for the tooling that checks it.

pub mod codepage;
pub mod commands;
pub mod graphics;
pub mod text;
