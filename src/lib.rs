//! # Kabala - Legacy Receipt Printer Library
//!
//! Kabala drives an ESC/POS thermal receipt printer that predates any
//! driver support: no right-to-left text, one single-byte codepage at a
//! time, and a bitmap layout that was only ever found by comparing bytes
//! against captures from a working installation. It provides:
//!
//! - **Rasterization**: any image → fixed-size 1-bit canvas (Lanczos3 + threshold)
//! - **Bitmap encoding**: six candidate byte layouts as one parameterised encoder
//! - **Assembly**: ordered documents of commands, text and bitmaps → one byte buffer
//! - **Hebrew text**: PC862 codepage and visual-order run splitting
//! - **Trace tooling**: hex capture parsing and encoding-mode calibration
//! - **Transport**: raw device spooling, one job per device at a time
//!
//! ## Quick Start
//!
//! ```no_run
//! use kabala::{
//!     ir::{ControlSequence, ReceiptDocument},
//!     pipeline::PrintPipeline,
//!     printer::JobConfig,
//!     protocol::{codepage::Codepage, commands::CutMode, graphics::BitmapScale},
//!     transport::RawDeviceSpooler,
//! };
//!
//! let config = JobConfig {
//!     printer: Some("usb/lp0".into()),
//!     ..JobConfig::default()
//! };
//! let pipeline = PrintPipeline::new(config)?;
//!
//! let mut doc = ReceiptDocument::with_init();
//! doc.control(ControlSequence::SelectCodepage(Codepage::Pc862))
//!     .bitmap(pipeline.logo_block("logo.png")?, BitmapScale::Normal)
//!     .line("תלמיד: 42 נקודות", Codepage::Pc862)
//!     .control(ControlSequence::Cut(CutMode::Partial));
//!
//! pipeline.print(&doc, &RawDeviceSpooler::new())?;
//!
//! # Ok::<(), kabala::error::KabalaError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`render`] | Canvas, rasterizer, bitmap encoder |
//! | [`protocol`] | ESC/POS command builders and codepages |
//! | [`ir`] | Receipt documents, assembler, bidi splitting |
//! | [`trace`] | Capture trace parsing and calibration |
//! | [`cache`] | Encoded asset cache and on-disk store |
//! | [`transport`] | Spooler interface and backends |
//! | [`printer`] | Device profile and job configuration |
//! | [`pipeline`] | Configured end-to-end print path |
//! | [`receipt`] | Receipt templates |
//! | [`error`] | Error types |

pub mod cache;
pub mod error;
pub mod ir;
pub mod pipeline;
pub mod printer;
pub mod protocol;
pub mod receipt;
pub mod render;
pub mod trace;
pub mod transport;

// Re-exports for convenience
pub use error::KabalaError;
pub use pipeline::PrintPipeline;
pub use printer::{JobConfig, PrinterConfig};
pub use render::{EncodingMode, MonochromeCanvas, RasterBlock};
pub use transport::RawDeviceSpooler;
