//! # Rendering Module
//!
//! Turns images into device bitmap data.
//!
//! ## Modules
//!
//! - [`canvas`]: the 1-bit [`MonochromeCanvas`](canvas::MonochromeCanvas)
//! - [`rasterize`]: image → canvas (scale to fit, center, threshold)
//! - [`encoder`]: canvas → bytes under a selectable [`EncodingMode`](encoder::EncodingMode)
//!
//! ## Usage Example
//!
//! ```
//! use kabala::render::canvas::MonochromeCanvas;
//! use kabala::render::encoder::{EncodingMode, RasterBlock};
//!
//! let canvas = MonochromeCanvas::test_pattern(352, 80);
//! let block = RasterBlock::from_canvas(&canvas, EncodingMode::ColumnMajorMsb).unwrap();
//! assert_eq!(block.data().len(), 44 * 10 * 8);
//! ```

pub mod canvas;
pub mod encoder;
pub mod rasterize;

pub use canvas::MonochromeCanvas;
pub use encoder::{EncodingMode, RasterBlock};
