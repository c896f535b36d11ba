//! # Printer Module
//!
//! - [`config`]: device profile and per-job settings

pub mod config;

pub use config::{JobConfig, PrinterConfig};
