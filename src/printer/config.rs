//! # Printer and Job Configuration
//!
//! [`PrinterConfig`] describes the hardware; [`JobConfig`] carries everything
//! a single print run needs (device name, logo, encoding mode, ...). Nothing
//! is hardcoded at module level: the CLI builds a `JobConfig` from a JSON
//! file and flags and passes it into the pipeline.
//!
//! ## Supported Printers
//!
//! | Profile | Width (dots) | Logo area | Codepage |
//! |---------|--------------|-----------|----------|
//! | Legacy 80mm | 576 | 352 × 80 | PC862 |
//!
//! ## Usage
//!
//! ```
//! use kabala::printer::PrinterConfig;
//!
//! let config = PrinterConfig::LEGACY_80MM;
//! println!("Logo area: {}x{} dots", config.logo_width, config.logo_height);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{KabalaError, Result};
use crate::protocol::codepage::Codepage;
use crate::render::encoder::EncodingMode;
use crate::render::rasterize::DEFAULT_THRESHOLD;

/// # Printer Configuration
///
/// The logo area of the legacy printer is 352 / 8 = 44 bytes wide and
/// 80 / 8 = 10 slices tall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterConfig {
    /// Maximum print width in dots; no bitmap may be wider
    pub width_dots: u16,

    /// Logo canvas width in dots
    pub logo_width: u16,

    /// Logo canvas height in dots
    pub logo_height: u16,

    /// Codepage for receipt text
    pub codepage: Codepage,
}

impl PrinterConfig {
    /// # Legacy 80mm ESC/POS Receipt Printer
    ///
    /// ```text
    /// ├── 4mm ──┼────── 72mm printable ──────┼── 4mm ──┤
    /// │ margin  │         576 dots           │ margin  │
    /// ```
    pub const LEGACY_80MM: Self = Self {
        width_dots: 576,
        logo_width: 352,
        logo_height: 80,
        codepage: Codepage::Pc862,
    };
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self::LEGACY_80MM
    }
}

// ============================================================================
// JOB CONFIGURATION
// ============================================================================

/// Settings for one print run, loadable from JSON.
///
/// ```json
/// {
///   "printer": "usb/lp0",
///   "logo": "assets/logo.png",
///   "mode": "column-major-lsb",
///   "threshold": 140,
///   "codepage": "pc862",
///   "asset_dir": "/var/cache/kabala"
/// }
/// ```
///
/// Missing keys take the [`Default`] values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobConfig {
    /// Device name or path
    pub printer: Option<String>,
    /// Logo image to print at the top of the job
    pub logo: Option<PathBuf>,
    /// Bitmap layout sent to the device
    pub mode: EncodingMode,
    /// Luminance below which a pixel prints
    pub threshold: u8,
    pub codepage: Codepage,
    /// Directory for persisted encoded assets
    pub asset_dir: Option<PathBuf>,
    pub logo_width: usize,
    pub logo_height: usize,
    /// Spooler job name
    pub job_name: String,
}

impl Default for JobConfig {
    fn default() -> Self {
        let printer = PrinterConfig::LEGACY_80MM;
        Self {
            printer: None,
            logo: None,
            mode: EncodingMode::default(),
            threshold: DEFAULT_THRESHOLD,
            codepage: printer.codepage,
            asset_dir: None,
            logo_width: printer.logo_width as usize,
            logo_height: printer.logo_height as usize,
            job_name: "kabala".to_string(),
        }
    }
}

impl JobConfig {
    /// Parse from a JSON string and validate.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            KabalaError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Check the logo fits the paper width and the single-byte `GS *`
    /// height parameter.
    pub fn validate(&self) -> Result<()> {
        const MAX_HEIGHT: usize = 255 * 8;
        let max_width = usize::from(PrinterConfig::LEGACY_80MM.width_dots);
        if self.logo_width == 0 || self.logo_height == 0 {
            return Err(KabalaError::Config(format!(
                "Logo size {}x{} must be non-zero",
                self.logo_width, self.logo_height
            )));
        }
        if self.logo_width > max_width {
            return Err(KabalaError::Config(format!(
                "Logo width {} exceeds the {}-dot print width",
                self.logo_width, max_width
            )));
        }
        if self.logo_height > MAX_HEIGHT {
            return Err(KabalaError::Config(format!(
                "Logo height {} exceeds {} dots",
                self.logo_height, MAX_HEIGHT
            )));
        }
        if self.job_name.is_empty() {
            return Err(KabalaError::Config("Job name must not be empty".to_string()));
        }
        Ok(())
    }

    /// The configured device name.
    pub fn printer(&self) -> Result<&str> {
        self.printer
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| KabalaError::Config("No printer configured".to_string()))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_legacy_dimensions() {
        let config = PrinterConfig::LEGACY_80MM;
        assert_eq!(config.logo_width / 8, 44);
        assert_eq!(config.logo_height / 8, 10);
        assert!(config.logo_width <= config.width_dots);
    }

    #[test]
    fn test_job_rejects_logo_wider_than_paper() {
        assert!(JobConfig::from_json(r#"{ "logo_width": 576 }"#).is_ok());
        let err = JobConfig::from_json(r#"{ "logo_width": 577 }"#).unwrap_err();
        assert!(err.to_string().contains("576"));
    }

    #[test]
    fn test_job_defaults() {
        let config = JobConfig::default();
        assert_eq!(config.mode, EncodingMode::RowMajorMsb);
        assert_eq!(config.threshold, 128);
        assert_eq!(config.codepage, Codepage::Pc862);
        assert_eq!((config.logo_width, config.logo_height), (352, 80));
    }

    #[test]
    fn test_job_from_json_partial() {
        let config = JobConfig::from_json(
            r#"{ "printer": "usb/lp0", "mode": "column-major-lsb", "threshold": 140 }"#,
        )
        .unwrap();
        assert_eq!(config.printer().unwrap(), "usb/lp0");
        assert_eq!(config.mode, EncodingMode::ColumnMajorLsb);
        assert_eq!(config.threshold, 140);
        assert_eq!(config.logo_width, 352);
    }

    #[test]
    fn test_job_rejects_unknown_keys() {
        let err = JobConfig::from_json(r#"{ "printr": "usb/lp0" }"#).unwrap_err();
        assert_eq!(err.stage(), "config");
    }

    #[test]
    fn test_job_rejects_oversized_logo() {
        let err = JobConfig::from_json(r#"{ "logo_width": 4096 }"#).unwrap_err();
        assert!(matches!(err, KabalaError::Config(_)));
    }

    #[test]
    fn test_missing_printer() {
        assert!(JobConfig::default().printer().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.json");
        fs::write(&path, r#"{ "printer": "ttyUSB0", "codepage": "pc437" }"#).unwrap();
        let config = JobConfig::from_file(&path).unwrap();
        assert_eq!(config.codepage, Codepage::Pc437);
        assert_eq!(config.printer().unwrap(), "ttyUSB0");
    }
}
