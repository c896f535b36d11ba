//! # Encoding Mode Calibration
//!
//! Compares bitmap data captured from a working installation against what
//! each [`EncodingMode`] produces for the same source canvas. A mode is only
//! ever called correct when it reproduces the capture byte for byte.

use tracing::info;

use super::parse::CaptureTrace;
use crate::error::{KabalaError, Result};
use crate::render::canvas::MonochromeCanvas;
use crate::render::encoder::{self, EncodingMode};

/// Byte-level comparison of two payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadDiff {
    pub expected_len: usize,
    pub actual_len: usize,
    /// First differing offset, including a length difference.
    pub first_mismatch: Option<usize>,
    /// Differing bytes within the common length.
    pub mismatched_bytes: usize,
}

impl PayloadDiff {
    pub fn is_match(&self) -> bool {
        self.first_mismatch.is_none()
    }
}

/// Compare `expected` (captured) with `actual` (generated).
pub fn diff(expected: &[u8], actual: &[u8]) -> PayloadDiff {
    let common = expected.len().min(actual.len());
    let mut first_mismatch = None;
    let mut mismatched_bytes = 0;
    for (i, (a, b)) in expected.iter().zip(actual).enumerate() {
        if a != b {
            mismatched_bytes += 1;
            first_mismatch.get_or_insert(i);
        }
    }
    if first_mismatch.is_none() && expected.len() != actual.len() {
        first_mismatch = Some(common);
    }
    PayloadDiff {
        expected_len: expected.len(),
        actual_len: actual.len(),
        first_mismatch,
        mismatched_bytes,
    }
}

/// Diff of every candidate mode against the first bitmap in `trace`.
pub fn calibrate(
    trace: &CaptureTrace,
    canvas: &MonochromeCanvas,
) -> Result<Vec<(EncodingMode, PayloadDiff)>> {
    let payload = trace.bitmap_payload()?;
    if usize::from(payload.width_bytes) != canvas.width_bytes()
        || usize::from(payload.height_slices) != canvas.height_slices()
    {
        return Err(KabalaError::TraceParse(format!(
            "Captured bitmap is {}x{} (bytes x slices), canvas is {}x{}",
            payload.width_bytes,
            payload.height_slices,
            canvas.width_bytes(),
            canvas.height_slices()
        )));
    }

    let report: Vec<(EncodingMode, PayloadDiff)> = EncodingMode::ALL
        .into_iter()
        .map(|mode| (mode, diff(payload.data, &encoder::encode(canvas, mode))))
        .collect();

    for (mode, d) in &report {
        info!(
            mode = %mode,
            matched = d.is_match(),
            mismatched_bytes = d.mismatched_bytes,
            "calibration candidate"
        );
    }
    Ok(report)
}

/// Modes that reproduce the captured bitmap exactly.
pub fn matching_modes(trace: &CaptureTrace, canvas: &MonochromeCanvas) -> Result<Vec<EncodingMode>> {
    Ok(calibrate(trace, canvas)?
        .into_iter()
        .filter(|(_, d)| d.is_match())
        .map(|(mode, _)| mode)
        .collect())
}

/// Decode the captured bitmap as if it were produced under `mode`.
pub fn render_payload(
    trace: &CaptureTrace,
    width: usize,
    height: usize,
    mode: EncodingMode,
) -> Result<MonochromeCanvas> {
    let payload = trace.bitmap_payload()?;
    encoder::decode(payload.data, width, height, mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_identical() {
        let d = diff(&[1, 2, 3], &[1, 2, 3]);
        assert!(d.is_match());
        assert_eq!(d.mismatched_bytes, 0);
    }

    #[test]
    fn test_diff_counts_bytes() {
        let d = diff(&[1, 2, 3, 4], &[1, 0, 3, 0]);
        assert_eq!(d.first_mismatch, Some(1));
        assert_eq!(d.mismatched_bytes, 2);
    }

    #[test]
    fn test_diff_length_only() {
        let d = diff(&[1, 2, 3], &[1, 2]);
        assert_eq!(d.first_mismatch, Some(2));
        assert_eq!(d.mismatched_bytes, 0);
        assert!(!d.is_match());
    }

    #[test]
    fn test_calibrate_rejects_dimension_mismatch() {
        let trace = CaptureTrace::parse("1D 2A 01 01 00 00 00 00 00 00 00 00 1D 2F 00");
        let canvas = MonochromeCanvas::new(16, 8);
        assert!(calibrate(&trace, &canvas).is_err());
    }

    #[test]
    fn test_single_mode_matches_capture() {
        // left half of row 1 black, written column-major LSB
        let trace = CaptureTrace::parse("1D 2A 01 01 02 02 02 02 00 00 00 00 1D 2F 00");
        let canvas = MonochromeCanvas::from_fn(8, 8, |x, y| y == 1 && x < 4);
        assert_eq!(
            matching_modes(&trace, &canvas).unwrap(),
            vec![EncodingMode::ColumnMajorLsb]
        );
    }

    #[test]
    fn test_render_payload() {
        let trace = CaptureTrace::parse("1D 2A 01 01 00 F0 00 00 00 00 00 00 1D 2F 00");
        let canvas = render_payload(&trace, 8, 8, EncodingMode::RowMajorMsb).unwrap();
        assert_eq!(canvas, MonochromeCanvas::from_fn(8, 8, |x, y| y == 1 && x < 4));
    }
}
