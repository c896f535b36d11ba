//! # Print Pipeline
//!
//! The one entry point that ties the stages together for a configured job:
//!
//! ```text
//! logo file ──► rasterize ──► encode ──► RasterBlock ─┐
//!        (cached by content hash, size, threshold, mode)  ├─► assemble ──► submit
//! text lines ──────────────────────────────────────────┘
//! ```
//!
//! All device names, paths and modes come from the [`JobConfig`] handed to
//! [`PrintPipeline::new`].

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::cache::{AssetCache, AssetStore};
use crate::error::{KabalaError, Result};
use crate::ir::{Assembler, ReceiptDocument};
use crate::printer::JobConfig;
use crate::render::canvas::MonochromeCanvas;
use crate::render::encoder::{self, RasterBlock};
use crate::render::rasterize;
use crate::transport::{self, Spooler};

/// A configured print pipeline with its asset cache.
#[derive(Debug)]
pub struct PrintPipeline {
    config: JobConfig,
    cache: AssetCache,
}

impl PrintPipeline {
    /// Validate `config` and open the asset store if one is configured.
    pub fn new(config: JobConfig) -> Result<Self> {
        config.validate()?;
        let cache = match &config.asset_dir {
            Some(dir) => AssetCache::with_store(AssetStore::open(dir)?),
            None => AssetCache::new(),
        };
        Ok(Self { config, cache })
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    /// Read an image file and turn it into a logo block.
    pub fn logo_block<P: AsRef<Path>>(&self, path: P) -> Result<RasterBlock> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .map_err(|e| KabalaError::ImageLoad(format!("{}: {}", path.display(), e)))?;
        self.logo_block_from_bytes(&asset_name(path), &bytes)
    }

    /// Rasterize and encode image bytes at the configured logo size, reusing
    /// the cached encoding when the same bytes were seen before with the same
    /// size, threshold and mode.
    pub fn logo_block_from_bytes(&self, name: &str, source: &[u8]) -> Result<RasterBlock> {
        let JobConfig {
            mode,
            threshold,
            logo_width,
            logo_height,
            ..
        } = self.config;
        let (width_bytes, height_slices) = encoder::dimensions_for(logo_width, logo_height)?;
        let expected_len = usize::from(width_bytes) * usize::from(height_slices) * 8;
        let key = render_key(source, logo_width, logo_height, threshold);

        let data = self.cache.get_or_encode_named(name, &key, mode, expected_len, || {
            let canvas = rasterize::rasterize_bytes(source, logo_width, logo_height, threshold)?;
            debug!(
                asset = name,
                black = canvas.black_count(),
                mode = %mode,
                "encoding logo"
            );
            Ok(encoder::encode(&canvas, mode))
        })?;

        // A stored file of the wrong size must never reach the device.
        RasterBlock::new(width_bytes, height_slices, mode, data.to_vec())
    }

    /// Calibration pattern at the configured logo size.
    pub fn test_pattern_block(&self) -> Result<RasterBlock> {
        let canvas =
            MonochromeCanvas::test_pattern(self.config.logo_width, self.config.logo_height);
        RasterBlock::from_canvas(&canvas, self.config.mode)
    }

    /// Decode a block back into dots, as the device would lay them out if it
    /// used the block's mode.
    pub fn preview(&self, block: &RasterBlock) -> Result<MonochromeCanvas> {
        encoder::decode(
            block.data(),
            self.config.logo_width,
            self.config.logo_height,
            block.mode(),
        )
    }

    /// Assemble a document into the final payload.
    pub fn assemble(&self, document: &ReceiptDocument) -> Result<Vec<u8>> {
        Assembler::new().assemble(document)
    }

    /// Assemble `document` and submit it to the configured printer.
    pub fn print<S: Spooler>(&self, document: &ReceiptDocument, spooler: &S) -> Result<usize> {
        let bytes = self.assemble(document)?;
        self.send_raw(&bytes, spooler)
    }

    /// Submit already assembled bytes, e.g. a replayed capture trace.
    pub fn send_raw<S: Spooler>(&self, bytes: &[u8], spooler: &S) -> Result<usize> {
        let printer = self.config.printer()?;
        let written = transport::submit(spooler, printer, &self.config.job_name, bytes)?;
        info!(printer, bytes = written, mode = %self.config.mode, "printed");
        Ok(written)
    }
}

/// Cache key material: the image bytes followed by every setting that
/// changes the rasterized output.
fn render_key(source: &[u8], width: usize, height: usize, threshold: u8) -> Vec<u8> {
    let mut key = Vec::with_capacity(source.len() + 17);
    key.extend_from_slice(source);
    key.extend_from_slice(&(width as u64).to_le_bytes());
    key.extend_from_slice(&(height as u64).to_le_bytes());
    key.push(threshold);
    key
}

/// Store-safe name for an image path: its file stem with anything outside
/// `[A-Za-z0-9_-]` replaced by `_`.
fn asset_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() { "logo".to_string() } else { name }
}
