//! # Kabala CLI
//!
//! Command-line interface for the legacy receipt printer.
//!
//! ## Usage
//!
//! ```bash
//! # Print a logo with the configured encoding mode
//! kabala --printer usb/lp0 --logo logo.png
//!
//! # Try a candidate layout on the calibration pattern
//! kabala --printer usb/lp0 --test-pattern --ordering column --lsb
//!
//! # Logo plus Hebrew text lines
//! kabala --printer usb/lp0 --logo logo.png --text "תלמיד: 42 נקודות"
//!
//! # Replay a captured byte sequence
//! kabala --printer usb/lp0 --hex-file capture.hex
//!
//! # Write the job to a file and a PNG preview instead of printing
//! kabala --printer usb/lp0 --logo logo.png --dry-run job.bin --png preview.png
//! ```
//!
//! Failures print one `<stage>: <cause>` line on stdout and exit with 1
//! (image, encoding, configuration) or 2 (transport). Set `RUST_LOG` for
//! detailed logs on stderr.

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use kabala::{
    JobConfig, KabalaError, PrintPipeline, RawDeviceSpooler,
    error::Result,
    protocol::codepage::Codepage,
    receipt,
    render::encoder::{EncodingMode, Ordering},
    trace::CaptureTrace,
};

/// Kabala - legacy ESC/POS receipt printer utility
#[derive(Parser, Debug)]
#[command(name = "kabala")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Printer device name (under /dev) or path
    #[arg(long)]
    printer: String,

    /// Logo image to print
    #[arg(long, value_name = "FILE")]
    logo: Option<PathBuf>,

    /// Bitmap byte ordering (overrides the configured mode)
    #[arg(long, value_enum)]
    ordering: Option<OrderingArg>,

    /// Pack the first dot of each byte into the least significant bit
    #[arg(long)]
    lsb: bool,

    /// Print the calibration pattern instead of a logo
    #[arg(long, conflicts_with = "logo")]
    test_pattern: bool,

    /// Send a literal hex byte sequence, e.g. "1B 40 1D 56 31"
    #[arg(long, value_name = "BYTES", conflicts_with = "hex_file")]
    hex: Option<String>,

    /// Send the bytes of a captured hex trace file
    #[arg(long, value_name = "FILE")]
    hex_file: Option<PathBuf>,

    /// JSON job configuration; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Luminance threshold (0-255) below which a pixel prints
    #[arg(long)]
    threshold: Option<u8>,

    /// Text line to print below the logo (repeatable)
    #[arg(long = "text", value_name = "LINE")]
    text: Vec<String>,

    /// Text codepage: pc437, pc862 or a table number
    #[arg(long)]
    codepage: Option<Codepage>,

    /// Directory for persisted encoded assets
    #[arg(long, value_name = "DIR")]
    asset_dir: Option<PathBuf>,

    /// Write the job to FILE instead of the printer
    #[arg(long, value_name = "FILE")]
    dry_run: Option<PathBuf>,

    /// Save a PNG preview of the encoded bitmap
    #[arg(long, value_name = "FILE")]
    png: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OrderingArg {
    Row,
    Column,
    Slice,
    SliceOdd,
}

impl From<OrderingArg> for Ordering {
    fn from(arg: OrderingArg) -> Self {
        match arg {
            OrderingArg::Row => Ordering::Row,
            OrderingArg::Column => Ordering::Column,
            OrderingArg::Slice => Ordering::Slice,
            OrderingArg::SliceOdd => Ordering::SliceOdd,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        println!("{}: {}", e.stage(), e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = job_config(&cli)?;
    let printer = config.printer()?.to_string();
    let pipeline = PrintPipeline::new(config)?;
    let spooler = if cli.dry_run.is_some() {
        RawDeviceSpooler::to_file()
    } else {
        RawDeviceSpooler::new()
    };

    if let Some(bytes) = replay_bytes(&cli)? {
        let written = pipeline.send_raw(&bytes, &spooler)?;
        println!("Sent {} bytes to {}", written, printer);
        return Ok(());
    }

    let block = if cli.test_pattern {
        Some(pipeline.test_pattern_block()?)
    } else {
        pipeline
            .config()
            .logo
            .as_ref()
            .map(|path| pipeline.logo_block(path))
            .transpose()?
    };

    if let Some(png_path) = &cli.png {
        let block = block.as_ref().ok_or_else(|| {
            KabalaError::Config("--png needs --logo or --test-pattern".to_string())
        })?;
        pipeline.preview(block)?.to_gray_image().save(png_path)?;
        info!(path = %png_path.display(), mode = %block.mode(), "saved preview");
    }

    if block.is_none() && cli.text.is_empty() {
        return Err(KabalaError::Config(
            "Nothing to print: pass --logo, --test-pattern, --text, --hex or --hex-file"
                .to_string(),
        ));
    }

    let document = receipt::text_document(block, &cli.text, pipeline.config().codepage);
    let written = pipeline.print(&document, &spooler)?;
    println!(
        "Printed {} bytes to {} ({})",
        written,
        printer,
        pipeline.config().mode
    );
    Ok(())
}

/// Config file (or defaults) with command-line overrides applied.
fn job_config(cli: &Cli) -> Result<JobConfig> {
    let mut config = match &cli.config {
        Some(path) => JobConfig::from_file(path)?,
        None => JobConfig::default(),
    };

    // A bare file name would be looked up under /dev.
    config.printer = Some(match &cli.dry_run {
        Some(path) if path.components().count() == 1 => {
            Path::new(".").join(path).display().to_string()
        }
        Some(path) => path.display().to_string(),
        None => cli.printer.clone(),
    });
    if let Some(logo) = &cli.logo {
        config.logo = Some(logo.clone());
    }
    if let Some(threshold) = cli.threshold {
        config.threshold = threshold;
    }
    if let Some(codepage) = cli.codepage {
        config.codepage = codepage;
    }
    if let Some(dir) = &cli.asset_dir {
        config.asset_dir = Some(dir.clone());
    }
    // --lsb alone keeps the configured traversal.
    match (cli.ordering, cli.lsb) {
        (Some(ordering), lsb) => config.mode = EncodingMode::from_ordering(ordering.into(), lsb)?,
        (None, true) => config.mode = config.mode.with_lsb()?,
        (None, false) => {}
    }
    Ok(config)
}

/// Bytes from `--hex` or `--hex-file`, if either was given.
fn replay_bytes(cli: &Cli) -> Result<Option<Vec<u8>>> {
    let trace = match (&cli.hex, &cli.hex_file) {
        (Some(text), _) => CaptureTrace::parse(text),
        (None, Some(path)) => CaptureTrace::from_file(path)?,
        (None, None) => return Ok(None),
    };
    if trace.skipped_tokens() > 0 {
        info!(skipped = trace.skipped_tokens(), "ignored non-hex tokens in trace");
    }
    Ok(Some(trace.bytes().to_vec()))
}
