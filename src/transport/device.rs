//! # Raw Device Spooler
//!
//! Writes jobs straight to a device node such as a USB line printer
//! (`/dev/usb/lp0`) or a serial adapter (`/dev/ttyUSB0`).
//!
//! ## Device Names
//!
//! A name containing `/` is used as a path. Any other name is looked up
//! under `/dev`, so `--printer usb/lp0` and `--printer /dev/usb/lp0` are the
//! same printer.
//!
//! ## TTY Configuration
//!
//! Serial devices are switched to raw mode before the first byte is sent so
//! that raster data passes through unmodified:
//!
//! - **No input processing**: IGNBRK, BRKINT, PARMRK, ISTRIP, INLCR, IGNCR, ICRNL
//! - **No flow control**: IXON, IXOFF, IXANY (0x11/0x13 occur in bitmap data)
//! - **No output processing**: OPOST
//! - **8-bit characters**: CS8, no parity
//! - **No echo, non-canonical**: ECHO, ECHONL, ICANON, ISIG, IEXTEN
//!
//! Line-printer nodes and plain files are not ttys and are left alone, as is
//! everything on non-Unix platforms.
//!
//! ## Chunked Writes
//!
//! Jobs larger than the chunk size (4096 bytes) are written in chunks with a
//! short delay between them, which keeps small printer buffers from
//! overflowing on long logos.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::debug;

use super::Spooler;
use crate::error::{KabalaError, Result};

/// Default chunk size for writes (bytes)
const CHUNK_SIZE: usize = 4096;

/// Delay between chunks (milliseconds)
const CHUNK_DELAY_MS: u64 = 2;

/// # Raw Device Spooler
///
/// ## Example
///
/// ```no_run
/// use kabala::transport::{self, RawDeviceSpooler};
/// use kabala::protocol::commands;
///
/// let spooler = RawDeviceSpooler::new();
/// let mut job = commands::init();
/// job.extend(commands::cut_partial());
/// transport::submit(&spooler, "usb/lp0", "test", &job)?;
///
/// # Ok::<(), kabala::error::KabalaError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RawDeviceSpooler {
    chunk_size: usize,
    chunk_delay: Duration,
    create: bool,
}

/// Open device of a [`RawDeviceSpooler`].
#[derive(Debug)]
pub struct DeviceHandle {
    file: File,
    path: PathBuf,
}

impl DeviceHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for RawDeviceSpooler {
    fn default() -> Self {
        Self::new()
    }
}

impl RawDeviceSpooler {
    /// Spooler for existing device nodes.
    pub fn new() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            chunk_delay: Duration::from_millis(CHUNK_DELAY_MS),
            create: false,
        }
    }

    /// Spooler that creates (or truncates) a regular file per job.
    ///
    /// Used for dry runs: the file receives exactly what the device would.
    pub fn to_file() -> Self {
        Self {
            chunk_delay: Duration::ZERO,
            create: true,
            ..Self::new()
        }
    }

    /// Set the chunk size for large writes. Default is 4096 bytes.
    pub fn set_chunk_size(&mut self, size: usize) {
        self.chunk_size = size.max(1);
    }

    fn write_chunked(&self, file: &mut File, data: &[u8]) -> io::Result<()> {
        if data.len() <= self.chunk_size {
            return file.write_all(data);
        }
        for chunk in data.chunks(self.chunk_size) {
            file.write_all(chunk)?;
            if !self.chunk_delay.is_zero() {
                thread::sleep(self.chunk_delay);
            }
        }
        Ok(())
    }
}

/// Map a printer name to a device path.
pub fn resolve_device(name: &str) -> PathBuf {
    if name.contains('/') {
        PathBuf::from(name)
    } else {
        Path::new("/dev").join(name)
    }
}

impl Spooler for RawDeviceSpooler {
    type Handle = DeviceHandle;

    fn open(&self, device: &str) -> Result<DeviceHandle> {
        let path = resolve_device(device);
        let mut options = OpenOptions::new();
        options.write(true);
        if self.create {
            options.create(true).truncate(true);
        }
        let file = options.open(&path).map_err(|e| {
            KabalaError::SpoolOpen(format!("Failed to open {}: {}", path.display(), e))
        })?;

        prepare_tty(&file, &path)?;
        Ok(DeviceHandle { file, path })
    }

    fn submit_job(&self, handle: &mut DeviceHandle, job_name: &str, bytes: &[u8]) -> Result<usize> {
        debug!(path = %handle.path.display(), job = job_name, bytes = bytes.len(), "writing job");
        self.write_chunked(&mut handle.file, bytes)
            .and_then(|()| handle.file.flush())
            .map_err(|e| {
                KabalaError::SpoolWrite(format!("Write to {} failed: {}", handle.path.display(), e))
            })?;
        Ok(bytes.len())
    }

    fn close(&self, handle: DeviceHandle) -> Result<()> {
        let DeviceHandle { mut file, path } = handle;
        file.flush().map_err(|e| {
            KabalaError::SpoolWrite(format!("Flush of {} failed: {}", path.display(), e))
        })
    }
}

/// Switch `file` to raw mode if it is a terminal.
#[cfg(unix)]
fn prepare_tty(file: &File, path: &Path) -> Result<()> {
    use std::os::unix::io::AsRawFd;

    let fd = file.as_raw_fd();
    // SAFETY: `fd` is owned by `file`, which is alive for this call.
    if unsafe { libc::isatty(fd) } == 1 {
        configure_tty_raw(fd)?;
        debug!(path = %path.display(), "configured tty for raw output");
    }
    Ok(())
}

#[cfg(not(unix))]
fn prepare_tty(_file: &File, _path: &Path) -> Result<()> {
    Ok(())
}

/// Configure a file descriptor for raw TTY mode.
#[cfg(unix)]
fn configure_tty_raw(fd: i32) -> Result<()> {
    use std::mem::MaybeUninit;

    let mut termios = MaybeUninit::uninit();
    // SAFETY: `fd` is a valid open descriptor and `termios` points to
    // writable storage for one `libc::termios`.
    let result = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if result != 0 {
        return Err(KabalaError::SpoolOpen(format!(
            "tcgetattr failed: {}",
            io::Error::last_os_error()
        )));
    }
    // SAFETY: tcgetattr returned 0 above, so `termios` is initialised.
    let mut termios = unsafe { termios.assume_init() };

    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);
    termios.c_oflag &= !libc::OPOST;
    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
    termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
    termios.c_cflag |= libc::CS8;

    // SAFETY: `fd` is a valid open descriptor and `termios` is a fully
    // initialised struct borrowed for the duration of the call.
    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) };
    if result != 0 {
        return Err(KabalaError::SpoolOpen(format!(
            "tcsetattr failed: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::submit;

    #[test]
    fn test_resolve_device() {
        assert_eq!(resolve_device("usb/lp0"), PathBuf::from("usb/lp0"));
        assert_eq!(resolve_device("ttyUSB0"), PathBuf::from("/dev/ttyUSB0"));
        assert_eq!(resolve_device("/dev/usb/lp1"), PathBuf::from("/dev/usb/lp1"));
    }

    #[test]
    fn test_missing_device_is_open_error() {
        let spooler = RawDeviceSpooler::new();
        let err = spooler.open("/nonexistent/kabala/lp9").unwrap_err();
        assert!(matches!(err, KabalaError::SpoolOpen(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_file_spooler_writes_exact_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.bin");
        let mut spooler = RawDeviceSpooler::to_file();
        spooler.set_chunk_size(3);

        let payload: Vec<u8> = (0u8..10).collect();
        let n = submit(&spooler, path.to_str().unwrap(), "dry-run", &payload).unwrap();
        assert_eq!(n, 10);
        assert_eq!(std::fs::read(&path).unwrap(), payload);
    }

    #[test]
    fn test_regular_file_is_not_treated_as_tty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.bin");
        let file = File::create(&path).unwrap();
        prepare_tty(&file, &path).unwrap();
    }

    #[test]
    fn test_file_spooler_truncates_previous_job() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.bin");
        let spooler = RawDeviceSpooler::to_file();
        let device = path.to_str().unwrap();

        submit(&spooler, device, "first", &[1, 2, 3, 4]).unwrap();
        submit(&spooler, device, "second", &[9]).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![9]);
    }
}
