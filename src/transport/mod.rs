//! # Printer Transport Layer
//!
//! The print core hands one finished byte buffer to a [`Spooler`] and gets
//! back a byte count. Spoolers are synchronous raw sinks: no retries, no
//! buffering guarantees.
//!
//! ## Available Spoolers
//!
//! - [`device`]: raw device node or file (`/dev/usb/lp0`, `/dev/ttyUSB0`, a dry-run file)
//! - [`memory`]: records jobs in memory, for tests
//!
//! ## Job Submission
//!
//! [`submit`] is the only entry point the pipeline uses. It
//!
//! 1. rejects an empty payload before touching the device
//! 2. waits for any other job on the same device name to finish
//! 3. opens, writes and closes the handle, closing it even when the write fails

pub mod device;
pub mod memory;

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use tracing::{info, warn};

use crate::error::{KabalaError, Result};

pub use device::RawDeviceSpooler;
pub use memory::{MemorySpooler, SpooledJob};

/// A raw-byte printer sink.
pub trait Spooler {
    /// Open printer resource.
    type Handle;

    /// Acquire the named printer. Fails with [`KabalaError::SpoolOpen`].
    fn open(&self, device: &str) -> Result<Self::Handle>;

    /// Write `bytes` as one job. Fails with [`KabalaError::SpoolWrite`].
    fn submit_job(&self, handle: &mut Self::Handle, job_name: &str, bytes: &[u8]) -> Result<usize>;

    /// Release the printer.
    fn close(&self, handle: Self::Handle) -> Result<()>;
}

/// One lock per device name, shared by every spooler in the process.
static DEVICE_LOCKS: LazyLock<Mutex<HashMap<String, Arc<Mutex<()>>>>> =
    LazyLock::new(Default::default);

fn device_lock(device: &str) -> Arc<Mutex<()>> {
    let mut locks = DEVICE_LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(locks.entry(device.to_string()).or_default())
}

/// Send `payload` to `device` as a single job.
///
/// Returns the number of bytes the spooler reports as written.
pub fn submit<S: Spooler>(spooler: &S, device: &str, job_name: &str, payload: &[u8]) -> Result<usize> {
    if payload.is_empty() {
        return Err(KabalaError::EmptyJob(format!(
            "job '{}' for {} has no bytes",
            job_name, device
        )));
    }

    let lock = device_lock(device);
    let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

    let mut handle = spooler.open(device)?;
    let written = spooler.submit_job(&mut handle, job_name, payload);
    let closed = spooler.close(handle);

    let written = match (written, closed) {
        (Ok(n), Ok(())) => n,
        (Ok(_), Err(e)) => return Err(e),
        (Err(e), Ok(())) => return Err(e),
        (Err(e), Err(close_err)) => {
            warn!(device, error = %close_err, "close failed after write error");
            return Err(e);
        }
    };

    info!(device, job = job_name, bytes = written, "job submitted");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_empty_payload_never_opens() {
        let spooler = MemorySpooler::new();
        let err = submit(&spooler, "empty-job", "receipt", &[]).unwrap_err();
        assert!(matches!(err, KabalaError::EmptyJob(_)));
        assert_eq!(spooler.open_count(), 0);
        assert!(spooler.jobs().is_empty());
    }

    #[test]
    fn test_submit_records_job() {
        let spooler = MemorySpooler::new();
        let n = submit(&spooler, "front-desk", "receipt", &[0x1B, 0x40]).unwrap();
        assert_eq!(n, 2);
        assert_eq!(
            spooler.jobs(),
            vec![SpooledJob {
                device: "front-desk".into(),
                job_name: "receipt".into(),
                bytes: vec![0x1B, 0x40],
            }]
        );
        assert_eq!(spooler.open_count(), 1);
        assert_eq!(spooler.close_count(), 1);
    }

    #[test]
    fn test_handle_closed_after_write_failure() {
        let spooler = MemorySpooler::failing_writes();
        let err = submit(&spooler, "jammed", "receipt", &[0x0A]).unwrap_err();
        assert!(matches!(err, KabalaError::SpoolWrite(_)));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(spooler.close_count(), 1);
    }

    #[test]
    fn test_open_failure_propagates() {
        let spooler = MemorySpooler::offline();
        let err = submit(&spooler, "offline", "receipt", &[0x0A]).unwrap_err();
        assert!(matches!(err, KabalaError::SpoolOpen(_)));
        assert_eq!(spooler.close_count(), 0);
    }

    #[test]
    fn test_jobs_to_one_device_are_serialised() {
        let spooler = Arc::new(MemorySpooler::with_write_delay(std::time::Duration::from_millis(5)));
        let handles: Vec<_> = (0..6u8)
            .map(|i| {
                let spooler = Arc::clone(&spooler);
                thread::spawn(move || submit(&*spooler, "shared-counter", "receipt", &[i]).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(spooler.jobs().len(), 6);
        assert_eq!(spooler.max_in_flight(), 1);
    }
}
