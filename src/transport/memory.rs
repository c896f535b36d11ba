//! In-memory spooler that records every job it receives.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use super::Spooler;
use crate::error::{KabalaError, Result};

/// A job as the spooler received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpooledJob {
    pub device: String,
    pub job_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Failure {
    #[default]
    None,
    Open,
    Write,
}

/// Spooler backed by a `Vec` of jobs, with optional failure injection.
#[derive(Debug, Default)]
pub struct MemorySpooler {
    jobs: Mutex<Vec<SpooledJob>>,
    failure: Failure,
    write_delay: Duration,
    opens: AtomicUsize,
    closes: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Open handle of a [`MemorySpooler`].
#[derive(Debug)]
pub struct MemoryHandle {
    device: String,
}

impl MemorySpooler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `open` fails, as if the printer were offline.
    pub fn offline() -> Self {
        Self {
            failure: Failure::Open,
            ..Self::default()
        }
    }

    /// `open` succeeds, every write fails.
    pub fn failing_writes() -> Self {
        Self {
            failure: Failure::Write,
            ..Self::default()
        }
    }

    /// Each write sleeps for `delay`, to widen race windows in tests.
    pub fn with_write_delay(delay: Duration) -> Self {
        Self {
            write_delay: delay,
            ..Self::default()
        }
    }

    pub fn jobs(&self) -> Vec<SpooledJob> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously open handles seen.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Spooler for MemorySpooler {
    type Handle = MemoryHandle;

    fn open(&self, device: &str) -> Result<MemoryHandle> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.failure == Failure::Open {
            return Err(KabalaError::SpoolOpen(format!("{}: printer offline", device)));
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Ok(MemoryHandle {
            device: device.to_string(),
        })
    }

    fn submit_job(&self, handle: &mut MemoryHandle, job_name: &str, bytes: &[u8]) -> Result<usize> {
        if !self.write_delay.is_zero() {
            thread::sleep(self.write_delay);
        }
        if self.failure == Failure::Write {
            return Err(KabalaError::SpoolWrite(format!("{}: paper jam", handle.device)));
        }
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SpooledJob {
                device: handle.device.clone(),
                job_name: job_name.to_string(),
                bytes: bytes.to_vec(),
            });
        Ok(bytes.len())
    }

    fn close(&self, _handle: MemoryHandle) -> Result<()> {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
