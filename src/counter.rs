//! Orchestration of a counting run.

use std::fs::File;
use std::num::NonZeroUsize;
use std::panic;
use std::path::Path;
use std::thread;

use log::{debug, warn};
use serde::Serialize;

#[cfg(feature = "mmap")]
use memmap2::Mmap;

use crate::error::UniqIpError;
use crate::planner::{plan, FileSpan};
use crate::presence::{AddressSink, PresenceSet};
use crate::worker::{scan_file, SpanReport};

/// Aggregated outcome of a counting run.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CountReport {
    /// Number of distinct addresses found.
    pub unique: u64,
    /// Size of the input in bytes when the run started.
    pub file_size: u64,
    /// Number of spans, and so of worker threads.
    pub workers: u64,
    /// Lines read in full across all spans.
    pub lines: u64,
    /// Lines that parsed as an address.
    pub addresses: u64,
    /// Lines that failed to parse.
    pub skipped: u64,
    /// Spans that stopped early on a read error.
    pub truncated_spans: usize,
}

impl CountReport {
    fn aggregate(unique: u64, file_size: u64, reports: &[SpanReport]) -> CountReport {
        reports.iter().fold(
            CountReport {
                unique,
                file_size,
                workers: reports.len() as u64,
                ..CountReport::default()
            },
            |mut acc, report| {
                acc.lines += report.lines;
                acc.addresses += report.addresses;
                acc.skipped += report.skipped;
                acc.truncated_spans += usize::from(report.is_truncated());
                acc
            },
        )
    }
}

/// Counts distinct IPv4 addresses in a file by scanning it in parallel.
///
/// The file is split into one byte span per worker; each worker runs on its
/// own thread with its own file handle and marks addresses in one shared
/// [`PresenceSet`].
///
/// # Example
///
/// ```no_run
/// let report = uniqip::Counter::new(8).count_file("IPs.txt")?;
/// println!("Number of unique addresses: {}", report.unique);
/// # Ok::<(), uniqip::UniqIpError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Counter {
    workers: u64,
    strict: bool,
}

impl Default for Counter {
    /// Twice the available hardware parallelism.
    fn default() -> Self {
        let threads = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        Counter::new(threads as u64 * 2)
    }
}

impl Counter {
    /// Creates a counter that scans with `workers` threads.
    ///
    /// A worker count of 0 is rejected when a run starts.
    pub fn new(workers: u64) -> Counter {
        Counter {
            workers,
            strict: false,
        }
    }

    /// Number of worker threads used per run.
    pub fn workers(&self) -> u64 {
        self.workers
    }

    /// Fail the run with [`UniqIpError::Truncated`] when any span stops
    /// early on a read error, instead of returning a partial count.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Counts the distinct addresses in the file at `path`.
    pub fn count_file<P: AsRef<Path>>(&self, path: P) -> Result<CountReport, UniqIpError> {
        let path = path.as_ref();
        let file_size = self.file_size(path)?;
        let set = PresenceSet::new();
        let reports = self.run(file_size, &set, |span, sink| scan_file(path, span, sink));
        self.finish(set.count(), file_size, &reports)
    }

    /// Counts the distinct addresses in the file at `path`, reading it
    /// through a memory map instead of per-worker file handles.
    ///
    /// The file must not be modified while the run is in progress.
    #[cfg(feature = "mmap")]
    pub fn count_mmap<P: AsRef<Path>>(&self, path: P) -> Result<CountReport, UniqIpError> {
        use crate::mapped::scan_slice;

        let path = path.as_ref();
        self.check_workers()?;
        let file = File::open(path).map_err(|e| UniqIpError::io(path, e))?;
        let file_size = file.metadata().map_err(|e| UniqIpError::io(path, e))?.len();

        let set = PresenceSet::new();
        let reports = if file_size == 0 {
            self.run(0, &set, |span, sink| scan_slice(&[], span, sink))
        } else {
            // SAFETY: the input is only read, and callers must not modify it
            // for the duration of the run.
            let mmap = unsafe { Mmap::map(&file) }.map_err(UniqIpError::Mmap)?;
            let data: &[u8] = &mmap;
            self.run(data.len() as u64, &set, |span, sink| scan_slice(data, span, sink))
        };
        self.finish(set.count(), file_size, &reports)
    }

    /// Scans the file at `path` into a caller-supplied sink.
    ///
    /// Runs the same plan as [`count_file`](Self::count_file) and returns the
    /// per-span reports in span order. Strict mode does not apply.
    pub fn scan_into<P, S>(&self, path: P, sink: &S) -> Result<Vec<SpanReport>, UniqIpError>
    where
        P: AsRef<Path>,
        S: AddressSink,
    {
        let path = path.as_ref();
        let file_size = self.file_size(path)?;
        Ok(self.run(file_size, sink, |span, sink| scan_file(path, span, sink)))
    }

    fn check_workers(&self) -> Result<(), UniqIpError> {
        if self.workers == 0 {
            return Err(UniqIpError::invalid_input("worker count must be at least 1"));
        }
        Ok(())
    }

    fn file_size(&self, path: &Path) -> Result<u64, UniqIpError> {
        self.check_workers()?;
        let file = File::open(path).map_err(|e| UniqIpError::io(path, e))?;
        let metadata = file.metadata().map_err(|e| UniqIpError::io(path, e))?;
        Ok(metadata.len())
    }

    /// Runs `scan` for every planned span on its own thread and waits for
    /// all of them.
    fn run<S, F>(&self, file_size: u64, sink: &S, scan: F) -> Vec<SpanReport>
    where
        S: AddressSink,
        F: Fn(FileSpan, &S) -> SpanReport + Sync,
    {
        let spans = plan(file_size, self.workers);
        debug!(
            "scanning {} bytes with {} worker(s), {} bytes per span",
            file_size,
            spans.len(),
            file_size / self.workers
        );

        let scan = &scan;
        thread::scope(|s| {
            let handles: Vec<_> = spans
                .iter()
                .map(|&span| s.spawn(move || scan(span, sink)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|payload| panic::resume_unwind(payload)))
                .collect()
        })
    }

    fn finish(
        &self,
        unique: u64,
        file_size: u64,
        reports: &[SpanReport],
    ) -> Result<CountReport, UniqIpError> {
        let report = CountReport::aggregate(unique, file_size, reports);
        if report.truncated_spans > 0 {
            if self.strict {
                return Err(UniqIpError::Truncated {
                    spans: report.truncated_spans,
                });
            }
            warn!(
                "{} of {} span(s) stopped early on read errors; the count is a lower bound",
                report.truncated_spans, report.workers
            );
        }
        Ok(report)
    }
}

/// Counts the distinct IPv4 addresses in the file at `path` using
/// `workers` threads.
///
/// Shorthand for `Counter::new(workers).count_file(path)` that keeps only
/// the count.
pub fn count_unique<P: AsRef<Path>>(path: P, workers: u64) -> Result<u64, UniqIpError> {
    Counter::new(workers).count_file(path).map(|report| report.unique)
}
