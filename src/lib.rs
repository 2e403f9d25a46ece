#![deny(trivial_casts, trivial_numeric_casts, unused_import_braces)]
//! # uniqip
//!
//! Counts the distinct IPv4 addresses in a newline-delimited text file
//! without loading the file into memory and without a hash set.
//!
//! Two pieces make this fast and exact:
//!
//! - [`PresenceSet`], a lock-free bitmap with one bit for every 32-bit
//!   address (512 MiB, allocated zeroed and touched only where addresses
//!   land);
//! - a parallel scan that splits the file into byte spans, one per worker
//!   thread, where each line is owned by the span holding its first byte.
//!   Workers never talk to each other; the ownership rule alone keeps every
//!   line counted exactly once.
//!
//! ## Features
//!
//! - **`cli`** (default: enabled): builds the `uniqip` and `genips`
//!   binaries
//! - **`mmap`** (default: disabled): adds [`Counter::count_mmap`], which
//!   scans a memory map of the input instead of per-worker file handles
//! - **`simdutf8`** (default: disabled): use SIMD instructions for the
//!   UTF-8 check done before parsing each line
//!
//! ## Input Format
//!
//! One dotted-decimal address per line, `\n` or `\r\n` terminated, the last
//! newline optional. Any line that is not a strict dotted-decimal IPv4
//! address (blank lines included) is logged and skipped.
//!
//! ## Quick Start
//!
//! ```no_run
//! fn main() -> Result<(), uniqip::UniqIpError> {
//!     let report = uniqip::Counter::new(8).count_file("IPs.txt")?;
//!     println!("Number of unique addresses: {}", report.unique);
//!     if report.truncated_spans > 0 {
//!         eprintln!("warning: some spans hit read errors");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Custom Sinks
//!
//! Workers write through the [`AddressSink`] trait, so a run can feed any
//! thread-safe collector:
//!
//! ```no_run
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! struct Tally(AtomicU64);
//!
//! impl uniqip::AddressSink for Tally {
//!     fn add(&self, _address: u32) {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//!
//! let tally = Tally(AtomicU64::new(0));
//! let spans = uniqip::Counter::new(4).scan_into("IPs.txt", &tally)?;
//! println!("{} spans, {} addresses", spans.len(), tally.0.load(Ordering::Relaxed));
//! # Ok::<(), uniqip::UniqIpError>(())
//! ```

mod address;
mod counter;
mod error;
#[cfg(feature = "mmap")]
mod mapped;
mod planner;
mod presence;
mod worker;

pub use address::parse_line;
pub use counter::{count_unique, CountReport, Counter};
pub use error::UniqIpError;
#[cfg(feature = "mmap")]
pub use mapped::scan_slice;
pub use planner::{plan, FileSpan};
pub use presence::{AddressSink, PresenceSet, WORDS};
pub use worker::{scan_file, scan_reader, SpanReport};
