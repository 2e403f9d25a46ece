//! Per-span line scanning.
//!
//! Each worker opens its own handle on the input and processes the lines
//! whose first byte falls inside its [`FileSpan`]. A span that does not
//! start at byte 0 skips the tail of the line begun in the previous span,
//! and every span finishes its last line even when that runs past `end`.
//! Together this hands each line to exactly one worker without any
//! coordination between them.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use log::{debug, error, warn};

use crate::address::{parse_line, trim_line_ending};
use crate::planner::FileSpan;
use crate::presence::AddressSink;

const READ_BUFFER_SIZE: usize = 256 * 1024;

/// Outcome of scanning one span.
#[derive(Debug)]
pub struct SpanReport {
    /// The span that was scanned.
    pub span: FileSpan,
    /// Lines owned by the span that were read in full.
    pub lines: u64,
    /// Lines that parsed as an address and were handed to the sink.
    pub addresses: u64,
    /// Lines that failed to parse.
    pub skipped: u64,
    /// Bytes consumed from the input, including the discarded prefix.
    pub bytes_read: u64,
    /// Read error that stopped the span early, if any.
    pub error: Option<io::Error>,
}

impl SpanReport {
    pub(crate) fn new(span: FileSpan) -> SpanReport {
        SpanReport {
            span,
            lines: 0,
            addresses: 0,
            skipped: 0,
            bytes_read: 0,
            error: None,
        }
    }

    /// Returns `true` if a read error kept the span from being fully scanned.
    pub fn is_truncated(&self) -> bool {
        self.error.is_some()
    }

    /// Parses one owned line starting at byte `offset` and feeds the sink.
    pub(crate) fn record_line<S>(&mut self, line: &[u8], offset: u64, sink: &S)
    where
        S: AddressSink + ?Sized,
    {
        self.lines += 1;
        match parse_line(line) {
            Some(address) => {
                sink.add(address);
                self.addresses += 1;
            }
            None => {
                self.skipped += 1;
                warn!(
                    "skipping line at byte {}: {:?} is not an IPv4 address",
                    offset,
                    String::from_utf8_lossy(trim_line_ending(line))
                );
            }
        }
    }

    pub(crate) fn fail(&mut self, err: io::Error) {
        error!(
            "read failed in span {}..{} after {} line(s), the rest of the span is not counted: {}",
            self.span.start, self.span.end, self.lines, err
        );
        self.error = Some(err);
    }
}

/// Scans `span` of the file at `path` through a freshly opened handle.
///
/// A failure to open the file is recorded in the report like any other read
/// error; nothing from the span is counted in that case.
pub fn scan_file<P, S>(path: P, span: FileSpan, sink: &S) -> SpanReport
where
    P: AsRef<Path>,
    S: AddressSink + ?Sized,
{
    if span.is_empty() {
        return SpanReport::new(span);
    }
    match File::open(path.as_ref()) {
        Ok(file) => scan_reader(file, span, sink),
        Err(err) => {
            let mut report = SpanReport::new(span);
            report.fail(err);
            report
        }
    }
}

/// Scans `span` of any seekable source and feeds every parsed address to
/// `sink`.
///
/// Parse failures are logged and counted as skipped. A read error other
/// than end-of-file stops the scan; lines processed before it stay counted
/// and the error is kept in [`SpanReport::error`].
pub fn scan_reader<R, S>(reader: R, span: FileSpan, sink: &S) -> SpanReport
where
    R: Read + Seek,
    S: AddressSink + ?Sized,
{
    let mut report = SpanReport::new(span);
    if span.is_empty() {
        return report;
    }
    debug!("scanning span {}..{}", span.start, span.end);

    if let Err(err) = scan(reader, span, sink, &mut report) {
        report.fail(err);
    }
    report
}

fn scan<R, S>(reader: R, span: FileSpan, sink: &S, report: &mut SpanReport) -> io::Result<()>
where
    R: Read + Seek,
    S: AddressSink + ?Sized,
{
    let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, reader);
    let mut line = Vec::with_capacity(64);

    // `pos` is always the offset of the next unread byte, which is a line
    // start once alignment is done.
    let mut pos = if span.is_first() {
        reader.seek(SeekFrom::Start(0))?;
        0
    } else {
        // Starting one byte early means a span that begins exactly on a line
        // start only drops the previous line's newline.
        let from = span.start - 1;
        reader.seek(SeekFrom::Start(from))?;
        let n = reader.read_until(b'\n', &mut line)? as u64;
        report.bytes_read += n;
        from + n
    };

    while pos < span.end {
        line.clear();
        let n = reader.read_until(b'\n', &mut line)? as u64;
        if n == 0 {
            break;
        }
        report.bytes_read += n;
        report.record_line(&line, pos, sink);
        pos += n;
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::testing::FailingReader;
    use crate::planner::plan;
    use std::io::Cursor;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        adds: Mutex<Vec<u32>>,
    }

    impl AddressSink for RecordingSink {
        fn add(&self, address: u32) {
            self.adds.lock().unwrap().push(address);
        }
    }

    impl RecordingSink {
        fn values(&self) -> Vec<u32> {
            self.adds.lock().unwrap().clone()
        }
    }

    fn ip(s: &str) -> u32 {
        parse_line(s.as_bytes()).unwrap()
    }

    fn scan_all(data: &[u8], workers: u64) -> Vec<u32> {
        let sink = RecordingSink::default();
        for span in plan(data.len() as u64, workers) {
            let report = scan_reader(Cursor::new(data), span, &sink);
            assert!(!report.is_truncated());
        }
        let mut values = sink.values();
        values.sort_unstable();
        values
    }

    #[test]
    fn test_every_line_claimed_once_for_any_split() {
        let _ = env_logger::try_init();

        let data = b"10.0.0.1\n10.0.0.10\n10.0.0.100\n10.0.0.200\n123.123.123.123\n17.123.253.123\n";
        let mut want: Vec<u32> = [
            "10.0.0.1",
            "10.0.0.10",
            "10.0.0.100",
            "10.0.0.200",
            "123.123.123.123",
            "17.123.253.123",
        ]
        .iter()
        .map(|s| ip(s))
        .collect();
        want.sort_unstable();

        for workers in 1..=(data.len() as u64 + 3) {
            assert_eq!(scan_all(data, workers), want, "workers = {workers}");
        }
    }

    #[test]
    fn test_every_line_claimed_once_without_trailing_newline() {
        let data = b"1.1.1.1\n2.2.2.2\n3.3.3.3";
        let want = vec![ip("1.1.1.1"), ip("2.2.2.2"), ip("3.3.3.3")];
        for workers in 1..=(data.len() as u64 + 1) {
            assert_eq!(scan_all(data, workers), want, "workers = {workers}");
        }
    }

    #[test]
    fn test_span_starting_on_line_start_keeps_line() {
        // "1.1.1.1\n" is 8 bytes, so a span at 8 begins exactly on "2.2.2.2".
        let data = b"1.1.1.1\n2.2.2.2\n";
        let sink = RecordingSink::default();
        let report = scan_reader(Cursor::new(&data[..]), FileSpan { start: 8, end: 16 }, &sink);
        assert_eq!(sink.values(), vec![ip("2.2.2.2")]);
        assert_eq!(report.lines, 1);
        assert_eq!(report.bytes_read, 9);

        let sink = RecordingSink::default();
        scan_reader(Cursor::new(&data[..]), FileSpan { start: 0, end: 8 }, &sink);
        assert_eq!(sink.values(), vec![ip("1.1.1.1")]);
    }

    #[test]
    fn test_straddling_line_owned_by_span_with_first_byte() {
        let data = b"1.1.1.1\n222.222.222.222\n3.3.3.3\n";
        // Boundary at 12 falls inside "222.222.222.222\n" (bytes 8..24).
        let first = RecordingSink::default();
        let report = scan_reader(Cursor::new(&data[..]), FileSpan { start: 0, end: 12 }, &first);
        assert_eq!(first.values(), vec![ip("1.1.1.1"), ip("222.222.222.222")]);
        assert_eq!(report.bytes_read, 24);

        let second = RecordingSink::default();
        scan_reader(Cursor::new(&data[..]), FileSpan { start: 12, end: 32 }, &second);
        assert_eq!(second.values(), vec![ip("3.3.3.3")]);
    }

    #[test]
    fn test_invalid_lines_are_skipped() {
        let data = b"8.8.8.8\ninvalid\n\n8.8.8.8\n1.1.1.1\n";
        let sink = RecordingSink::default();
        let report = scan_reader(Cursor::new(&data[..]), plan(data.len() as u64, 1)[0], &sink);
        assert_eq!(sink.values(), vec![ip("8.8.8.8"), ip("8.8.8.8"), ip("1.1.1.1")]);
        assert_eq!(report.lines, 5);
        assert_eq!(report.addresses, 3);
        assert_eq!(report.skipped, 2);
        assert!(!report.is_truncated());
    }

    #[test]
    fn test_read_error_truncates_span() {
        let data = b"1.1.1.1\n2.2.2.2\n3.3.3.3\n".to_vec();
        let reader = FailingReader::new(data, 12);
        let sink = RecordingSink::default();
        let report = scan_reader(reader, FileSpan { start: 0, end: 24 }, &sink);

        assert_eq!(sink.values(), vec![ip("1.1.1.1")]);
        assert_eq!(report.lines, 1);
        assert!(report.is_truncated());
        assert_eq!(
            report.error.as_ref().map(io::Error::kind),
            Some(io::ErrorKind::Other)
        );
    }

    #[test]
    fn test_empty_span_reads_nothing() {
        let sink = RecordingSink::default();
        let report = scan_reader(Cursor::new(b"1.1.1.1\n"), FileSpan { start: 4, end: 4 }, &sink);
        assert!(sink.values().is_empty());
        assert_eq!(report.bytes_read, 0);
    }

    #[test]
    fn test_scan_file_missing_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let sink = RecordingSink::default();
        let report = scan_file(dir.path().join("missing.txt"), FileSpan { start: 0, end: 10 }, &sink);
        assert!(report.is_truncated());
        assert_eq!(
            report.error.as_ref().map(io::Error::kind),
            Some(io::ErrorKind::NotFound)
        );
    }
}
