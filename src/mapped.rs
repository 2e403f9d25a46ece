//! Span scanning over a memory-mapped view of the input.
//!
//! Applies the same ownership rule as [`scan_reader`](crate::scan_reader):
//! a line belongs to the span holding its first byte. With the whole file
//! addressable there is nothing to seek and no read that can fail halfway.

use log::debug;
use memchr::memchr;

use crate::planner::FileSpan;
use crate::presence::AddressSink;
use crate::worker::SpanReport;

/// Scans `span` of `data` and feeds every parsed address to `sink`.
///
/// `data` is the complete input; offsets in `span` index into it.
pub fn scan_slice<S>(data: &[u8], span: FileSpan, sink: &S) -> SpanReport
where
    S: AddressSink + ?Sized,
{
    let mut report = SpanReport::new(span);
    let len = data.len();
    let end = usize::try_from(span.end).map_or(len, |end| end.min(len));
    let start = usize::try_from(span.start).map_or(len, |start| start.min(len));
    if start >= end {
        return report;
    }
    debug!("scanning mapped span {}..{}", span.start, span.end);

    let mut pos = if start == 0 {
        0
    } else {
        let from = start - 1;
        let next = line_end(data, from);
        report.bytes_read += (next - from) as u64;
        next
    };

    while pos < end {
        let next = line_end(data, pos);
        report.bytes_read += (next - pos) as u64;
        report.record_line(&data[pos..next], pos as u64, sink);
        pos = next;
    }
    report
}

/// Offset just past the newline ending the line that contains `from`, or
/// the end of `data` for an unterminated last line.
fn line_end(data: &[u8], from: usize) -> usize {
    memchr(b'\n', &data[from..]).map_or(data.len(), |i| from + i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::plan;
    use crate::PresenceSet;

    #[test]
    fn test_mapped_scan_matches_any_split() {
        let data = b"8.8.8.8\ninvalid\n\n8.8.8.8\n1.1.1.1\n255.255.255.255\n0.0.0.0";
        for workers in (1..=8).chain([data.len() as u64 + 2]) {
            let set = PresenceSet::new();
            let mut skipped = 0;
            for span in plan(data.len() as u64, workers) {
                let report = scan_slice(data, span, &set);
                assert!(!report.is_truncated());
                skipped += report.skipped;
            }
            assert_eq!(set.count(), 4, "workers = {workers}");
            assert_eq!(skipped, 2, "workers = {workers}");
        }
    }

    #[test]
    fn test_mapped_span_starting_on_line_start_keeps_line() {
        let data = b"1.1.1.1\n2.2.2.2\n";
        let set = PresenceSet::new();
        let report = scan_slice(data, FileSpan { start: 8, end: 16 }, &set);
        assert_eq!(report.lines, 1);
        assert_eq!(report.bytes_read, 9);
        assert!(set.contains(0x0202_0202));
        assert!(!set.contains(0x0101_0101));
    }

    #[test]
    fn test_line_end() {
        assert_eq!(line_end(b"ab\ncd", 0), 3);
        assert_eq!(line_end(b"ab\ncd", 2), 3);
        assert_eq!(line_end(b"ab\ncd", 3), 5);
    }
}
