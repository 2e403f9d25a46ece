//! Partitioning of a file's byte range into per-worker spans.

/// Half-open byte range `[start, end)` of the input assigned to one worker.
///
/// A span owns every line whose first byte lies inside it, even when the
/// line runs past `end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileSpan {
    /// First byte offset of the span.
    pub start: u64,
    /// One past the last byte offset of the span.
    pub end: u64,
}

impl FileSpan {
    /// Returns `true` if the span begins at byte 0.
    pub fn is_first(&self) -> bool {
        self.start == 0
    }

    /// Number of bytes nominally assigned to the span.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Returns `true` if the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Splits `[0, file_size)` into exactly `workers` contiguous spans.
///
/// Every span but the last is `file_size / workers` bytes long; the last
/// one absorbs the remainder. When there are more workers than bytes the
/// leading spans are empty.
///
/// `workers` must be at least 1; callers reject 0 before planning.
///
/// ```
/// let spans = uniqip::plan(10, 3);
/// assert_eq!(spans.len(), 3);
/// assert_eq!((spans[0].start, spans[0].end), (0, 3));
/// assert_eq!((spans[2].start, spans[2].end), (6, 10));
/// ```
pub fn plan(file_size: u64, workers: u64) -> Vec<FileSpan> {
    debug_assert!(workers >= 1, "worker count must be at least 1");
    let block = file_size / workers;

    (0..workers)
        .map(|i| {
            let start = block * i;
            let end = if i + 1 == workers {
                file_size
            } else {
                start + block
            };
            FileSpan { start, end }
        })
        .collect()
}
