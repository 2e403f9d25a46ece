//! Line parsing.

use std::net::Ipv4Addr;

#[cfg(feature = "simdutf8")]
use simdutf8::basic::from_utf8;
#[cfg(not(feature = "simdutf8"))]
use std::str::from_utf8;

/// Strips one trailing `\n` and then one trailing `\r`.
pub(crate) fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Parses a single line as a dotted-decimal IPv4 address.
///
/// The line may still carry its terminator. The returned value has octet 0
/// in the most significant byte. Blank lines, surrounding whitespace,
/// leading zeros and anything that is not strict dotted-decimal yield
/// `None`.
///
/// ```
/// assert_eq!(uniqip::parse_line(b"10.0.0.1\n"), Some(0x0A00_0001));
/// assert_eq!(uniqip::parse_line(b"invalid"), None);
/// ```
pub fn parse_line(line: &[u8]) -> Option<u32> {
    let text = from_utf8(trim_line_ending(line)).ok()?;
    text.parse::<Ipv4Addr>().ok().map(u32::from)
}
