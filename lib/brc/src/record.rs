use crate::constants::KEY_SEPARATOR;
use memchr::memchr;

/// One parsed `key;value` line, borrowing the key from the chunk buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Record<'a> {
    pub key: &'a str,
    pub value: f64,
}

/// Parses a single line (without its terminator).
///
/// Returns `None` for anything that is not a record: blank lines, lines with no
/// `;`, keys that are not UTF-8, and values that do not parse as a finite float.
/// The key is split at the first separator and kept verbatim; whitespace around
/// the value (including a trailing `\r`) is ignored.
pub fn parse_line(line: &[u8]) -> Option<Record<'_>> {
    if line.iter().all(u8::is_ascii_whitespace) { return None; }
    let sep = memchr(KEY_SEPARATOR, line)?;
    let key = std::str::from_utf8(&line[..sep]).ok()?;
    let value = std::str::from_utf8(&line[sep + 1..]).ok()?.trim();
    let value: f64 = value.parse().ok()?;
    if !value.is_finite() { return None; }
    Some(Record { key, value })
}
