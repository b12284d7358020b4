use crate::constants::LINE_TERMINATOR;
use anyhow::{Context, Result};
use memchr::memchr;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Opens the input file and returns it together with its length in bytes.
pub fn open_input(path: impl AsRef<Path>) -> Result<(BufReader<File>, u64)> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let len = file.metadata().with_context(|| format!("stat {}", path.display()))?.len();
    Ok((BufReader::new(file), len))
}

/// Appends up to `limit` bytes from `reader` to `buf`, reading until the window
/// is full or the stream ends. Returns the number of bytes appended; `0` means
/// end of stream.
pub fn read_window<R: Read>(reader: &mut R, buf: &mut Vec<u8>, limit: usize) -> std::io::Result<usize> {
    reader.take(limit as u64).read_to_end(buf)
}

/// Iterates the lines of `block` without their terminators. A final line with
/// no terminator is yielded too; the empty tail after a final terminator is not.
pub fn split_lines(block: &[u8]) -> impl Iterator<Item = &[u8]> + '_ {
    let mut rest = block;
    std::iter::from_fn(move || {
        if rest.is_empty() { return None; }
        match memchr(LINE_TERMINATOR, rest) {
            Some(i) => {
                let line = &rest[..i];
                rest = &rest[i + 1..];
                Some(line)
            }
            None => {
                let line = rest;
                rest = &[];
                Some(line)
            }
        }
    })
}
