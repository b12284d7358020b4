use crate::constants::LINE_TERMINATOR;
use crate::io::{read_window, split_lines};
use anyhow::{Context, Result};
use memchr::memrchr;
use std::io::Read;

/// A block of complete lines, the unit of parallel work.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    pub seq: usize,
    pub data: Vec<u8>,
    /// Set on the trailing fragment of an input with no final terminator.
    pub is_tail: bool,
}

impl Chunk {
    pub fn lines(&self) -> impl Iterator<Item = &[u8]> + '_ { split_lines(&self.data) }

    pub fn len(&self) -> usize { self.data.len() }

    pub fn is_empty(&self) -> bool { self.data.is_empty() }
}

/// Reads a byte stream in fixed windows and yields line-aligned chunks.
///
/// The bytes after the last terminator of a window are held back and prepended
/// to the next window, so no line ever straddles two chunks. Concatenating the
/// `data` of every chunk reproduces the input exactly.
pub struct Chunker<R> {
    reader: R,
    window: usize,
    carry: Vec<u8>,
    next_seq: usize,
    windows_read: u64,
    bytes_read: u64,
    done: bool,
}

impl<R: Read> Chunker<R> {
    pub fn new(reader: R, window: usize) -> Self {
        Self { reader, window: window.max(1), carry: Vec::new(), next_seq: 0, windows_read: 0, bytes_read: 0, done: false }
    }

    pub fn bytes_read(&self) -> u64 { self.bytes_read }

    pub fn windows_read(&self) -> u64 { self.windows_read }

    pub fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        while !self.done {
            let mut buf = std::mem::take(&mut self.carry);
            buf.reserve(self.window);
            let n = match read_window(&mut self.reader, &mut buf, self.window) {
                Ok(n) => n,
                Err(e) => {
                    self.done = true;
                    return Err(e).with_context(|| format!("read window {} at byte {}", self.windows_read, self.bytes_read));
                }
            };
            self.bytes_read += n as u64;
            if n == 0 {
                self.done = true;
                if buf.is_empty() { return Ok(None); }
                return Ok(Some(self.emit(buf, true)));
            }
            self.windows_read += 1;
            match memrchr(LINE_TERMINATOR, &buf) {
                Some(last) => {
                    self.carry = buf.split_off(last + 1);
                    return Ok(Some(self.emit(buf, false)));
                }
                // no complete line yet, keep reading
                None => self.carry = buf,
            }
        }
        Ok(None)
    }

    fn emit(&mut self, data: Vec<u8>, is_tail: bool) -> Chunk {
        let seq = self.next_seq;
        self.next_seq += 1;
        Chunk { seq, data, is_tail }
    }
}

impl<R: Read> Iterator for Chunker<R> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> { self.next_chunk().transpose() }
}

/// Number of windows needed to cover `total_len` bytes.
pub fn estimate_windows(total_len: u64, window: usize) -> u64 {
    let window = window.max(1) as u64;
    total_len.div_ceil(window)
}
