use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::ScanError;

/// Size of the fixed-size window read from the underlying file on each
/// refill. 4096 matches the reference implementation.
pub const BUFFER_SIZE: usize = 4096;

/// A single byte from the stream, or end-of-file.
///
/// Per the "exceptions for control flow on EOF" design note, EOF is
/// represented as a value rather than a `-1` sentinel or a thrown error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Byte {
    Value(u8),
    Eof,
}

impl Byte {
    pub fn is_eof(self) -> bool {
        matches!(self, Byte::Eof)
    }

    pub fn value(self) -> Option<u8> {
        match self {
            Byte::Value(b) => Some(b),
            Byte::Eof => None,
        }
    }
}

/// A monotonic, buffered forward cursor over a random-access file.
///
/// Wraps a [`File`] and a fixed-size window of already-read bytes. Callers
/// may request any offset at or after the previously returned offset; the
/// one exception is [`seek`](Self::seek), which may rewind to any offset
/// still inside the current window, used by the identifier extractor to
/// re-read the matched header region after the KMP scanner has found it.
///
/// A KMP match can start up to `pattern.len() - 1` bytes before the byte
/// that confirms it, so a match straddling a buffer refill would otherwise
/// become unseekable the instant the window moves past it. On each refill
/// the trailing `retain` bytes of the outgoing window are carried over to
/// the front of the new one before fresh bytes are read in behind them —
/// the same boundary-crossing trick the teacher crate uses in its chunked
/// `Matches` iterator, generalized into a constructor parameter instead of
/// being hardcoded to one pattern's length.
pub struct BufferedForwardReader {
    file: File,
    buf: Vec<u8>,
    retain: usize,
    /// File offset of `buf[0]`.
    window_start: u64,
    /// Number of valid bytes in `buf`, starting at `window_start`.
    window_len: usize,
    /// Offset most recently returned by `byte_at`/`next_byte`.
    last_offset: Option<u64>,
}

impl BufferedForwardReader {
    /// Open `path` for random access and pre-read the first buffer's worth
    /// of bytes. The logical cursor starts at offset 0. Equivalent to
    /// [`with_retention`](Self::with_retention) with `retain = 0`, so
    /// [`seek`](Self::seek) only ever rewinds within the most recent read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ScanError> {
        Self::with_retention(path, 0)
    }

    /// As [`open`](Self::open), but carrying `retain` trailing bytes of
    /// each window forward across a refill so they stay seekable. Callers
    /// that will rewind to a KMP match start should pass the pattern's
    /// length (or more).
    pub fn with_retention(path: impl AsRef<Path>, retain: usize) -> Result<Self, ScanError> {
        let file = File::open(path)?;
        Self::from_file_with_retention(file, retain)
    }

    /// As [`open`](Self::open) but from an already-open [`File`].
    pub fn from_file(file: File) -> Result<Self, ScanError> {
        Self::from_file_with_retention(file, 0)
    }

    /// As [`with_retention`](Self::with_retention) but from an already-open
    /// [`File`].
    pub fn from_file_with_retention(mut file: File, retain: usize) -> Result<Self, ScanError> {
        if retain >= BUFFER_SIZE {
            return Err(ScanError::invalid_usage(format!(
                "retention margin {retain} must be smaller than the buffer size {BUFFER_SIZE}"
            )));
        }
        let mut buf = vec![0u8; BUFFER_SIZE];
        let window_len = fill_buffer(&mut file, &mut buf)?;
        Ok(Self {
            file,
            buf,
            retain,
            window_start: 0,
            window_len,
            last_offset: None,
        })
    }

    /// Return the byte at `offset`, or [`Byte::Eof`] past the end of the
    /// file. Fails with [`ScanError::InvalidUsage`] if `offset` is strictly
    /// less than the previously returned offset.
    pub fn byte_at(&mut self, offset: u64) -> Result<Byte, ScanError> {
        if let Some(last) = self.last_offset {
            if offset < last {
                return Err(ScanError::invalid_usage(format!(
                    "requested offset {offset} precedes previous offset {last}"
                )));
            }
        }
        if offset < self.window_start {
            return Err(ScanError::invalid_usage(format!(
                "requested offset {offset} is before the earliest retained byte {}",
                self.window_start
            )));
        }

        loop {
            let window_end = self.window_start + self.window_len as u64;
            if offset < window_end {
                self.last_offset = Some(offset);
                let idx = (offset - self.window_start) as usize;
                return Ok(Byte::Value(self.buf[idx]));
            }
            if self.window_len < self.buf.len() {
                // The last read was short: the underlying file has no more bytes.
                self.last_offset = Some(offset);
                return Ok(Byte::Eof);
            }
            self.refill()?;
        }
    }

    /// Equivalent to `byte_at(previous_offset + 1)`, or `byte_at(0)` before
    /// any byte has been read.
    pub fn next_byte(&mut self) -> Result<Byte, ScanError> {
        let next_offset = match self.last_offset {
            Some(o) => o + 1,
            None => 0,
        };
        self.byte_at(next_offset)
    }

    /// Reposition the cursor so the next [`next_byte`](Self::next_byte)
    /// call returns the byte at `offset`. `offset` must fall inside the
    /// current window: `window_start <= offset < window_start + window_len`.
    pub fn seek(&mut self, offset: u64) -> Result<(), ScanError> {
        let window_end = self.window_start + self.window_len as u64;
        if offset < self.window_start || offset >= window_end {
            return Err(ScanError::invalid_usage(format!(
                "seek offset {offset} outside current window [{}, {window_end})",
                self.window_start
            )));
        }
        self.last_offset = offset.checked_sub(1);
        Ok(())
    }

    /// Consume the reader, releasing the underlying file handle. Dropping
    /// the reader without calling this has the same effect; `close` exists
    /// so a caller can make the release point explicit in a scan.
    pub fn close(self) {
        drop(self);
    }

    fn refill(&mut self) -> Result<(), ScanError> {
        let keep = self.retain.min(self.window_len);
        if keep > 0 {
            self.buf.copy_within(self.window_len - keep..self.window_len, 0);
        }
        self.window_start += (self.window_len - keep) as u64;
        let read = fill_buffer(&mut self.file, &mut self.buf[keep..])?;
        self.window_len = keep + read;
        Ok(())
    }
}

/// Read into `buf` until it is full or the file is exhausted.
///
/// A single `Read::read` call is not guaranteed to fill its buffer even
/// when more bytes remain, so the short-read check the cursor relies on
/// (`window_len < buf.len()` means true EOF) requires looping here.
fn fill_buffer(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fixture(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(bytes).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn reads_sequential_bytes() {
        let f = fixture(b"abcdef");
        let mut r = BufferedForwardReader::open(f.path()).unwrap();
        assert_eq!(r.next_byte().unwrap(), Byte::Value(b'a'));
        assert_eq!(r.next_byte().unwrap(), Byte::Value(b'b'));
        assert_eq!(r.byte_at(5).unwrap(), Byte::Value(b'f'));
        assert_eq!(r.next_byte().unwrap(), Byte::Eof);
    }

    #[test]
    fn rejects_non_monotonic_offset() {
        let f = fixture(b"abcdef");
        let mut r = BufferedForwardReader::open(f.path()).unwrap();
        r.byte_at(3).unwrap();
        assert!(r.byte_at(1).is_err());
    }

    #[test]
    fn seek_rewinds_within_window() {
        let f = fixture(b"abcdef");
        let mut r = BufferedForwardReader::open(f.path()).unwrap();
        r.byte_at(4).unwrap();
        r.seek(1).unwrap();
        assert_eq!(r.next_byte().unwrap(), Byte::Value(b'b'));
        assert_eq!(r.next_byte().unwrap(), Byte::Value(b'c'));
    }

    #[test]
    fn seek_outside_window_fails() {
        let data = vec![b'x'; BUFFER_SIZE + 10];
        let f = fixture(&data);
        let mut r = BufferedForwardReader::open(f.path()).unwrap();
        r.byte_at((BUFFER_SIZE + 5) as u64).unwrap();
        assert!(r.seek(0).is_err());
    }

    #[test]
    fn crosses_buffer_boundary() {
        let mut data = vec![0u8; BUFFER_SIZE - 2];
        data.extend_from_slice(b"WXYZ");
        let f = fixture(&data);
        let mut r = BufferedForwardReader::open(f.path()).unwrap();
        for offset in 0..(BUFFER_SIZE - 2) as u64 {
            assert_eq!(r.byte_at(offset).unwrap(), Byte::Value(0));
        }
        assert_eq!(r.next_byte().unwrap(), Byte::Value(b'W'));
        assert_eq!(r.next_byte().unwrap(), Byte::Value(b'X'));
        assert_eq!(r.next_byte().unwrap(), Byte::Value(b'Y'));
        assert_eq!(r.next_byte().unwrap(), Byte::Value(b'Z'));
        assert_eq!(r.next_byte().unwrap(), Byte::Eof);
    }

    #[test]
    fn empty_file_is_immediate_eof() {
        let f = fixture(b"");
        let mut r = BufferedForwardReader::open(f.path()).unwrap();
        assert_eq!(r.next_byte().unwrap(), Byte::Eof);
    }

    #[test]
    fn retention_keeps_match_start_seekable_across_refill() {
        let pattern = b"ABCDEF";
        let mut data = vec![0u8; BUFFER_SIZE - 3];
        data.extend_from_slice(pattern);
        let f = fixture(&data);
        let match_offset = (BUFFER_SIZE - 3) as u64;

        let mut r = BufferedForwardReader::with_retention(f.path(), pattern.len()).unwrap();
        for (i, &expected) in pattern.iter().enumerate() {
            assert_eq!(r.byte_at(match_offset + i as u64).unwrap(), Byte::Value(expected));
        }
        // The match spanned the BUFFER_SIZE boundary; seeking back to its
        // start must still succeed thanks to the retained margin.
        r.seek(match_offset).unwrap();
        assert_eq!(r.next_byte().unwrap(), Byte::Value(b'A'));
        assert_eq!(r.next_byte().unwrap(), Byte::Value(b'B'));
    }

    #[test]
    fn zero_retention_loses_the_pre_boundary_bytes() {
        let mut data = vec![0u8; BUFFER_SIZE - 1];
        data.extend_from_slice(b"XY");
        let f = fixture(&data);
        let mut r = BufferedForwardReader::open(f.path()).unwrap();
        r.byte_at((BUFFER_SIZE - 1) as u64).unwrap();
        r.byte_at(BUFFER_SIZE as u64).unwrap();
        assert!(r.seek((BUFFER_SIZE - 1) as u64).is_err());
    }
}
