//! Backward buffered line reader.
//!
//! Reads a file from the end in fixed-size chunks and yields lines
//! newest-first without ever holding the whole file in memory. The log
//! is owned by the server process and grows (or gets rotated)
//! concurrently; the reader snapshots the length once at the first
//! read and only walks backward from there.

use std::io::{self, SeekFrom};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

/// Chunk size for backward reads.
const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Yields the lines of a seekable stream newest-first.
///
/// Lossy UTF-8 decoding keeps the reader alive across the stray
/// non-UTF8 bytes C/C++ server binaries occasionally emit.
pub struct RevLineReader<R> {
    inner: R,
    /// File offset below which nothing has been loaded yet.
    pos: u64,
    /// Loaded-but-unemitted bytes, in file order.
    carry: Vec<u8>,
    chunk_size: usize,
    initialized: bool,
}

impl<R: AsyncRead + AsyncSeek + Unpin> RevLineReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_chunk_size(inner, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(inner: R, chunk_size: usize) -> Self {
        Self {
            inner,
            pos: 0,
            carry: Vec::new(),
            chunk_size: chunk_size.max(1),
            initialized: false,
        }
    }

    /// Next line walking toward the start of the stream, or `None` once
    /// the start has been passed.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        if !self.initialized {
            self.pos = self.inner.seek(SeekFrom::End(0)).await?;
            self.initialized = true;
            self.fill().await?;
            // A trailing newline is a line terminator, not an empty
            // final line.
            if self.carry.last() == Some(&b'\n') {
                self.carry.pop();
                if self.carry.last() == Some(&b'\r') {
                    self.carry.pop();
                }
            }
        }

        loop {
            if let Some(idx) = self.carry.iter().rposition(|&b| b == b'\n') {
                let line = decode(&self.carry[idx + 1..]);
                self.carry.truncate(idx);
                if self.carry.last() == Some(&b'\r') {
                    self.carry.pop();
                }
                return Ok(Some(line));
            }

            if self.pos == 0 {
                if self.carry.is_empty() {
                    return Ok(None);
                }
                let line = decode(&self.carry);
                self.carry.clear();
                return Ok(Some(line));
            }

            self.fill().await?;
        }
    }

    /// Load the chunk preceding the current region and prepend it to
    /// the carry buffer.
    async fn fill(&mut self) -> io::Result<()> {
        if self.pos == 0 {
            return Ok(());
        }
        let start = self.pos.saturating_sub(self.chunk_size as u64);
        let len = usize::try_from(self.pos - start).unwrap_or(self.chunk_size);

        self.inner.seek(SeekFrom::Start(start)).await?;
        let mut chunk = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            let n = self.inner.read(&mut chunk[filled..]).await?;
            if n == 0 {
                // The file shrank under us (rotation/truncation); take
                // what still exists and stop walking.
                break;
            }
            filled += n;
        }
        chunk.truncate(filled);

        if filled == 0 {
            self.pos = 0;
            return Ok(());
        }

        chunk.extend_from_slice(&self.carry);
        self.carry = chunk;
        self.pos = start;
        Ok(())
    }
}

fn decode(bytes: &[u8]) -> String {
    let mut line = String::from_utf8_lossy(bytes).into_owned();
    if line.ends_with('\r') {
        line.pop();
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tokio_test::block_on;

    async fn collect(data: &[u8], chunk_size: usize) -> Vec<String> {
        let mut reader = RevLineReader::with_chunk_size(Cursor::new(data.to_vec()), chunk_size);
        let mut lines = Vec::new();
        while let Some(line) = reader.next_line().await.unwrap() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn test_reads_newest_first() {
        let lines = block_on(collect(b"one\ntwo\nthree\n", 8192));
        assert_eq!(lines, ["three", "two", "one"]);
    }

    #[test]
    fn test_no_trailing_newline() {
        let lines = block_on(collect(b"one\ntwo\nthree", 8192));
        assert_eq!(lines, ["three", "two", "one"]);
    }

    #[test]
    fn test_crlf_endings() {
        let lines = block_on(collect(b"one\r\ntwo\r\nthree\r\n", 8192));
        assert_eq!(lines, ["three", "two", "one"]);
    }

    #[test]
    fn test_empty_stream() {
        let lines = block_on(collect(b"", 8192));
        assert!(lines.is_empty());
    }

    #[test]
    fn test_single_line_no_newline() {
        let lines = block_on(collect(b"lonely", 8192));
        assert_eq!(lines, ["lonely"]);
    }

    #[test]
    fn test_blank_lines_preserved() {
        let lines = block_on(collect(b"one\n\ntwo\n", 8192));
        assert_eq!(lines, ["two", "", "one"]);
    }

    #[test]
    fn test_lines_spanning_chunk_boundaries() {
        // Tiny chunks force every line across a fill boundary.
        let data = b"first line here\nsecond line here\nthird line here\n";
        for chunk_size in [1, 2, 3, 5, 7, 16] {
            let lines = block_on(collect(data, chunk_size));
            assert_eq!(
                lines,
                ["third line here", "second line here", "first line here"],
                "chunk_size={chunk_size}"
            );
        }
    }

    #[test]
    fn test_non_utf8_bytes_are_lossy() {
        let lines = block_on(collect(b"ok line\nbad \xff byte\n", 8192));
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("bad"));
        assert_eq!(lines[1], "ok line");
    }
}
