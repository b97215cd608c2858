//! Reverse line reading for tailing large log files
//!
//! [`ReverseLineReader`] walks a seekable stream from the end toward the
//! start in fixed-size blocks, so memory use is bounded by the block size
//! plus the longest line, never by the file size.

use std::io::{self, Read, Seek, SeekFrom, Write};

/// Block size used when reading backward
pub const DEFAULT_BLOCK_SIZE: usize = 8 * 1024;

/// Lazy, finite sequence of lines, most recent first
///
/// Lines are split on `\n`; a trailing `\r` is dropped. A line terminator at
/// the very end of the stream does not yield an extra empty line. Bytes that
/// are not valid UTF-8 are replaced lossily.
///
/// The reader cannot be rewound; reopen the underlying stream to start over.
pub struct ReverseLineReader<R> {
    reader: R,
    /// Start offset of the region not yet pulled into `head`
    pos: u64,
    /// Earliest block read so far, not yet searched past its last `\n`
    head: Vec<u8>,
    /// Newline-free blocks of the current partial line that follow `head`,
    /// latest block first
    rest: Vec<Vec<u8>>,
    block_size: usize,
    /// Whether another line remains, even if nothing is buffered or unread
    has_line: bool,
}

impl<R: Read + Seek> ReverseLineReader<R> {
    pub fn new(reader: R) -> io::Result<Self> {
        Self::with_block_size(reader, DEFAULT_BLOCK_SIZE)
    }

    pub fn with_block_size(mut reader: R, block_size: usize) -> io::Result<Self> {
        let len = reader.seek(SeekFrom::End(0))?;
        let mut pos = len;

        if len > 0 {
            let mut last = [0u8; 1];
            reader.seek(SeekFrom::Start(len - 1))?;
            reader.read_exact(&mut last)?;
            if last[0] == b'\n' {
                pos -= 1;
            }
        }

        Ok(Self {
            reader,
            pos,
            head: Vec::new(),
            rest: Vec::new(),
            block_size: block_size.max(1),
            has_line: len > 0,
        })
    }

    /// Park `head` in `rest` and read the block before `pos` into `head`
    fn fill(&mut self) -> io::Result<()> {
        let start = self.pos.saturating_sub(self.block_size as u64);
        let len = (self.pos - start) as usize;

        let mut block = vec![0u8; len];
        self.reader.seek(SeekFrom::Start(start))?;
        self.reader.read_exact(&mut block)?;

        let scanned = std::mem::replace(&mut self.head, block);
        if !scanned.is_empty() {
            self.rest.push(scanned);
        }
        self.pos = start;
        Ok(())
    }

    /// Join `first` with the parked blocks into one line
    fn take_line(&mut self, mut first: Vec<u8>) -> String {
        let len = first.len() + self.rest.iter().map(Vec::len).sum::<usize>();
        first.reserve(len - first.len());
        for block in self.rest.drain(..).rev() {
            first.extend_from_slice(&block);
        }
        decode_line(first)
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        if !self.has_line {
            return Ok(None);
        }

        loop {
            // Only `head` can hold a newline; everything in `rest` was searched
            if let Some(idx) = self.head.iter().rposition(|&b| b == b'\n') {
                let line = self.head.split_off(idx + 1);
                self.head.truncate(idx);
                return Ok(Some(self.take_line(line)));
            }

            if self.pos == 0 {
                self.has_line = false;
                let line = std::mem::take(&mut self.head);
                return Ok(Some(self.take_line(line)));
            }

            self.fill()?;
        }
    }
}

impl<R: Read + Seek> Iterator for ReverseLineReader<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_line() {
            Ok(line) => line.map(Ok),
            Err(e) => {
                self.has_line = false;
                Some(Err(e))
            }
        }
    }
}

fn decode_line(mut bytes: Vec<u8>) -> String {
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

/// Collect the last `max_lines` lines, keeping only those containing
/// `filter` when given, in top-to-bottom order.
pub fn tail_lines<I>(lines: I, max_lines: usize, filter: Option<&str>) -> io::Result<Vec<String>>
where
    I: IntoIterator<Item = io::Result<String>>,
{
    let mut collected = Vec::with_capacity(max_lines.min(1024));
    if max_lines == 0 {
        return Ok(collected);
    }

    for line in lines {
        let line = line?;
        if filter.map_or(true, |f| line.contains(f)) {
            collected.push(line);
            if collected.len() == max_lines {
                break;
            }
        }
    }

    collected.reverse();
    tracing::debug!(
        lines = collected.len(),
        max_lines,
        filtered = filter.is_some(),
        "tail collected"
    );
    Ok(collected)
}

/// Write each line followed by a `\n` separator
pub fn write_lines<W: Write + ?Sized>(sink: &mut W, lines: &[String]) -> io::Result<()> {
    for line in lines {
        sink.write_all(line.as_bytes())?;
        sink.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reversed(text: &str, block_size: usize) -> Vec<String> {
        ReverseLineReader::with_block_size(Cursor::new(text.as_bytes().to_vec()), block_size)
            .unwrap()
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    fn tail(text: &str, k: usize, filter: Option<&str>) -> Vec<String> {
        let cursor = Cursor::new(text.as_bytes().to_vec());
        let reader = ReverseLineReader::with_block_size(cursor, 3).unwrap();
        tail_lines(reader, k, filter).unwrap()
    }

    #[test]
    fn test_reverse_order_across_block_sizes() {
        for block in [1, 2, 3, 5, 64, DEFAULT_BLOCK_SIZE] {
            assert_eq!(reversed("a\nbb\nccc\n", block), vec!["ccc", "bb", "a"], "block {block}");
            assert_eq!(reversed("a\nbb\nccc", block), vec!["ccc", "bb", "a"], "block {block}");
        }
    }

    #[test]
    fn test_empty_and_blank_lines() {
        assert!(reversed("", 4).is_empty());
        assert_eq!(reversed("\n", 4), vec![""]);
        assert_eq!(reversed("a\n\nb\n", 2), vec!["b", "", "a"]);
        assert_eq!(reversed("a\n\n", 2), vec!["", "a"]);
    }

    #[test]
    fn test_crlf_is_stripped() {
        assert_eq!(reversed("one\r\ntwo\r\n", 3), vec!["two", "one"]);
    }

    #[test]
    fn test_tail_last_k_lines() {
        let text = "1\n2\n3\n4\n5\n";
        for k in 0..=5 {
            let expected: Vec<String> = (6 - k..=5).map(|n| n.to_string()).collect();
            assert_eq!(tail(text, k, None), expected);
        }
        assert_eq!(tail(text, 50, None), vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn test_tail_filter_skips_non_matching() {
        let text = "ERROR a\ninfo\nERROR b\ninfo\ninfo\nERROR c\ninfo\n";
        assert_eq!(tail(text, 2, Some("ERROR")), vec!["ERROR b", "ERROR c"]);
        assert_eq!(tail(text, 10, Some("ERROR")), vec!["ERROR a", "ERROR b", "ERROR c"]);
        assert!(tail(text, 10, Some("FATAL")).is_empty());
        assert!(tail(text, 10, Some("error")).is_empty());
    }

    #[test]
    fn test_tail_stops_pulling_at_limit() {
        let mut pulled = 0;
        let lines = (0..100).rev().map(|n| {
            pulled += 1;
            Ok(n.to_string())
        });
        let out = tail_lines(lines, 3, None).unwrap();
        assert_eq!(out, vec!["97", "98", "99"]);
        assert_eq!(pulled, 3);
    }

    #[test]
    fn test_multi_mib_single_line() {
        let long = "x".repeat(8 * 1024 * 1024 + 17);
        let text = format!("first\n{long}\r\n");

        let reader = ReverseLineReader::new(Cursor::new(text.into_bytes())).unwrap();
        let lines = tail_lines(reader, 2, None).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "first");
        assert_eq!(lines[1].len(), long.len());
        assert!(lines[1].bytes().all(|b| b == b'x'));
    }

    #[test]
    fn test_long_lines_across_many_blocks() {
        let text = format!("{}\n{}\n{}", "a".repeat(10), "b".repeat(25), "c".repeat(7));
        assert_eq!(
            reversed(&text, 4),
            vec!["c".repeat(7), "b".repeat(25), "a".repeat(10)]
        );
    }

    #[test]
    fn test_write_lines_terminates_each_line() {
        let mut out = Vec::new();
        write_lines(&mut out, &["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(out, b"a\nb\n");
    }
}
