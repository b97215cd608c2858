//! Streaming line search

use std::io::{self, BufRead, Write};

/// Write every line of `reader` containing `term` to `sink` as
/// `[label] line`, one line at a time. Returns the number of matches.
pub fn scan_lines<R, W>(mut reader: R, term: &str, label: &str, sink: &mut W) -> io::Result<usize>
where
    R: BufRead,
    W: Write + ?Sized,
{
    let mut buf = Vec::new();
    let mut matches = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }

        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }

        let line = String::from_utf8_lossy(&buf);
        if line.contains(term) {
            writeln!(sink, "[{label}] {line}")?;
            matches += 1;
        }
    }

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_scan_prefixes_matches() {
        let mut out = Vec::new();
        let input = Cursor::new("error: x\nok\nerror: z");
        let n = scan_lines(input, "error", "a.log", &mut out).unwrap();
        assert_eq!(n, 2);
        assert_eq!(String::from_utf8(out).unwrap(), "[a.log] error: x\n[a.log] error: z\n");
    }

    #[test]
    fn test_scan_no_match() {
        let mut out = Vec::new();
        let n = scan_lines(Cursor::new("ok\r\nfine\r\n"), "error", "a.log", &mut out).unwrap();
        assert_eq!(n, 0);
        assert!(out.is_empty());
    }
}
