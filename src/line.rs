use crate::constants::{CR, LF};

/// Scan state of the line currently being read.
///
/// A line starts at an offset the caller supplies on every call and is found
/// incrementally: `len` doubles as the resume cursor, so bytes already looked
/// at are never scanned again after the input grew.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Line {
    len: usize,
    complete: bool,
    crlf: bool,
    /// Completed by the end of input rather than by `\n`.
    eof: bool,
    final_boundary: bool,
    /// Number of delimiter bytes already verified against the line's prefix.
    matched: usize,
    /// The line is known not to be a boundary.
    disqualified: bool,
}

impl Line {
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_final_boundary(&self) -> bool {
        self.final_boundary
    }

    /// Looks for the line terminator in `buf[start..]`, resuming where the
    /// previous call stopped. Returns whether the line is complete.
    pub(crate) fn scan(&mut self, buf: &[u8], start: usize) -> bool {
        if self.complete {
            return true;
        }

        let from = start + self.len;
        if from >= buf.len() {
            return false;
        }

        match memchr::memchr(LF, &buf[from..]) {
            Some(idx) => {
                self.len += idx + 1;
                self.complete = true;
                self.crlf = self.len >= 2 && buf[start + self.len - 2] == CR;
                true
            }
            None => {
                self.len = buf.len() - start;
                false
            }
        }
    }

    /// Treats the bytes scanned so far as a whole line without terminator.
    pub(crate) fn complete_at_eof(&mut self) {
        self.complete = true;
        self.crlf = false;
        self.eof = true;
    }

    /// 0 for a line completed by the end of input, otherwise 1 or 2.
    pub(crate) fn terminator_len(&self) -> usize {
        if self.eof {
            0
        } else if self.crlf {
            2
        } else {
            1
        }
    }

    /// The line without its terminator.
    pub(crate) fn content<'a>(&self, buf: &'a [u8], start: usize) -> &'a [u8] {
        &buf[start..start + self.len - self.terminator_len()]
    }

    /// Checks a complete line against `--boundary` and `--boundary--`.
    pub(crate) fn check_boundary(&mut self, buf: &[u8], start: usize, delimiter: &[u8]) -> bool {
        debug_assert!(self.complete);

        if self.disqualified {
            return false;
        }

        let content = self.content(buf, start);
        if !content.starts_with(delimiter) {
            return false;
        }

        match &content[delimiter.len()..] {
            b"" => true,
            b"--" => {
                self.final_boundary = true;
                true
            }
            _ => false,
        }
    }

    /// Whether an incomplete line can still turn into a boundary line once
    /// its terminator arrives. Progress is remembered, a negative answer is
    /// sticky.
    pub(crate) fn could_be_boundary(&mut self, buf: &[u8], start: usize, delimiter: &[u8]) -> bool {
        if self.disqualified {
            return false;
        }

        let line = &buf[start..start + self.len];
        let checked = std::cmp::min(self.len, delimiter.len());

        if line[self.matched..checked] != delimiter[self.matched..checked] {
            self.disqualified = true;
            return false;
        }
        self.matched = checked;

        // what may sit between the delimiter and the `\n` still to come
        let could_be = matches!(&line[checked..], b"" | b"\r" | b"-" | b"--" | b"--\r");
        if !could_be {
            self.disqualified = true;
        }

        could_be
    }

    /// Keeps only the last scanned byte in the line, which might be a `\r`
    /// whose `\n` has not arrived yet. Only valid for a disqualified line.
    pub(crate) fn retain_last_byte(&mut self) {
        debug_assert!(self.disqualified && !self.complete);
        self.len = 1;
    }

    pub(crate) fn reset(&mut self) {
        *self = Line::default();
    }
}
