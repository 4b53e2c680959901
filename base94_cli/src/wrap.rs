//! Adapts an [`io::Write`] into a [`fmt::Write`] that breaks lines.

use std::{fmt, io};

/// Writes text to an inner writer, inserting a line break every `width`
/// characters.
///
/// Since [`fmt::Write`] cannot carry the underlying error, the first
/// [`io::Error`] is kept and returned by [`finish`](Self::finish).
#[derive(Debug)]
pub struct LineWriter<W> {
    inner: W,
    width: usize,
    column: usize,
    written: bool,
    error: Option<io::Error>,
}

impl<W: io::Write> LineWriter<W> {
    /// Creates a new writer. A `width` of 0 disables line breaks.
    pub fn new(inner: W, width: usize) -> Self {
        Self {
            inner,
            width,
            column: 0,
            written: false,
            error: None,
        }
    }

    /// Terminates the last line and returns the inner writer.
    ///
    /// # Errors
    ///
    /// Returns the first error the inner writer returned, if any.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(why) = self.error.take() {
            return Err(why);
        }

        // a completely filled last line already ended with a line break
        if self.column != 0 || self.width == 0 || !self.written {
            self.inner.write_all(b"\n")?;
        }

        Ok(self.inner)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> fmt::Result {
        self.written |= !bytes.is_empty();
        if let Err(why) = self.inner.write_all(bytes) {
            self.error = Some(why);
            return Err(fmt::Error);
        }

        Ok(())
    }
}

impl<W: io::Write> fmt::Write for LineWriter<W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.width == 0 {
            return self.write_bytes(s.as_bytes());
        }

        s.chars().try_for_each(|c| self.write_char(c))
    }

    fn write_char(&mut self, c: char) -> fmt::Result {
        let mut buf = [0u8; 4];
        self.write_bytes(c.encode_utf8(&mut buf).as_bytes())?;

        if self.width != 0 {
            self.column += 1;
            if self.column == self.width {
                self.column = 0;
                self.write_bytes(b"\n")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Write as _;

    use super::*;

    fn wrapped(width: usize, text: &str) -> String {
        let mut writer = LineWriter::new(Vec::new(), width);
        writer.write_str(text).expect("write to Vec cannot fail");
        let out = writer.finish().expect("write to Vec cannot fail");
        String::from_utf8(out).expect("output must be utf-8")
    }

    #[test]
    fn no_wrap() {
        assert_eq!(wrapped(0, "abcdef"), "abcdef\n");
        assert_eq!(wrapped(0, ""), "\n");
    }

    #[test]
    fn wraps_lines() {
        assert_eq!(wrapped(4, "abcdefghij"), "abcd\nefgh\nij\n");
        assert_eq!(wrapped(3, "abcdef"), "abc\ndef\n");
        assert_eq!(wrapped(1, "ab"), "a\nb\n");
        assert_eq!(wrapped(4, ""), "\n");
    }

    #[test]
    fn wraps_across_writes() {
        let mut writer = LineWriter::new(Vec::new(), 3);
        for c in ["ab", "cd", "e"] {
            writer.write_str(c).expect("write to Vec cannot fail");
        }

        let out = writer.finish().expect("write to Vec cannot fail");
        assert_eq!(out, b"abc\nde\n");
    }

    #[test]
    fn keeps_io_error() {
        #[derive(Debug)]
        struct Broken;
        impl io::Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::other("broken pipe"))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut writer = LineWriter::new(Broken, 0);
        writer.write_str("abc").expect_err("inner writer fails");

        let err = writer.finish().expect_err("error must be kept");
        assert_eq!(err.to_string(), "broken pipe");
    }
}
