/*! Character sources that the matcher can read from.

The matcher doesn't care how the characters are stored, it only needs to
get the character at some index, and to know whether some index is past
the end of the input. Anything implementing [`Input`] can be matched.
*/

use std::cell::{Cell, RefCell};
use std::io::{self, Read};

#[cfg(feature = "logging")]
use log::*;

/// Random access to a sequence of characters.
pub trait Input {
    /// Returns the character at index `i`.
    ///
    /// # Panics
    ///
    /// Implementations may panic if `is_end(i)` is true.
    fn char_at(&self, i: usize) -> char;

    /// Returns true if `i` is at the end of the input or past it.
    fn is_end(&self, i: usize) -> bool;
}

impl Input for [char] {
    #[inline]
    fn char_at(&self, i: usize) -> char {
        self[i]
    }

    #[inline]
    fn is_end(&self, i: usize) -> bool {
        i >= self.len()
    }
}

impl Input for Vec<char> {
    #[inline]
    fn char_at(&self, i: usize) -> char {
        self[i]
    }

    #[inline]
    fn is_end(&self, i: usize) -> bool {
        i >= self.len()
    }
}

impl<T: Input + ?Sized> Input for &T {
    #[inline]
    fn char_at(&self, i: usize) -> char {
        (**self).char_at(i)
    }

    #[inline]
    fn is_end(&self, i: usize) -> bool {
        (**self).is_end(i)
    }
}

/// A string decoded into characters, which remembers where each character
/// starts in the original string.
pub struct StrInput<'a> {
    s: &'a str,
    chars: Vec<char>,
    /// Byte offset of each character, plus the length of the string.
    offsets: Vec<usize>,
}

impl<'a> StrInput<'a> {
    /// Decodes `s`.
    pub fn new(s: &'a str) -> Self {
        let mut chars = Vec::with_capacity(s.len());
        let mut offsets = Vec::with_capacity(s.len() + 1);

        for (offset, c) in s.char_indices() {
            chars.push(c);
            offsets.push(offset);
        }

        offsets.push(s.len());

        Self { s, chars, offsets }
    }

    /// The original string.
    #[inline]
    pub fn as_str(&self) -> &'a str {
        self.s
    }

    /// Number of characters.
    #[inline]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// The decoded characters.
    #[inline]
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Byte offset where the character at index `i` starts. For `i` equal
    /// to the number of characters it returns the length of the string.
    ///
    /// # Panics
    ///
    /// If `i` is greater than the number of characters.
    #[inline]
    pub fn byte_offset(&self, i: usize) -> usize {
        self.offsets[i]
    }

    /// Returns the substring between character indexes `start` and `end`.
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.s[self.byte_offset(start)..self.byte_offset(end)]
    }
}

impl Input for StrInput<'_> {
    #[inline]
    fn char_at(&self, i: usize) -> char {
        self.chars[i]
    }

    #[inline]
    fn is_end(&self, i: usize) -> bool {
        i >= self.chars.len()
    }
}

/// Reads characters from a [`Read`] as the matcher asks for them.
///
/// The data is expected to be UTF-8, invalid sequences are replaced with
/// U+FFFD. Characters are kept in memory once they are read, because the
/// matcher can go back to any previous position.
pub struct ReaderInput<R: Read> {
    reader: RefCell<R>,
    chars: RefCell<Vec<char>>,
    /// Bytes read but not decoded yet, which can be at most the beginning of
    /// a multi-byte sequence.
    pending: RefCell<Vec<u8>>,
    eof: Cell<bool>,
    /// Error that ended the input prematurely.
    error: RefCell<Option<io::Error>>,
}

impl<R: Read> ReaderInput<R> {
    /// Creates an input that reads from `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader: RefCell::new(reader),
            chars: RefCell::new(Vec::new()),
            pending: RefCell::new(Vec::new()),
            eof: Cell::new(false),
            error: RefCell::new(None),
        }
    }

    /// Characters read so far.
    pub fn buffered(&self) -> Vec<char> {
        self.chars.borrow().clone()
    }

    /// Returns the I/O error that stopped the reading, if any. The input
    /// ends where the error occurred, so a search that returned no match
    /// may have missed one after that point.
    pub fn take_error(&self) -> Option<io::Error> {
        self.error.borrow_mut().take()
    }

    /// Reads until there are more than `i` characters, or the reader is
    /// exhausted. An I/O error ends the input, and is kept for
    /// [`ReaderInput::take_error`].
    fn fill(&self, i: usize) {
        let mut buf = [0_u8; 4096];

        while !self.eof.get() && self.chars.borrow().len() <= i {
            let n = match self.reader.borrow_mut().read(&mut buf) {
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {
                    continue
                }
                Err(err) => {
                    #[cfg(feature = "logging")]
                    warn!(
                        "input truncated after {} characters: {}",
                        self.chars.borrow().len(),
                        err
                    );
                    *self.error.borrow_mut() = Some(err);
                    0
                }
            };

            let mut pending = self.pending.borrow_mut();

            if n == 0 {
                self.eof.set(true);
                if !pending.is_empty() {
                    self.chars.borrow_mut().push(char::REPLACEMENT_CHARACTER);
                    pending.clear();
                }
                break;
            }

            pending.extend_from_slice(&buf[..n]);
            let consumed = decode_utf8(&pending, &mut self.chars.borrow_mut());
            pending.drain(..consumed);
        }
    }
}

impl<R: Read> Input for ReaderInput<R> {
    fn char_at(&self, i: usize) -> char {
        self.fill(i);
        self.chars.borrow()[i]
    }

    fn is_end(&self, i: usize) -> bool {
        self.fill(i);
        i >= self.chars.borrow().len()
    }
}

/// Decodes as many characters as possible from `bytes` and appends them to
/// `chars`. Returns the number of bytes consumed, which is less than the
/// length of `bytes` only when `bytes` ends in the middle of a character.
fn decode_utf8(mut bytes: &[u8], chars: &mut Vec<char>) -> usize {
    let len = bytes.len();

    loop {
        match std::str::from_utf8(bytes) {
            Ok(s) => {
                chars.extend(s.chars());
                return len;
            }
            Err(err) => {
                let (valid, rest) = bytes.split_at(err.valid_up_to());
                // `valid` is known to be UTF-8.
                if let Ok(s) = std::str::from_utf8(valid) {
                    chars.extend(s.chars());
                }
                match err.error_len() {
                    Some(invalid) => {
                        chars.push(char::REPLACEMENT_CHARACTER);
                        bytes = &rest[invalid..];
                    }
                    // Truncated sequence at the end, wait for more bytes.
                    None => return len - rest.len(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{Input, ReaderInput, StrInput};

    #[test]
    fn str_input() {
        let input = StrInput::new("añb");

        assert_eq!(input.len(), 3);
        assert_eq!(input.char_at(1), 'ñ');
        assert!(!input.is_end(2));
        assert!(input.is_end(3));
        assert_eq!(input.byte_offset(2), 3);
        assert_eq!(input.byte_offset(3), 4);
        assert_eq!(input.slice(1, 3), "ñb");
    }

    #[test]
    fn reader_input() {
        let input = ReaderInput::new("añb".as_bytes());

        assert_eq!(input.char_at(0), 'a');
        assert_eq!(input.char_at(1), 'ñ');
        assert!(!input.is_end(2));
        assert!(input.is_end(3));
        assert_eq!(input.buffered(), vec!['a', 'ñ', 'b']);
    }

    #[test]
    fn reader_input_invalid_utf8() {
        let input = ReaderInput::new(&[b'a', 0xff, b'b', 0xc3][..]);

        assert_eq!(input.char_at(0), 'a');
        assert_eq!(input.char_at(1), char::REPLACEMENT_CHARACTER);
        assert_eq!(input.char_at(2), 'b');
        assert_eq!(input.char_at(3), char::REPLACEMENT_CHARACTER);
        assert!(input.is_end(4));
    }

    /// A reader that returns one byte at a time, so that multi-byte
    /// characters arrive split.
    struct OneByte<'a>(&'a [u8]);

    impl std::io::Read for OneByte<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.0.split_first() {
                Some((first, rest)) if !buf.is_empty() => {
                    buf[0] = *first;
                    self.0 = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    #[test]
    fn reader_input_split_characters() {
        let input = ReaderInput::new(OneByte("€x".as_bytes()));

        assert_eq!(input.char_at(0), '€');
        assert_eq!(input.char_at(1), 'x');
        assert!(input.is_end(2));
    }

    /// A reader that fails after returning its data.
    struct Failing<'a>(&'a [u8]);

    impl std::io::Read for Failing<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.0.is_empty() {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "broken pipe",
                ));
            }
            let n = self.0.len().min(buf.len());
            buf[..n].copy_from_slice(&self.0[..n]);
            self.0 = &self.0[n..];
            Ok(n)
        }
    }

    #[test]
    fn reader_input_error() {
        let input = ReaderInput::new(Failing(b"ab"));

        assert_eq!(input.char_at(1), 'b');
        assert!(input.take_error().is_none());

        // The input ends where the error happened.
        assert!(input.is_end(2));

        let err = input.take_error().unwrap();
        assert_eq!(err.kind(), std::io::ErrorKind::Other);
        assert!(input.take_error().is_none());
        assert!(input.is_end(2));
    }
}
