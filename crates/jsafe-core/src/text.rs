//! Owned byte buffer with an explicit length.

use std::borrow::Cow;
use std::fmt;
use std::os::raw::c_char;

use crate::alloc;
use crate::error::AllocError;

/// Immutable owned text.
///
/// The length is authoritative and interior NUL bytes are allowed. One extra
/// NUL is kept past the end so C callers can also read the buffer as a
/// null-terminated string. UTF-8 is expected but not checked.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Text {
    // Always ends with the hidden NUL.
    buf: Box<[u8]>,
}

impl Text {
    /// Copies `bytes` into a new buffer. Aborts if memory is exhausted.
    pub fn new(bytes: &[u8]) -> Self {
        alloc::ensure(Self::try_new(bytes))
    }

    pub(crate) fn try_new(bytes: &[u8]) -> Result<Self, AllocError> {
        Self::try_from_vec(Cow::Borrowed(bytes))
    }

    /// Takes ownership of an already built buffer without copying its contents.
    pub(crate) fn try_from_vec(bytes: Cow<'_, [u8]>) -> Result<Self, AllocError> {
        let mut buf = match bytes {
            Cow::Owned(vec) => vec,
            Cow::Borrowed(slice) => {
                let mut vec = Vec::new();
                alloc::reserve(&mut vec, slice.len() + 1, "text bytes")?;
                vec.extend_from_slice(slice);
                vec
            }
        };
        alloc::reserve(&mut buf, 1, "text bytes")?;
        buf.push(0);
        Ok(Self {
            buf: buf.into_boxed_slice(),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.buf.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.buf.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pointer to the first byte, followed by `len()` bytes and a NUL.
    ///
    /// The buffer is heap allocated and never moves, so the pointer stays
    /// valid for as long as this `Text` is alive, even if the `Text` itself
    /// is moved.
    pub fn as_c_ptr(&self) -> *const c_char {
        self.buf.as_ptr().cast()
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        Text::new(s.as_bytes())
    }
}

impl fmt::Debug for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Text({:?})", self.to_string_lossy())
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn keeps_hidden_terminator() {
        let text = Text::from("hello");
        assert_eq!(text.len(), 5);
        assert_eq!(text.as_bytes(), b"hello");
        let c = unsafe { CStr::from_ptr(text.as_c_ptr()) };
        assert_eq!(c.to_bytes(), b"hello");
    }

    #[test]
    fn interior_nul_is_preserved() {
        let text = Text::new(b"a\0b");
        assert_eq!(text.len(), 3);
        assert_eq!(text.as_bytes(), b"a\0b");
    }

    #[test]
    fn empty_text() {
        let text = Text::new(b"");
        assert!(text.is_empty());
        assert_eq!(unsafe { *text.as_c_ptr() }, 0);
    }

    #[test]
    fn pointer_survives_move() {
        let text = Text::from("stable");
        let ptr = text.as_c_ptr();
        let moved = vec![text];
        assert_eq!(moved[0].as_c_ptr(), ptr);
    }

    #[test]
    fn invalid_utf8_is_stored_verbatim() {
        let text = Text::new(&[0xff, b'x']);
        assert_eq!(text.as_bytes(), &[0xff, b'x']);
        assert_eq!(text.to_string_lossy(), "\u{fffd}x");
    }
}
