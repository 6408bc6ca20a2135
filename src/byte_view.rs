//! A [ByteView] is the value type stored by [ConcurrentCache](crate::ConcurrentCache): an immutable run of bytes.
//!
//! Clones share one buffer.  Nothing hands out a mutable reference to it, and [ByteView::byte_slice] copies, so bytes
//! read out of the cache can't be used to change what the cache holds.
use std::fmt;
use std::sync::Arc;

use crate::{CacheError, SizedValue};

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ByteView {
    bytes: Arc<[u8]>,
}

impl ByteView {
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> ByteView {
        ByteView {
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// An owned copy of the contents.
    pub fn byte_slice(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The contents as text, failing if they aren't UTF-8.  [ToString] is the lossy alternative.
    pub fn as_str(&self) -> Result<&str, CacheError> {
        Ok(std::str::from_utf8(&self.bytes)?)
    }
}

impl SizedValue for ByteView {
    fn len(&self) -> usize {
        ByteView::len(self)
    }
}

impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.bytes))
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ByteView")
            .field(&String::from_utf8_lossy(&self.bytes))
            .finish()
    }
}

impl AsRef<[u8]> for ByteView {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(bytes: Vec<u8>) -> ByteView {
        ByteView::new(bytes)
    }
}

impl From<Box<[u8]>> for ByteView {
    fn from(bytes: Box<[u8]>) -> ByteView {
        ByteView::new(bytes)
    }
}

impl From<&[u8]> for ByteView {
    fn from(bytes: &[u8]) -> ByteView {
        ByteView::new(bytes)
    }
}

impl From<String> for ByteView {
    fn from(s: String) -> ByteView {
        ByteView::new(s.into_bytes())
    }
}

impl From<&str> for ByteView {
    fn from(s: &str) -> ByteView {
        ByteView::new(s.as_bytes())
    }
}
