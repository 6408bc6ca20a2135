//! The [SizedValue] trait is how the caches in this crate learn what a value costs.
//!
//! Each entry is charged the length of its key plus [SizedValue::len] of its value.  Nothing checks that the reported
//! length matches the real footprint; an implementation which lies will silently skew the byte budget.
use std::sync::Arc;

/// A value which can report its size, usually in bytes.
pub trait SizedValue {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SizedValue for String {
    fn len(&self) -> usize {
        String::len(self)
    }
}

impl SizedValue for &'static str {
    fn len(&self) -> usize {
        str::len(self)
    }
}

impl SizedValue for Vec<u8> {
    fn len(&self) -> usize {
        Vec::len(self)
    }
}

impl SizedValue for Box<[u8]> {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }
}

impl SizedValue for Arc<[u8]> {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lengths() {
        assert_eq!(SizedValue::len(&"abc".to_string()), 3);
        assert_eq!(SizedValue::len(&"héllo"), 6);
        assert_eq!(SizedValue::len(&vec![0u8; 7]), 7);

        let boxed: Box<[u8]> = vec![1, 2].into_boxed_slice();
        assert_eq!(SizedValue::len(&boxed), 2);

        let shared: Arc<[u8]> = Arc::from(&b""[..]);
        assert!(SizedValue::is_empty(&shared));
    }
}
