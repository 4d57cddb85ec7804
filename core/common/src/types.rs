//! Common types used throughout Sealwire.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A caller-supplied secret.
///
/// Sealwire always takes two of these, and their order is part of the key:
/// swapping them is the same as using the wrong secrets.
///
/// The bytes are zeroized on drop. Copies the caller made before handing
/// the bytes over are the caller's responsibility.
#[derive(Clone, Zeroize, ZeroizeOnDrop, PartialEq, Eq)]
pub struct Secret(Vec<u8>);

impl Secret {
    /// Take ownership of raw secret bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Get the secret bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the secret in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Secret {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Secret {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&str> for Secret {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<String> for Secret {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret([REDACTED; {}])", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = Secret::from("hunter2");
        let rendered = format!("{:?}", secret);
        assert!(!rendered.contains("hunter2"));
        assert_eq!(rendered, "Secret([REDACTED; 7])");
    }

    #[test]
    fn test_secret_conversions_agree() {
        let a = Secret::from("alpha");
        let b = Secret::from(b"alpha".to_vec());
        let c = Secret::from(String::from("alpha"));
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.as_bytes(), b"alpha");
        assert_eq!(a.len(), 5);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_secret_zeroize() {
        let mut secret = Secret::from("alpha");
        secret.zeroize();
        assert!(secret.is_empty());
    }
}
