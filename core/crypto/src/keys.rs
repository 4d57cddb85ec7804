//! Key types with secure memory handling.
//!
//! All key types automatically zeroize their memory on drop to prevent
//! sensitive data from persisting in memory. Keys are created fresh for a
//! single encrypt or decrypt call and never cached.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::protocol::{AES_KEY_LEN, MAC_KEY_LEN};

/// AES-256 key for the CBC layer.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct AesKey {
    key: [u8; AES_KEY_LEN],
}

impl AesKey {
    /// Create an AES key from raw bytes.
    pub fn from_bytes(key: [u8; AES_KEY_LEN]) -> Self {
        Self { key }
    }

    /// Get the key bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8; AES_KEY_LEN] {
        &self.key
    }
}

impl fmt::Debug for AesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AesKey([REDACTED])")
    }
}

/// HMAC-SHA512 key for the integrity tag.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MacKey {
    key: [u8; MAC_KEY_LEN],
}

impl MacKey {
    /// Create a MAC key from raw bytes.
    pub fn from_bytes(key: [u8; MAC_KEY_LEN]) -> Self {
        Self { key }
    }

    /// Get the key bytes.
    pub fn as_bytes(&self) -> &[u8; MAC_KEY_LEN] {
        &self.key
    }
}

impl fmt::Debug for MacKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacKey([REDACTED])")
    }
}

/// The key pair produced by one derivation.
///
/// The codec splits this with [`DerivedKeys::into_parts`] so each half can
/// be dropped (and therefore wiped) as soon as its last use is over, rather
/// than at the end of the call.
#[derive(Debug)]
pub struct DerivedKeys {
    aes_key: AesKey,
    mac_key: MacKey,
}

impl DerivedKeys {
    /// Bundle an AES key and a MAC key.
    pub fn new(aes_key: AesKey, mac_key: MacKey) -> Self {
        Self { aes_key, mac_key }
    }

    /// The AES half.
    pub fn aes_key(&self) -> &AesKey {
        &self.aes_key
    }

    /// The MAC half.
    pub fn mac_key(&self) -> &MacKey {
        &self.mac_key
    }

    /// Split into independently owned halves.
    pub fn into_parts(self) -> (AesKey, MacKey) {
        (self.aes_key, self.mac_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let keys = DerivedKeys::new(
            AesKey::from_bytes([0xAA; AES_KEY_LEN]),
            MacKey::from_bytes([0xBB; MAC_KEY_LEN]),
        );
        let rendered = format!("{:?}", keys);
        assert!(rendered.contains("AesKey([REDACTED])"));
        assert!(rendered.contains("MacKey([REDACTED])"));
        assert!(!rendered.contains("170"));
    }

    #[test]
    fn test_zeroize_clears_key() {
        let mut key = AesKey::from_bytes([7u8; AES_KEY_LEN]);
        key.zeroize();
        assert_eq!(key.as_bytes(), &[0u8; AES_KEY_LEN]);

        let mut mac = MacKey::from_bytes([7u8; MAC_KEY_LEN]);
        mac.zeroize();
        assert_eq!(mac.as_bytes(), &[0u8; MAC_KEY_LEN]);
    }

    #[test]
    fn test_into_parts_preserves_bytes() {
        let keys = DerivedKeys::new(
            AesKey::from_bytes([1u8; AES_KEY_LEN]),
            MacKey::from_bytes([2u8; MAC_KEY_LEN]),
        );
        let (aes, mac) = keys.into_parts();
        assert_eq!(aes.as_bytes(), &[1u8; AES_KEY_LEN]);
        assert_eq!(mac.as_bytes(), &[2u8; MAC_KEY_LEN]);
    }
}
