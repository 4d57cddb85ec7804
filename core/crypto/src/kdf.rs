//! Key derivation using scrypt.
//!
//! Both secrets are pre-hashed with SHA-512, then each digest serves as the
//! password for one scrypt run and as the salt for the other:
//!
//! ```text
//! aes_key = scrypt(password = H(secret1), salt = H(secret2), 32 bytes)
//! mac_key = scrypt(password = H(secret2), salt = H(secret1), 64 bytes)
//! ```
//!
//! The construction is deterministic and order-sensitive.
//!
//! When both secrets are equal the two scrypt runs see the same password
//! and salt, and scrypt's output for a shorter length is a prefix of its
//! output for a longer one. The AES key is then the first half of the MAC
//! key. Callers should pass two distinct secrets.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use zeroize::Zeroizing;

use crate::digest::sha512;
use crate::keys::{AesKey, DerivedKeys, MacKey};
use crate::protocol::{AES_KEY_LEN, MAC_KEY_LEN};

/// Parameters for scrypt key derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// log2 of the CPU/memory cost N.
    pub log_n: u8,
    /// Block size r.
    pub r: u32,
    /// Parallelization p.
    pub p: u32,
}

impl KdfParams {
    /// The wire-compatible parameters: N = 16384, r = 8, p = 1.
    ///
    /// Every message on the wire was sealed with these; anything else
    /// derives different keys and fails authentication.
    pub const fn standard() -> Self {
        Self {
            log_n: 14,
            r: 8,
            p: 1,
        }
    }

    /// Cheap parameters for tests. Not interoperable with [`standard`](Self::standard).
    pub const fn testing() -> Self {
        Self {
            log_n: 4,
            r: 1,
            p: 1,
        }
    }

    /// The cost parameter N.
    pub fn n(&self) -> u64 {
        1u64.checked_shl(u32::from(self.log_n)).unwrap_or(u64::MAX)
    }

    /// Peak scrypt working set in bytes, `128 * N * r * p`.
    pub fn working_set_bytes(&self) -> u64 {
        128u64
            .saturating_mul(self.n())
            .saturating_mul(u64::from(self.r))
            .saturating_mul(u64::from(self.p))
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::standard()
    }
}

/// Key derivation failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KdfError {
    /// The scrypt working set could not be allocated.
    #[error("Cannot allocate {0} bytes for key derivation")]
    OutOfMemory(u64),

    /// scrypt rejected the parameters or output length.
    #[error("Invalid KDF parameters: {0}")]
    InvalidParams(String),
}

/// Derive the AES and MAC keys from two secrets.
///
/// # Postconditions
/// - Identical inputs always produce identical keys
/// - `derive_keys(a, b, p)` and `derive_keys(b, a, p)` differ when `a != b`
///
/// # Errors
/// - [`KdfError::OutOfMemory`] if the working set cannot be reserved
/// - [`KdfError::InvalidParams`] if scrypt rejects `params`
///
/// # Security
/// - Secret digests and raw key output are zeroized before returning
/// - If `secret1 == secret2`, the AES key equals the first 32 bytes of the
///   MAC key
pub fn derive_keys(
    secret1: &[u8],
    secret2: &[u8],
    params: &KdfParams,
) -> Result<DerivedKeys, KdfError> {
    ensure_working_set(params)?;

    let started = Instant::now();
    let h1 = Zeroizing::new(sha512(secret1));
    let h2 = Zeroizing::new(sha512(secret2));

    let mut aes_bytes = Zeroizing::new([0u8; AES_KEY_LEN]);
    run_scrypt(h1.as_ref(), h2.as_ref(), params, aes_bytes.as_mut())?;

    let mut mac_bytes = Zeroizing::new([0u8; MAC_KEY_LEN]);
    run_scrypt(h2.as_ref(), h1.as_ref(), params, mac_bytes.as_mut())?;

    debug!(
        log_n = params.log_n,
        r = params.r,
        p = params.p,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Derived key pair"
    );

    Ok(DerivedKeys::new(
        AesKey::from_bytes(*aes_bytes),
        MacKey::from_bytes(*mac_bytes),
    ))
}

fn run_scrypt(
    password: &[u8],
    salt: &[u8],
    params: &KdfParams,
    output: &mut [u8],
) -> Result<(), KdfError> {
    let scrypt_params = scrypt::Params::new(params.log_n, params.r, params.p, output.len())
        .map_err(|e| KdfError::InvalidParams(e.to_string()))?;

    scrypt::scrypt(password, salt, &scrypt_params, output)
        .map_err(|e| KdfError::InvalidParams(e.to_string()))
}

/// Reserve and release the scrypt working set up front.
///
/// scrypt itself aborts the process if its allocation fails; probing with
/// `try_reserve_exact` turns the common case into a recoverable error.
fn ensure_working_set(params: &KdfParams) -> Result<(), KdfError> {
    let bytes = params.working_set_bytes();
    let size = usize::try_from(bytes).map_err(|_| KdfError::OutOfMemory(bytes))?;

    let mut probe: Vec<u8> = Vec::new();
    probe
        .try_reserve_exact(size)
        .map_err(|_| KdfError::OutOfMemory(bytes))?;
    drop(probe);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_keys_deterministic() {
        let params = KdfParams::testing();

        let k1 = derive_keys(b"alpha", b"beta", &params).unwrap();
        let k2 = derive_keys(b"alpha", b"beta", &params).unwrap();

        assert_eq!(k1.aes_key().as_bytes(), k2.aes_key().as_bytes());
        assert_eq!(k1.mac_key().as_bytes(), k2.mac_key().as_bytes());
    }

    #[test]
    fn test_derive_keys_order_sensitive() {
        let params = KdfParams::testing();

        let forward = derive_keys(b"alpha", b"beta", &params).unwrap();
        let swapped = derive_keys(b"beta", b"alpha", &params).unwrap();

        assert_ne!(forward.aes_key().as_bytes(), swapped.aes_key().as_bytes());
        assert_ne!(forward.mac_key().as_bytes(), swapped.mac_key().as_bytes());
    }

    #[test]
    fn test_equal_secrets_share_key_prefix() {
        let keys = derive_keys(b"same", b"same", &KdfParams::testing()).unwrap();
        assert_eq!(
            &keys.aes_key().as_bytes()[..],
            &keys.mac_key().as_bytes()[..AES_KEY_LEN]
        );
    }

    #[test]
    fn test_distinct_secrets_give_unrelated_keys() {
        let keys = derive_keys(b"alpha", b"beta", &KdfParams::testing()).unwrap();
        assert_ne!(
            &keys.aes_key().as_bytes()[..],
            &keys.mac_key().as_bytes()[..AES_KEY_LEN]
        );
    }

    #[test]
    fn test_different_params_different_keys() {
        let a = derive_keys(b"alpha", b"beta", &KdfParams::testing()).unwrap();
        let b = derive_keys(
            b"alpha",
            b"beta",
            &KdfParams {
                log_n: 5,
                ..KdfParams::testing()
            },
        )
        .unwrap();
        assert_ne!(a.aes_key().as_bytes(), b.aes_key().as_bytes());
    }

    #[test]
    fn test_standard_working_set() {
        let params = KdfParams::standard();
        assert_eq!(params.n(), 16384);
        assert_eq!(params.working_set_bytes(), 16 * 1024 * 1024);
        assert_eq!(KdfParams::default(), params);
    }

    #[test]
    fn test_invalid_params_rejected() {
        // scrypt requires log_n < 16 * r
        let params = KdfParams {
            log_n: 17,
            r: 1,
            p: 1,
        };
        assert!(matches!(
            derive_keys(b"a", b"b", &params),
            Err(KdfError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_unallocatable_working_set() {
        let params = KdfParams {
            log_n: 40,
            r: 8,
            p: 1,
        };
        assert!(matches!(
            derive_keys(b"a", b"b", &params),
            Err(KdfError::OutOfMemory(_))
        ));
    }
}
