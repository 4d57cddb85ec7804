//! One-shot cryptographic hashing.
//!
//! The codec only needs [`sha512`], for pre-hashing secrets before key
//! derivation. [`digest`] and [`digest_named`] are the general entry points
//! for callers that pick an algorithm at runtime.

use std::fmt;
use std::str::FromStr;

use blake2::Blake2b512;
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::protocol::SHA512_LEN;
use sealwire_common::{Error, Result};

/// Supported hash algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// SHA-256 (32-byte output).
    Sha256,
    /// SHA-384 (48-byte output).
    Sha384,
    /// SHA-512 (64-byte output).
    Sha512,
    /// BLAKE2b with 64-byte output.
    Blake2b512,
}

impl HashAlgorithm {
    /// Canonical algorithm name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
            Self::Blake2b512 => "BLAKE2b-512",
        }
    }

    /// Digest length in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 | Self::Blake2b512 => 64,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    /// Accepts canonical names case-insensitively, with or without dashes
    /// (`"SHA-512"`, `"sha512"`, `"blake2b-512"`).
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            "blake2b512" | "blake2b" => Ok(Self::Blake2b512),
            _ => Err(Error::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

/// SHA-512 of `data`.
pub fn sha512(data: &[u8]) -> [u8; SHA512_LEN] {
    let mut out = [0u8; SHA512_LEN];
    out.copy_from_slice(&Sha512::digest(data));
    out
}

/// Hash `data` with the given algorithm.
pub fn digest(data: &[u8], algorithm: HashAlgorithm) -> Vec<u8> {
    match algorithm {
        HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
        HashAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
        HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        HashAlgorithm::Blake2b512 => Blake2b512::digest(data).to_vec(),
    }
}

/// Hash `data` with an algorithm looked up by name.
///
/// # Errors
/// - [`Error::UnsupportedAlgorithm`] if the name is not recognised
pub fn digest_named(data: &[u8], algorithm: &str) -> Result<Vec<u8>> {
    let algorithm = algorithm.parse::<HashAlgorithm>()?;
    Ok(digest(data, algorithm))
}

/// Lowercase hex rendering of a digest.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha512_known_vector() {
        // FIPS 180-2 "abc"
        let expected = "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
                        2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f";
        assert_eq!(to_hex(&sha512(b"abc")), expected);
    }

    #[test]
    fn test_sha256_known_vector() {
        let expected = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
        assert_eq!(to_hex(&digest(b"abc", HashAlgorithm::Sha256)), expected);
    }

    #[test]
    fn test_digest_matches_sha512() {
        assert_eq!(
            digest(b"sealwire", HashAlgorithm::Sha512),
            sha512(b"sealwire").to_vec()
        );
    }

    #[test]
    fn test_output_lengths() {
        for alg in [
            HashAlgorithm::Sha256,
            HashAlgorithm::Sha384,
            HashAlgorithm::Sha512,
            HashAlgorithm::Blake2b512,
        ] {
            assert_eq!(digest(b"", alg).len(), alg.output_len(), "{}", alg);
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("SHA-512".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha512);
        assert_eq!("sha256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("Sha_384".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha384);
        assert_eq!(
            "BLAKE2b-512".parse::<HashAlgorithm>().unwrap(),
            HashAlgorithm::Blake2b512
        );
    }

    #[test]
    fn test_digest_named_unknown() {
        let err = digest_named(b"data", "MD5").unwrap_err();
        assert!(matches!(err, Error::UnsupportedAlgorithm(name) if name == "MD5"));
    }
}
