//! Error types for Sealwire.
//!
//! Encryption and decryption each get their own taxonomy so callers can
//! match exhaustively on the failures that are actually reachable from
//! that direction. [`Error`] folds both together for code that doesn't care.

use thiserror::Error;

/// Failures reachable from `encrypt`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The host reported memory pressure, or the key derivation working set
    /// could not be allocated. Retrying later may succeed.
    #[error("Resource exhausted: not enough memory for key derivation")]
    ResourceExhausted,

    /// Plaintext contained a byte outside the 7-bit range.
    #[error("Invalid plaintext: byte {byte:#04x} at offset {offset} is outside 0..=127")]
    InvalidPlaintext {
        /// Position of the first offending byte.
        offset: usize,
        /// The offending byte value.
        byte: u8,
    },

    /// The block cipher refused the input.
    #[error("Cipher failure: {0}")]
    CipherFailure(String),

    /// The secure random source failed.
    #[error("Random source failure: {0}")]
    Random(String),
}

/// Failures reachable from `decrypt`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The host reported memory pressure, or the key derivation working set
    /// could not be allocated. Retrying later may succeed.
    #[error("Resource exhausted: not enough memory for key derivation")]
    ResourceExhausted,

    /// The buffer is too short or its length markers are wrong.
    #[error("Not a sealwire message: {0}")]
    NotOurFormat(&'static str),

    /// The tag did not verify. Tampering and wrong secrets look the same.
    #[error("Authentication failed: message tampered or wrong secrets")]
    TamperedOrWrongKey,

    /// The block cipher failed after the tag verified.
    #[error("Cipher failure: {0}")]
    CipherFailure(String),
}

/// Top-level error type for Sealwire operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Encryption failed.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Decryption failed.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A digest algorithm name was not recognised.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

impl Error {
    /// True when retrying the same call later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Encode(EncodeError::ResourceExhausted)
                | Self::Decode(DecodeError::ResourceExhausted)
        )
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
