//! Fixed protocol constants.
//!
//! These are part of the wire format. Changing any of them produces
//! messages that older builds cannot open, so they are deliberately not
//! configurable at runtime.

/// IV length for AES-256-CBC, and the value of the first marker byte.
pub const IV_LEN: usize = 16;

/// HMAC-SHA512 tag length, and the value of the second marker byte.
pub const TAG_LEN: usize = 64;

/// AES-256 key length.
pub const AES_KEY_LEN: usize = 32;

/// HMAC-SHA512 key length.
pub const MAC_KEY_LEN: usize = 64;

/// SHA-512 digest length.
pub const SHA512_LEN: usize = 64;

/// Bytes before the ciphertext: `[IV_LEN][iv][TAG_LEN][tag]`.
///
/// A valid message is always strictly longer than this, because CBC with
/// PKCS#7 padding never produces an empty ciphertext.
pub const HEADER_LEN: usize = 1 + IV_LEN + 1 + TAG_LEN;

/// Offset of the tag-length marker byte.
pub const TAG_MARKER_OFFSET: usize = 1 + IV_LEN;

/// Fixed prefix of the associated data.
pub const AAD_PREFIX: &[u8] = b"sealwire.aead.v1";

/// Separator between [`AAD_PREFIX`] and the caller-supplied suffix.
pub const AAD_SEPARATOR: &[u8] = b":";

/// Size of each output window that receives one randomizer marker.
pub const RANDOMIZER_WINDOW: usize = 16;

/// Smallest marker byte value. Plaintext bytes must stay below this.
pub const MARKER_MIN: u8 = 128;

/// Build `AAD_PREFIX || AAD_SEPARATOR || suffix`.
pub fn associated_data(suffix: &[u8]) -> Vec<u8> {
    let mut aad = Vec::with_capacity(AAD_PREFIX.len() + AAD_SEPARATOR.len() + suffix.len());
    aad.extend_from_slice(AAD_PREFIX);
    aad.extend_from_slice(AAD_SEPARATOR);
    aad.extend_from_slice(suffix);
    aad
}
