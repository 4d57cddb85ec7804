//! Wire message layout.
//!
//! ```text
//! +------+--------+------+---------+------------+
//! | 0x10 | iv[16] | 0x40 | tag[64] | ciphertext |
//! +------+--------+------+---------+------------+
//! ```
//!
//! The two length bytes are fixed and double as a format fingerprint:
//! anything else is rejected before any key derivation runs.

use sealwire_common::DecodeError;

use crate::protocol::{HEADER_LEN, IV_LEN, TAG_LEN, TAG_MARKER_OFFSET};

/// A parsed view into a wire message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireMessage<'a> {
    iv: &'a [u8; IV_LEN],
    tag: &'a [u8; TAG_LEN],
    ciphertext: &'a [u8],
}

impl<'a> WireMessage<'a> {
    /// Parse and validate the framing of `bytes`.
    ///
    /// # Errors
    /// - [`DecodeError::NotOurFormat`] if `bytes` is not longer than the
    ///   header, or either length marker is wrong
    pub fn parse(bytes: &'a [u8]) -> Result<Self, DecodeError> {
        if bytes.len() <= HEADER_LEN {
            return Err(DecodeError::NotOurFormat("message too short"));
        }
        if usize::from(bytes[0]) != IV_LEN {
            return Err(DecodeError::NotOurFormat("unexpected IV length marker"));
        }
        if usize::from(bytes[TAG_MARKER_OFFSET]) != TAG_LEN {
            return Err(DecodeError::NotOurFormat("unexpected tag length marker"));
        }

        let (iv, rest) = bytes[1..].split_at(IV_LEN);
        let (tag, ciphertext) = rest[1..].split_at(TAG_LEN);

        // Lengths were checked above.
        let iv = <&[u8; IV_LEN]>::try_from(iv)
            .map_err(|_| DecodeError::NotOurFormat("truncated IV"))?;
        let tag = <&[u8; TAG_LEN]>::try_from(tag)
            .map_err(|_| DecodeError::NotOurFormat("truncated tag"))?;

        Ok(Self {
            iv,
            tag,
            ciphertext,
        })
    }

    /// Serialize `iv`, `tag` and `ciphertext` into the wire layout.
    pub fn assemble(iv: &[u8; IV_LEN], tag: &[u8; TAG_LEN], ciphertext: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + ciphertext.len());
        out.push(IV_LEN as u8);
        out.extend_from_slice(iv);
        out.push(TAG_LEN as u8);
        out.extend_from_slice(tag);
        out.extend_from_slice(ciphertext);
        out
    }

    /// The CBC initialization vector.
    pub fn iv(&self) -> &'a [u8; IV_LEN] {
        self.iv
    }

    /// The HMAC tag.
    pub fn tag(&self) -> &'a [u8; TAG_LEN] {
        self.tag
    }

    /// The encrypted, padded, randomized plaintext.
    pub fn ciphertext(&self) -> &'a [u8] {
        self.ciphertext
    }
}

/// Cheap fingerprint check: length and both markers, nothing else.
pub fn looks_like_wire_message(bytes: &[u8]) -> bool {
    WireMessage::parse(bytes).is_ok()
}
