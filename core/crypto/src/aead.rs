//! Authenticated encryption: scrypt-derived keys, AES-256-CBC and
//! HMAC-SHA512 in encrypt-then-MAC order.
//!
//! The tag covers `iv || ciphertext || aad`, where the associated data is
//! `AAD_PREFIX || AAD_SEPARATOR || aad_suffix`. The suffix is never sent;
//! the caller must supply the same one to `decrypt`.
//!
//! # Security
//! - The tag is verified before the cipher ever sees the ciphertext
//! - Each derived key is dropped, and therefore zeroized, right after its
//!   last use, on success and on every error path
//! - No plaintext, secret or key material is logged

use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use sha2::Sha512;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use sealwire_common::{DecodeError, EncodeError};

use crate::admission::{MemoryMonitor, SystemMemoryMonitor};
use crate::kdf::{derive_keys, KdfError, KdfParams};
use crate::keys::{AesKey, MacKey};
use crate::protocol::{associated_data, IV_LEN, TAG_LEN};
use crate::randomizer::{derandomize, first_non_ascii, randomize_with};
use crate::wire::WireMessage;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;
type HmacSha512 = Hmac<Sha512>;

/// Encrypts and decrypts sealwire messages.
///
/// The codec holds no per-message state. One instance can be shared across
/// threads; each call derives its own keys and owns its own buffers.
#[derive(Debug)]
pub struct AeadCodec<M = SystemMemoryMonitor> {
    monitor: M,
    kdf_params: KdfParams,
}

impl AeadCodec<SystemMemoryMonitor> {
    /// Create a codec gated on the host's available memory.
    pub fn new() -> Self {
        Self::with_monitor(SystemMemoryMonitor::default())
    }
}

impl Default for AeadCodec<SystemMemoryMonitor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: MemoryMonitor> AeadCodec<M> {
    /// Create a codec with a custom memory monitor and standard KDF cost.
    pub fn with_monitor(monitor: M) -> Self {
        Self {
            monitor,
            kdf_params: KdfParams::standard(),
        }
    }

    /// Override the scrypt cost.
    ///
    /// Messages sealed with non-standard parameters can only be opened by a
    /// codec configured the same way.
    pub fn with_kdf_params(mut self, params: KdfParams) -> Self {
        self.kdf_params = params;
        self
    }

    /// The scrypt cost in use.
    pub fn kdf_params(&self) -> &KdfParams {
        &self.kdf_params
    }

    /// Seal `plaintext` under two secrets.
    ///
    /// # Preconditions
    /// - Every plaintext byte is in `0..=127`
    ///
    /// # Postconditions
    /// - Returns `[16][iv][64][tag][ciphertext]` with a fresh random IV
    ///
    /// # Errors
    /// - [`EncodeError::ResourceExhausted`] if the host is low on memory or
    ///   the KDF working set cannot be allocated
    /// - [`EncodeError::InvalidPlaintext`] if a byte is 128 or above
    /// - [`EncodeError::Random`] if the OS random source fails
    /// - [`EncodeError::CipherFailure`] if the cipher or MAC refuse their input
    pub fn encrypt(
        &self,
        secret1: &[u8],
        secret2: &[u8],
        plaintext: &[u8],
        aad_suffix: &[u8],
    ) -> Result<Vec<u8>, EncodeError> {
        if self.monitor.is_low_on_memory() {
            warn!("Refusing to encrypt: host is low on memory");
            return Err(EncodeError::ResourceExhausted);
        }

        debug!(
            plaintext_len = plaintext.len(),
            aad_suffix_len = aad_suffix.len(),
            "Encrypting"
        );

        if let Some((offset, byte)) = first_non_ascii(plaintext) {
            return Err(EncodeError::InvalidPlaintext { offset, byte });
        }

        let aad = associated_data(aad_suffix);

        let mut rng =
            StdRng::from_rng(OsRng).map_err(|e| EncodeError::Random(e.to_string()))?;
        let randomized = Zeroizing::new(randomize_with(plaintext, &mut rng));
        let mut iv = [0u8; IV_LEN];
        rng.fill_bytes(&mut iv);

        let keys = derive_keys(secret1, secret2, &self.kdf_params).map_err(encode_kdf_error)?;
        let (aes_key, mac_key) = keys.into_parts();

        let ciphertext = cbc_encrypt(&aes_key, &iv, &randomized);
        drop(aes_key);
        let ciphertext = ciphertext?;

        let tag = compute_tag(&mac_key, &iv, &ciphertext, &aad);
        drop(mac_key);
        let tag = tag.map_err(EncodeError::CipherFailure)?;

        let message = WireMessage::assemble(&iv, &tag, &ciphertext);
        debug!(message_len = message.len(), "Encrypted");
        Ok(message)
    }

    /// Open a message produced by [`encrypt`](Self::encrypt).
    ///
    /// # Errors
    /// - [`DecodeError::ResourceExhausted`] if the host is low on memory or
    ///   the KDF working set cannot be allocated
    /// - [`DecodeError::NotOurFormat`] if the framing is wrong; no key
    ///   derivation happens in that case
    /// - [`DecodeError::TamperedOrWrongKey`] if the tag does not verify; the
    ///   ciphertext is never decrypted in that case
    /// - [`DecodeError::CipherFailure`] if decryption fails after the tag verified
    pub fn decrypt(
        &self,
        secret1: &[u8],
        secret2: &[u8],
        message: &[u8],
        aad_suffix: &[u8],
    ) -> Result<Vec<u8>, DecodeError> {
        if self.monitor.is_low_on_memory() {
            warn!("Refusing to decrypt: host is low on memory");
            return Err(DecodeError::ResourceExhausted);
        }

        debug!(
            message_len = message.len(),
            aad_suffix_len = aad_suffix.len(),
            "Decrypting"
        );

        let wire = WireMessage::parse(message)?;
        let aad = associated_data(aad_suffix);

        let keys = derive_keys(secret1, secret2, &self.kdf_params).map_err(decode_kdf_error)?;
        let (aes_key, mac_key) = keys.into_parts();

        let expected = compute_tag(&mac_key, wire.iv(), wire.ciphertext(), &aad);
        drop(mac_key);
        let expected = expected.map_err(DecodeError::CipherFailure)?;

        if !bool::from(expected[..].ct_eq(&wire.tag()[..])) {
            warn!("Authentication failed");
            return Err(DecodeError::TamperedOrWrongKey);
        }

        let randomized = cbc_decrypt(&aes_key, wire.iv(), wire.ciphertext());
        drop(aes_key);
        let randomized = Zeroizing::new(randomized?);

        let plaintext = derandomize(&randomized);
        debug!(plaintext_len = plaintext.len(), "Decrypted");
        Ok(plaintext)
    }
}

/// Encrypt with a codec gated on the host's available memory.
pub fn encrypt(
    secret1: &[u8],
    secret2: &[u8],
    plaintext: &[u8],
    aad_suffix: &[u8],
) -> Result<Vec<u8>, EncodeError> {
    AeadCodec::new().encrypt(secret1, secret2, plaintext, aad_suffix)
}

/// Decrypt with a codec gated on the host's available memory.
pub fn decrypt(
    secret1: &[u8],
    secret2: &[u8],
    message: &[u8],
    aad_suffix: &[u8],
) -> Result<Vec<u8>, DecodeError> {
    AeadCodec::new().decrypt(secret1, secret2, message, aad_suffix)
}

fn cbc_encrypt(key: &AesKey, iv: &[u8; IV_LEN], data: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let cipher = Aes256CbcEnc::new_from_slices(key.as_bytes(), iv)
        .map_err(|e| EncodeError::CipherFailure(format!("AES-CBC init failed: {}", e)))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(data))
}

fn cbc_decrypt(key: &AesKey, iv: &[u8; IV_LEN], data: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let cipher = Aes256CbcDec::new_from_slices(key.as_bytes(), iv)
        .map_err(|e| DecodeError::CipherFailure(format!("AES-CBC init failed: {}", e)))?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(data)
        .map_err(|_| DecodeError::CipherFailure("invalid padding".to_string()))
}

fn compute_tag(
    key: &MacKey,
    iv: &[u8; IV_LEN],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<[u8; TAG_LEN], String> {
    let mut mac = <HmacSha512 as Mac>::new_from_slice(key.as_bytes())
        .map_err(|e| format!("HMAC init failed: {}", e))?;
    mac.update(iv);
    mac.update(ciphertext);
    mac.update(aad);

    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&mac.finalize().into_bytes());
    Ok(tag)
}

fn encode_kdf_error(err: KdfError) -> EncodeError {
    match err {
        KdfError::OutOfMemory(_) => EncodeError::ResourceExhausted,
        KdfError::InvalidParams(msg) => EncodeError::CipherFailure(msg),
    }
}

fn decode_kdf_error(err: KdfError) -> DecodeError {
    match err {
        KdfError::OutOfMemory(_) => DecodeError::ResourceExhausted,
        KdfError::InvalidParams(msg) => DecodeError::CipherFailure(msg),
    }
}
