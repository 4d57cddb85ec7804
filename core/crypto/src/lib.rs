//! Cryptographic core for Sealwire.
//!
//! This module provides:
//! - Key derivation from two secrets using SHA-512 pre-hashing and scrypt
//! - Authenticated encryption using AES-256-CBC with an HMAC-SHA512 tag
//! - A reversible marker-byte randomization pre-pass
//! - A self-describing wire format with a cheap format fingerprint
//! - A memory-pressure admission gate
//!
//! # Security Guarantees
//! - All key material is automatically zeroized on drop
//! - No plaintext or key material is ever logged
//! - The tag is verified in constant time before any decryption

pub mod admission;
pub mod aead;
pub mod digest;
pub mod kdf;
pub mod keys;
pub mod protocol;
pub mod randomizer;
pub mod wire;

pub use admission::{AlwaysAvailable, MemoryMonitor, SystemMemoryMonitor};
pub use aead::{decrypt, encrypt, AeadCodec};
pub use digest::{digest, digest_named, sha512, HashAlgorithm};
pub use kdf::{derive_keys, KdfError, KdfParams};
pub use keys::{AesKey, DerivedKeys, MacKey};
pub use randomizer::{derandomize, randomize};
pub use wire::{looks_like_wire_message, WireMessage};
