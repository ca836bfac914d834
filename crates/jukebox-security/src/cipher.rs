// CloudJukebox - Music archive and playback over object storage
// Copyright (C) 2025 CloudJukebox Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! AES-256-CBC encryption in the legacy archive format
//!
//! Every encrypted object in an existing archive was produced this way, so the
//! scheme is reproduced exactly:
//!
//! - 256-bit key taken from the configured key string: truncated to 32 bytes or
//!   right-padded with `#`
//! - 128-bit IV taken from the configured IV string: truncated to 16 bytes or
//!   right-padded with `@`
//! - Plaintext right-padded with ASCII spaces to a multiple of 16 bytes; the number
//!   of pad bytes is returned to the caller, who stores it with the object
//! - No padding scheme inside the ciphertext, no authentication tag
//!
//! # Security
//!
//! This is **not** a strong construction. The key is a padded passphrase rather
//! than derived key material, the IV is fixed per archive, and CBC without a MAC
//! is malleable. Integrity is provided separately by the checksum over the
//! original bytes. Do not reuse this module for anything but reading and writing
//! archive objects.
//!
//! # Format
//!
//! ```text
//! [AES-256-CBC(plaintext || ' ' * pad_char_count)]
//! ```

use aes::Aes256;
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use secrecy::{ExposeSecret, SecretVec};
use thiserror::Error;
use tracing::debug;
use zeroize::Zeroizing;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Key size in bytes (256 bits for AES-256)
pub const KEY_SIZE: usize = 32;

/// Cipher block size and IV length in bytes
pub const BLOCK_SIZE: usize = 16;

/// Fill character used to extend a short key
pub const KEY_PAD_CHAR: u8 = b'#';

/// Fill character used to extend a short IV
pub const IV_PAD_CHAR: u8 = b'@';

/// Fill character appended to plaintext for block alignment
const BLOCK_PAD_CHAR: u8 = b' ';

/// Encryption errors
#[derive(Error, Debug)]
pub enum EncryptionError {
    /// No key was configured
    #[error("encryption key cannot be empty")]
    EmptyKey,

    /// Ciphertext length is not a whole number of blocks
    #[error("invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    /// Recorded pad count does not fit the decrypted data
    #[error("invalid pad count {pad} for {len} decrypted bytes")]
    InvalidPadCount {
        /// Recorded pad count
        pad: usize,
        /// Decrypted length
        len: usize,
    },

    /// Cipher construction or operation failed
    #[error("cipher failure: {0}")]
    CipherFailed(String),
}

/// Result of [`LegacyCipher::encrypt`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encrypted {
    /// Ciphertext, a multiple of [`BLOCK_SIZE`] bytes
    pub ciphertext: Vec<u8>,
    /// Number of space bytes appended before encryption (0..=15)
    pub pad_char_count: usize,
}

/// Number of pad bytes needed to bring `len` to a multiple of [`BLOCK_SIZE`]
///
/// Already-aligned input gets no padding.
pub fn pad_count(len: usize) -> usize {
    match len % BLOCK_SIZE {
        0 => 0,
        rem => BLOCK_SIZE - rem,
    }
}

fn normalize(value: &[u8], size: usize, fill: u8) -> Vec<u8> {
    let mut normalized: Vec<u8> = value.iter().copied().take(size).collect();
    normalized.resize(size, fill);
    normalized
}

/// AES-256-CBC cipher with legacy key/IV normalization
pub struct LegacyCipher {
    key: SecretVec<u8>,
    iv: [u8; BLOCK_SIZE],
}

impl LegacyCipher {
    /// Build a cipher from the configured key and IV strings
    ///
    /// An empty IV is padded entirely with `@`.
    ///
    /// # Errors
    ///
    /// Returns [`EncryptionError::EmptyKey`] when `key` is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use jukebox_security::LegacyCipher;
    ///
    /// let cipher = LegacyCipher::new("sixteen-byte-key", "iv").unwrap();
    /// let encrypted = cipher.encrypt(b"Tales of Brave Ulysses").unwrap();
    /// assert_eq!(encrypted.ciphertext.len(), 32);
    /// assert_eq!(encrypted.pad_char_count, 10);
    ///
    /// let plaintext = cipher
    ///     .decrypt(&encrypted.ciphertext, encrypted.pad_char_count)
    ///     .unwrap();
    /// assert_eq!(plaintext, b"Tales of Brave Ulysses");
    /// ```
    pub fn new(key: &str, iv: &str) -> Result<Self, EncryptionError> {
        if key.is_empty() {
            return Err(EncryptionError::EmptyKey);
        }

        let normalized_iv = normalize(iv.as_bytes(), BLOCK_SIZE, IV_PAD_CHAR);
        let mut iv_bytes = [0u8; BLOCK_SIZE];
        iv_bytes.copy_from_slice(&normalized_iv);

        if key.len() != KEY_SIZE {
            debug!(
                configured = key.len(),
                "Encryption key normalized to {} bytes", KEY_SIZE
            );
        }

        Ok(Self {
            key: SecretVec::new(normalize(key.as_bytes(), KEY_SIZE, KEY_PAD_CHAR)),
            iv: iv_bytes,
        })
    }

    /// Pad with spaces to a block boundary and encrypt
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Encrypted, EncryptionError> {
        let pad_char_count = pad_count(plaintext.len());

        let mut padded = Zeroizing::new(Vec::with_capacity(plaintext.len() + pad_char_count));
        padded.extend_from_slice(plaintext);
        padded.resize(plaintext.len() + pad_char_count, BLOCK_PAD_CHAR);

        let ciphertext = Aes256CbcEnc::new_from_slices(self.key.expose_secret(), &self.iv)
            .map_err(|e| EncryptionError::CipherFailed(e.to_string()))?
            .encrypt_padded_vec_mut::<NoPadding>(&padded);

        debug!(
            plaintext_size = plaintext.len(),
            ciphertext_size = ciphertext.len(),
            pad_char_count,
            "Encryption complete"
        );

        Ok(Encrypted {
            ciphertext,
            pad_char_count,
        })
    }

    /// Decrypt and strip exactly `pad_char_count` trailing bytes
    pub fn decrypt(
        &self,
        ciphertext: &[u8],
        pad_char_count: usize,
    ) -> Result<Vec<u8>, EncryptionError> {
        if !ciphertext.len().is_multiple_of(BLOCK_SIZE) {
            return Err(EncryptionError::InvalidCiphertext(format!(
                "length {} is not a multiple of {}",
                ciphertext.len(),
                BLOCK_SIZE
            )));
        }

        let mut plaintext = Aes256CbcDec::new_from_slices(self.key.expose_secret(), &self.iv)
            .map_err(|e| EncryptionError::CipherFailed(e.to_string()))?
            .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
            .map_err(|e| EncryptionError::InvalidCiphertext(e.to_string()))?;

        if pad_char_count >= BLOCK_SIZE || pad_char_count > plaintext.len() {
            return Err(EncryptionError::InvalidPadCount {
                pad: pad_char_count,
                len: plaintext.len(),
            });
        }

        plaintext.truncate(plaintext.len() - pad_char_count);
        Ok(plaintext)
    }
}

impl std::fmt::Debug for LegacyCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegacyCipher")
            .field("key", &"<redacted>")
            .field("iv", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_key_normalization_pads_with_hash() {
        let key = normalize(b"short", KEY_SIZE, KEY_PAD_CHAR);
        assert_eq!(key.len(), KEY_SIZE);
        assert_eq!(&key[..5], b"short");
        assert!(key[5..].iter().all(|&b| b == b'#'));
    }

    #[test]
    fn test_key_normalization_truncates() {
        let long = [b'k'; 40];
        let key = normalize(&long, KEY_SIZE, KEY_PAD_CHAR);
        assert_eq!(key, vec![b'k'; KEY_SIZE]);
    }

    #[test]
    fn test_iv_normalization_pads_with_at() {
        let iv = normalize(b"", BLOCK_SIZE, IV_PAD_CHAR);
        assert_eq!(iv, vec![b'@'; BLOCK_SIZE]);
    }

    #[test]
    fn test_pad_count() {
        assert_eq!(pad_count(0), 0);
        assert_eq!(pad_count(1), 15);
        assert_eq!(pad_count(15), 1);
        assert_eq!(pad_count(16), 0);
        assert_eq!(pad_count(100), 12);
    }

    #[test]
    fn test_empty_key_is_rejected() {
        assert!(matches!(
            LegacyCipher::new("", "iv"),
            Err(EncryptionError::EmptyKey)
        ));
    }

    #[test]
    fn test_known_ciphertext() {
        // Reference vector computed independently for this key/IV pair
        let cipher = LegacyCipher::new("sixteen-byte-key", "iv").unwrap();
        let encrypted = cipher.encrypt(b"Tales of Brave Ulysses").unwrap();

        assert_eq!(encrypted.pad_char_count, 10);
        assert_eq!(
            hex::encode(&encrypted.ciphertext),
            "2553e9e4b70849646c1f1991c43d9e7ea1bf9319ead244464a5368586632b919"
        );
    }

    #[test]
    fn test_roundtrip_strips_exact_pad() {
        let cipher = LegacyCipher::new("key", "").unwrap();
        // Trailing spaces in the original survive because only pad bytes are stripped
        let plaintext = b"ends with spaces   ";

        let encrypted = cipher.encrypt(plaintext).unwrap();
        let decrypted = cipher
            .decrypt(&encrypted.ciphertext, encrypted.pad_char_count)
            .unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_aligned_input_gets_no_padding() {
        let cipher = LegacyCipher::new("key", "iv").unwrap();
        let encrypted = cipher.encrypt(&[7u8; 32]).unwrap();

        assert_eq!(encrypted.pad_char_count, 0);
        assert_eq!(encrypted.ciphertext.len(), 32);
    }

    #[test]
    fn test_bad_ciphertext_length() {
        let cipher = LegacyCipher::new("key", "iv").unwrap();

        assert!(matches!(
            cipher.decrypt(&[0u8; 17], 0),
            Err(EncryptionError::InvalidCiphertext(_))
        ));
        assert!(matches!(
            cipher.decrypt(&[0u8; 31], 0),
            Err(EncryptionError::InvalidCiphertext(_))
        ));
    }

    #[test]
    fn test_bad_pad_count() {
        let cipher = LegacyCipher::new("key", "iv").unwrap();
        let encrypted = cipher.encrypt(b"abc").unwrap();

        assert!(matches!(
            cipher.decrypt(&encrypted.ciphertext, 16),
            Err(EncryptionError::InvalidPadCount { .. })
        ));
    }

    #[test]
    fn test_wrong_key_does_not_reproduce_plaintext() {
        let plaintext = b"Sunshine of Your Love";
        let encrypted = LegacyCipher::new("right", "iv")
            .unwrap()
            .encrypt(plaintext)
            .unwrap();

        let decrypted = LegacyCipher::new("wrong", "iv")
            .unwrap()
            .decrypt(&encrypted.ciphertext, encrypted.pad_char_count)
            .unwrap();
        assert_ne!(decrypted, plaintext);
    }

    #[test]
    fn test_debug_redacts_key() {
        let cipher = LegacyCipher::new("super-secret", "iv").unwrap();
        let debug_str = format!("{:?}", cipher);
        assert!(debug_str.contains("<redacted>"));
        assert!(!debug_str.contains("super-secret"));
    }
}
