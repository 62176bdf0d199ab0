//! Encryption algorithms for encrypted tokens
//!
//! Key management is limited to direct use of a shared symmetric key
//! (`dir`). Content is protected with AES-GCM.

use std::fmt;

use ring::aead;
use serde::{Deserialize, Serialize};

use crate::error;

/// Key management algorithms (`alg` header of an encrypted token)
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum KeyManagement {
    /// Direct use of a shared symmetric key as the content encryption key
    #[serde(rename = "dir")]
    Dir,
}

impl fmt::Display for KeyManagement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Dir => f.write_str("dir"),
        }
    }
}

/// Content encryption algorithms (`enc` header of an encrypted token)
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[allow(clippy::upper_case_acronyms)]
#[non_exhaustive]
pub enum ContentEncryption {
    /// AES-GCM using a 128-bit key
    A128GCM,
    /// AES-GCM using a 256-bit key
    A256GCM,
}

/// Size in bytes of the AES-GCM nonce
pub const IV_LEN: usize = aead::NONCE_LEN;

/// Size in bytes of the AES-GCM authentication tag
pub const TAG_LEN: usize = 16;

impl ContentEncryption {
    /// Size in bytes of the content encryption key
    #[must_use]
    pub const fn key_len(self) -> usize {
        match self {
            Self::A128GCM => 16,
            Self::A256GCM => 32,
        }
    }

    pub(crate) fn ring_algorithm(self) -> &'static aead::Algorithm {
        match self {
            Self::A128GCM => &aead::AES_128_GCM,
            Self::A256GCM => &aead::AES_256_GCM,
        }
    }

    /// Authenticates and decrypts `ciphertext`
    pub(crate) fn open(
        self,
        cek: &[u8],
        iv: &[u8],
        aad: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
    ) -> Result<Vec<u8>, error::JweError> {
        if tag.len() != TAG_LEN {
            return Err(error::malformed_segment("tag", "unexpected tag length").into());
        }

        let nonce = aead::Nonce::try_assume_unique_for_key(iv)
            .map_err(|_| error::malformed_segment("iv", "unexpected IV length"))?;

        let key = aead::UnboundKey::new(self.ring_algorithm(), cek)
            .map_err(|_| error::key_rejected("content encryption key has the wrong length"))?;
        let key = aead::LessSafeKey::new(key);

        let mut in_out = Vec::with_capacity(ciphertext.len() + tag.len());
        in_out.extend_from_slice(ciphertext);
        in_out.extend_from_slice(tag);

        let plaintext_len = key
            .open_in_place(nonce, aead::Aad::from(aad), &mut in_out)
            .map_err(|_| error::decryption_failed())?
            .len();

        in_out.truncate(plaintext_len);
        Ok(in_out)
    }
}

impl fmt::Display for ContentEncryption {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::A128GCM => "A128GCM",
            Self::A256GCM => "A256GCM",
        };

        f.write_str(s)
    }
}
