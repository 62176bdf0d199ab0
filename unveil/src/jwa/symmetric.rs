use std::fmt;

use aliri_base64::Base64Url;
use serde::{Deserialize, Serialize};

use crate::{error, jwa, jws};

/// A shared secret (`kty` = `oct`)
///
/// Used both as an HMAC key for signed tokens and as the content encryption
/// key for encrypted tokens using direct key agreement.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct Symmetric {
    #[serde(rename = "k")]
    secret: Base64Url,
}

impl fmt::Debug for Symmetric {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Symmetric { secret }")
    }
}

impl Symmetric {
    /// A symmetric key using the provided secret
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: Base64Url::from_raw(secret),
        }
    }

    pub(crate) fn secret(&self) -> &Base64Url {
        &self.secret
    }

    /// The secret as a content encryption key for `enc`
    pub(crate) fn content_key(
        &self,
        enc: jwa::ContentEncryption,
    ) -> Result<&[u8], error::KeyRejected> {
        if self.secret.as_slice().len() != enc.key_len() {
            return Err(error::key_rejected(format!(
                "{} requires a {}-byte key",
                enc,
                enc.key_len()
            )));
        }

        Ok(self.secret.as_slice())
    }
}

impl jws::Verifier for Symmetric {
    type Algorithm = jwa::hmac::SigningAlgorithm;
    type Error = error::SignatureMismatch;

    fn can_verify(&self, _alg: Self::Algorithm) -> bool {
        !self.secret.as_slice().is_empty()
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        jwa::hmac::verify(alg, self.secret.as_slice(), data, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jws::Verifier;

    #[test]
    fn content_key_length_must_match() {
        let key = Symmetric::new(vec![7; 16]);
        assert!(key.content_key(jwa::ContentEncryption::A128GCM).is_ok());
        assert!(key.content_key(jwa::ContentEncryption::A256GCM).is_err());
    }

    #[test]
    fn debug_hides_secret() {
        let key = Symmetric::new(b"hunter2".to_vec());
        assert_eq!(format!("{:?}", key), "Symmetric { secret }");
    }

    #[test]
    fn verifies_hmac_tag() {
        let key = Symmetric::new(b"secret".to_vec());
        let ring_key = ring::hmac::Key::new(ring::hmac::HMAC_SHA256, b"secret");
        let tag = ring::hmac::sign(&ring_key, b"data");

        assert!(key
            .verify(jwa::hmac::SigningAlgorithm::HS256, b"data", tag.as_ref())
            .is_ok());
        assert!(key
            .verify(jwa::hmac::SigningAlgorithm::HS256, b"datA", tag.as_ref())
            .is_err());
    }
}
