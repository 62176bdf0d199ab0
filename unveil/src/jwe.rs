//! Implementations of the JSON Web Encryption (JWE) standard
//!
//! An encrypted token in compact serialization is five base64url segments:
//! the protected header, the encrypted key, the initialization vector, the
//! ciphertext, and the authentication tag.
//!
//! Only direct encryption with a shared symmetric key (`dir`) is
//! supported, so the encrypted key segment is always empty.
//!
//! The specifications for this standard can be found in [RFC7516][].
//!
//! [RFC7516]: https://tools.ietf.org/html/rfc7516

use aliri_base64::Base64Url;
use serde::{Deserialize, Serialize};

use crate::{
    error,
    hints::{ContentType, ContentTypeRef, KeyHints},
    jwa,
    jwk::{CertificateUrl, CertificateUrlRef, KeyId, KeyIdRef},
    Jwk,
};

/// The protected header of an encrypted token
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct Header {
    alg: jwa::KeyManagement,
    enc: jwa::ContentEncryption,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    zip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kid: Option<KeyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    jwk: Option<Jwk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    x5u: Option<CertificateUrl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    x5t: Option<Base64Url>,
    #[serde(rename = "x5t#S256", default, skip_serializing_if = "Option::is_none")]
    x5t_s256: Option<Base64Url>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cty: Option<ContentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

impl Header {
    /// A header for a token encrypted directly with a shared key
    pub const fn new(enc: jwa::ContentEncryption) -> Self {
        Self {
            alg: jwa::KeyManagement::Dir,
            enc,
            zip: None,
            kid: None,
            jwk: None,
            x5u: None,
            x5t: None,
            x5t_s256: None,
            cty: None,
            typ: None,
        }
    }

    /// The key management algorithm
    #[must_use]
    pub fn alg(&self) -> jwa::KeyManagement {
        self.alg
    }

    /// The content encryption algorithm
    #[must_use]
    pub fn enc(&self) -> jwa::ContentEncryption {
        self.enc
    }

    /// The declared media type of the whole token (`typ`)
    #[must_use]
    pub fn typ(&self) -> Option<&str> {
        self.typ.as_deref()
    }

    /// Sets the key ID
    pub fn with_key_id(self, kid: impl Into<KeyId>) -> Self {
        Self {
            kid: Some(kid.into()),
            ..self
        }
    }

    /// Embeds a public key
    pub fn with_jwk(self, jwk: Jwk) -> Self {
        Self {
            jwk: Some(jwk),
            ..self
        }
    }

    /// Sets the X.509 certificate URL
    pub fn with_certificate_url(self, url: impl Into<CertificateUrl>) -> Self {
        Self {
            x5u: Some(url.into()),
            ..self
        }
    }

    /// Sets the X.509 certificate SHA-1 thumbprint
    pub fn with_certificate_sha1(self, digest: impl Into<Vec<u8>>) -> Self {
        Self {
            x5t: Some(Base64Url::from_raw(digest)),
            ..self
        }
    }

    /// Sets the X.509 certificate SHA-256 thumbprint
    pub fn with_certificate_sha256(self, digest: impl Into<Vec<u8>>) -> Self {
        Self {
            x5t_s256: Some(Base64Url::from_raw(digest)),
            ..self
        }
    }

    /// Sets the content type of the payload
    pub fn with_content_type(self, cty: impl Into<ContentType>) -> Self {
        Self {
            cty: Some(cty.into()),
            ..self
        }
    }

    /// Sets the compression algorithm
    ///
    /// Tokens carrying this parameter are refused when decomposed.
    pub fn with_compression(self, zip: impl Into<String>) -> Self {
        Self {
            zip: Some(zip.into()),
            ..self
        }
    }
}

impl KeyHints for Header {
    fn key_id(&self) -> Option<&KeyIdRef> {
        self.kid.as_deref()
    }

    fn embedded_key(&self) -> Option<&Jwk> {
        self.jwk.as_ref()
    }

    fn certificate_url(&self) -> Option<&CertificateUrlRef> {
        self.x5u.as_deref()
    }

    fn certificate_sha256(&self) -> Option<&[u8]> {
        self.x5t_s256.as_ref().map(|d| d.as_slice())
    }

    fn certificate_sha1(&self) -> Option<&[u8]> {
        self.x5t.as_ref().map(|d| d.as_slice())
    }

    fn content_type(&self) -> Option<&ContentTypeRef> {
        self.cty.as_deref()
    }
}

/// A decomposed encrypted token
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub struct Jwe {
    header: Header,
    aad: String,
    encrypted_key: Base64Url,
    iv: Base64Url,
    ciphertext: Base64Url,
    tag: Base64Url,
}

impl Jwe {
    /// Splits a compact serialization into its five segments
    ///
    /// # Errors
    ///
    /// The token does not have exactly five segments, a segment is not
    /// valid base64url, the header is not a valid JWE header, or the header
    /// requests compression.
    pub fn decompose(token: &str) -> Result<Self, error::JweError> {
        let segments: Vec<&str> = token.split('.').collect();
        let (h_str, k_str, iv_str, c_str, t_str) = match segments.as_slice() {
            [h, k, iv, c, t] => (*h, *k, *iv, *c, *t),
            _ => return Err(error::malformed_token(5).into()),
        };

        let h_raw = Base64Url::from_encoded(h_str).map_err(error::malformed_header)?;
        let header: Header =
            serde_json::from_slice(h_raw.as_slice()).map_err(error::malformed_header)?;

        if header.zip.is_some() {
            return Err(error::unsupported_parameter("zip").into());
        }

        Ok(Self {
            header,
            aad: h_str.to_owned(),
            encrypted_key: decode_segment("encrypted key", k_str)?,
            iv: decode_segment("iv", iv_str)?,
            ciphertext: decode_segment("ciphertext", c_str)?,
            tag: decode_segment("tag", t_str)?,
        })
    }

    /// Authenticates and decrypts the payload
    ///
    /// The recipient key supplies the content encryption key. The sender key
    /// only takes part in key agreement, which `dir` does not use.
    ///
    /// # Errors
    ///
    /// No recipient key was supplied, the key cannot be used with the
    /// header's algorithms, or the ciphertext fails to authenticate.
    pub fn decrypt(
        &self,
        _sender: Option<&Jwk>,
        recipient: Option<&Jwk>,
    ) -> Result<Vec<u8>, error::JweError> {
        let recipient = recipient.ok_or_else(|| error::missing_key("recipient"))?;

        let cek = match self.header.alg {
            jwa::KeyManagement::Dir => {
                if !self.encrypted_key.as_slice().is_empty() {
                    return Err(error::malformed_segment(
                        "encrypted key",
                        "must be empty with direct encryption",
                    )
                    .into());
                }

                recipient.content_key(self.header.alg, self.header.enc)?
            }
        };

        self.header.enc.open(
            cek,
            self.iv.as_slice(),
            self.aad.as_bytes(),
            self.ciphertext.as_slice(),
            self.tag.as_slice(),
        )
    }

    /// The protected header
    pub fn header(&self) -> &Header {
        &self.header
    }
}

fn decode_segment(segment: &'static str, s: &str) -> Result<Base64Url, error::MalformedSegment> {
    Base64Url::from_encoded(s).map_err(|e| error::malformed_segment(segment, e))
}
