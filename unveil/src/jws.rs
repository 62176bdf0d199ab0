//! Implementations of the JSON Web Signature (JWS) standard
//!
//! A signed token in compact serialization is three base64url segments
//! separated by `.`: the protected header, the payload, and the signature
//! over the first two segments.
//!
//! ```text
//! eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiJ1bnZlaWwifQ.<signature>
//! ```
//!
//! The specifications for this standard can be found in [RFC7515][].
//!
//! [RFC7515]: https://tools.ietf.org/html/rfc7515

use std::{error::Error as StdError, fmt};

use aliri_base64::Base64Url;
use serde::{Deserialize, Serialize};

use crate::{
    error,
    hints::{ContentType, ContentTypeRef, KeyHints},
    jwa,
    jwk::{CertificateUrl, CertificateUrlRef, KeyId, KeyIdRef},
    Jwk,
};

/// JSON Web Signature signing algorithms
///
/// This list may be expanded in the future.
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
#[non_exhaustive]
pub enum Algorithm {
    /// HMAC symmetric
    Hmac(jwa::hmac::SigningAlgorithm),

    /// RSA public/private key pair
    #[cfg(feature = "rsa")]
    #[cfg_attr(docsrs, doc(cfg(feature = "rsa")))]
    Rsa(jwa::rsa::SigningAlgorithm),

    /// Elliptic curve cryptography
    #[cfg(feature = "ec")]
    #[cfg_attr(docsrs, doc(cfg(feature = "ec")))]
    EllipticCurve(jwa::ec::SigningAlgorithm),
}

impl Algorithm {
    /// The HS256 signing algorithm
    pub const HS256: Algorithm = Self::Hmac(jwa::hmac::SigningAlgorithm::HS256);
    /// The HS384 signing algorithm
    pub const HS384: Algorithm = Self::Hmac(jwa::hmac::SigningAlgorithm::HS384);
    /// The HS512 signing algorithm
    pub const HS512: Algorithm = Self::Hmac(jwa::hmac::SigningAlgorithm::HS512);
}

#[cfg(feature = "rsa")]
#[cfg_attr(docsrs, doc(cfg(feature = "rsa")))]
impl Algorithm {
    /// The RS256 signing algorithm
    pub const RS256: Algorithm = Self::Rsa(jwa::rsa::SigningAlgorithm::RS256);
    /// The RS384 signing algorithm
    pub const RS384: Algorithm = Self::Rsa(jwa::rsa::SigningAlgorithm::RS384);
    /// The RS512 signing algorithm
    pub const RS512: Algorithm = Self::Rsa(jwa::rsa::SigningAlgorithm::RS512);
    /// The PS256 signing algorithm
    pub const PS256: Algorithm = Self::Rsa(jwa::rsa::SigningAlgorithm::PS256);
    /// The PS384 signing algorithm
    pub const PS384: Algorithm = Self::Rsa(jwa::rsa::SigningAlgorithm::PS384);
    /// The PS512 signing algorithm
    pub const PS512: Algorithm = Self::Rsa(jwa::rsa::SigningAlgorithm::PS512);
}

#[cfg(feature = "ec")]
#[cfg_attr(docsrs, doc(cfg(feature = "ec")))]
impl Algorithm {
    /// The ES256 signing algorithm
    pub const ES256: Algorithm = Self::EllipticCurve(jwa::ec::SigningAlgorithm::ES256);
    /// The ES384 signing algorithm
    pub const ES384: Algorithm = Self::EllipticCurve(jwa::ec::SigningAlgorithm::ES384);
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Hmac(a) => fmt::Display::fmt(a, f),

            #[cfg(feature = "rsa")]
            Self::Rsa(a) => fmt::Display::fmt(a, f),

            #[cfg(feature = "ec")]
            Self::EllipticCurve(a) => fmt::Display::fmt(a, f),
        }
    }
}

/// A JWS verifier
pub trait Verifier {
    /// The verifiable signature algorithms
    type Algorithm;

    /// The error returned on a failure to verify
    type Error: StdError + Send + Sync + 'static;

    /// Whether the specific algorithm provided is compatible
    /// with this verifier
    fn can_verify(&self, alg: Self::Algorithm) -> bool;

    /// Attempts to verify the data against the signature using the
    /// specified algorithm
    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error>;
}

/// The protected header of a signed token
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct Header {
    alg: Algorithm,
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
    /// A header for a token signed with `alg`
    pub const fn new(alg: Algorithm) -> Self {
        Self {
            alg,
            kid: None,
            jwk: None,
            x5u: None,
            x5t: None,
            x5t_s256: None,
            cty: None,
            typ: None,
        }
    }

    /// The signing algorithm
    #[must_use]
    pub fn alg(&self) -> Algorithm {
        self.alg
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

/// A decomposed signed token
///
/// Nothing held here is trustworthy until [`Jws::verify_signature()`]
/// reports a matching signature.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub struct Jws {
    header: Header,
    message: String,
    payload: Vec<u8>,
    signature: Base64Url,
}

impl Jws {
    /// Splits a compact serialization into header, payload, and signature
    ///
    /// # Errors
    ///
    /// The token does not have exactly three segments, or a segment is not
    /// valid base64url, or the header is not a valid JWS header.
    pub fn decompose(token: &str) -> Result<Self, error::JwsError> {
        let mut segments = token.split('.');
        let (h_str, p_str, s_str) = match (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) {
            (Some(h), Some(p), Some(s), None) => (h, p, s),
            _ => return Err(error::malformed_token(3).into()),
        };

        let h_raw = Base64Url::from_encoded(h_str).map_err(error::malformed_header)?;
        let header: Header =
            serde_json::from_slice(h_raw.as_slice()).map_err(error::malformed_header)?;
        let payload = Base64Url::from_encoded(p_str)
            .map_err(|e| error::malformed_segment("payload", e))?
            .into_inner();
        let signature =
            Base64Url::from_encoded(s_str).map_err(|e| error::malformed_segment("signature", e))?;

        let message = token[..h_str.len() + 1 + p_str.len()].to_owned();

        Ok(Self {
            header,
            message,
            payload,
            signature,
        })
    }

    /// Checks the signature with `key`
    ///
    /// A well-formed signature that does not match yields `Ok(false)`.
    ///
    /// # Errors
    ///
    /// No key was supplied, or the key cannot be used with the header's
    /// algorithm.
    pub fn verify_signature(&self, key: Option<&Jwk>) -> Result<bool, error::JwkVerifyError> {
        let key = key.ok_or_else(|| error::missing_key("sender"))?;

        match key.verify(
            self.header.alg().into(),
            self.message.as_bytes(),
            self.signature.as_slice(),
        ) {
            Ok(()) => Ok(true),
            Err(error::JwkVerifyError::SignatureMismatch(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// The protected header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The decoded payload bytes
    ///
    /// **WARNING:** *The payload has not been authenticated.*
    #[must_use]
    pub fn untrusted_payload(&self) -> &[u8] {
        &self.payload
    }

    /// The signing input: encoded header and payload joined by `.`
    #[must_use]
    pub fn signing_input(&self) -> &str {
        &self.message
    }

    /// The raw signature
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        self.signature.as_slice()
    }
}
