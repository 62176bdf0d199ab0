//! Implementations of the JSON Web Keys (JWK) standard
//!
//! The specifications for JSON Web Keys can be found in [RFC7517][]. Key
//! thumbprints follow [RFC7638][].
//!
//! [RFC7517]: https://tools.ietf.org/html/rfc7517
//! [RFC7638]: https://tools.ietf.org/html/rfc7638

use std::{
    convert::{TryFrom, TryInto},
    fmt,
};

use aliri_base64::Base64Url;
use aliri_braid::braid;
use serde::{Deserialize, Serialize};

use crate::{
    error, jwa,
    jws::{self, Verifier},
};

/// An identifier for a JWK
#[braid(serde, ref_doc = "A borrowed reference to JWK identifier ([`KeyId`])")]
pub struct KeyId;

/// A URL referring to an X.509 certificate or certificate chain
#[braid(serde, ref_doc = "A borrowed reference to a [`CertificateUrl`]")]
pub struct CertificateUrl;

/// The RFC 7638 SHA-256 thumbprint of a key
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Thumbprint(Base64Url);

impl Thumbprint {
    /// The raw digest
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }

    /// Whether a key identifier is this thumbprint in base64url form
    #[must_use]
    pub fn matches_key_id(&self, kid: &KeyIdRef) -> bool {
        self.0.to_string() == kid.as_str()
    }
}

impl fmt::Display for Thumbprint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for Thumbprint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Thumbprint({})", self.0)
    }
}

/// An identified JSON Web Key
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "JwkDto")]
#[must_use]
pub struct Jwk {
    #[serde(rename = "kid", skip_serializing_if = "Option::is_none")]
    key_id: Option<KeyId>,

    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    usage: Option<jwa::Usage>,

    #[serde(rename = "alg", skip_serializing_if = "Option::is_none")]
    algorithm: Option<jwa::Algorithm>,

    #[serde(rename = "x5u", skip_serializing_if = "Option::is_none")]
    certificate_url: Option<CertificateUrl>,

    #[serde(rename = "x5t", skip_serializing_if = "Option::is_none")]
    certificate_sha1: Option<Base64Url>,

    #[serde(rename = "x5t#S256", skip_serializing_if = "Option::is_none")]
    certificate_sha256: Option<Base64Url>,

    #[serde(flatten)]
    key: Key,
}

impl Jwk {
    /// The key ID
    #[must_use]
    pub fn key_id(&self) -> Option<&KeyIdRef> {
        self.key_id.as_deref()
    }

    /// The intended usage of the key
    #[must_use]
    pub fn usage(&self) -> Option<jwa::Usage> {
        self.usage
    }

    /// The algorithm to be used with this JWK
    #[must_use]
    pub fn algorithm(&self) -> Option<jwa::Algorithm> {
        self.algorithm
    }

    /// The X.509 certificate URL (`x5u`)
    #[must_use]
    pub fn certificate_url(&self) -> Option<&CertificateUrlRef> {
        self.certificate_url.as_deref()
    }

    /// The X.509 certificate SHA-1 thumbprint (`x5t`)
    #[must_use]
    pub fn certificate_sha1(&self) -> Option<&[u8]> {
        self.certificate_sha1.as_ref().map(|d| d.as_slice())
    }

    /// The X.509 certificate SHA-256 thumbprint (`x5t#S256`)
    #[must_use]
    pub fn certificate_sha256(&self) -> Option<&[u8]> {
        self.certificate_sha256.as_ref().map(|d| d.as_slice())
    }

    /// Whether the key is compatible with the given algorithm
    #[must_use]
    pub fn is_compatible(&self, alg: jwa::Algorithm) -> bool {
        self.key.is_compatible(alg)
    }

    /// Computes the RFC 7638 thumbprint of the key's required members
    ///
    /// # Errors
    ///
    /// The key's parameters cannot be canonicalized.
    pub fn thumbprint(&self) -> Result<Thumbprint, error::ThumbprintUnavailable> {
        let canonical = self.key.canonical_members()?;
        let digest = ring::digest::digest(&ring::digest::SHA256, canonical.as_bytes());
        Ok(Thumbprint(Base64Url::from_raw(digest.as_ref())))
    }

    /// Sets the key ID
    pub fn with_key_id(self, kid: impl Into<KeyId>) -> Self {
        Self {
            key_id: Some(kid.into()),
            ..self
        }
    }

    /// Sets the key's usage
    pub fn with_usage(self, usage: jwa::Usage) -> Self {
        Self {
            usage: Some(usage),
            ..self
        }
    }

    /// Sets the algorithm and usage consistent with that algorithm
    pub fn with_algorithm(self, alg: impl Into<jwa::Algorithm>) -> Self {
        let alg = alg.into();
        Self {
            algorithm: Some(alg),
            usage: Some(alg.to_usage()),
            ..self
        }
    }

    /// Sets the X.509 certificate URL
    pub fn with_certificate_url(self, url: impl Into<CertificateUrl>) -> Self {
        Self {
            certificate_url: Some(url.into()),
            ..self
        }
    }

    /// Sets the X.509 certificate SHA-1 thumbprint
    pub fn with_certificate_sha1(self, digest: impl Into<Vec<u8>>) -> Self {
        Self {
            certificate_sha1: Some(Base64Url::from_raw(digest)),
            ..self
        }
    }

    /// Sets the X.509 certificate SHA-256 thumbprint
    pub fn with_certificate_sha256(self, digest: impl Into<Vec<u8>>) -> Self {
        Self {
            certificate_sha256: Some(Base64Url::from_raw(digest)),
            ..self
        }
    }

    /// The content encryption key to use for a `dir` encrypted token
    pub(crate) fn content_key(
        &self,
        alg: jwa::KeyManagement,
        enc: jwa::ContentEncryption,
    ) -> Result<&[u8], error::JweError> {
        if let Some(u) = self.usage {
            if u != jwa::Usage::Encryption {
                return Err(error::jwk_usage_mismatch().into());
            }
        }

        match self.algorithm {
            Some(key_alg)
                if key_alg == jwa::Algorithm::from(alg) || key_alg == jwa::Algorithm::from(enc) => {}
            Some(_) => return Err(error::incompatible_algorithm(alg).into()),
            None => {}
        }

        match &self.key {
            Key::Symmetric(k) => Ok(k.content_key(enc)?),

            #[allow(unreachable_patterns)]
            _ => Err(error::incompatible_algorithm(alg).into()),
        }
    }
}

impl From<jwa::Symmetric> for Jwk {
    fn from(key: jwa::Symmetric) -> Self {
        Self::from_key(Key::Symmetric(key))
    }
}

#[cfg(feature = "rsa")]
#[cfg_attr(docsrs, doc(cfg(feature = "rsa")))]
impl From<jwa::Rsa> for Jwk {
    fn from(key: jwa::Rsa) -> Self {
        Self::from_key(Key::Rsa(key))
    }
}

#[cfg(feature = "ec")]
#[cfg_attr(docsrs, doc(cfg(feature = "ec")))]
impl From<jwa::EllipticCurve> for Jwk {
    fn from(key: jwa::EllipticCurve) -> Self {
        Self::from_key(Key::EllipticCurve(key))
    }
}

impl Jwk {
    fn from_key(key: Key) -> Self {
        Self {
            key_id: None,
            usage: None,
            algorithm: None,
            certificate_url: None,
            certificate_sha1: None,
            certificate_sha256: None,
            key,
        }
    }
}

impl Verifier for Jwk {
    type Algorithm = jwa::Algorithm;
    type Error = error::JwkVerifyError;

    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        if let Ok(alg) = jws::Algorithm::try_from(alg) {
            self.key.can_verify(alg)
        } else {
            false
        }
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        if alg.to_usage() != jwa::Usage::Signing {
            return Err(error::jwk_usage_mismatch().into());
        }

        if let Some(u) = self.usage {
            if u != jwa::Usage::Signing {
                return Err(error::jwk_usage_mismatch().into());
            }
        }

        match self.algorithm {
            Some(key_alg) if key_alg == alg => {}
            Some(_) => {
                return Err(error::incompatible_algorithm(alg).into());
            }
            None => {}
        }

        let alg = jws::Algorithm::try_from(alg)?;
        if !self.key.can_verify(alg) {
            return Err(error::incompatible_algorithm(alg).into());
        }

        self.key.verify(alg, data, signature)?;

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct JwkDto {
    #[serde(rename = "kid", default)]
    key_id: Option<KeyId>,

    #[serde(rename = "use", default)]
    usage: Option<jwa::Usage>,

    #[serde(rename = "alg", default)]
    algorithm: Option<jwa::Algorithm>,

    #[serde(rename = "x5u", default)]
    certificate_url: Option<CertificateUrl>,

    #[serde(rename = "x5t", default)]
    certificate_sha1: Option<Base64Url>,

    #[serde(rename = "x5t#S256", default)]
    certificate_sha256: Option<Base64Url>,

    #[serde(flatten)]
    key: Key,
}

impl TryFrom<JwkDto> for Jwk {
    type Error = error::IncompatibleAlgorithm;

    fn try_from(dto: JwkDto) -> Result<Self, Self::Error> {
        if let Some(alg) = &dto.algorithm {
            if !dto.key.is_compatible(*alg) {
                return Err(error::incompatible_algorithm(*alg));
            }
        }

        Ok(Self {
            key_id: dto.key_id,
            usage: dto.usage,
            algorithm: dto.algorithm,
            certificate_url: dto.certificate_url,
            certificate_sha1: dto.certificate_sha1,
            certificate_sha256: dto.certificate_sha256,
            key: dto.key,
        })
    }
}

/// The key material of a JWK
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kty")]
enum Key {
    /// RSA
    #[cfg(feature = "rsa")]
    #[serde(rename = "RSA")]
    Rsa(jwa::Rsa),

    /// Elliptic curve cryptography
    #[cfg(feature = "ec")]
    #[serde(rename = "EC")]
    EllipticCurve(jwa::EllipticCurve),

    /// Shared secret
    #[serde(rename = "oct")]
    Symmetric(jwa::Symmetric),
}

impl Key {
    fn is_compatible(&self, alg: jwa::Algorithm) -> bool {
        match alg {
            jwa::Algorithm::Signing(alg) => self.can_verify(alg),
            jwa::Algorithm::KeyManagement(jwa::KeyManagement::Dir) => {
                matches!(self, Self::Symmetric(_))
            }
            jwa::Algorithm::ContentEncryption(enc) => match self {
                Self::Symmetric(k) => k.content_key(enc).is_ok(),

                #[allow(unreachable_patterns)]
                _ => false,
            },
        }
    }

    /// The required members in lexicographic order, without whitespace
    fn canonical_members(&self) -> Result<String, error::ThumbprintUnavailable> {
        match self {
            #[cfg(feature = "rsa")]
            Self::Rsa(k) => Ok(format!(
                r#"{{"e":"{}","kty":"RSA","n":"{}"}}"#,
                k.exponent(),
                k.modulus()
            )),

            #[cfg(feature = "ec")]
            Self::EllipticCurve(k) => Ok(format!(
                r#"{{"crv":"{}","kty":"EC","x":"{}","y":"{}"}}"#,
                k.curve().as_str(),
                k.x(),
                k.y()
            )),

            Self::Symmetric(k) => {
                if k.secret().as_slice().is_empty() {
                    return Err(error::thumbprint_unavailable("empty symmetric secret"));
                }

                Ok(format!(r#"{{"k":"{}","kty":"oct"}}"#, k.secret()))
            }
        }
    }
}

impl Verifier for Key {
    type Algorithm = jws::Algorithm;
    type Error = error::JwkVerifyError;

    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        match self {
            #[cfg(feature = "rsa")]
            Self::Rsa(p) => {
                if let Ok(alg) = alg.try_into() {
                    p.can_verify(alg)
                } else {
                    false
                }
            }

            #[cfg(feature = "ec")]
            Self::EllipticCurve(p) => {
                if let Ok(alg) = alg.try_into() {
                    p.can_verify(alg)
                } else {
                    false
                }
            }

            Self::Symmetric(p) => {
                if let Ok(alg) = alg.try_into() {
                    p.can_verify(alg)
                } else {
                    false
                }
            }
        }
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        match self {
            #[cfg(feature = "rsa")]
            Self::Rsa(p) => p.verify(alg.try_into()?, data, signature)?,

            #[cfg(feature = "ec")]
            Self::EllipticCurve(p) => p.verify(alg.try_into()?, data, signature)?,

            Self::Symmetric(p) => p.verify(alg.try_into()?, data, signature)?,
        }

        Ok(())
    }
}
