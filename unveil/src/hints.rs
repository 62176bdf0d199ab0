//! Header and key metadata used to pair a token layer with its key
//!
//! Signed and encrypted headers carry the same set of key hints. Both
//! implement [`KeyHints`], so matching logic is written once against the
//! trait rather than once per header kind.

use aliri_braid::braid;

use crate::{
    jwk::{CertificateUrlRef, KeyIdRef, Thumbprint},
    Jwk,
};

/// The media type of a token's payload (`cty`)
#[braid(serde, ref_doc = "A borrowed reference to a [`ContentType`]")]
pub struct ContentType;

impl ContentTypeRef {
    /// Whether the payload is itself a compact-serialized token
    ///
    /// Compared case-insensitively. The `application/` prefix may be
    /// included or omitted.
    #[must_use]
    pub fn is_jwt(&self) -> bool {
        let s = self.as_str();
        let s = match s.get(..12) {
            Some(prefix) if prefix.eq_ignore_ascii_case("application/") => &s[12..],
            _ => s,
        };

        s.eq_ignore_ascii_case("JWT")
    }
}

/// Key hints carried by a protected header
pub trait KeyHints {
    /// The key ID (`kid`)
    fn key_id(&self) -> Option<&KeyIdRef>;

    /// A public key embedded in the header (`jwk`)
    fn embedded_key(&self) -> Option<&Jwk>;

    /// The X.509 certificate URL (`x5u`)
    fn certificate_url(&self) -> Option<&CertificateUrlRef>;

    /// The X.509 certificate SHA-256 thumbprint (`x5t#S256`)
    fn certificate_sha256(&self) -> Option<&[u8]>;

    /// The X.509 certificate SHA-1 thumbprint (`x5t`)
    fn certificate_sha1(&self) -> Option<&[u8]>;

    /// The content type of the payload (`cty`)
    fn content_type(&self) -> Option<&ContentTypeRef>;

    /// Whether the payload is a nested token
    fn is_nested(&self) -> bool {
        self.content_type().map_or(false, ContentTypeRef::is_jwt)
    }
}

impl<T: KeyHints + ?Sized> KeyHints for &'_ T {
    fn key_id(&self) -> Option<&KeyIdRef> {
        T::key_id(self)
    }

    fn embedded_key(&self) -> Option<&Jwk> {
        T::embedded_key(self)
    }

    fn certificate_url(&self) -> Option<&CertificateUrlRef> {
        T::certificate_url(self)
    }

    fn certificate_sha256(&self) -> Option<&[u8]> {
        T::certificate_sha256(self)
    }

    fn certificate_sha1(&self) -> Option<&[u8]> {
        T::certificate_sha1(self)
    }

    fn content_type(&self) -> Option<&ContentTypeRef> {
        T::content_type(self)
    }
}

/// Identifying metadata of a candidate key
pub trait KeyMaterial {
    /// The RFC 7638 thumbprint, if it can be computed
    fn thumbprint(&self) -> Option<Thumbprint>;

    /// The key ID (`kid`)
    fn key_id(&self) -> Option<&KeyIdRef>;

    /// The X.509 certificate URL (`x5u`)
    fn certificate_url(&self) -> Option<&CertificateUrlRef>;

    /// The X.509 certificate SHA-256 thumbprint (`x5t#S256`)
    fn certificate_sha256(&self) -> Option<&[u8]>;

    /// The X.509 certificate SHA-1 thumbprint (`x5t`)
    fn certificate_sha1(&self) -> Option<&[u8]>;
}

impl KeyMaterial for Jwk {
    fn thumbprint(&self) -> Option<Thumbprint> {
        Jwk::thumbprint(self).ok()
    }

    fn key_id(&self) -> Option<&KeyIdRef> {
        Jwk::key_id(self)
    }

    fn certificate_url(&self) -> Option<&CertificateUrlRef> {
        Jwk::certificate_url(self)
    }

    fn certificate_sha256(&self) -> Option<&[u8]> {
        Jwk::certificate_sha256(self)
    }

    fn certificate_sha1(&self) -> Option<&[u8]> {
        Jwk::certificate_sha1(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jwt_content_type_variants() {
        assert!(ContentTypeRef::from_str("JWT").is_jwt());
        assert!(ContentTypeRef::from_str("jwt").is_jwt());
        assert!(ContentTypeRef::from_str("application/jwt").is_jwt());
        assert!(ContentTypeRef::from_str("Application/JWT").is_jwt());
    }

    #[test]
    fn other_content_types_are_terminal() {
        assert!(!ContentTypeRef::from_str("json").is_jwt());
        assert!(!ContentTypeRef::from_str("application/json").is_jwt());
        assert!(!ContentTypeRef::from_str("application/").is_jwt());
        assert!(!ContentTypeRef::from_str("").is_jwt());
    }
}
