//! Selecting the key for a nested token layer
//!
//! Each candidate key is tested against the header with the rules of
//! [`MatchRule::PRIORITY`], in that order. The first candidate that
//! satisfies any rule wins, so list order among candidates takes precedence
//! over rule order.

use std::fmt;

use crate::hints::{KeyHints, KeyMaterial};

/// A single way in which a key can be identified by a header
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum MatchRule {
    /// The key's RFC 7638 thumbprint equals the header `kid`
    Thumbprint,
    /// The key's thumbprint equals the thumbprint of the header `jwk`
    EmbeddedKey,
    /// The header `x5u` equals the key's `x5u`
    CertificateUrl,
    /// The header `x5t#S256` equals the key's `x5t#S256`
    CertificateSha256,
    /// The header `x5t` equals the key's `x5t`
    CertificateSha1,
    /// The header `kid` equals the key's `kid`
    KeyId,
}

impl MatchRule {
    /// Rules in the order they are tried for each candidate
    pub const PRIORITY: [MatchRule; 6] = [
        Self::Thumbprint,
        Self::EmbeddedKey,
        Self::CertificateUrl,
        Self::CertificateSha256,
        Self::CertificateSha1,
        Self::KeyId,
    ];

    /// Whether `key` is identified by `header` under this rule
    #[must_use]
    pub fn matches<K, H>(self, key: &K, header: &H) -> bool
    where
        K: KeyMaterial + ?Sized,
        H: KeyHints + ?Sized,
    {
        let predicate: fn(&K, &H) -> bool = match self {
            Self::Thumbprint => thumbprint_is_key_id::<K, H>,
            Self::EmbeddedKey => thumbprint_of_embedded_key::<K, H>,
            Self::CertificateUrl => same_certificate_url::<K, H>,
            Self::CertificateSha256 => same_certificate_sha256::<K, H>,
            Self::CertificateSha1 => same_certificate_sha1::<K, H>,
            Self::KeyId => same_key_id::<K, H>,
        };

        predicate(key, header)
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Thumbprint => "thumbprint",
            Self::EmbeddedKey => "jwk",
            Self::CertificateUrl => "x5u",
            Self::CertificateSha256 => "x5t#S256",
            Self::CertificateSha1 => "x5t",
            Self::KeyId => "kid",
        };

        f.write_str(s)
    }
}

fn thumbprint_is_key_id<K, H>(key: &K, header: &H) -> bool
where
    K: KeyMaterial + ?Sized,
    H: KeyHints + ?Sized,
{
    match (header.key_id(), key.thumbprint()) {
        (Some(kid), Some(tp)) => tp.matches_key_id(kid),
        _ => false,
    }
}

fn thumbprint_of_embedded_key<K, H>(key: &K, header: &H) -> bool
where
    K: KeyMaterial + ?Sized,
    H: KeyHints + ?Sized,
{
    let embedded = match header.embedded_key().and_then(KeyMaterial::thumbprint) {
        Some(tp) => tp,
        None => return false,
    };

    key.thumbprint().map_or(false, |tp| tp == embedded)
}

fn same_certificate_url<K, H>(key: &K, header: &H) -> bool
where
    K: KeyMaterial + ?Sized,
    H: KeyHints + ?Sized,
{
    both_equal(header.certificate_url(), key.certificate_url())
}

fn same_certificate_sha256<K, H>(key: &K, header: &H) -> bool
where
    K: KeyMaterial + ?Sized,
    H: KeyHints + ?Sized,
{
    both_equal(header.certificate_sha256(), key.certificate_sha256())
}

fn same_certificate_sha1<K, H>(key: &K, header: &H) -> bool
where
    K: KeyMaterial + ?Sized,
    H: KeyHints + ?Sized,
{
    both_equal(header.certificate_sha1(), key.certificate_sha1())
}

fn same_key_id<K, H>(key: &K, header: &H) -> bool
where
    K: KeyMaterial + ?Sized,
    H: KeyHints + ?Sized,
{
    both_equal(header.key_id(), key.key_id())
}

fn both_equal<T: PartialEq + ?Sized>(a: Option<&T>, b: Option<&T>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

/// Finds the first candidate identified by `header`
///
/// Returns `None` when there is no header or no candidate matches.
pub fn resolve_key<'k, K, H>(candidates: &'k [K], header: Option<&H>) -> Option<&'k K>
where
    K: KeyMaterial,
    H: KeyHints + ?Sized,
{
    resolve_key_with_rule(candidates, header).map(|(key, _)| key)
}

/// Finds the first candidate identified by `header`, along with the rule
/// that identified it
pub fn resolve_key_with_rule<'k, K, H>(
    candidates: &'k [K],
    header: Option<&H>,
) -> Option<(&'k K, MatchRule)>
where
    K: KeyMaterial,
    H: KeyHints + ?Sized,
{
    let header = header?;

    candidates.iter().find_map(|key| {
        MatchRule::PRIORITY
            .iter()
            .copied()
            .find(|rule| rule.matches(key, header))
            .map(|rule| (key, rule))
    })
}
