use std::{convert::TryFrom, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{error, jwa, jws};

/// An algorithm a JWK may be restricted to
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
#[non_exhaustive]
pub enum Algorithm {
    /// A signing/verification algorithm
    Signing(jws::Algorithm),

    /// A key management algorithm for encrypted tokens
    KeyManagement(jwa::KeyManagement),

    /// A content encryption algorithm for encrypted tokens
    ContentEncryption(jwa::ContentEncryption),
}

/// The intended use for a key or algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[must_use]
pub enum Usage {
    /// Signing and verification
    #[serde(rename = "sig")]
    Signing,

    /// Encryption and decryption
    #[serde(rename = "enc")]
    Encryption,
}

impl Algorithm {
    /// Gets the usage related to this algorithm
    pub fn to_usage(self) -> Usage {
        match self {
            Self::Signing(_) => Usage::Signing,
            Self::KeyManagement(_) | Self::ContentEncryption(_) => Usage::Encryption,
        }
    }

    /// The `dir` key management algorithm
    pub const DIR: Algorithm = Self::KeyManagement(jwa::KeyManagement::Dir);
    /// The A128GCM content encryption algorithm
    pub const A128GCM: Algorithm = Self::ContentEncryption(jwa::ContentEncryption::A128GCM);
    /// The A256GCM content encryption algorithm
    pub const A256GCM: Algorithm = Self::ContentEncryption(jwa::ContentEncryption::A256GCM);

    /// The HS256 signing algorithm
    pub const HS256: Algorithm = Self::Signing(jws::Algorithm::HS256);
    /// The HS384 signing algorithm
    pub const HS384: Algorithm = Self::Signing(jws::Algorithm::HS384);
    /// The HS512 signing algorithm
    pub const HS512: Algorithm = Self::Signing(jws::Algorithm::HS512);
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Signing(x) => fmt::Display::fmt(x, f),
            Self::KeyManagement(x) => fmt::Display::fmt(x, f),
            Self::ContentEncryption(x) => fmt::Display::fmt(x, f),
        }
    }
}

#[cfg(feature = "rsa")]
#[cfg_attr(docsrs, doc(cfg(feature = "rsa")))]
impl Algorithm {
    /// The RS256 signing algorithm
    pub const RS256: Algorithm = Self::Signing(jws::Algorithm::RS256);
    /// The RS384 signing algorithm
    pub const RS384: Algorithm = Self::Signing(jws::Algorithm::RS384);
    /// The RS512 signing algorithm
    pub const RS512: Algorithm = Self::Signing(jws::Algorithm::RS512);
    /// The PS256 signing algorithm
    pub const PS256: Algorithm = Self::Signing(jws::Algorithm::PS256);
    /// The PS384 signing algorithm
    pub const PS384: Algorithm = Self::Signing(jws::Algorithm::PS384);
    /// The PS512 signing algorithm
    pub const PS512: Algorithm = Self::Signing(jws::Algorithm::PS512);
}

#[cfg(feature = "ec")]
#[cfg_attr(docsrs, doc(cfg(feature = "ec")))]
impl Algorithm {
    /// The ES256 signing algorithm
    pub const ES256: Algorithm = Self::Signing(jws::Algorithm::ES256);
    /// The ES384 signing algorithm
    pub const ES384: Algorithm = Self::Signing(jws::Algorithm::ES384);
}

impl TryFrom<&'_ str> for Algorithm {
    type Error = error::UnknownAlgorithm;

    #[inline]
    fn try_from(value: &'_ str) -> Result<Self, Self::Error> {
        match value {
            #[cfg(feature = "ec")]
            "ES256" => Ok(Algorithm::ES256),
            #[cfg(feature = "ec")]
            "ES384" => Ok(Algorithm::ES384),
            #[cfg(feature = "rsa")]
            "RS256" => Ok(Algorithm::RS256),
            #[cfg(feature = "rsa")]
            "RS384" => Ok(Algorithm::RS384),
            #[cfg(feature = "rsa")]
            "RS512" => Ok(Algorithm::RS512),
            #[cfg(feature = "rsa")]
            "PS256" => Ok(Algorithm::PS256),
            #[cfg(feature = "rsa")]
            "PS384" => Ok(Algorithm::PS384),
            #[cfg(feature = "rsa")]
            "PS512" => Ok(Algorithm::PS512),
            "HS256" => Ok(Algorithm::HS256),
            "HS384" => Ok(Algorithm::HS384),
            "HS512" => Ok(Algorithm::HS512),
            "dir" => Ok(Algorithm::DIR),
            "A128GCM" => Ok(Algorithm::A128GCM),
            "A256GCM" => Ok(Algorithm::A256GCM),
            _ => Err(error::unknown_algorithm(value.to_string())),
        }
    }
}

impl FromStr for Algorithm {
    type Err = error::UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

impl From<jws::Algorithm> for Algorithm {
    #[inline]
    fn from(alg: jws::Algorithm) -> Self {
        Self::Signing(alg)
    }
}

impl From<jwa::KeyManagement> for Algorithm {
    #[inline]
    fn from(alg: jwa::KeyManagement) -> Self {
        Self::KeyManagement(alg)
    }
}

impl From<jwa::ContentEncryption> for Algorithm {
    #[inline]
    fn from(alg: jwa::ContentEncryption) -> Self {
        Self::ContentEncryption(alg)
    }
}

impl TryFrom<Algorithm> for jws::Algorithm {
    type Error = error::IncompatibleAlgorithm;

    #[inline]
    fn try_from(alg: Algorithm) -> Result<Self, Self::Error> {
        match alg {
            Algorithm::Signing(alg) => Ok(alg),
            _ => Err(error::incompatible_algorithm(alg)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_from_every_family() {
        assert_eq!("HS256".parse::<Algorithm>().unwrap(), Algorithm::HS256);
        assert_eq!("dir".parse::<Algorithm>().unwrap(), Algorithm::DIR);
        assert_eq!("A256GCM".parse::<Algorithm>().unwrap(), Algorithm::A256GCM);
        assert!("none".parse::<Algorithm>().is_err());
    }

    #[test]
    fn usage_follows_family() {
        assert_eq!(Algorithm::HS384.to_usage(), Usage::Signing);
        assert_eq!(Algorithm::DIR.to_usage(), Usage::Encryption);
        assert_eq!(Algorithm::A128GCM.to_usage(), Usage::Encryption);
    }

    #[test]
    fn deserializes_untagged() {
        let alg: Algorithm = serde_json::from_str(r#""A128GCM""#).unwrap();
        assert_eq!(alg, Algorithm::A128GCM);
        let alg: Algorithm = serde_json::from_str(r#""HS512""#).unwrap();
        assert_eq!(alg, Algorithm::HS512);
    }

    #[test]
    fn only_signing_algorithms_convert_to_jws() {
        assert!(jws::Algorithm::try_from(Algorithm::HS256).is_ok());
        assert!(jws::Algorithm::try_from(Algorithm::DIR).is_err());
    }
}
