//! ECC JSON Web Algorithm implementations

use std::{convert::TryFrom, fmt};

use aliri_base64::Base64Url;
use serde::{Deserialize, Serialize};

use crate::{error, jws};

/// A named ECC curve
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Curve {
    /// The P-256 curve (prime256v1/secp256r1)
    #[serde(rename = "P-256")]
    P256,

    /// The P-384 curve (secp384r1)
    #[serde(rename = "P-384")]
    P384,
}

impl Curve {
    /// Size in bytes of a single affine coordinate
    #[must_use]
    pub const fn coordinate_len(self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
        }
    }

    /// The curve name as it appears in a JWK
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
        }
    }
}

/// Elliptic curve public key
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EllipticCurveDto")]
#[must_use]
pub struct EllipticCurve {
    #[serde(rename = "crv")]
    curve: Curve,
    x: Base64Url,
    y: Base64Url,
}

impl EllipticCurve {
    /// Constructs a public key from its affine coordinates
    ///
    /// # Errors
    ///
    /// A coordinate does not have the size the curve calls for.
    pub fn from_coordinates(
        curve: Curve,
        x: impl Into<Base64Url>,
        y: impl Into<Base64Url>,
    ) -> Result<Self, error::KeyRejected> {
        let x = x.into();
        let y = y.into();
        if x.as_slice().len() != curve.coordinate_len() || y.as_slice().len() != curve.coordinate_len()
        {
            return Err(error::key_rejected(format!(
                "{} coordinates must be {} bytes",
                curve.as_str(),
                curve.coordinate_len()
            )));
        }

        Ok(Self { curve, x, y })
    }

    /// The curve of this key
    #[must_use]
    pub fn curve(&self) -> Curve {
        self.curve
    }

    /// The affine x coordinate
    pub fn x(&self) -> &Base64Url {
        &self.x
    }

    /// The affine y coordinate
    pub fn y(&self) -> &Base64Url {
        &self.y
    }

    fn uncompressed_point(&self) -> Vec<u8> {
        let mut point = Vec::with_capacity(1 + self.x.as_slice().len() + self.y.as_slice().len());
        point.push(0x04);
        point.extend_from_slice(self.x.as_slice());
        point.extend_from_slice(self.y.as_slice());
        point
    }
}

#[derive(Deserialize)]
struct EllipticCurveDto {
    crv: Curve,
    x: Base64Url,
    y: Base64Url,
}

impl TryFrom<EllipticCurveDto> for EllipticCurve {
    type Error = error::KeyRejected;

    fn try_from(dto: EllipticCurveDto) -> Result<Self, Self::Error> {
        Self::from_coordinates(dto.crv, dto.x, dto.y)
    }
}

/// Elliptic curve cryptography signing algorithms
///
/// This list may be expanded in the future.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[allow(clippy::upper_case_acronyms)]
#[non_exhaustive]
pub enum SigningAlgorithm {
    /// ECDSA using the P-256 curve and SHA-256
    ES256,
    /// ECDSA using the P-384 curve and SHA-384
    ES384,
}

impl SigningAlgorithm {
    fn verification_algorithm(self) -> &'static ring::signature::EcdsaVerificationAlgorithm {
        match self {
            Self::ES256 => &ring::signature::ECDSA_P256_SHA256_FIXED,
            Self::ES384 => &ring::signature::ECDSA_P384_SHA384_FIXED,
        }
    }

    /// The curve this algorithm signs over
    #[must_use]
    pub const fn curve(self) -> Curve {
        match self {
            Self::ES256 => Curve::P256,
            Self::ES384 => Curve::P384,
        }
    }
}

impl From<SigningAlgorithm> for jws::Algorithm {
    fn from(alg: SigningAlgorithm) -> Self {
        Self::EllipticCurve(alg)
    }
}

impl TryFrom<jws::Algorithm> for SigningAlgorithm {
    type Error = error::IncompatibleAlgorithm;

    fn try_from(alg: jws::Algorithm) -> Result<Self, Self::Error> {
        match alg {
            jws::Algorithm::EllipticCurve(alg) => Ok(alg),

            #[allow(unreachable_patterns)]
            _ => Err(error::incompatible_algorithm(alg)),
        }
    }
}

impl jws::Verifier for EllipticCurve {
    type Algorithm = SigningAlgorithm;
    type Error = error::SignatureMismatch;

    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        alg.curve() == self.curve
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        if !self.can_verify(alg) {
            return Err(error::signature_mismatch());
        }

        let point = self.uncompressed_point();
        ring::signature::UnparsedPublicKey::new(alg.verification_algorithm(), &point)
            .verify(data, signature)
            .map_err(|_| error::signature_mismatch())
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::ES256 => "ES256",
            Self::ES384 => "ES384",
        };

        f.write_str(s)
    }
}
