//! Common errors

#![allow(missing_copy_implementations)]

use std::error::Error as StdError;

use thiserror::Error;

/// The key cannot be used with the requested algorithm
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("key incompatible with algorithm '{alg}'")]
pub struct IncompatibleAlgorithm {
    alg: crate::jwa::Algorithm,
}

#[inline]
pub(crate) fn incompatible_algorithm(
    alg: impl Into<crate::jwa::Algorithm>,
) -> IncompatibleAlgorithm {
    IncompatibleAlgorithm { alg: alg.into() }
}

/// The provided name could not be matched with supported algorithms
#[derive(Debug, Error)]
#[error("'{alg}' does not match supported algorithms")]
pub struct UnknownAlgorithm {
    alg: String,
}

#[inline]
pub(crate) fn unknown_algorithm(alg: String) -> UnknownAlgorithm {
    UnknownAlgorithm { alg }
}

/// The JWK has a specific usage that disallows this use
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("JWK cannot be used in this way")]
pub struct JwkUsageMismatch {
    _p: (),
}

pub(crate) const fn jwk_usage_mismatch() -> JwkUsageMismatch {
    JwkUsageMismatch { _p: () }
}

/// No key was supplied for an operation that needs one
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("no {role} key supplied")]
pub struct MissingKey {
    role: &'static str,
}

pub(crate) const fn missing_key(role: &'static str) -> MissingKey {
    MissingKey { role }
}

/// The signature did not match
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("signature mismatch")]
pub struct SignatureMismatch {
    _p: (),
}

pub(crate) const fn signature_mismatch() -> SignatureMismatch {
    SignatureMismatch { _p: () }
}

/// The key material was rejected
#[derive(Debug, Error)]
#[error("key rejected")]
pub struct KeyRejected {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn key_rejected(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> KeyRejected {
    KeyRejected {
        source: source.into(),
    }
}

/// The key's essential parameters cannot be canonicalized into a thumbprint
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("thumbprint unavailable: {reason}")]
pub struct ThumbprintUnavailable {
    reason: &'static str,
}

pub(crate) const fn thumbprint_unavailable(reason: &'static str) -> ThumbprintUnavailable {
    ThumbprintUnavailable { reason }
}

/// The compact serialization does not have the expected number of segments
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("malformed token: expected {expected} segments")]
pub struct MalformedToken {
    expected: usize,
}

pub(crate) const fn malformed_token(expected: usize) -> MalformedToken {
    MalformedToken { expected }
}

/// The protected header is malformed
#[derive(Debug, Error)]
#[error("malformed token header")]
pub struct MalformedHeader {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn malformed_header(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> MalformedHeader {
    MalformedHeader {
        source: source.into(),
    }
}

/// A segment other than the header is malformed
#[derive(Debug, Error)]
#[error("malformed token {segment}")]
pub struct MalformedSegment {
    segment: &'static str,
    #[source]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn malformed_segment(
    segment: &'static str,
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> MalformedSegment {
    MalformedSegment {
        segment,
        source: source.into(),
    }
}

/// The decoded payload is not an acceptable claim set
#[derive(Debug, Error)]
#[error("malformed claims")]
pub struct MalformedClaims {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn malformed_claims(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> MalformedClaims {
    MalformedClaims {
        source: source.into(),
    }
}

/// The header requests a feature that is not supported
#[derive(Debug, Error)]
#[error("unsupported header parameter '{param}'")]
pub struct UnsupportedParameter {
    param: &'static str,
}

pub(crate) const fn unsupported_parameter(param: &'static str) -> UnsupportedParameter {
    UnsupportedParameter { param }
}

/// Authenticated decryption failed
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("decryption failed")]
pub struct DecryptionFailed {
    _p: (),
}

pub(crate) const fn decryption_failed() -> DecryptionFailed {
    DecryptionFailed { _p: () }
}

/// An error occurring while verifying a signature with a JWK
#[derive(Debug, Error)]
pub enum JwkVerifyError {
    /// No key was available to verify with
    #[error(transparent)]
    MissingKey(#[from] MissingKey),

    /// Token cannot be verified with this algorithm
    #[error(transparent)]
    IncompatibleAlgorithm(#[from] IncompatibleAlgorithm),

    /// JWK cannot be used for signature verification
    #[error(transparent)]
    JwkUsageMismatch(#[from] JwkUsageMismatch),

    /// Signature is invalid
    #[error(transparent)]
    SignatureMismatch(#[from] SignatureMismatch),
}

impl JwkVerifyError {
    /// Whether the error is due to an incompatible algorithm
    #[must_use]
    pub fn is_incompatible_alg(&self) -> bool {
        matches!(self, Self::IncompatibleAlgorithm(_))
    }

    /// Whether the error is due to a usage mismatch
    #[must_use]
    pub fn is_usage_mismatch(&self) -> bool {
        matches!(self, Self::JwkUsageMismatch(_))
    }

    /// Whether the error is due to a signature mismatch
    #[must_use]
    pub fn is_signature_mismatch(&self) -> bool {
        matches!(self, Self::SignatureMismatch(_))
    }

    /// Whether the error is due to a missing key
    #[must_use]
    pub fn is_missing_key(&self) -> bool {
        matches!(self, Self::MissingKey(_))
    }
}

/// An error occurring while decomposing a signed token
#[derive(Debug, Error)]
pub enum JwsError {
    /// The token does not have three segments
    #[error(transparent)]
    MalformedToken(#[from] MalformedToken),

    /// The protected header is malformed
    #[error(transparent)]
    MalformedHeader(#[from] MalformedHeader),

    /// The payload or signature is malformed
    #[error(transparent)]
    MalformedSegment(#[from] MalformedSegment),
}

/// An error occurring while decomposing or decrypting an encrypted token
#[derive(Debug, Error)]
pub enum JweError {
    /// The token does not have five segments
    #[error(transparent)]
    MalformedToken(#[from] MalformedToken),

    /// The protected header is malformed
    #[error(transparent)]
    MalformedHeader(#[from] MalformedHeader),

    /// The encrypted key, IV, ciphertext, or tag is malformed
    #[error(transparent)]
    MalformedSegment(#[from] MalformedSegment),

    /// The header requests an unsupported feature
    #[error(transparent)]
    UnsupportedParameter(#[from] UnsupportedParameter),

    /// No key was available to decrypt with
    #[error(transparent)]
    MissingKey(#[from] MissingKey),

    /// The key cannot be used with the requested algorithm
    #[error(transparent)]
    IncompatibleAlgorithm(#[from] IncompatibleAlgorithm),

    /// JWK cannot be used for decryption
    #[error(transparent)]
    JwkUsageMismatch(#[from] JwkUsageMismatch),

    /// The key material is unusable
    #[error(transparent)]
    KeyRejected(#[from] KeyRejected),

    /// The ciphertext failed authentication
    #[error(transparent)]
    DecryptionFailed(#[from] DecryptionFailed),
}

impl JweError {
    /// Whether the ciphertext failed to authenticate
    #[must_use]
    pub fn is_decryption_failure(&self) -> bool {
        matches!(self, Self::DecryptionFailed(_))
    }

    /// Whether the error is due to a missing key
    #[must_use]
    pub fn is_missing_key(&self) -> bool {
        matches!(self, Self::MissingKey(_))
    }
}

/// An error occurring when validating the claims of a token
#[derive(Debug, Error)]
pub enum ClaimsRejected {
    /// The token issuer is not the expected one
    #[error("issuer mismatch")]
    IssuerMismatch,

    /// The token is expired according to the `exp` claim
    #[error("token expired")]
    Expired,

    /// The token is not yet valid according to the `nbf` claim
    #[error("token not yet valid")]
    NotYetValid,

    /// The `iat` claim lies in the future
    #[error("token issued in the future")]
    IssuedInTheFuture,

    /// The token audience does not include the expected one
    #[error("audience mismatch")]
    AudienceMismatch,

    /// The token subject is not acceptable
    #[error("invalid subject")]
    InvalidSubject,

    /// A required claim is missing
    #[error("required {_0} claim missing")]
    MissingRequiredClaim(&'static str),

    /// Custom validation error
    #[error(transparent)]
    Custom(Box<dyn StdError + Send + Sync>),
}

impl ClaimsRejected {
    /// Wraps an error raised by a caller-supplied claims check
    pub fn custom(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Custom(source.into())
    }
}

/// An error occurring while verifying a token
///
/// Any error means the token must be rejected. No partially decoded claims
/// are ever handed back alongside an error.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The token has neither three nor five segments
    #[error("unknown token format")]
    UnknownFormat,

    /// The signature does not match the signed content
    #[error("invalid signature")]
    InvalidSignature,

    /// A nested token was found, but no nested key matches its header
    #[error("no nested key matches the token header")]
    MissingNestedJwtKey,

    /// The `iss` claim is not the expected issuer
    #[error("issuer mismatch")]
    IssuerMismatch,

    /// The `exp` claim has passed
    #[error("token expired")]
    Expired,

    /// The `nbf` claim has not yet been reached
    #[error("token not yet valid")]
    NotYetValid,

    /// The `iat` claim lies in the future
    #[error("token issued in the future")]
    IssuedInTheFuture,

    /// The `aud` claim does not contain the expected audience
    #[error("audience mismatch")]
    AudienceMismatch,

    /// The `sub` claim does not match the configured pattern
    #[error("invalid subject")]
    InvalidSubject,

    /// A claim the validator requires is absent
    #[error("required {_0} claim missing")]
    MissingRequiredClaim(&'static str),

    /// The caller-supplied claims check rejected the token
    #[error("extra claim validation failed")]
    ExtraClaimValidationFailed(#[source] Box<dyn StdError + Send + Sync>),

    /// The innermost payload could not be decoded
    #[error("failed to decode token payload")]
    DecodeFailed(#[from] MalformedClaims),

    /// The token nests more layers than allowed
    #[error("token nested deeper than {max} layers")]
    NestingTooDeep {
        /// The configured maximum number of layers
        max: usize,
    },

    /// A signed layer could not be decomposed
    #[error(transparent)]
    Jws(#[from] JwsError),

    /// A signed layer could not be checked with the given key
    #[error(transparent)]
    Jwk(#[from] JwkVerifyError),

    /// An encrypted layer could not be decomposed or decrypted
    #[error(transparent)]
    Jwe(#[from] JweError),
}

impl From<ClaimsRejected> for VerifyError {
    fn from(err: ClaimsRejected) -> Self {
        match err {
            ClaimsRejected::IssuerMismatch => Self::IssuerMismatch,
            ClaimsRejected::Expired => Self::Expired,
            ClaimsRejected::NotYetValid => Self::NotYetValid,
            ClaimsRejected::IssuedInTheFuture => Self::IssuedInTheFuture,
            ClaimsRejected::AudienceMismatch => Self::AudienceMismatch,
            ClaimsRejected::InvalidSubject => Self::InvalidSubject,
            ClaimsRejected::MissingRequiredClaim(claim) => Self::MissingRequiredClaim(claim),
            ClaimsRejected::Custom(source) => Self::ExtraClaimValidationFailed(source),
        }
    }
}

impl VerifyError {
    /// Whether the error was raised by a registered or custom claims check
    #[must_use]
    pub fn is_claims_rejection(&self) -> bool {
        matches!(
            self,
            Self::IssuerMismatch
                | Self::Expired
                | Self::NotYetValid
                | Self::IssuedInTheFuture
                | Self::AudienceMismatch
                | Self::InvalidSubject
                | Self::MissingRequiredClaim(_)
                | Self::ExtraClaimValidationFailed(_)
        )
    }
}
