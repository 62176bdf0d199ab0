//! Claim sets carried by tokens, and their validation
//!
//! The registered claims of [RFC7519][] are modeled by [`Claims`], which
//! also carries any caller-defined claims through its payload parameter.
//! Once a token's cryptographic layers have been verified, its claims are
//! checked by a [`CoreValidator`] and, last, by an optional caller-supplied
//! [`ClaimsValidator`].
//!
//! ```
//! use aliri_clock::{TestClock, UnixTime};
//! use unveil::jwt;
//!
//! let claims = jwt::Claims::new()
//!     .with_issuer("https://issuer.example")
//!     .with_audiences(vec![jwt::Audience::from_static("svc-a"), jwt::Audience::from_static("svc-b")])
//!     .with_expiration(UnixTime(1_000));
//!
//! let validator = jwt::CoreValidator::default()
//!     .require_issuer("https://issuer.example")
//!     .require_audience("svc-a");
//!
//! let clock = TestClock::new(UnixTime(999));
//! assert!(validator.validate_with_clock(&claims, jwt::NoopValidator, &clock).is_ok());
//! ```
//!
//! [RFC7519]: https://tools.ietf.org/html/rfc7519

use std::{fmt, time::Duration};

use aliri_braid::braid;
use aliri_clock::{Clock, System, UnixTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error;

/// An audience
#[braid(serde, ref_doc = "A borrowed reference to an [`Audience`]")]
pub struct Audience;

/// An issuer of tokens
#[braid(serde, ref_doc = "A borrowed reference to an [`Issuer`]")]
pub struct Issuer;

/// The subject of a token
#[braid(serde, ref_doc = "A borrowed reference to a [`Subject`]")]
pub struct Subject;

/// Registered claims that the core validator knows how to check
pub trait CoreClaims {
    /// Not before
    ///
    /// A verifier MUST reject this token before the given time.
    fn nbf(&self) -> Option<UnixTime>;

    /// Expires
    ///
    /// A verifier MUST reject this token at or after the given time.
    fn exp(&self) -> Option<UnixTime>;

    /// Issued at
    ///
    /// A verifier rejects a token claiming to be issued in the future.
    fn iat(&self) -> Option<UnixTime>;

    /// Audience
    ///
    /// A verifier MUST reject this token if it does not list the expected
    /// audience.
    fn aud(&self) -> Option<&Audiences>;

    /// Issuer
    ///
    /// A verifier MUST reject this token if the issuer is not the expected
    /// one.
    fn iss(&self) -> Option<&IssuerRef>;

    /// Subject
    fn sub(&self) -> Option<&SubjectRef>;
}

/// A claim set without caller-defined claims
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmptyClaims {}

/// The registered claims of a token, plus a caller-defined payload
///
/// Claims not named here are deserialized into `P`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct Claims<P = EmptyClaims> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aud: Option<Audiences>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iss: Option<Issuer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<Subject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<UnixTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nbf: Option<UnixTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<UnixTime>,
    #[serde(flatten)]
    payload: P,
}

impl Claims {
    /// Constructs an empty claim set
    pub const fn new() -> Self {
        Self::with_payload(EmptyClaims {})
    }
}

impl Default for Claims {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Claims<P> {
    /// Constructs a claim set with no registered claims around `payload`
    pub const fn with_payload(payload: P) -> Self {
        Self {
            aud: None,
            iss: None,
            sub: None,
            exp: None,
            nbf: None,
            iat: None,
            payload,
        }
    }

    /// The caller-defined claims
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Extracts the caller-defined claims
    pub fn into_payload(self) -> P {
        self.payload
    }

    /// Sets the `aud` claim to a single audience
    pub fn with_audience(mut self, aud: impl Into<Audience>) -> Self {
        self.aud = Some(Audiences::single(aud));
        self
    }

    /// Sets the `aud` claim, where multiple audiences are allowed
    pub fn with_audiences(mut self, aud: impl Into<Audiences>) -> Self {
        self.aud = Some(aud.into());
        self
    }

    /// Sets the `iss` claim
    pub fn with_issuer(mut self, iss: impl Into<Issuer>) -> Self {
        self.iss = Some(iss.into());
        self
    }

    /// Sets the `sub` claim
    pub fn with_subject(mut self, sub: impl Into<Subject>) -> Self {
        self.sub = Some(sub.into());
        self
    }

    /// Sets the `exp` claim
    pub fn with_expiration(mut self, time: UnixTime) -> Self {
        self.exp = Some(time);
        self
    }

    /// Sets the `nbf` claim
    pub fn with_not_before(mut self, time: UnixTime) -> Self {
        self.nbf = Some(time);
        self
    }

    /// Sets the `iat` claim
    pub fn with_issued_at(mut self, time: UnixTime) -> Self {
        self.iat = Some(time);
        self
    }
}

impl<P> CoreClaims for Claims<P> {
    fn nbf(&self) -> Option<UnixTime> {
        self.nbf
    }

    fn exp(&self) -> Option<UnixTime> {
        self.exp
    }

    fn iat(&self) -> Option<UnixTime> {
        self.iat
    }

    fn aud(&self) -> Option<&Audiences> {
        self.aud.as_ref()
    }

    fn iss(&self) -> Option<&IssuerRef> {
        self.iss.as_deref()
    }

    fn sub(&self) -> Option<&SubjectRef> {
        self.sub.as_deref()
    }
}

/// A set of zero or more [`Audience`]s
///
/// Serialized as a bare string when there is exactly one audience.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OneOrMany<Audience>", into = "OneOrMany<Audience>")]
#[repr(transparent)]
#[must_use]
pub struct Audiences(Vec<Audience>);

impl Audiences {
    /// An empty audience set
    #[inline]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// An audience set with a single audience
    #[inline]
    pub fn single(aud: impl Into<Audience>) -> Self {
        Self(vec![aud.into()])
    }

    /// Indicates whether the audience set is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `aud` is a member of the set
    #[must_use]
    pub fn contains(&self, aud: &AudienceRef) -> bool {
        self.iter().any(|a| a == aud)
    }

    /// Iterates through references to the audiences in the set
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &AudienceRef> {
        self.0.iter().map(AsRef::as_ref)
    }
}

impl From<OneOrMany<Audience>> for Audiences {
    #[inline]
    fn from(vals: OneOrMany<Audience>) -> Self {
        match vals {
            OneOrMany::One(x) => Self(vec![x]),
            OneOrMany::Many(v) => Self(v),
        }
    }
}

impl From<Audiences> for OneOrMany<Audience> {
    fn from(Audiences(mut vals): Audiences) -> Self {
        match vals.len() {
            1 => match vals.pop() {
                Some(aud) => Self::One(aud),
                None => Self::Many(vals),
            },
            _ => Self::Many(vals),
        }
    }
}

impl From<Vec<Audience>> for Audiences {
    #[inline]
    fn from(vals: Vec<Audience>) -> Self {
        Self(vals)
    }
}

impl From<Audience> for Audiences {
    #[inline]
    fn from(aud: Audience) -> Self {
        Self::single(aud)
    }
}

/// A type representing one or more items, primarily for serialization
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A single item
    One(T),

    /// Zero or more items, to be serialized/deserialized as an array
    Many(Vec<T>),
}

/// A caller-supplied check of the claims in a token
///
/// Runs after every registered claim check has passed.
pub trait ClaimsValidator<C> {
    /// Validates the claims decoded from a token
    ///
    /// # Errors
    ///
    /// Returns an error if the claims are invalid according to the
    /// validator. Domain-specific failures are best reported through
    /// [`ClaimsRejected::custom()`][error::ClaimsRejected::custom].
    fn validate(&self, claims: &C) -> Result<(), error::ClaimsRejected>;
}

impl<C, T> ClaimsValidator<C> for &'_ T
where
    T: ClaimsValidator<C> + ?Sized,
{
    #[inline]
    fn validate(&self, claims: &C) -> Result<(), error::ClaimsRejected> {
        T::validate(&**self, claims)
    }
}

impl<C, T> ClaimsValidator<C> for Box<T>
where
    T: ClaimsValidator<C> + ?Sized,
{
    #[inline]
    fn validate(&self, claims: &C) -> Result<(), error::ClaimsRejected> {
        T::validate(&**self, claims)
    }
}

/// A validator that makes no checks
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NoopValidator;

impl<C> ClaimsValidator<C> for NoopValidator {
    #[inline]
    fn validate(&self, _claims: &C) -> Result<(), error::ClaimsRejected> {
        Ok(())
    }
}

/// A claims validator built from a closure
///
/// Created by [`from_fn()`].
#[derive(Clone, Copy)]
pub struct FnValidator<F>(F);

impl<F> fmt::Debug for FnValidator<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("FnValidator")
    }
}

/// Wraps a closure as a [`ClaimsValidator`]
pub fn from_fn<C, F>(f: F) -> FnValidator<F>
where
    F: Fn(&C) -> Result<(), error::ClaimsRejected>,
{
    FnValidator(f)
}

impl<C, F> ClaimsValidator<C> for FnValidator<F>
where
    F: Fn(&C) -> Result<(), error::ClaimsRejected>,
{
    #[inline]
    fn validate(&self, claims: &C) -> Result<(), error::ClaimsRejected> {
        (self.0)(claims)
    }
}

/// The registered claim checks
///
/// Checks are made in a fixed order and the first failure is reported:
/// issuer, expiration, not before, issued at, audience, then subject.
/// Time claims that are absent are not checked. By default, an expected
/// issuer or audience is only compared when the token carries that claim;
/// see [`require_present_claims()`][Self::require_present_claims].
#[derive(Clone, Debug, Default)]
#[must_use]
pub struct CoreValidator {
    leeway: Duration,
    issuer: Option<Issuer>,
    audience: Option<Audience>,
    valid_subjects: Option<Regex>,
    require_present: bool,
}

impl CoreValidator {
    /// Sets the allowance for clock skew applied to the time claims
    #[inline]
    pub fn with_leeway(self, leeway: Duration) -> Self {
        Self { leeway, ..self }
    }

    /// Sets the allowance for clock skew applied to the time claims, in
    /// seconds
    #[inline]
    pub fn with_leeway_secs(self, leeway: u64) -> Self {
        Self {
            leeway: Duration::from_secs(leeway),
            ..self
        }
    }

    /// Requires that the `iss` claim, when present, be `issuer`
    #[inline]
    pub fn require_issuer(self, issuer: impl Into<Issuer>) -> Self {
        Self {
            issuer: Some(issuer.into()),
            ..self
        }
    }

    /// Requires that the `aud` claim, when present, contain `audience`
    #[inline]
    pub fn require_audience(self, audience: impl Into<Audience>) -> Self {
        Self {
            audience: Some(audience.into()),
            ..self
        }
    }

    /// Requires that the `sub` claim exists and matches a particular
    /// regular expression
    #[inline]
    pub fn check_subject(self, sub_regex: Regex) -> Self {
        Self {
            valid_subjects: Some(sub_regex),
            ..self
        }
    }

    /// Rejects tokens missing the `iss` or `aud` claim when an issuer or
    /// audience is expected
    #[inline]
    pub fn require_present_claims(self) -> Self {
        Self {
            require_present: true,
            ..self
        }
    }

    /// The expected issuer
    #[must_use]
    pub fn issuer(&self) -> Option<&IssuerRef> {
        self.issuer.as_deref()
    }

    /// The expected audience
    #[must_use]
    pub fn audience(&self) -> Option<&AudienceRef> {
        self.audience.as_deref()
    }

    /// Validates `claims` against the system clock, then runs `custom`
    ///
    /// # Errors
    ///
    /// The first check that fails.
    pub fn validate<C, X>(&self, claims: &C, custom: X) -> Result<(), error::ClaimsRejected>
    where
        C: CoreClaims,
        X: ClaimsValidator<C>,
    {
        self.validate_with_clock(claims, custom, &System)
    }

    /// Validates `claims` against `clock`, then runs `custom`
    ///
    /// The clock is read once.
    ///
    /// # Errors
    ///
    /// The first check that fails.
    pub fn validate_with_clock<C, X, K>(
        &self,
        claims: &C,
        custom: X,
        clock: &K,
    ) -> Result<(), error::ClaimsRejected>
    where
        C: CoreClaims,
        X: ClaimsValidator<C>,
        K: Clock + ?Sized,
    {
        let now = clock.now();
        let leeway = self.leeway.as_secs();

        if let Some(expected) = &self.issuer {
            match claims.iss() {
                Some(iss) if iss != expected => {
                    tracing::trace!(%iss, %expected, "issuer mismatch");
                    return Err(error::ClaimsRejected::IssuerMismatch);
                }
                None if self.require_present => {
                    return Err(error::ClaimsRejected::MissingRequiredClaim("iss"));
                }
                _ => {}
            }
        }

        if let Some(exp) = claims.exp() {
            if now.0 >= exp.0.saturating_add(leeway) {
                tracing::trace!(exp = exp.0, now = now.0, "token expired");
                return Err(error::ClaimsRejected::Expired);
            }
        }

        if let Some(nbf) = claims.nbf() {
            if now.0.saturating_add(leeway) < nbf.0 {
                tracing::trace!(nbf = nbf.0, now = now.0, "token not yet valid");
                return Err(error::ClaimsRejected::NotYetValid);
            }
        }

        if let Some(iat) = claims.iat() {
            if iat.0 > now.0.saturating_add(leeway) {
                tracing::trace!(iat = iat.0, now = now.0, "token issued in the future");
                return Err(error::ClaimsRejected::IssuedInTheFuture);
            }
        }

        if let Some(expected) = &self.audience {
            match claims.aud() {
                Some(aud) if !aud.contains(expected) => {
                    tracing::trace!(%expected, "audience mismatch");
                    return Err(error::ClaimsRejected::AudienceMismatch);
                }
                None if self.require_present => {
                    return Err(error::ClaimsRejected::MissingRequiredClaim("aud"));
                }
                _ => {}
            }
        }

        if let Some(valid_subs) = &self.valid_subjects {
            if let Some(sub) = claims.sub() {
                if !valid_subs.is_match(sub.as_str()) {
                    return Err(error::ClaimsRejected::InvalidSubject);
                }
            } else {
                return Err(error::ClaimsRejected::MissingRequiredClaim("sub"));
            }
        }

        custom.validate(claims)
    }
}
