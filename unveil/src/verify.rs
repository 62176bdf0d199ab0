//! Verification of compact-serialized tokens
//!
//! A token is classified by its number of `.`-separated segments: three for
//! a signed token and five for an encrypted token. A layer whose header
//! declares the content type `JWT` carries another token as its payload.
//! That token is verified in turn, with a key chosen from the nested key
//! candidates by [`resolve`][crate::resolve]. The innermost layer carries
//! the claims, which are decoded and then validated.
//!
//! Layers are unwound iteratively and their number is bounded by
//! [`TokenVerifier::with_max_depth()`].
//!
//! ```
//! use unveil::{jwt, verify::{Keys, TokenVerifier, Verified}, VerifyError};
//!
//! let verifier = TokenVerifier::default()
//!     .with_validator(jwt::CoreValidator::default().require_audience("svc-a"));
//!
//! let result: Result<Verified<jwt::Claims>, _> = verifier.verify("not-a-token", Keys::new());
//! assert!(matches!(result, Err(VerifyError::UnknownFormat)));
//! ```

use std::borrow::Cow;

use aliri_clock::{Clock, System};
use serde::de::DeserializeOwned;

use crate::{
    error::{self, VerifyError},
    hints::KeyHints,
    jwe, jws,
    jwt::{AudienceRef, ClaimsValidator, CoreClaims, CoreValidator, IssuerRef, NoopValidator},
    resolve, Jwk,
};

/// The number of layers a token may have unless configured otherwise
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Key material supplied for a single verification
#[derive(Clone, Copy, Debug, Default)]
#[must_use]
pub struct Keys<'a> {
    /// Verifies the outermost signed layer
    pub sender: Option<&'a Jwk>,

    /// Decrypts the outermost encrypted layer
    pub recipient: Option<&'a Jwk>,

    /// Candidates for the layers nested inside the outermost one
    pub nested: &'a [Jwk],
}

impl<'a> Keys<'a> {
    /// No keys at all
    pub const fn new() -> Self {
        Self {
            sender: None,
            recipient: None,
            nested: &[],
        }
    }

    /// Sets the key verifying the outermost signed layer
    pub const fn with_sender(self, sender: &'a Jwk) -> Self {
        Self {
            sender: Some(sender),
            ..self
        }
    }

    /// Sets the key decrypting the outermost encrypted layer
    pub const fn with_recipient(self, recipient: &'a Jwk) -> Self {
        Self {
            recipient: Some(recipient),
            ..self
        }
    }

    /// Sets the candidates for nested layers
    pub const fn with_nested(self, nested: &'a [Jwk]) -> Self {
        Self { nested, ..self }
    }
}

/// The verified claims of a token, with the innermost layer they came from
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub enum Verified<C> {
    /// The claims were carried by a signed layer
    Signed {
        /// The validated claims
        claims: C,

        /// The innermost signed layer
        layer: jws::Jws,
    },

    /// The claims were carried by an encrypted layer
    Encrypted {
        /// The validated claims
        claims: C,

        /// The innermost encrypted layer
        layer: jwe::Jwe,
    },
}

impl<C> Verified<C> {
    /// The validated claims
    pub fn claims(&self) -> &C {
        match self {
            Self::Signed { claims, .. } | Self::Encrypted { claims, .. } => claims,
        }
    }

    /// Extracts the validated claims
    pub fn into_claims(self) -> C {
        match self {
            Self::Signed { claims, .. } | Self::Encrypted { claims, .. } => claims,
        }
    }

    /// Whether the claims were carried by an encrypted layer
    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        matches!(self, Self::Encrypted { .. })
    }
}

/// Verifies tokens against a fixed set of claim checks
#[derive(Clone, Debug)]
#[must_use]
pub struct TokenVerifier {
    validator: CoreValidator,
    max_depth: usize,
}

impl Default for TokenVerifier {
    fn default() -> Self {
        Self {
            validator: CoreValidator::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl TokenVerifier {
    /// Sets the claim checks applied to the innermost layer
    pub fn with_validator(self, validator: CoreValidator) -> Self {
        Self { validator, ..self }
    }

    /// Sets the number of layers a token may have
    pub fn with_max_depth(self, max_depth: usize) -> Self {
        Self { max_depth, ..self }
    }

    /// The claim checks applied to the innermost layer
    pub fn validator(&self) -> &CoreValidator {
        &self.validator
    }

    /// Verifies `token` and returns its validated claims
    ///
    /// # Errors
    ///
    /// Any cryptographic, structural, or claims failure. No claims are
    /// returned unless every check passed.
    pub fn verify<C>(&self, token: &str, keys: Keys<'_>) -> Result<Verified<C>, VerifyError>
    where
        C: DeserializeOwned + CoreClaims,
    {
        self.verify_with_custom(token, keys, NoopValidator)
    }

    /// Verifies `token`, running `custom` after the registered claim checks
    ///
    /// # Errors
    ///
    /// Any cryptographic, structural, or claims failure. A failure reported
    /// by `custom` becomes [`VerifyError::ExtraClaimValidationFailed`].
    pub fn verify_with_custom<C, X>(
        &self,
        token: &str,
        keys: Keys<'_>,
        custom: X,
    ) -> Result<Verified<C>, VerifyError>
    where
        C: DeserializeOwned + CoreClaims,
        X: ClaimsValidator<C>,
    {
        self.verify_with_clock(token, keys, custom, &System)
    }

    /// Verifies `token`, judging time claims against `clock`
    ///
    /// # Errors
    ///
    /// Any cryptographic, structural, or claims failure.
    pub fn verify_with_clock<C, X, K>(
        &self,
        token: &str,
        keys: Keys<'_>,
        custom: X,
        clock: &K,
    ) -> Result<Verified<C>, VerifyError>
    where
        C: DeserializeOwned + CoreClaims,
        X: ClaimsValidator<C>,
        K: Clock + ?Sized,
    {
        let mut current = Cow::Borrowed(token);
        let mut sender = keys.sender;
        let mut recipient = keys.recipient;
        let mut depth = 0_usize;

        loop {
            depth += 1;
            if depth > self.max_depth {
                tracing::debug!(max = self.max_depth, "token nested too deeply");
                return Err(VerifyError::NestingTooDeep {
                    max: self.max_depth,
                });
            }

            match current.split('.').count() {
                3 => {
                    let jws = jws::Jws::decompose(&current)?;
                    tracing::debug!(depth, format = "jws", alg = %jws.header().alg(), "unwrapping layer");

                    if jws.header().is_nested() {
                        let key = resolve_nested(keys.nested, jws.header(), depth)?;
                        let inner = String::from_utf8(jws.untrusted_payload().to_vec())
                            .map_err(error::malformed_claims)?;

                        current = Cow::Owned(inner);
                        sender = Some(key);
                        recipient = None;
                        continue;
                    }

                    let claims: C = serde_json::from_slice(jws.untrusted_payload())
                        .map_err(error::malformed_claims)?;

                    if !jws.verify_signature(sender)? {
                        tracing::debug!(depth, "signature mismatch");
                        return Err(VerifyError::InvalidSignature);
                    }

                    self.validate(&claims, &custom, clock, depth)?;
                    return Ok(Verified::Signed { claims, layer: jws });
                }
                5 => {
                    let jwe = jwe::Jwe::decompose(&current)?;
                    tracing::debug!(depth, format = "jwe", enc = %jwe.header().enc(), "unwrapping layer");

                    let plaintext = jwe.decrypt(sender, recipient)?;

                    if jwe.header().is_nested() {
                        let key = resolve_nested(keys.nested, jwe.header(), depth)?;
                        let inner = String::from_utf8(plaintext).map_err(error::malformed_claims)?;

                        current = Cow::Owned(inner);
                        recipient = Some(key);
                        continue;
                    }

                    let claims: C =
                        serde_json::from_slice(&plaintext).map_err(error::malformed_claims)?;

                    self.validate(&claims, &custom, clock, depth)?;
                    return Ok(Verified::Encrypted { claims, layer: jwe });
                }
                segments => {
                    tracing::debug!(depth, segments, "unknown token format");
                    return Err(VerifyError::UnknownFormat);
                }
            }
        }
    }

    fn validate<C, X, K>(
        &self,
        claims: &C,
        custom: &X,
        clock: &K,
        depth: usize,
    ) -> Result<(), VerifyError>
    where
        C: CoreClaims,
        X: ClaimsValidator<C>,
        K: Clock + ?Sized,
    {
        self.validator
            .validate_with_clock(claims, custom, clock)
            .map_err(|err| {
                tracing::debug!(depth, error = %err, "claims rejected");
                VerifyError::from(err)
            })
    }
}

fn resolve_nested<'k, H>(nested: &'k [Jwk], header: &H, depth: usize) -> Result<&'k Jwk, VerifyError>
where
    H: KeyHints,
{
    match resolve::resolve_key_with_rule(nested, Some(header)) {
        Some((key, rule)) => {
            tracing::debug!(depth, %rule, kid = ?key.key_id(), "resolved nested key");
            Ok(key)
        }
        None => {
            tracing::debug!(depth, candidates = nested.len(), "no nested key matches");
            Err(VerifyError::MissingNestedJwtKey)
        }
    }
}

/// Verifies `token` with the given keys and registered claim expectations
///
/// `sender` verifies the outermost signed layer and `recipient` decrypts the
/// outermost encrypted layer. Nested layers take their key from
/// `nested_keys`. The issuer and audience are only compared when the token
/// carries the corresponding claim.
///
/// # Errors
///
/// Any cryptographic, structural, or claims failure.
pub fn verify<C>(
    token: &str,
    sender: Option<&Jwk>,
    recipient: Option<&Jwk>,
    nested_keys: &[Jwk],
    issuer: Option<&IssuerRef>,
    audience: Option<&AudienceRef>,
) -> Result<Verified<C>, VerifyError>
where
    C: DeserializeOwned + CoreClaims,
{
    let mut validator = CoreValidator::default();
    if let Some(iss) = issuer {
        validator = validator.require_issuer(iss.to_owned());
    }
    if let Some(aud) = audience {
        validator = validator.require_audience(aud.to_owned());
    }

    let keys = Keys {
        sender,
        recipient,
        nested: nested_keys,
    };

    TokenVerifier::default()
        .with_validator(validator)
        .verify(token, keys)
}

#[cfg(test)]
mod tests {
    use aliri_clock::{TestClock, UnixTime};
    use color_eyre::Result;
    use tracing_test::traced_test;

    use super::*;
    use crate::{
        jwa,
        jwt::{self, Audience, Claims},
        test,
    };

    fn clock() -> TestClock {
        TestClock::new(test::NOW)
    }

    fn at(offset: i64) -> UnixTime {
        UnixTime((test::NOW.0 as i64 + offset) as u64)
    }

    fn hs256() -> jws::Header {
        jws::Header::new(jws::Algorithm::HS256)
    }

    fn verify_at(
        verifier: &TokenVerifier,
        token: &str,
        keys: Keys<'_>,
    ) -> Result<Verified<Claims>, VerifyError> {
        verifier.verify_with_clock(token, keys, NoopValidator, &clock())
    }

    fn scenario_claims() -> Claims {
        Claims::new()
            .with_issuer("https://issuer.example")
            .with_expiration(at(3600))
            .with_audiences(vec![
                Audience::from_static("svc-a"),
                Audience::from_static("svc-b"),
            ])
    }

    fn scenario_verifier(audience: &str) -> TokenVerifier {
        TokenVerifier::default().with_validator(
            jwt::CoreValidator::default()
                .require_issuer("https://issuer.example")
                .require_audience(audience.to_owned()),
        )
    }

    #[test]
    fn unknown_formats() {
        for token in &["", "abc", "a.b", "a.b.c.d", "a.b.c.d.e.f"] {
            let err = verify::<Claims>(token, None, None, &[], None, None).unwrap_err();
            assert!(matches!(err, VerifyError::UnknownFormat), "{}: {:?}", token, err);
        }
    }

    #[test]
    fn free_function_checks_issuer_and_audience() -> Result<()> {
        let key = test::hmac_key().with_key_id("key-1");
        let claims = Claims::new()
            .with_issuer("https://issuer.example")
            .with_audience("svc-a");
        let token = test::sign_claims(&hs256().with_key_id("key-1"), &claims, test::HMAC_SECRET);

        let issuer = jwt::IssuerRef::from_str("https://issuer.example");
        let verified: Verified<Claims> = verify(
            &token,
            Some(&key),
            None,
            &[],
            Some(issuer),
            Some(jwt::AudienceRef::from_str("svc-a")),
        )?;
        assert_eq!(verified.claims(), &claims);

        let err = verify::<Claims>(
            &token,
            Some(&key),
            None,
            &[],
            Some(jwt::IssuerRef::from_str("https://elsewhere.example")),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, VerifyError::IssuerMismatch));
        Ok(())
    }

    #[test]
    fn issuer_and_audience_scenario() -> Result<()> {
        let key = test::hmac_key().with_key_id("key-1");
        let header = hs256().with_key_id("key-1");
        let token = test::sign_claims(&header, &scenario_claims(), test::HMAC_SECRET);
        let keys = Keys::new().with_sender(&key);

        let verified = verify_at(&scenario_verifier("svc-a"), &token, keys)?;
        assert_eq!(verified.claims(), &scenario_claims());
        assert!(!verified.is_encrypted());

        let err = verify_at(&scenario_verifier("svc-c"), &token, keys).unwrap_err();
        assert!(matches!(err, VerifyError::AudienceMismatch));
        Ok(())
    }

    #[test]
    fn tampered_signature_is_rejected_before_claims() {
        let key = test::hmac_key();
        let expired = scenario_claims().with_expiration(at(-10));
        let token = test::tamper_signature(&test::sign_claims(&hs256(), &expired, test::HMAC_SECRET));

        let err = verify_at(
            &scenario_verifier("svc-c"),
            &token,
            Keys::new().with_sender(&key),
        )
        .unwrap_err();
        assert!(matches!(err, VerifyError::InvalidSignature), "{:?}", err);
    }

    #[test]
    fn missing_sender_key() {
        let token = test::sign_claims(&hs256(), &Claims::new(), test::HMAC_SECRET);

        let err = verify_at(&TokenVerifier::default(), &token, Keys::new()).unwrap_err();
        assert!(matches!(err, VerifyError::Jwk(ref e) if e.is_missing_key()));
    }

    #[test]
    fn time_claim_boundaries() {
        let key = test::hmac_key();
        let verifier = TokenVerifier::default();
        let run = |claims: Claims| {
            let token = test::sign_claims(&hs256(), &claims, test::HMAC_SECRET);
            verify_at(&verifier, &token, Keys::new().with_sender(&key))
        };

        assert!(matches!(
            run(Claims::new().with_expiration(at(0))),
            Err(VerifyError::Expired)
        ));
        assert!(run(Claims::new().with_expiration(at(1))).is_ok());

        assert!(run(Claims::new().with_not_before(at(0))).is_ok());
        assert!(matches!(
            run(Claims::new().with_not_before(at(1))),
            Err(VerifyError::NotYetValid)
        ));

        assert!(run(Claims::new().with_issued_at(at(0))).is_ok());
        assert!(matches!(
            run(Claims::new().with_issued_at(at(1))),
            Err(VerifyError::IssuedInTheFuture)
        ));
    }

    #[test]
    fn undecodable_payload() {
        let key = test::hmac_key();
        let token = test::sign(&hs256(), b"not json", test::HMAC_SECRET);

        let err = verify_at(&TokenVerifier::default(), &token, Keys::new().with_sender(&key))
            .unwrap_err();
        assert!(matches!(err, VerifyError::DecodeFailed(_)));
    }

    #[test]
    fn custom_validator_failure_is_reported() {
        let key = test::hmac_key();
        let token = test::sign_claims(&hs256(), &Claims::new(), test::HMAC_SECRET);
        let refuse = jwt::from_fn(|_: &Claims| Err(error::ClaimsRejected::custom("tenant")));

        let err = TokenVerifier::default()
            .verify_with_clock::<Claims, _, _>(&token, Keys::new().with_sender(&key), refuse, &clock())
            .unwrap_err();
        assert!(matches!(err, VerifyError::ExtraClaimValidationFailed(_)));
        assert!(err.is_claims_rejection());
    }

    #[test]
    #[traced_test]
    fn signed_inside_signed() -> Result<()> {
        let inner_key = test::other_hmac_key().with_key_id("inner");
        let decoy = test::hmac_key().with_key_id("decoy");
        let nested = [decoy, inner_key];

        let claims = Claims::new().with_subject("user-1");
        let inner = test::sign_claims(&hs256(), &claims, test::OTHER_HMAC_SECRET);
        let outer_header = hs256().with_key_id("inner").with_content_type("JWT");
        let outer = test::sign(&outer_header, inner.as_bytes(), test::HMAC_SECRET);

        let verified = verify_at(
            &TokenVerifier::default(),
            &outer,
            Keys::new().with_nested(&nested),
        )?;
        assert_eq!(verified.claims(), &claims);
        assert!(logs_contain("resolved nested key"));
        Ok(())
    }

    #[test]
    fn nested_layer_without_matching_key() {
        let inner = test::sign_claims(&hs256(), &Claims::new(), test::HMAC_SECRET);
        let outer_header = hs256().with_key_id("unknown").with_content_type("JWT");
        let outer = test::tamper_signature(&test::sign(
            &outer_header,
            inner.as_bytes(),
            test::HMAC_SECRET,
        ));
        let nested = [test::hmac_key().with_key_id("known")];
        let wrong_sender = test::other_hmac_key();

        let err = verify_at(
            &TokenVerifier::default(),
            &outer,
            Keys::new().with_sender(&wrong_sender).with_nested(&nested),
        )
        .unwrap_err();
        assert!(matches!(err, VerifyError::MissingNestedJwtKey), "{:?}", err);
    }

    #[test]
    fn encrypted_layer_without_matching_nested_key() {
        let inner = test::sign_claims(&hs256(), &Claims::new(), test::HMAC_SECRET);
        let header = jwe::Header::new(jwa::ContentEncryption::A128GCM)
            .with_key_id("unknown")
            .with_content_type("JWT");
        let token = test::encrypt(&header, inner.as_bytes(), test::AES128_KEY);
        let nested = [test::hmac_key().with_key_id("known")];

        let err = verify_at(
            &TokenVerifier::default(),
            &token,
            Keys::new()
                .with_recipient(&test::aes128_key())
                .with_nested(&nested),
        )
        .unwrap_err();
        assert!(matches!(err, VerifyError::MissingNestedJwtKey), "{:?}", err);
    }

    #[test]
    fn nested_key_signs_the_inner_layer() {
        let inner = test::sign_claims(&hs256(), &Claims::new(), test::HMAC_SECRET);
        let outer_header = hs256().with_key_id("k").with_content_type("JWT");
        let outer = test::sign(&outer_header, inner.as_bytes(), test::HMAC_SECRET);
        let nested = [test::other_hmac_key().with_key_id("k")];

        let err = verify_at(
            &TokenVerifier::default(),
            &outer,
            Keys::new()
                .with_sender(&test::hmac_key())
                .with_nested(&nested),
        )
        .unwrap_err();
        assert!(matches!(err, VerifyError::InvalidSignature));
    }

    #[test]
    fn encrypted_leaf_is_validated() -> Result<()> {
        let key = test::aes256_key();
        let header = jwe::Header::new(jwa::ContentEncryption::A256GCM);

        let fresh = Claims::new().with_expiration(at(60));
        let token = test::encrypt_claims(&header, &fresh, test::AES256_KEY);
        let verified = verify_at(
            &TokenVerifier::default(),
            &token,
            Keys::new().with_recipient(&key),
        )?;
        assert!(verified.is_encrypted());
        assert_eq!(verified.into_claims(), fresh);

        let stale = Claims::new().with_expiration(at(-60));
        let token = test::encrypt_claims(&header, &stale, test::AES256_KEY);
        let err = verify_at(
            &TokenVerifier::default(),
            &token,
            Keys::new().with_recipient(&key),
        )
        .unwrap_err();
        assert!(matches!(err, VerifyError::Expired));
        Ok(())
    }

    #[test]
    fn decryption_errors_pass_through() {
        let header = jwe::Header::new(jwa::ContentEncryption::A256GCM);
        let token = test::encrypt_claims(&header, &Claims::new(), test::AES256_KEY);
        let wrong = Jwk::from(jwa::Symmetric::new(vec![0x99; 32]));

        let err = verify_at(
            &TokenVerifier::default(),
            &token,
            Keys::new().with_recipient(&wrong),
        )
        .unwrap_err();
        assert!(matches!(err, VerifyError::Jwe(ref e) if e.is_decryption_failure()));
    }

    #[test]
    #[traced_test]
    fn encrypted_wrapping_signed() -> Result<()> {
        let recipient = test::aes128_key();
        let signer = test::hmac_key().with_key_id("signer");
        let nested = [signer];

        let claims = Claims::new().with_issuer("https://issuer.example");
        let signed = test::sign_claims(&hs256(), &claims, test::HMAC_SECRET);
        let header = jwe::Header::new(jwa::ContentEncryption::A128GCM)
            .with_key_id("signer")
            .with_content_type("JWT");
        let token = test::encrypt(&header, signed.as_bytes(), test::AES128_KEY);

        let verified = verify_at(
            &TokenVerifier::default(),
            &token,
            Keys::new()
                .with_sender(&nested[0])
                .with_recipient(&recipient)
                .with_nested(&nested),
        )?;

        match verified {
            Verified::Signed { claims: got, layer } => {
                assert_eq!(got, claims);
                assert_eq!(layer.header(), &hs256());
            }
            other => panic!("expected a signed leaf, got {:?}", other),
        }
        assert!(logs_contain("jwe"));
        Ok(())
    }

    #[test]
    fn encrypted_wrapping_signed_keeps_the_sender() {
        let signed = test::sign_claims(&hs256(), &Claims::new(), test::HMAC_SECRET);
        let header = jwe::Header::new(jwa::ContentEncryption::A128GCM)
            .with_key_id("signer")
            .with_content_type("JWT");
        let token = test::encrypt(&header, signed.as_bytes(), test::AES128_KEY);
        let nested = [test::hmac_key().with_key_id("signer")];

        let err = verify_at(
            &TokenVerifier::default(),
            &token,
            Keys::new()
                .with_recipient(&test::aes128_key())
                .with_nested(&nested),
        )
        .unwrap_err();
        assert!(matches!(err, VerifyError::Jwk(ref e) if e.is_missing_key()));
    }

    #[test]
    fn encrypted_inside_encrypted() -> Result<()> {
        let claims = Claims::new().with_subject("user-1");
        let inner_header = jwe::Header::new(jwa::ContentEncryption::A256GCM);
        let inner = test::encrypt_claims(&inner_header, &claims, test::AES256_KEY);

        let outer_header = jwe::Header::new(jwa::ContentEncryption::A128GCM)
            .with_key_id("inner-enc")
            .with_content_type("JWT");
        let outer = test::encrypt(&outer_header, inner.as_bytes(), test::AES128_KEY);

        let nested = [
            test::aes128_key().with_key_id("outer-enc"),
            test::aes256_key().with_key_id("inner-enc"),
        ];

        let verified = verify_at(
            &TokenVerifier::default(),
            &outer,
            Keys::new()
                .with_recipient(&test::aes128_key())
                .with_nested(&nested),
        )?;

        match verified {
            Verified::Encrypted { claims: got, layer } => {
                assert_eq!(got, claims);
                assert_eq!(layer.header(), &inner_header);
            }
            other => panic!("expected an encrypted leaf, got {:?}", other),
        }

        let err = verify_at(
            &TokenVerifier::default(),
            &outer,
            Keys::new()
                .with_recipient(&test::aes128_key())
                .with_nested(&nested[..1]),
        )
        .unwrap_err();
        assert!(matches!(err, VerifyError::MissingNestedJwtKey));
        Ok(())
    }

    #[test]
    #[cfg(feature = "ec")]
    fn es256_issuer_and_audience_scenario() -> Result<()> {
        let (pair, key) = test::p256_key_pair();
        let key = key.with_key_id("key-1");
        let header = jws::Header::new(jws::Algorithm::ES256).with_key_id("key-1");
        let token = test::sign_es256_claims(&header, &scenario_claims(), &pair);
        let keys = Keys::new().with_sender(&key);

        let verified = verify_at(&scenario_verifier("svc-a"), &token, keys)?;
        assert_eq!(verified.claims(), &scenario_claims());

        let err = verify_at(&scenario_verifier("svc-c"), &token, keys).unwrap_err();
        assert!(matches!(err, VerifyError::AudienceMismatch));

        let tampered = test::tamper_signature(&token);
        let err = verify_at(&scenario_verifier("svc-c"), &tampered, keys).unwrap_err();
        assert!(matches!(err, VerifyError::InvalidSignature), "{:?}", err);
        Ok(())
    }

    #[test]
    #[cfg(feature = "rsa")]
    fn rs256_token_from_rfc7515() -> Result<()> {
        use aliri_base64::Base64Url;

        let key = Jwk::from(jwa::Rsa::from_public_components(
            Base64Url::from_encoded(test::RFC7515_RSA_MODULUS)?,
            Base64Url::from_encoded("AQAB")?,
        )?);
        let token = test::RFC7515_RS256_TOKEN;
        let before_expiry = TestClock::new(UnixTime(1_300_819_379));

        let verified: Verified<Claims> = TokenVerifier::default()
            .with_validator(jwt::CoreValidator::default().require_issuer("joe"))
            .verify_with_clock(token, Keys::new().with_sender(&key), NoopValidator, &before_expiry)?;
        assert_eq!(verified.claims().iss().map(|i| i.as_str()), Some("joe"));

        let err = TokenVerifier::default()
            .verify::<Claims>(token, Keys::new().with_sender(&key))
            .unwrap_err();
        assert!(matches!(err, VerifyError::Expired));
        Ok(())
    }

    #[test]
    fn nesting_depth_is_bounded() -> Result<()> {
        let key = test::hmac_key().with_key_id("k");
        let nested = [key.clone()];
        let header = hs256().with_key_id("k").with_content_type("JWT");

        let mut token = test::sign_claims(&hs256(), &Claims::new(), test::HMAC_SECRET);
        for _ in 0..3 {
            token = test::sign(&header, token.as_bytes(), test::HMAC_SECRET);
        }

        let keys = Keys::new().with_nested(&nested);

        let shallow = TokenVerifier::default().with_max_depth(3);
        let err = verify_at(&shallow, &token, keys).unwrap_err();
        assert!(matches!(err, VerifyError::NestingTooDeep { max: 3 }));

        let enough = TokenVerifier::default().with_max_depth(4);
        let verified = verify_at(&enough, &token, keys)?;
        assert!(!verified.is_encrypted());
        Ok(())
    }

    #[test]
    fn default_depth_stops_runaway_nesting() {
        let nested = [test::hmac_key().with_key_id("k")];
        let header = hs256().with_key_id("k").with_content_type("JWT");

        let mut token = test::sign_claims(&hs256(), &Claims::new(), test::HMAC_SECRET);
        for _ in 0..DEFAULT_MAX_DEPTH {
            token = test::sign(&header, token.as_bytes(), test::HMAC_SECRET);
        }

        let err = verify_at(
            &TokenVerifier::default(),
            &token,
            Keys::new().with_nested(&nested),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            VerifyError::NestingTooDeep {
                max: DEFAULT_MAX_DEPTH
            }
        ));
    }
}
