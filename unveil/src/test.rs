#![allow(dead_code)]

use aliri_base64::Base64Url;
use aliri_clock::UnixTime;
#[cfg(feature = "ec")]
use ring::signature::{self, EcdsaKeyPair, KeyPair};
use ring::{
    aead, hmac,
    rand::{SecureRandom, SystemRandom},
};
use serde::Serialize;

use crate::{jwa, jwe, jws, Jwk};

pub const NOW: UnixTime = UnixTime(1_700_000_000);

pub const HMAC_SECRET: &[u8] = b"a shared secret that is long enough";
pub const OTHER_HMAC_SECRET: &[u8] = b"some other secret entirely";
pub const AES128_KEY: &[u8] = &[0x11; 16];
pub const AES256_KEY: &[u8] = &[0x22; 32];

// RFC 7515 Appendix A.2
pub const RFC7515_RSA_MODULUS: &str = concat!(
    "ofgWCuLjybRlzo0tZWJjNiuSfb4p4fAkd_wWJcyQoTbji9k0l8W26mPddxHmfHQp-Vaw-4qPCJrcS2mJPMEzP1Pt0Bm4d4QlL-",
    "yRT-SFd2lZS-pCgNMsD1W_YpRPEwOWvG6b32690r2jZ47soMZo9wGzjb_7OMg0LOL-bSf63kpaSHSXndS5z5rexMdbBYUsLA9e-",
    "KXBdQOS-UTo7WTBEMa2R2CapHg665xsmtdVMTBQY4uDZlxvb3qCo5ZwKh9kG4LT6_I5IhlJH7aGhyxXFvUK-DWNmoudF8NAco9_h9",
    "iaGNj8q2ethFkMLs91kzk2PAcDTW9gb54h4FRWyuXpoQ",
);

pub const RFC7515_RS256_TOKEN: &str = concat!(
    "eyJhbGciOiJSUzI1NiJ9.",
    "eyJpc3MiOiJqb2UiLA0KICJleHAiOjEzMDA4MTkzODAsDQogImh0dHA6Ly9leGFtcGxlLmNvbS9pc19yb290Ijp0cnVlfQ.",
    "cC4hiUPoj9Eetdgtv3hF80EGrhuB__dzERat0XF9g2VtQgr9PJbu3XOiZj5RZmh7AAuHIm4Bh-0Qc_lF5YKt_O8W2Fp5jujGbds9uJdb",
    "F9CUAr7t1dnZcAcQjbKBYNX4BAynRFdiuB--f_nZLgrnbyTyWzO75vRK5h6xBArLIARNPvkSjtQBMHlb1L07Qe7K0GarZRmB_eSN9383",
    "LcOLn6_dO--xi12jzDwusC-eOkHWEsqtFZESc6BfI7noOPqvhJ1phCnvWh6IeYI2w9QOYEUipUTI8np6LbgGY9Fs98rqVt5AXLIhWkWy",
    "wlVmtVrBp0igcN_IoypGlUPQGe77Rw",
);

pub fn hmac_key() -> Jwk {
    Jwk::from(jwa::Symmetric::new(HMAC_SECRET))
}

pub fn other_hmac_key() -> Jwk {
    Jwk::from(jwa::Symmetric::new(OTHER_HMAC_SECRET))
}

pub fn aes128_key() -> Jwk {
    Jwk::from(jwa::Symmetric::new(AES128_KEY))
}

pub fn aes256_key() -> Jwk {
    Jwk::from(jwa::Symmetric::new(AES256_KEY))
}

fn encode_json<T: Serialize>(value: &T) -> Base64Url {
    Base64Url::from_raw(serde_json::to_vec(value).expect("serializable"))
}

fn signing_input(header: &jws::Header, payload: &[u8]) -> String {
    format!("{}.{}", encode_json(header), Base64Url::from_raw(payload))
}

/// Produces a compact signed token, HMAC-signed with `secret`
pub fn sign(header: &jws::Header, payload: &[u8], secret: &[u8]) -> String {
    let alg = match header.alg() {
        jws::Algorithm::Hmac(alg) => alg.into_ring_algorithm(),
        other => panic!("not an HMAC algorithm: {}", other),
    };

    let message = signing_input(header, payload);
    let key = hmac::Key::new(alg, secret);
    let signature = hmac::sign(&key, message.as_bytes());

    format!("{}.{}", message, Base64Url::from_raw(signature.as_ref()))
}

/// Produces a compact signed token carrying `claims`
pub fn sign_claims<C: Serialize>(header: &jws::Header, claims: &C, secret: &[u8]) -> String {
    let payload = serde_json::to_vec(claims).expect("serializable");
    sign(header, &payload, secret)
}

/// Generates a fresh P-256 key pair along with its public JWK
#[cfg(feature = "ec")]
pub fn p256_key_pair() -> (EcdsaKeyPair, Jwk) {
    let rng = SystemRandom::new();
    let alg = &signature::ECDSA_P256_SHA256_FIXED_SIGNING;
    let pkcs8 = EcdsaKeyPair::generate_pkcs8(alg, &rng).expect("generated");
    let pair = EcdsaKeyPair::from_pkcs8(alg, pkcs8.as_ref(), &rng).expect("parsed");

    let point = pair.public_key().as_ref();
    let public = jwa::EllipticCurve::from_coordinates(
        jwa::ec::Curve::P256,
        point[1..33].to_vec(),
        point[33..].to_vec(),
    )
    .expect("valid P-256 point");

    (pair, Jwk::from(public))
}

/// Produces a compact ES256 token carrying `claims`, signed by `pair`
#[cfg(feature = "ec")]
pub fn sign_es256_claims<C: Serialize>(
    header: &jws::Header,
    claims: &C,
    pair: &EcdsaKeyPair,
) -> String {
    assert_eq!(header.alg(), jws::Algorithm::ES256);

    let payload = serde_json::to_vec(claims).expect("serializable");
    let message = signing_input(header, &payload);
    let signature = pair
        .sign(&SystemRandom::new(), message.as_bytes())
        .expect("signed");

    format!("{}.{}", message, Base64Url::from_raw(signature.as_ref()))
}

/// Flips the first character of the signature segment
pub fn tamper_signature(token: &str) -> String {
    let start = token.rfind('.').map_or(0, |i| i + 1);
    let replacement = if token[start..].starts_with('A') { "B" } else { "A" };

    let mut tampered = token.to_owned();
    tampered.replace_range(start..=start, replacement);
    tampered
}

/// Produces a compact encrypted token, sealed directly with `cek`
pub fn encrypt(header: &jwe::Header, plaintext: &[u8], cek: &[u8]) -> String {
    let encoded_header = encode_json(header).to_string();

    let mut iv = [0u8; jwa::encryption::IV_LEN];
    SystemRandom::new().fill(&mut iv).expect("random IV");

    let key = aead::UnboundKey::new(header.enc().ring_algorithm(), cek).expect("valid CEK");
    let key = aead::LessSafeKey::new(key);

    let mut in_out = plaintext.to_vec();
    let tag = key
        .seal_in_place_separate_tag(
            aead::Nonce::assume_unique_for_key(iv),
            aead::Aad::from(encoded_header.as_bytes()),
            &mut in_out,
        )
        .expect("sealed");

    format!(
        "{}..{}.{}.{}",
        encoded_header,
        Base64Url::from_raw(iv.to_vec()),
        Base64Url::from_raw(in_out),
        Base64Url::from_raw(tag.as_ref()),
    )
}

/// Produces a compact encrypted token carrying `claims`
pub fn encrypt_claims<C: Serialize>(header: &jwe::Header, claims: &C, cek: &[u8]) -> String {
    let payload = serde_json::to_vec(claims).expect("serializable");
    encrypt(header, &payload, cek)
}
