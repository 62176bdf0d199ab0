//! Implementations of the JSON Web Algorithms (JWA) standard
//!
//! Only the verifying halves of the signature algorithms and the decrypting
//! halves of the encryption algorithms are provided.
//!
//! The specifications for these algorithms can be found in [RFC7518][].
//!
//! [RFC7518]: https://tools.ietf.org/html/rfc7518

#[cfg(feature = "ec")]
#[cfg_attr(docsrs, doc(cfg(feature = "ec")))]
pub mod ec;
pub mod encryption;
pub mod hmac;
#[cfg(feature = "rsa")]
#[cfg_attr(docsrs, doc(cfg(feature = "rsa")))]
pub mod rsa;
mod symmetric;

#[cfg(feature = "ec")]
#[cfg_attr(docsrs, doc(cfg(feature = "ec")))]
#[doc(inline)]
pub use ec::EllipticCurve;
#[doc(inline)]
pub use encryption::{ContentEncryption, KeyManagement};
#[cfg(feature = "rsa")]
#[cfg_attr(docsrs, doc(cfg(feature = "rsa")))]
#[doc(inline)]
pub use rsa::Rsa;
pub use symmetric::Symmetric;

mod algorithm;

pub use algorithm::{Algorithm, Usage};
