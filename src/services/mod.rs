pub mod canonical;
pub mod expiration;
pub mod url_signer;

pub use expiration::{expired, expired_at};
pub use url_signer::{sign, sign_with_expiration, valid_signature, UrlSigner, Verdict};
