use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::canonical::{
    canonicalize, has_param, parse_absolute, query_pairs, with_query, EXPIRES_PARAM,
    SIGNATURE_PARAM,
};
use super::expiration::expired_at;
use crate::error::SignError;

type HmacSha256 = Hmac<Sha256>;

/// Sign an absolute URL without an expiry.
pub fn sign(url: &str, key: &[u8]) -> Result<String, SignError> {
    sign_with_expiration(url, None, key)
}

/// Sign an absolute URL, embedding `expires_at` when given.
///
/// Any `expires` parameter already on the URL is replaced. Fails with
/// [`SignError::ReservedParameterConflict`] if the URL already carries a
/// `signature`.
pub fn sign_with_expiration(
    url: &str,
    expires_at: Option<DateTime<Utc>>,
    key: &[u8],
) -> Result<String, SignError> {
    let url = parse_absolute(url)?;
    let mut pairs = query_pairs(&url);
    if has_param(&pairs, SIGNATURE_PARAM) {
        return Err(SignError::ReservedParameterConflict);
    }

    if let Some(expires_at) = expires_at {
        pairs.retain(|(name, _)| name != EXPIRES_PARAM);
        pairs.push((EXPIRES_PARAM.to_string(), expires_at.timestamp().to_string()));
    }

    let canonical = with_query(&url, &pairs);
    let signature = hex::encode(keyed_mac(key, canonical.as_str()).finalize().into_bytes());

    pairs.push((SIGNATURE_PARAM.to_string(), signature));
    Ok(with_query(&url, &pairs).into())
}

/// Check the `signature` parameter of an absolute URL.
///
/// Only a non-absolute URL is an error. A missing, undecodable or
/// mismatching signature is simply `Ok(false)`.
pub fn valid_signature(url: &str, key: &[u8]) -> Result<bool, SignError> {
    let url = parse_absolute(url)?;
    let received = url
        .query_pairs()
        .find(|(name, _)| name == SIGNATURE_PARAM)
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default();

    let Ok(received) = hex::decode(received) else {
        return Ok(false);
    };

    // verify_slice compares in constant time
    Ok(keyed_mac(key, &canonicalize(&url))
        .verify_slice(&received)
        .is_ok())
}

fn keyed_mac(key: &[u8], message: &str) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    mac
}

/// Result of checking a signed link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    InvalidSignature,
    Expired,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Valid => f.write_str("valid"),
            Verdict::InvalidSignature => f.write_str("invalid signature"),
            Verdict::Expired => f.write_str("expired"),
        }
    }
}

/// URL signing service bound to one key and a default validity window.
#[derive(Clone)]
pub struct UrlSigner {
    key: Arc<[u8]>,
    /// Validity applied by [`UrlSigner::sign`]; `None` issues links that never expire
    validity: Option<Duration>,
}

impl UrlSigner {
    /// Signer with the default validity of one hour.
    pub fn new(key: impl Into<Arc<[u8]>>) -> Self {
        Self {
            key: key.into(),
            validity: Some(Duration::hours(1)),
        }
    }

    pub fn with_validity(mut self, validity: Option<Duration>) -> Self {
        self.validity = validity;
        self
    }

    pub fn validity(&self) -> Option<Duration> {
        self.validity
    }

    /// Sign using the default validity window.
    pub fn sign(&self, url: &str) -> Result<String, SignError> {
        self.sign_until(url, self.validity.map(|validity| Utc::now() + validity))
    }

    /// Sign a link valid for `ttl` from now.
    pub fn sign_for(&self, url: &str, ttl: Duration) -> Result<String, SignError> {
        self.sign_until(url, Some(Utc::now() + ttl))
    }

    pub fn sign_until(
        &self,
        url: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<String, SignError> {
        sign_with_expiration(url, expires_at, &self.key)
    }

    /// Check signature, then expiry.
    pub fn verify(&self, url: &str) -> Result<Verdict, SignError> {
        self.verify_at(url, Utc::now())
    }

    pub fn verify_at(&self, url: &str, now: DateTime<Utc>) -> Result<Verdict, SignError> {
        if !valid_signature(url, &self.key)? {
            return Ok(Verdict::InvalidSignature);
        }
        if expired_at(url, now) {
            return Ok(Verdict::Expired);
        }
        Ok(Verdict::Valid)
    }
}

impl fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlSigner")
            .field("key", &"<redacted>")
            .field("validity", &self.validity)
            .finish()
    }
}
