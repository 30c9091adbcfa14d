//! Canonical form of a URL, the message a signature is computed over.
//!
//! The query is decoded into pairs, the `signature` pair is dropped, and the
//! rest is re-encoded sorted by key. Two URLs that differ only in parameter
//! order therefore canonicalize to the same string.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::error::SignError;

/// Query parameter carrying the hex-encoded MAC.
pub const SIGNATURE_PARAM: &str = "signature";

/// Query parameter carrying the expiry as Unix seconds.
pub const EXPIRES_PARAM: &str = "expires";

/// Everything except the unreserved characters `A-Z a-z 0-9 - _ . ~`.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Decoded query parameters in the order they appear.
pub type QueryPairs = Vec<(String, String)>;

/// Parse a reference that must carry a scheme and a host.
pub fn parse_absolute(raw: &str) -> Result<Url, SignError> {
    match Url::parse(raw) {
        Ok(url) if url.has_host() => Ok(url),
        _ => Err(SignError::InvalidReference(raw.to_string())),
    }
}

pub fn query_pairs(url: &Url) -> QueryPairs {
    url.query_pairs().into_owned().collect()
}

pub fn has_param(pairs: &[(String, String)], name: &str) -> bool {
    pairs.iter().any(|(key, _)| key == name)
}

/// Encode pairs sorted by key.
///
/// The sort is stable, so repeated keys keep their relative order.
pub fn encode_query(pairs: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = pairs.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    sorted
        .iter()
        .map(|(key, value)| format!("{}={}", escape(key), escape(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Return `url` with its query replaced by the canonical encoding of `pairs`.
///
/// An empty pair list removes the query entirely, leaving no trailing `?`.
pub fn with_query(url: &Url, pairs: &[(String, String)]) -> Url {
    let mut out = url.clone();
    let query = encode_query(pairs);
    if query.is_empty() {
        out.set_query(None);
    } else {
        out.set_query(Some(query.as_str()));
    }
    out
}

/// Canonical string of `url`, ignoring any signature it already carries.
pub fn canonicalize(url: &Url) -> String {
    let pairs: QueryPairs = query_pairs(url)
        .into_iter()
        .filter(|(key, _)| key != SIGNATURE_PARAM)
        .collect();

    with_query(url, &pairs).into()
}

// Spaces become `+`, everything outside the unreserved set becomes `%XX`.
fn escape(component: &str) -> String {
    component
        .split(' ')
        .map(|part| utf8_percent_encode(part, QUERY_COMPONENT).to_string())
        .collect::<Vec<_>>()
        .join("+")
}
