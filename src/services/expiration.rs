//! Expiration policy for signed links.

use chrono::{DateTime, Utc};
use url::form_urlencoded;

use super::canonical::EXPIRES_PARAM;

/// Whether the link has outlived its `expires` marker.
///
/// Links without a marker never expire. A marker that is not a base-10
/// integer fails closed and counts as expired. Relative references are
/// accepted since only the query is read.
pub fn expired(url: &str) -> bool {
    expired_at(url, Utc::now())
}

/// Same as [`expired`], evaluated at `now` instead of the current time.
pub fn expired_at(url: &str, now: DateTime<Utc>) -> bool {
    let Some(value) = expires_value(url) else {
        return false;
    };
    if value.is_empty() {
        return false;
    }

    match value.parse::<i64>() {
        // Strictly before `now`, which keeps its sub-second part.
        Ok(expires) => {
            let secs = now.timestamp();
            expires < secs || (expires == secs && now.timestamp_subsec_nanos() > 0)
        }
        Err(_) => true,
    }
}

// First `expires` value of a possibly relative reference.
fn expires_value(url: &str) -> Option<String> {
    let (_, rest) = url.split_once('?')?;
    let query = rest.split_once('#').map_or(rest, |(query, _)| query);

    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == EXPIRES_PARAM)
        .map(|(_, value)| value.into_owned())
}
