//! Access gate for signed links.
//!
//! [`AccessGate`] is a `tower` layer. Requests whose URL carries a valid,
//! unexpired signature reach the wrapped service untouched; everything else
//! is answered here with `403 Forbidden`, or `500 Internal Server Error` when
//! the request target cannot be resolved against the configured base URL.

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    extract::OriginalUri,
    http::{Request, Uri},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use futures_util::future::{self, Either, Ready};
use tower::{Layer, Service};
use url::{form_urlencoded, Url};

use crate::error::GateRejection;
use crate::services::canonical::SIGNATURE_PARAM;
use crate::services::{UrlSigner, Verdict};

#[derive(Debug, Clone)]
pub struct AccessGate {
    base_url: Arc<Url>,
    signer: UrlSigner,
}

impl AccessGate {
    /// Gate resolving request targets against `base_url` and checking them with `key`.
    pub fn new(base_url: Url, key: impl Into<Arc<[u8]>>) -> Self {
        Self {
            base_url: Arc::new(base_url),
            signer: UrlSigner::new(key).with_validity(None),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Decide whether a request target may pass.
    pub fn check(&self, target: &Uri) -> Result<(), GateRejection> {
        self.check_at(target, Utc::now())
    }

    pub fn check_at(&self, target: &Uri, now: DateTime<Utc>) -> Result<(), GateRejection> {
        if !carries_signature(target) {
            tracing::debug!(path = %target.path(), "Rejected unsigned request");
            return Err(GateRejection::Forbidden);
        }

        let resolved = match self.resolve(target) {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::warn!(%e, base_url = %self.base_url, "Failed to resolve request target");
                return Err(GateRejection::Internal);
            }
        };

        match self.signer.verify_at(resolved.as_str(), now) {
            Ok(Verdict::Valid) => Ok(()),
            Ok(verdict) => {
                tracing::debug!(path = %target.path(), %verdict, "Rejected signed request");
                Err(GateRejection::Forbidden)
            }
            Err(e) => {
                tracing::warn!(%e, base_url = %self.base_url, "Resolved request target is not absolute");
                Err(GateRejection::Internal)
            }
        }
    }

    /// URL the client requested.
    ///
    /// Only absolute-form targets name their own host. An origin-form target
    /// keeps the base URL's origin even when its path starts with `//`.
    fn resolve(&self, target: &Uri) -> Result<Url, url::ParseError> {
        if target.scheme().is_some() {
            return self.base_url.join(&target.to_string());
        }
        if self.base_url.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase);
        }

        let mut resolved = Url::clone(&self.base_url);
        resolved.set_path(target.path());
        resolved.set_query(target.query());
        resolved.set_fragment(None);
        Ok(resolved)
    }
}

fn carries_signature(target: &Uri) -> bool {
    target.query().is_some_and(|query| {
        form_urlencoded::parse(query.as_bytes()).any(|(key, _)| key == SIGNATURE_PARAM)
    })
}

impl<S> Layer<S> for AccessGate {
    type Service = AccessGateService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessGateService {
            gate: self.clone(),
            inner,
        }
    }
}

/// Service produced by [`AccessGate`].
#[derive(Debug, Clone)]
pub struct AccessGateService<S> {
    gate: AccessGate,
    inner: S,
}

impl<S, B> Service<Request<B>> for AccessGateService<S>
where
    S: Service<Request<B>, Response = Response> + Clone,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Either<S::Future, Ready<Result<Response, S::Error>>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        // Nested routers rewrite the URI; the signature covers the one the client sent.
        let target = req
            .extensions()
            .get::<OriginalUri>()
            .map_or_else(|| req.uri(), |original| &original.0);

        match self.gate.check(target) {
            Ok(()) => Either::Left(self.inner.call(req)),
            Err(rejection) => {
                // Drop the inner service made ready by `poll_ready` so limits held for it are released.
                self.inner = self.inner.clone();
                Either::Right(future::ready(Ok(rejection.into_response())))
            }
        }
    }
}
