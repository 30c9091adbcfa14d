//! signedurl - tamper-evident, optionally expiring URLs.
//!
//! Links are signed with HMAC-SHA256 over a canonical form of the URL and
//! verified without any per-link server state. [`AccessGate`] enforces the
//! check as `tower` middleware in front of any axum route.

pub mod api;
pub mod error;
pub mod models;
pub mod server;
pub mod services;

pub use api::{AccessGate, AccessGateService};
pub use error::{ConfigError, GateRejection, SignError};
pub use services::{
    expired, expired_at, sign, sign_with_expiration, valid_signature, UrlSigner, Verdict,
};
