//! Assertion helpers for tests.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use super::app::TestResponse;

/// Assert response has expected status code
pub fn assert_status(response: &TestResponse, expected: StatusCode) {
    assert_eq!(
        response.status,
        expected,
        "Expected status {}, got {}. Body: {}",
        expected,
        response.status,
        response.text()
    );
}

/// Assert response is OK (200)
pub fn assert_ok(response: &TestResponse) {
    assert_status(response, StatusCode::OK);
}

/// Assert the gate answered with its generic 403
pub fn assert_forbidden(response: &TestResponse) {
    assert_status(response, StatusCode::FORBIDDEN);
    assert_eq!(response.text(), "403 Forbidden");
}

/// Assert the gate answered with its generic 500
pub fn assert_internal_error(response: &TestResponse) {
    assert_status(response, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text(), "Internal Server Error");
}
