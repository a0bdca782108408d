//! Tests for HTTP outcome classification.

use org_metrics::github::ApiResponse;

fn classify(status: u16, message: &str) -> Option<ApiResponse<()>> {
    ApiResponse::from_status(status, message)
}

#[test]
fn test_success_statuses_are_not_failures() {
    assert_eq!(classify(200, ""), None);
    assert_eq!(classify(204, ""), None);
}

#[test]
fn test_forbidden_is_permission_denied() {
    assert!(matches!(
        classify(403, "Resource not accessible by integration"),
        Some(ApiResponse::PermissionDenied(_))
    ));
    assert!(matches!(
        classify(401, "Bad credentials"),
        Some(ApiResponse::PermissionDenied(_))
    ));
}

#[test]
fn test_rate_limit_403_is_transient() {
    assert!(matches!(
        classify(403, "API rate limit exceeded for user ID 1"),
        Some(ApiResponse::Transient(_))
    ));
    assert!(matches!(
        classify(429, "secondary rate limit"),
        Some(ApiResponse::Transient(_))
    ));
}

#[test]
fn test_missing_feature_is_not_found() {
    assert!(matches!(classify(404, "Not Found"), Some(ApiResponse::NotFound(_))));
    assert!(matches!(classify(410, "Gone"), Some(ApiResponse::NotFound(_))));
}

#[test]
fn test_server_errors_are_transient() {
    assert!(matches!(classify(500, ""), Some(ApiResponse::Transient(_))));
    assert!(matches!(classify(502, "Bad Gateway"), Some(ApiResponse::Transient(_))));
}

#[test]
fn test_failure_reason_names_the_class() {
    let denied: ApiResponse<()> = ApiResponse::PermissionDenied("HTTP 403: nope".to_string());
    assert_eq!(
        denied.failure_reason().as_deref(),
        Some("permission denied (HTTP 403: nope)")
    );
    assert_eq!(ApiResponse::Success(1).failure_reason(), None);
}

#[test]
fn test_map_keeps_failures() {
    let missing: ApiResponse<u32> = ApiResponse::NotFound("HTTP 404".to_string());
    assert_eq!(
        missing.map(|n| n + 1),
        ApiResponse::NotFound("HTTP 404".to_string())
    );
    assert_eq!(ApiResponse::Success(1).map(|n| n + 1), ApiResponse::Success(2));
}
