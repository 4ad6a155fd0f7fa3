use rstest::rstest;

use crate::error::AppError;

#[rstest]
#[case(AppError::Validation("x".into()), 400, "VALIDATION_ERROR")]
#[case(AppError::Unauthorized("x".into()), 401, "UNAUTHORIZED")]
#[case(AppError::Forbidden("x".into()), 403, "FORBIDDEN")]
#[case(AppError::NotFound("x".into()), 404, "NOT_FOUND")]
#[case(AppError::Conflict("x".into()), 409, "CONFLICT")]
#[case(AppError::Database("x".into()), 500, "DATABASE_ERROR")]
#[case(AppError::Internal("x".into()), 500, "INTERNAL_ERROR")]
fn test_status_and_code(#[case] err: AppError, #[case] status: u16, #[case] code: &str) {
    assert_eq!(err.status_code(), status);
    assert_eq!(err.error_code(), code);
}

#[test]
fn test_error_display() {
    assert_eq!(
        AppError::Validation("msg".into()).to_string(),
        "Validation error: msg"
    );
    assert_eq!(
        AppError::Unauthorized("msg".into()).to_string(),
        "Authentication failed: msg"
    );
    assert_eq!(
        AppError::Forbidden("msg".into()).to_string(),
        "Access denied: msg"
    );
    assert_eq!(
        AppError::NotFound("msg".into()).to_string(),
        "Not found: msg"
    );
    assert_eq!(
        AppError::Conflict("msg".into()).to_string(),
        "Conflict: msg"
    );
}

#[test]
fn test_server_errors_hide_details() {
    let err = AppError::Database("relation \"budgets\" does not exist".into());
    assert!(err.is_server_error());
    assert_eq!(err.public_message(), "An internal error occurred");

    let err = AppError::Internal("argon2 params".into());
    assert!(err.is_server_error());
    assert!(!err.public_message().contains("argon2"));
}

#[test]
fn test_client_errors_keep_details() {
    let err = AppError::NotFound("budget 7".into());
    assert!(!err.is_server_error());
    assert_eq!(err.public_message(), "budget 7");
}
