use std::error::Error;

use folio::errors::{PortfolioError, UploadError};
use folio::storage::BackendKind;

#[test]
fn test_portfolio_error_implements_error_trait() {
    fn assert_error<T: Error>(_: &T) {}

    let error = PortfolioError::Validation("test error".to_string());
    assert_error(&error);
}

#[test]
fn test_portfolio_error_display() {
    let error = PortfolioError::storage(BackendKind::KeyValue, "WRONGPASS invalid token");
    assert_eq!(
        format!("{error}"),
        "Storage error (kv): WRONGPASS invalid token"
    );

    let error = PortfolioError::storage(BackendKind::File, "write data/portfolio.json: denied");
    assert_eq!(
        format!("{error}"),
        "Storage error (file): write data/portfolio.json: denied"
    );

    let error = PortfolioError::from(UploadError::FileTooLarge(6 * 1024 * 1024));
    assert_eq!(format!("{error}"), "File size exceeds 5MB limit");
}

#[test]
fn test_status_codes() {
    assert_eq!(PortfolioError::Unauthorized.status_code(), 401);
    assert_eq!(
        PortfolioError::Validation("bad".into()).status_code(),
        400
    );
    assert_eq!(
        PortfolioError::from(UploadError::MissingFile).status_code(),
        400
    );
    assert_eq!(
        PortfolioError::storage(BackendKind::Blob, "down").status_code(),
        500
    );
    assert_eq!(PortfolioError::Config("x".into()).status_code(), 500);
}

#[test]
fn test_portfolio_error_from_conversions() {
    let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let portfolio_err: PortfolioError = err.into();
    assert!(matches!(portfolio_err, PortfolioError::Validation(_)));

    // Verifies the reqwest conversion exists without making a request
    #[allow(unused)]
    fn _check_reqwest_conversion(err: reqwest::Error) -> PortfolioError {
        PortfolioError::from(err)
    }
}
