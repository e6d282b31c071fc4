/// Folio - the content backend of a personal portfolio site.
///
/// A single API Lambda serves the public portfolio document, counts unique
/// visitors, and lets a password-gated admin replace the document and upload
/// images.
///
/// # Architecture
///
/// The system uses:
/// - AWS Lambda behind API Gateway for request handling
/// - One JSON document per data domain (portfolio, analytics), stored on a
///   blob store, a Redis-compatible KV REST API, or a local file, chosen from
///   which credentials are configured
/// - reqwest for the blob and KV REST APIs
/// - HMAC-signed, expiring cookies for the admin session
///
/// # Example
///
/// ```no_run
/// use folio::core::config::StorageConfig;
/// use folio::core::analytics::AnalyticsRepository;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     folio::setup_logging();
///
///     let storage = StorageConfig::local("data");
///     let http = reqwest::Client::new();
///     let analytics = AnalyticsRepository::from_config(&storage, &http);
///
///     let doc = analytics.register_visitor("visitor-123").await?;
///     println!("Unique visitors: {}", doc.unique_visitors);
///     Ok(())
/// }
/// ```
pub mod api;
pub mod core;
pub mod errors;
pub mod storage;
pub mod utils;

pub use errors::{PortfolioError, UploadError};

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// This function sets up tracing-subscriber with a JSON formatter suitable for
/// `CloudWatch` Logs integration. It should be called once at cold start.
/// Calling it again is a no-op.
///
/// # Example
///
/// ```
/// folio::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}
