//! API Lambda handler - thin router that delegates to per-resource handlers.
//!
//! Routes:
//! - `/api/portfolio` (GET, PUT)
//! - `/api/analytics/visit` (POST), `/api/analytics/stats` (GET)
//! - `/api/auth/login`, `/api/auth/logout` (POST), `/api/auth/check` (GET)
//! - `/api/upload` (POST)

use lambda_runtime::{Error, LambdaEvent};
use reqwest::Client as HttpClient;
use serde_json::Value;
use tracing::{error, info, warn};

use super::parsing::ApiRequest;
use super::session::{ADMIN_COOKIE, AuthGate};
use super::{analytics, auth, helpers, portfolio, upload};
use crate::core::analytics::AnalyticsRepository;
use crate::core::config::AppConfig;
use crate::core::portfolio::PortfolioRepository;
use crate::core::upload::{UploadGateway, UploadTarget};
use crate::errors::PortfolioError;
use crate::storage::BlobClient;

pub use self::function_handler as handler;

/// Per-invocation state: resolved configuration plus a shared HTTP client.
pub struct ApiContext {
    pub config: AppConfig,
    pub http: HttpClient,
}

impl ApiContext {
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            http: HttpClient::new(),
        }
    }

    #[must_use]
    pub fn portfolio(&self) -> PortfolioRepository {
        PortfolioRepository::from_config(&self.config.storage, &self.http)
    }

    #[must_use]
    pub fn analytics(&self) -> AnalyticsRepository {
        AnalyticsRepository::from_config(&self.config.storage, &self.http)
    }

    /// Uploads go to the blob store when its token is configured, otherwise
    /// into the local public directory.
    #[must_use]
    pub fn uploads(&self) -> UploadGateway {
        let target = match &self.config.storage.blob_token {
            Some(token) => UploadTarget::Blob(BlobClient::new(
                self.http.clone(),
                &self.config.storage.blob_api_url,
                token.clone(),
            )),
            None => UploadTarget::Local {
                public_dir: self.config.public_dir.clone(),
            },
        };
        UploadGateway::new(target)
    }

    #[must_use]
    pub fn auth(&self) -> AuthGate<'_> {
        AuthGate::new(&self.config.auth)
    }

    #[must_use]
    pub fn is_admin(&self, req: &ApiRequest) -> bool {
        self.auth().check(req.cookie(ADMIN_COOKIE))
    }
}

/// Lambda handler for the API entrypoint.
///
/// # Errors
///
/// Returns an error only when configuration cannot be resolved; request
/// failures are reported as proxy responses with an error status.
#[tracing::instrument(level = "info", skip(event))]
pub async fn function_handler(event: LambdaEvent<Value>) -> Result<Value, Error> {
    let config = AppConfig::from_env().map_err(|e| {
        let err = PortfolioError::Config(e);
        error!("{}", err);
        Error::from(err)
    })?;
    let ctx = ApiContext::new(config);

    let request = match ApiRequest::from_event(&event.payload) {
        Ok(r) => r,
        Err(e) => {
            error!("Malformed request event: {}", e);
            return Ok(helpers::err_response(e.status_code(), &e.to_string()));
        }
    };

    Ok(route(&ctx, &request).await)
}

/// Dispatches a parsed request to its handler.
pub async fn route(ctx: &ApiContext, req: &ApiRequest) -> Value {
    info!(method = %req.method, path = %req.path, "API request");

    let response = match (req.path.as_str(), req.method.as_str()) {
        ("/api/portfolio", "GET") => portfolio::handle_get(ctx).await,
        ("/api/portfolio", "PUT") => portfolio::handle_put(ctx, req).await,
        ("/api/analytics/visit", "POST") => analytics::handle_visit(ctx, req).await,
        ("/api/analytics/stats", "GET") => analytics::handle_stats(ctx).await,
        ("/api/auth/login", "POST") => auth::handle_login(ctx, req),
        ("/api/auth/logout", "POST") => auth::handle_logout(ctx),
        ("/api/auth/check", "GET") => auth::handle_check(ctx, req),
        ("/api/upload", "POST") => upload::handle_upload(ctx, req).await,
        (path, method) if is_known_path(path) => {
            warn!(method, path, "Method not allowed");
            helpers::err_response(405, "Method not allowed")
        }
        _ => helpers::err_response(404, "Not found"),
    };

    info!(status = helpers::status_of(&response), "API response");
    response
}

fn is_known_path(path: &str) -> bool {
    matches!(
        path,
        "/api/portfolio"
            | "/api/analytics/visit"
            | "/api/analytics/stats"
            | "/api/auth/login"
            | "/api/auth/logout"
            | "/api/auth/check"
            | "/api/upload"
    )
}

/// Maps an error to a response. Client errors carry their own message;
/// server errors are logged and replaced by `public_message`.
#[must_use]
pub fn error_response(err: &PortfolioError, public_message: &str) -> Value {
    let status = err.status_code();
    if status >= 500 {
        error!("{}: {}", public_message, err);
        helpers::err_response(status, public_message)
    } else {
        helpers::err_response(status, &err.to_string())
    }
}
