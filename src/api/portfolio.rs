use serde_json::{Value, json};
use tracing::error;

use super::handler::{ApiContext, error_response};
use super::helpers;
use super::parsing::ApiRequest;
use crate::core::models::PortfolioDocument;
use crate::errors::PortfolioError;

const STORAGE_HINT: &str = "Check the storage configuration: set BLOB_READ_WRITE_TOKEN, or KV_REST_API_URL, KV_REST_API_TOKEN and KV_URL.";

pub async fn handle_get(ctx: &ApiContext) -> Value {
    match ctx.portfolio().get().await {
        Ok(doc) => helpers::ok(&doc),
        Err(e) => error_response(&e, "Failed to fetch portfolio data"),
    }
}

/// Full-document replacement; missing fields are rejected, not defaulted.
pub async fn handle_put(ctx: &ApiContext, req: &ApiRequest) -> Value {
    if !ctx.is_admin(req) {
        return error_response(&PortfolioError::Unauthorized, "Unauthorized");
    }

    let doc: PortfolioDocument = match serde_json::from_slice(&req.body) {
        Ok(doc) => doc,
        Err(e) => return error_response(&PortfolioError::from(e), "Invalid portfolio document"),
    };

    match ctx.portfolio().save(&doc).await {
        Ok(()) => helpers::ok(&json!({ "success": true })),
        // The editor is the only consumer, so surface the raw cause.
        Err(e @ PortfolioError::Storage { .. }) => {
            error!("Error updating portfolio data: {}", e);
            helpers::json_response(
                e.status_code(),
                &json!({ "error": e.to_string(), "hint": STORAGE_HINT }),
            )
        }
        Err(e) => error_response(&e, "Failed to update portfolio data"),
    }
}
