use serde_json::{Value, json};

use super::handler::{ApiContext, error_response};
use super::helpers;
use super::parsing::ApiRequest;
use crate::errors::PortfolioError;

pub async fn handle_visit(ctx: &ApiContext, req: &ApiRequest) -> Value {
    let visitor_id = req.json_body().ok().and_then(|body| {
        body.get("visitorId")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    });
    let Some(visitor_id) = visitor_id else {
        return error_response(
            &PortfolioError::Validation("Invalid visitor ID".to_string()),
            "Invalid visitor ID",
        );
    };

    match ctx.analytics().register_visitor(&visitor_id).await {
        Ok(doc) => helpers::ok(&json!({ "uniqueVisitors": doc.unique_visitors })),
        Err(e) => error_response(&e, "Failed to register visitor"),
    }
}

pub async fn handle_stats(ctx: &ApiContext) -> Value {
    match ctx.analytics().get().await {
        Ok(doc) => helpers::ok(&json!({
            "uniqueVisitors": doc.unique_visitors,
            "totalTrackedVisitors": doc.visitor_ids.len(),
        })),
        Err(e) => error_response(&e, "Failed to fetch analytics stats"),
    }
}
