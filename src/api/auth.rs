use serde_json::{Value, json};
use tracing::info;

use super::handler::ApiContext;
use super::helpers;
use super::parsing::ApiRequest;

pub fn handle_login(ctx: &ApiContext, req: &ApiRequest) -> Value {
    let password = req.json_body().ok().and_then(|body| {
        body.get("password")
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    let Some(password) = password else {
        return helpers::json_response(400, &json!({ "success": false, "error": "Invalid request" }));
    };

    match ctx.auth().login(&password) {
        Some(cookie) => {
            info!("Admin login succeeded");
            helpers::with_cookie(helpers::ok(&json!({ "success": true })), cookie)
        }
        None => helpers::json_response(
            401,
            &json!({ "success": false, "error": "Invalid password" }),
        ),
    }
}

pub fn handle_logout(ctx: &ApiContext) -> Value {
    helpers::with_cookie(helpers::ok(&json!({ "success": true })), ctx.auth().logout())
}

pub fn handle_check(ctx: &ApiContext, req: &ApiRequest) -> Value {
    if ctx.is_admin(req) {
        helpers::ok(&json!({ "authenticated": true }))
    } else {
        helpers::json_response(401, &json!({ "authenticated": false }))
    }
}
