//! Response builders for API Gateway proxy responses.

use serde::Serialize;
use serde_json::{Value, json};

/// Returns a JSON response with the given status code.
#[must_use]
pub fn json_response<T: Serialize>(status_code: u16, body: &T) -> Value {
    let body = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    json!({
        "statusCode": status_code,
        "headers": { "content-type": "application/json" },
        "body": body
    })
}

/// Returns a 200 OK JSON response.
#[must_use]
pub fn ok<T: Serialize>(body: &T) -> Value {
    json_response(200, body)
}

/// Returns an error response with the given status code and message.
#[must_use]
pub fn err_response(status_code: u16, message: &str) -> Value {
    json_response(status_code, &json!({ "error": message }))
}

/// Attaches `Set-Cookie` values using the payload 2.0 `cookies` field.
#[must_use]
pub fn with_cookie(mut response: Value, cookie: String) -> Value {
    if let Some(obj) = response.as_object_mut() {
        let cookies = obj.entry("cookies").or_insert_with(|| json!([]));
        if let Some(list) = cookies.as_array_mut() {
            list.push(Value::String(cookie));
        }
    }
    response
}

/// Status code of a built response, mainly for logging and tests.
#[must_use]
pub fn status_of(response: &Value) -> u16 {
    response
        .get("statusCode")
        .and_then(Value::as_u64)
        .and_then(|s| u16::try_from(s).ok())
        .unwrap_or(500)
}

/// Parsed JSON body of a built response.
#[must_use]
pub fn body_of(response: &Value) -> Value {
    response
        .get("body")
        .and_then(Value::as_str)
        .and_then(|b| serde_json::from_str(b).ok())
        .unwrap_or(Value::Null)
}
