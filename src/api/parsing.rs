//! Extraction of method, path, headers, cookies and body from API Gateway
//! proxy events (payload format 1.0 and 2.0).

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use crate::errors::PortfolioError;

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: String,
    pub path: String,
    pub headers: Value,
    pub cookies: Vec<String>,
    pub body: Vec<u8>,
}

impl ApiRequest {
    /// # Errors
    ///
    /// Returns a validation error if the event has no path or carries an
    /// undecodable base64 body.
    pub fn from_event(payload: &Value) -> Result<Self, PortfolioError> {
        let method = v_str(payload, &["requestContext", "http", "method"])
            .or_else(|| v_str(payload, &["httpMethod"]))
            .unwrap_or("GET")
            .to_ascii_uppercase();

        let raw_path = v_str(payload, &["rawPath"])
            .or_else(|| v_str(payload, &["path"]))
            .ok_or_else(|| PortfolioError::Validation("Missing path".to_string()))?;

        let headers = payload.get("headers").cloned().unwrap_or(Value::Null);

        let mut cookies: Vec<String> = payload
            .get("cookies")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        if cookies.is_empty()
            && let Some(header) = get_header_value(&headers, "cookie")
        {
            cookies = header.split(';').map(|c| c.trim().to_string()).collect();
        }

        let body = match payload.get("body").and_then(Value::as_str) {
            None => Vec::new(),
            Some(text) if is_base64_encoded(payload) => STANDARD
                .decode(text)
                .map_err(|e| PortfolioError::Validation(format!("Invalid base64 body: {e}")))?,
            Some(text) => text.as_bytes().to_vec(),
        };

        Ok(Self {
            method,
            path: api_route(raw_path),
            headers,
            cookies,
            body,
        })
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        get_header_value(&self.headers, name)
    }

    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        cookie_value(&self.cookies, name)
    }

    /// # Errors
    ///
    /// Returns a validation error if the body is not JSON.
    pub fn json_body(&self) -> Result<Value, PortfolioError> {
        if self.body.is_empty() {
            return Err(PortfolioError::Validation("Missing body".to_string()));
        }
        Ok(serde_json::from_slice(&self.body)?)
    }
}

fn is_base64_encoded(payload: &Value) -> bool {
    payload
        .get("isBase64Encoded")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Strips any stage prefix so `/prod/api/portfolio/` routes as `/api/portfolio`.
#[must_use]
pub fn api_route(raw_path: &str) -> String {
    let path = raw_path.split('?').next().unwrap_or_default();
    let path = path.find("/api/").map_or(path, |idx| &path[idx..]);
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

#[must_use]
pub fn cookie_value<'a>(cookies: &'a [String], name: &str) -> Option<&'a str> {
    cookies.iter().find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key.trim() == name).then(|| value.trim())
    })
}

pub fn v_path<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut cur = root;
    for key in path {
        cur = cur.get(*key)?;
    }
    Some(cur)
}

pub fn v_str<'a>(root: &'a Value, path: &[&str]) -> Option<&'a str> {
    v_path(root, path).and_then(|v| v.as_str())
}

pub fn get_header_value<'a>(headers: &'a Value, name: &str) -> Option<&'a str> {
    if let Some(v) = headers.get(name).and_then(|s| s.as_str()) {
        return Some(v);
    }
    headers.as_object().and_then(|map| {
        map.iter().find_map(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                v.as_str()
            } else {
                None
            }
        })
    })
}
