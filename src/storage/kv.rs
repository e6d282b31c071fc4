//! Redis-compatible key-value store reached over its REST API.
//!
//! Commands are posted as JSON arrays (`["GET", "key"]`) to the REST endpoint
//! with a bearer token; replies come back as `{"result": ...}` or
//! `{"error": "..."}`.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::{Value, json};

use super::{BackendKind, DocumentStore};
use crate::errors::PortfolioError;

/// Sets `KEYS[1]` to `ARGV[3]` only when its current value matches the
/// expectation (`ARGV[1] == "0"` means "must be absent").
const CAS_SCRIPT: &str = r"
local current = redis.call('GET', KEYS[1])
if ARGV[1] == '0' then
  if current then return 0 end
elseif current ~= ARGV[2] then
  return 0
end
redis.call('SET', KEYS[1], ARGV[3])
return 1
";

#[derive(Clone)]
pub struct KvClient {
    http: HttpClient,
    rest_url: String,
    token: String,
}

impl KvClient {
    pub fn new(http: HttpClient, rest_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http,
            rest_url: rest_url.into(),
            token: token.into(),
        }
    }

    /// Runs a single command and returns its `result` value.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the request fails or the store replies with
    /// an error.
    pub async fn command(&self, args: &[Value]) -> Result<Value, PortfolioError> {
        let resp = self
            .http
            .post(&self.rest_url)
            .bearer_auth(&self.token)
            .json(args)
            .send()
            .await
            .map_err(|e| kv_error(format!("request: {e}")))?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .map_err(|e| kv_error(format!("response parse (status {status}): {e}")))?;

        parse_reply(body)
    }
}

/// Extracts the `result` of a REST reply.
///
/// # Errors
///
/// Returns a storage error for `{"error": ...}` replies or replies without a
/// `result` field.
pub fn parse_reply(body: Value) -> Result<Value, PortfolioError> {
    if let Some(err) = body.get("error").and_then(Value::as_str) {
        return Err(kv_error(err.to_string()));
    }
    match body {
        Value::Object(mut map) => map
            .remove("result")
            .ok_or_else(|| kv_error("reply missing result".to_string())),
        other => Err(kv_error(format!("unexpected reply: {other}"))),
    }
}

#[must_use]
pub fn cas_command(key: &str, expected: Option<&str>, contents: &str) -> Vec<Value> {
    let (flag, expected) = match expected {
        Some(v) => ("1", v),
        None => ("0", ""),
    };
    vec![
        json!("EVAL"),
        json!(CAS_SCRIPT),
        json!("1"),
        json!(key),
        json!(flag),
        json!(expected),
        json!(contents),
    ]
}

/// `GET` must return the stored text verbatim: compare-and-swap compares
/// against that exact string, so any other reply is an error.
///
/// # Errors
///
/// Returns a storage error if the key holds something other than a string.
pub fn document_from_reply(key: &str, reply: Value) -> Result<Option<String>, PortfolioError> {
    match reply {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        other => Err(kv_error(format!(
            "GET {key}: expected a string value, got {other}"
        ))),
    }
}

fn kv_error(message: String) -> PortfolioError {
    PortfolioError::storage(BackendKind::KeyValue, message)
}

pub struct KvStore {
    client: KvClient,
    key: String,
}

impl KvStore {
    pub fn new(client: KvClient, key: impl Into<String>) -> Self {
        Self {
            client,
            key: key.into(),
        }
    }
}

#[async_trait]
impl DocumentStore for KvStore {
    fn kind(&self) -> BackendKind {
        BackendKind::KeyValue
    }

    async fn load(&self) -> Result<Option<String>, PortfolioError> {
        let reply = self.client.command(&[json!("GET"), json!(self.key)]).await?;
        document_from_reply(&self.key, reply)
    }

    async fn store(&self, contents: &str) -> Result<(), PortfolioError> {
        self.client
            .command(&[json!("SET"), json!(self.key), json!(contents)])
            .await?;
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        expected: Option<&str>,
        contents: &str,
    ) -> Result<bool, PortfolioError> {
        let result = self
            .client
            .command(&cas_command(&self.key, expected, contents))
            .await?;
        Ok(result.as_i64() == Some(1))
    }
}
