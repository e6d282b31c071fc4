use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::storage::{BackendKind, Domain, StorageTarget};

pub const BLOB_TOKEN_VAR: &str = "BLOB_READ_WRITE_TOKEN";
pub const KV_REST_URL_VAR: &str = "KV_REST_API_URL";
pub const KV_REST_TOKEN_VAR: &str = "KV_REST_API_TOKEN";
pub const KV_URL_VAR: &str = "KV_URL";

pub const DEFAULT_BLOB_API_URL: &str = "https://blob.vercel-storage.com";
pub const DEFAULT_ADMIN_PASSWORDS: [&str; 2] = ["Praveen@14", "Relax!2002"];

#[derive(Clone)]
pub struct KvConfig {
    pub rest_url: String,
    pub rest_token: String,
    pub connection_url: String,
}

/// Storage configuration. Only presence of the credentials drives backend
/// selection; their values never reach the logs.
#[derive(Clone)]
pub struct StorageConfig {
    pub blob_token: Option<String>,
    pub blob_api_url: String,
    pub kv: Option<KvConfig>,
    pub data_dir: PathBuf,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub passwords: Vec<String>,
    pub session_secret: String,
    pub secure_cookies: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub public_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| present(lookup(key));

        Ok(Self {
            storage: StorageConfig::from_lookup(&get),
            auth: AuthConfig::from_lookup(&get)?,
            public_dir: get("PUBLIC_DIR").map_or_else(|| PathBuf::from("public"), PathBuf::from),
        })
    }
}

impl StorageConfig {
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let kv = match (
            get(KV_REST_URL_VAR),
            get(KV_REST_TOKEN_VAR),
            get(KV_URL_VAR),
        ) {
            (Some(rest_url), Some(rest_token), Some(connection_url)) => Some(KvConfig {
                rest_url,
                rest_token,
                connection_url,
            }),
            _ => None,
        };

        Self {
            blob_token: get(BLOB_TOKEN_VAR),
            blob_api_url: get("BLOB_API_URL").unwrap_or_else(|| DEFAULT_BLOB_API_URL.to_string()),
            kv,
            data_dir: get("DATA_DIR").map_or_else(|| PathBuf::from("data"), PathBuf::from),
        }
    }

    /// File-only configuration rooted at `data_dir`.
    pub fn local(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            blob_token: None,
            blob_api_url: DEFAULT_BLOB_API_URL.to_string(),
            kv: None,
            data_dir: data_dir.into(),
        }
    }

    /// Active backend: blob token first, then the complete KV triple, then
    /// the local file fallback.
    #[must_use]
    pub fn backend(&self) -> BackendKind {
        if self.blob_token.is_some() {
            BackendKind::Blob
        } else if self.kv.is_some() {
            BackendKind::KeyValue
        } else {
            BackendKind::File
        }
    }

    #[must_use]
    pub fn select(&self, domain: Domain) -> StorageTarget {
        match self.backend() {
            BackendKind::Blob => StorageTarget::Blob {
                pathname: domain.blob_pathname().to_string(),
            },
            BackendKind::KeyValue => StorageTarget::KeyValue {
                key: domain.kv_key().to_string(),
            },
            BackendKind::File => StorageTarget::File {
                path: self.data_dir.join(domain.file_name()),
            },
        }
    }
}

impl AuthConfig {
    pub fn from_lookup<F>(get: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let passwords: Vec<String> = match get("ADMIN_PASSWORDS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_ADMIN_PASSWORDS
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
        };
        if passwords.is_empty() {
            return Err("ADMIN_PASSWORDS: no passwords configured".to_string());
        }

        let session_secret = match get("ADMIN_SESSION_SECRET") {
            Some(secret) => secret,
            None => {
                tracing::warn!(
                    "ADMIN_SESSION_SECRET is not set; deriving the session key from the password list"
                );
                format!("folio-session:{}", passwords.join("\n"))
            }
        };

        Ok(Self {
            passwords,
            session_secret,
            secure_cookies: get("APP_ENV").is_some_and(|v| v.eq_ignore_ascii_case("production")),
        })
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("backend", &self.backend())
            .field("blob_api_url", &self.blob_api_url)
            .field("data_dir", &self.data_dir)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("passwords", &self.passwords.len())
            .field("secure_cookies", &self.secure_cookies)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for KvConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KvConfig { .. }")
    }
}
