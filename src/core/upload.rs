//! Image uploads for avatars and skill icons.
//!
//! The declared MIME type is taken at face value; no content sniffing is
//! done, so callers must not rely on it as a security boundary.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::info;

use crate::errors::{PortfolioError, UploadError};
use crate::storage::BackendKind;
use crate::storage::blob::{BlobClient, PutOptions};
use crate::utils::mime::is_supported_image_mime;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadCategory {
    Avatar,
    SkillIcon,
}

impl UploadCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            UploadCategory::Avatar => "avatar",
            UploadCategory::SkillIcon => "skill-icon",
        }
    }
}

impl fmt::Display for UploadCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadCategory {
    type Err = PortfolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "avatar" => Ok(UploadCategory::Avatar),
            "skill-icon" => Ok(UploadCategory::SkillIcon),
            other => Err(PortfolioError::Validation(format!(
                "Invalid upload type '{other}'. Expected 'avatar' or 'skill-icon'."
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredAsset {
    pub url: String,
    pub stored_name: String,
}

/// Where accepted uploads end up.
#[derive(Clone)]
pub enum UploadTarget {
    Blob(BlobClient),
    Local { public_dir: PathBuf },
}

impl UploadTarget {
    #[must_use]
    pub fn kind(&self) -> BackendKind {
        match self {
            UploadTarget::Blob(_) => BackendKind::Blob,
            UploadTarget::Local { .. } => BackendKind::File,
        }
    }
}

/// Checks presence, declared type and size, in that order.
///
/// # Errors
///
/// Returns the first failing [`UploadError`].
pub fn validate(file: Option<&UploadedFile>) -> Result<&UploadedFile, UploadError> {
    let file = file.ok_or(UploadError::MissingFile)?;
    if !is_supported_image_mime(&file.content_type) {
        return Err(UploadError::UnsupportedType(file.content_type.clone()));
    }
    if file.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(UploadError::FileTooLarge(file.bytes.len()));
    }
    Ok(file)
}

/// Replaces everything outside `[A-Za-z0-9.-]` with `_`.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    static UNSAFE_CHARS: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[^a-zA-Z0-9.\-]").expect("static regex compile"));

    let cleaned = UNSAFE_CHARS.replace_all(name, "_");
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.into_owned()
    }
}

#[must_use]
pub fn stored_name(category: UploadCategory, timestamp_millis: i64, original: &str) -> String {
    format!(
        "{category}-{timestamp_millis}-{}",
        sanitize_file_name(original)
    )
}

pub struct UploadGateway {
    target: UploadTarget,
}

impl UploadGateway {
    pub fn new(target: UploadTarget) -> Self {
        Self { target }
    }

    /// Validates `file` and persists it under a timestamped name.
    ///
    /// # Errors
    ///
    /// Returns an upload error when validation fails and a storage error when
    /// the target rejects the write.
    pub async fn upload(
        &self,
        file: Option<UploadedFile>,
        category: UploadCategory,
    ) -> Result<StoredAsset, PortfolioError> {
        let file = validate(file.as_ref())?;
        let name = stored_name(
            category,
            chrono::Utc::now().timestamp_millis(),
            &file.file_name,
        );

        let asset = match &self.target {
            UploadTarget::Blob(client) => {
                let object = client
                    .put(
                        &format!("uploads/{name}"),
                        file.bytes.clone(),
                        PutOptions {
                            content_type: &file.content_type,
                            add_random_suffix: true,
                            allow_overwrite: false,
                            cache_max_age: None,
                        },
                    )
                    .await?;
                StoredAsset {
                    url: object.url,
                    stored_name: object.pathname,
                }
            }
            UploadTarget::Local { public_dir } => {
                let dir = public_dir.join("uploads");
                tokio::fs::create_dir_all(&dir).await.map_err(|e| {
                    PortfolioError::storage(BackendKind::File, format!("create {}: {e}", dir.display()))
                })?;
                let path = dir.join(&name);
                tokio::fs::write(&path, &file.bytes).await.map_err(|e| {
                    PortfolioError::storage(BackendKind::File, format!("write {}: {e}", path.display()))
                })?;
                StoredAsset {
                    url: format!("/uploads/{name}"),
                    stored_name: format!("uploads/{name}"),
                }
            }
        };

        info!(
            backend = %self.target.kind(),
            category = %category,
            size = file.bytes.len(),
            stored_name = %asset.stored_name,
            "Stored upload"
        );
        Ok(asset)
    }
}
