use serde_json::{Value, json};

use super::handler::{ApiContext, error_response};
use super::helpers;
use super::multipart::{FormPart, boundary_from_content_type, parse_multipart};
use super::parsing::ApiRequest;
use crate::core::upload::{UploadCategory, UploadedFile, validate};
use crate::errors::PortfolioError;

pub async fn handle_upload(ctx: &ApiContext, req: &ApiRequest) -> Value {
    if !ctx.is_admin(req) {
        return error_response(&PortfolioError::Unauthorized, "Unauthorized");
    }

    let parts = match form_parts(req) {
        Ok(parts) => parts,
        Err(e) => return error_response(&e, "Invalid upload request"),
    };

    let mut category = None;
    let mut file = None;
    for part in parts {
        if part.name == "file" {
            file = into_uploaded_file(part);
        } else if part.name == "type" {
            category = Some(part.text());
        }
    }

    // A missing or rejected file is reported before a bad category.
    if let Err(e) = validate(file.as_ref()) {
        return error_response(&PortfolioError::from(e), "Invalid upload");
    }

    let category = match category.unwrap_or_default().parse::<UploadCategory>() {
        Ok(c) => c,
        Err(e) => return error_response(&e, "Invalid upload type"),
    };

    match ctx.uploads().upload(file, category).await {
        Ok(asset) => helpers::ok(&json!({
            "success": true,
            "url": asset.url,
            "filename": asset.stored_name,
        })),
        Err(e) => error_response(&e, "Failed to upload file"),
    }
}

fn form_parts(req: &ApiRequest) -> Result<Vec<FormPart>, PortfolioError> {
    let boundary = req
        .header("content-type")
        .and_then(boundary_from_content_type)
        .ok_or_else(|| PortfolioError::Validation("Expected multipart/form-data".to_string()))?;
    parse_multipart(&req.body, &boundary).map_err(PortfolioError::Validation)
}

/// Browsers send an empty, unnamed part when no file was chosen.
fn into_uploaded_file(part: FormPart) -> Option<UploadedFile> {
    let file_name = part.file_name.unwrap_or_default();
    if file_name.is_empty() && part.data.is_empty() {
        return None;
    }
    Some(UploadedFile {
        file_name,
        content_type: part
            .content_type
            .unwrap_or_else(|| "application/octet-stream".to_string()),
        bytes: part.data,
    })
}
