//! Minimal `multipart/form-data` parser for upload requests.

use std::collections::HashMap;

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl FormPart {
    /// Part data as text, for plain form fields.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

/// Extracts the boundary parameter from a `multipart/form-data` content type.
///
/// # Examples
///
/// ```
/// use folio::api::multipart::boundary_from_content_type;
///
/// let ct = "multipart/form-data; boundary=----WebKitFormBoundary7MA4YWxk";
/// assert_eq!(
///     boundary_from_content_type(ct).as_deref(),
///     Some("----WebKitFormBoundary7MA4YWxk")
/// );
/// assert_eq!(boundary_from_content_type("application/json"), None);
/// ```
#[must_use]
pub fn boundary_from_content_type(content_type: &str) -> Option<String> {
    let mut params = content_type.split(';');
    let mime = params.next()?.trim();
    if !mime.eq_ignore_ascii_case("multipart/form-data") {
        return None;
    }
    params.find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("boundary")
            .then(|| value.trim().trim_matches('"').to_string())
            .filter(|b| !b.is_empty())
    })
}

/// Splits `body` into its parts.
///
/// # Errors
///
/// Returns an error message if the body does not contain the boundary, a
/// part has no header terminator, or a part lacks a `name`.
pub fn parse_multipart(body: &[u8], boundary: &str) -> Result<Vec<FormPart>, String> {
    let delimiter = format!("--{boundary}").into_bytes();
    let separator = format!("\r\n--{boundary}").into_bytes();

    let mut pos = find(body, &delimiter, 0)
        .ok_or_else(|| "Multipart body does not contain the boundary".to_string())?
        + delimiter.len();
    let mut parts = Vec::new();

    loop {
        if body[pos..].starts_with(b"--") {
            break;
        }
        if body[pos..].starts_with(b"\r\n") {
            pos += 2;
        }

        let header_end = find(body, b"\r\n\r\n", pos)
            .ok_or_else(|| "Multipart part is missing its header terminator".to_string())?;
        let headers = parse_part_headers(&String::from_utf8_lossy(&body[pos..header_end]));
        let data_start = header_end + 4;

        let data_end = find(body, &separator, data_start)
            .ok_or_else(|| "Multipart body is missing its closing boundary".to_string())?;

        let disposition = headers
            .get("content-disposition")
            .map(|v| parse_disposition(v))
            .unwrap_or_default();
        let name = disposition
            .get("name")
            .cloned()
            .ok_or_else(|| "Multipart part is missing a name".to_string())?;

        parts.push(FormPart {
            name,
            file_name: disposition.get("filename").cloned(),
            content_type: headers.get("content-type").cloned(),
            data: body[data_start..data_end].to_vec(),
        });

        pos = data_end + separator.len();
        if pos >= body.len() {
            break;
        }
    }

    Ok(parts)
}

fn parse_part_headers(raw: &str) -> HashMap<String, String> {
    raw.split("\r\n")
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            Some((key.trim().to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect()
}

/// Parses `form-data; name="file"; filename="a.png"` into its parameters.
fn parse_disposition(value: &str) -> HashMap<String, String> {
    value
        .split(';')
        .skip(1)
        .filter_map(|param| {
            let (key, value) = param.split_once('=')?;
            Some((
                key.trim().to_ascii_lowercase(),
                value.trim().trim_matches('"').to_string(),
            ))
        })
        .collect()
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() || needle.is_empty() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}
