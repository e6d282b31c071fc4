//! MIME utilities shared across modules

const SUPPORTED_IMAGE_MIMES: [&str; 4] = ["image/png", "image/svg+xml", "image/jpeg", "image/jpg"];

/// Lower-cases a MIME type and drops any parameters (`; charset=...`).
#[must_use]
pub fn canonicalize_mime(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Returns whether a given MIME type is accepted for image uploads.
#[must_use]
pub fn is_supported_image_mime(mime: &str) -> bool {
    let canon = canonicalize_mime(mime);
    SUPPORTED_IMAGE_MIMES.contains(&canon.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_declared_image_types() {
        assert!(is_supported_image_mime("image/png"));
        assert!(is_supported_image_mime("IMAGE/SVG+XML"));
        assert!(is_supported_image_mime("image/jpeg; charset=binary"));
        assert!(is_supported_image_mime("image/jpg"));
    }

    #[test]
    fn rejects_everything_else() {
        assert!(!is_supported_image_mime("application/octet-stream"));
        assert!(!is_supported_image_mime("image/gif"));
        assert!(!is_supported_image_mime(""));
    }
}
