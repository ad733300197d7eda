//! Image payload helpers: data URLs and content-type checks.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::CoreError;

/// Content type assumed when an upload does not declare one.
pub const DEFAULT_IMAGE_CONTENT_TYPE: &str = "image/jpeg";

/// Image types accepted for backgrounds and guest photos.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// Check an upload's declared content type, defaulting to JPEG when absent.
pub fn validate_image_content_type(content_type: Option<&str>) -> Result<&'static str, CoreError> {
    let declared = content_type
        .map(|ct| ct.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty());

    let Some(declared) = declared else {
        return Ok(DEFAULT_IMAGE_CONTENT_TYPE);
    };
    // Browsers still send the non-standard alias.
    let declared = if declared == "image/jpg" { "image/jpeg".to_string() } else { declared };

    ALLOWED_IMAGE_TYPES
        .iter()
        .copied()
        .find(|allowed| *allowed == declared)
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "Unsupported image type '{declared}'. Allowed: {}",
                ALLOWED_IMAGE_TYPES.join(", ")
            ))
        })
}

/// Encode bytes as a base64 `data:` URL.
pub fn encode_data_url(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{content_type};base64,{}", STANDARD.encode(bytes))
}

/// A decoded `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Decode a base64 `data:` URL.
pub fn decode_data_url(url: &str) -> Result<DataUrl, CoreError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| CoreError::Validation("Not a data URL".to_string()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| CoreError::Validation("Malformed data URL".to_string()))?;
    let content_type = meta
        .strip_suffix(";base64")
        .ok_or_else(|| CoreError::Validation("Only base64 data URLs are supported".to_string()))?;

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| CoreError::Validation(format!("Invalid base64 payload: {e}")))?;

    Ok(DataUrl {
        content_type: if content_type.is_empty() {
            DEFAULT_IMAGE_CONTENT_TYPE.to_string()
        } else {
            content_type.to_string()
        },
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_content_type_defaults_to_jpeg() {
        assert_eq!(validate_image_content_type(None).unwrap(), "image/jpeg");
        assert_eq!(validate_image_content_type(Some("")).unwrap(), "image/jpeg");
    }

    #[test]
    fn content_type_parameters_are_ignored() {
        assert_eq!(
            validate_image_content_type(Some("image/PNG; charset=binary")).unwrap(),
            "image/png"
        );
        assert_eq!(validate_image_content_type(Some("image/jpg")).unwrap(), "image/jpeg");
    }

    #[test]
    fn non_images_are_rejected() {
        assert!(validate_image_content_type(Some("application/pdf")).is_err());
        assert!(validate_image_content_type(Some("image/svg+xml")).is_err());
    }

    #[test]
    fn data_url_has_expected_shape() {
        let url = encode_data_url("image/png", b"hi");
        assert_eq!(url, "data:image/png;base64,aGk=");
        let decoded = decode_data_url(&url).unwrap();
        assert_eq!(decoded.content_type, "image/png");
        assert_eq!(decoded.bytes, b"hi");
    }

    #[test]
    fn malformed_data_urls_are_rejected() {
        assert!(decode_data_url("https://example.com/a.png").is_err());
        assert!(decode_data_url("data:image/png,raw").is_err());
        assert!(decode_data_url("data:image/png;base64,@@@").is_err());
    }
}
