//! Image MIME detection for uploads whose declared type is missing or generic.

use std::path::Path;

/// MIME type by file extension, images only.
pub fn image_mime_from_name(name: &str) -> Option<&'static str> {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())?
        .to_ascii_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        "tiff" | "tif" => Some("image/tiff"),
        _ => None,
    }
}

/// MIME type from the leading magic bytes.
pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, b'P', b'N', b'G', ..] => Some("image/png"),
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        [b'B', b'M', ..] => Some("image/bmp"),
        _ => None,
    }
}

/// Settle the MIME type of an upload.
///
/// A declared `image/*` type wins; a missing or generic one is replaced by the
/// file extension, then the magic bytes. Anything else is returned as declared
/// so the caller can reject it.
pub fn resolve_image_mime(declared: Option<&str>, file_name: Option<&str>, bytes: &[u8]) -> String {
    let declared = declared
        .map(|m| m.split(';').next().unwrap_or(m).trim().to_ascii_lowercase())
        .filter(|m| !m.is_empty());

    match declared.as_deref() {
        Some(m) if m.starts_with("image/") => m.to_string(),
        None | Some("application/octet-stream") => file_name
            .and_then(image_mime_from_name)
            .or_else(|| sniff_image_mime(bytes))
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".to_string()),
        Some(other) => other.to_string(),
    }
}
