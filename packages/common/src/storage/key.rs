use uuid::Uuid;

use super::error::StorageError;

/// Namespace every advertisement asset key lives under.
pub const KEY_PREFIX: &str = "advertisements";

/// Generate a unique key of the form `advertisements/{uuid}.{ext}`.
pub fn new_object_key(content_type: &str) -> String {
    format!(
        "{KEY_PREFIX}/{}.{}",
        Uuid::new_v4(),
        extension_for(content_type)
    )
}

/// Pick a file extension for a MIME type.
pub fn extension_for(content_type: &str) -> &'static str {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "image/avif" => "avif",
        other => mime_guess::get_mime_extensions_str(other)
            .and_then(|exts| exts.first().copied())
            .unwrap_or("bin"),
    }
}

/// Validate a storage key before it is mapped onto a backend path.
pub fn validate_key(key: &str) -> Result<&str, StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("key is empty".into()));
    }
    if key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(format!("'{key}' is not relative")));
    }
    if key.chars().any(|c| c.is_control()) {
        return Err(StorageError::InvalidKey(format!(
            "'{}' contains control characters",
            key.escape_debug()
        )));
    }
    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(StorageError::InvalidKey(format!(
            "'{key}' contains empty or relative segments"
        )));
    }
    Ok(key)
}
