//! Image codec: local image resources to transport-safe base64 text.
//!
//! - `ImageResource::from_path` reads a file from disk (the only fallible step).
//! - `encode` produces pure base64 payload, never a data URL.
//! - `strip_data_url_prefix` / `to_data_url` convert between the two forms.
//! - `sniff_mime` guesses the image type from magic bytes.
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::error::{AppError, AppResult};

/// Used whenever the bytes do not match a known signature.
pub const DEFAULT_MIME: &str = "image/jpeg";

/// A binary image held in memory, with the name and type it was selected under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageResource {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageResource {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let mime = sniff_mime(&bytes).to_string();
        ImageResource { name: name.into(), mime, bytes }
    }

    /// Read an image from disk. Any I/O failure becomes `AppError::Read`.
    pub async fn from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|source| AppError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self::from_bytes(name, bytes))
    }
}

/// Base64 of the resource bytes, without any `data:` prefix.
pub fn encode(resource: &ImageResource) -> String {
    BASE64.encode(&resource.bytes)
}

/// Read a file and encode it in one step.
pub async fn encode_file(path: impl AsRef<Path>) -> AppResult<String> {
    let resource = ImageResource::from_path(path).await?;
    Ok(encode(&resource))
}

/// Drop a leading `data:<mime>;base64,` header if present.
pub fn strip_data_url_prefix(text: &str) -> &str {
    if text.starts_with("data:") {
        if let Some((_, payload)) = text.split_once(',') {
            return payload;
        }
    }
    text
}

/// Wrap pure base64 payload as an inline data URL, sniffing the type from the payload.
pub fn to_data_url(encoded: &str) -> String {
    let payload = strip_data_url_prefix(encoded);
    format!("data:{};base64,{}", sniff_mime_base64(payload), payload)
}

pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        "image/png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        "image/gif"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        DEFAULT_MIME
    }
}

/// Same as `sniff_mime`, decoding only the first few bytes of a base64 payload.
fn sniff_mime_base64(payload: &str) -> &'static str {
    // 16 chars decode to 12 bytes, enough for every signature above.
    let head: String = payload.chars().take(16).collect();
    match BASE64.decode(head.as_bytes()) {
        Ok(bytes) => sniff_mime(&bytes),
        Err(_) => DEFAULT_MIME,
    }
}
