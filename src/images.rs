//! Uploaded image intake: extension allow-list, MIME mapping and base64 storage.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

/// Image formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageKind {
    /// Look up a file extension (without the dot), case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ImageKind::Png),
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "gif" => Some(ImageKind::Gif),
            "webp" => Some(ImageKind::Webp),
            _ => None,
        }
    }

    /// Determine the kind from an uploaded file name.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Gif => "image/gif",
            ImageKind::Webp => "image/webp",
        }
    }
}

/// An image as persisted: base64 payload plus MIME type, both as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    pub data: String,
    pub mime_type: String,
}

impl StoredImage {
    /// Build from the two nullable image columns of a row.
    pub fn from_columns(data: Option<String>, mime_type: Option<String>) -> Option<Self> {
        match (data, mime_type) {
            (Some(data), Some(mime_type)) if !data.is_empty() => Some(Self { data, mime_type }),
            _ => None,
        }
    }

    /// Encode an upload if its file name is allow-listed and it has content.
    pub fn from_upload(filename: &str, bytes: &[u8]) -> Option<Self> {
        let kind = ImageKind::from_filename(filename)?;
        if bytes.is_empty() {
            return None;
        }
        Some(Self {
            data: BASE64.encode(bytes),
            mime_type: kind.mime_type().to_string(),
        })
    }

    /// `data:` URI for use in an `<img src>` attribute.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}
