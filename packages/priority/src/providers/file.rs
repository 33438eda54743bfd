//! Decoder for local files and in-memory image bytes.

use crate::PriorityError;
use crate::vision::{DecodedImage, ImageDecoder, ImageFormat, ImageRef};

/// Reads image bytes from disk (plain paths and `file://` URIs) or from
/// memory and checks the container signature.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileImageDecoder;

impl FileImageDecoder {
    /// Creates a new decoder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl ImageDecoder for FileImageDecoder {
    async fn decode(&self, image: &ImageRef) -> Result<DecodedImage, PriorityError> {
        let data = match image {
            ImageRef::Bytes(bytes) => bytes.clone(),
            ImageRef::Path(path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|e| PriorityError::Decode {
                        message: format!("Failed to read {}: {e}", path.display()),
                    })?
            }
            ImageRef::Uri(uri) => {
                let Some(path) = uri.strip_prefix("file://") else {
                    return Err(PriorityError::Decode {
                        message: format!("Unsupported image URI: {uri}"),
                    });
                };
                tokio::fs::read(path)
                    .await
                    .map_err(|e| PriorityError::Decode {
                        message: format!("Failed to read {path}: {e}"),
                    })?
            }
        };

        let format = detect_format(&data).ok_or_else(|| PriorityError::Decode {
            message: format!("Unrecognized image data ({} bytes)", data.len()),
        })?;

        Ok(DecodedImage { format, data })
    }
}

/// Detects the container format from the leading magic bytes.
#[must_use]
pub fn detect_format(data: &[u8]) -> Option<ImageFormat> {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some(ImageFormat::Png)
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(ImageFormat::Jpeg)
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some(ImageFormat::Gif)
    } else if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        Some(ImageFormat::WebP)
    } else {
        None
    }
}
