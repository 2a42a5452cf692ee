use std::fs;

use serde::Serialize;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, Serialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    Gif,
    Jpeg,
    Png,
    Bmp,
}

impl ImageFormat {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gif => "gif",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Bmp => "bmp",
        }
    }

    /// Identify the format from the leading magic bytes of an image file.
    #[must_use]
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

        if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(PNG_MAGIC) {
            Some(Self::Png)
        } else if bytes.starts_with(b"BM") {
            Some(Self::Bmp)
        } else {
            None
        }
    }
}

/// Opaque reference to an image that was successfully loaded.
#[derive(Debug, Clone, Serialize, Eq, PartialEq)]
pub struct ImageHandle {
    source: String,
    format: ImageFormat,
    byte_len: usize,
    sha256: String,
}

impl ImageHandle {
    #[must_use]
    pub fn new(source: impl Into<String>, format: ImageFormat, bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self {
            source: source.into(),
            format,
            byte_len: bytes.len(),
            sha256: format!("{:x}", hasher.finalize()),
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    #[must_use]
    pub fn sha256(&self) -> &str {
        &self.sha256
    }
}

#[derive(Debug, Clone, thiserror::Error, Serialize, Eq, PartialEq)]
#[error("unable to open image file {filename}: {reason}")]
pub struct ImageLoadError {
    pub filename: String,
    pub reason: String,
}

impl ImageLoadError {
    #[must_use]
    pub fn new(filename: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        format!("Unable to open image file: {}", self.filename)
    }
}

/// Turns an image filename into a loaded [`ImageHandle`].
pub trait ImageLoader {
    /// # Errors
    /// Returns [`ImageLoadError`] when the file is missing, unreadable, or not an image.
    fn load_image(&self, filename: &str) -> Result<ImageHandle, ImageLoadError>;
}

/// Loads images from the local filesystem, relative paths resolving against
/// the working directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsImageLoader;

impl ImageLoader for FsImageLoader {
    fn load_image(&self, filename: &str) -> Result<ImageHandle, ImageLoadError> {
        if filename.trim().is_empty() {
            return Err(ImageLoadError::new(filename, "image filename MUST be non-empty"));
        }

        let bytes = fs::read(filename)
            .map_err(|err| ImageLoadError::new(filename, err.to_string()))?;
        let format = ImageFormat::sniff(&bytes)
            .ok_or_else(|| ImageLoadError::new(filename, "unrecognized image format"))?;

        tracing::debug!(filename, format = format.as_str(), bytes = bytes.len(), "loaded image");
        Ok(ImageHandle::new(filename, format, &bytes))
    }
}
