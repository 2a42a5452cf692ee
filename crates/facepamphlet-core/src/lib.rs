//! Profile records, the name-keyed profile store, and the flat text format
//! used to persist a network of profiles.

use std::fmt::{Display, Formatter};

mod codec;
mod image;
mod profile;
mod store;

pub use codec::{decode_from_reader, encode_to_writer, CodecError, ImageWarning, LoadReport};
pub use image::{FsImageLoader, ImageFormat, ImageHandle, ImageLoadError, ImageLoader};
pub use profile::Profile;
pub use store::{FriendshipOutcome, ProfileStore};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum FileOperation {
    Load,
    Save,
}

impl FileOperation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Save => "save",
        }
    }
}

impl Display for FileOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A network file could not be read or written.
#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
#[error("{operation} failed for {filename}: {detail}")]
pub struct FileError {
    pub operation: FileOperation,
    pub filename: String,
    pub detail: String,
}

impl FileError {
    #[must_use]
    pub fn new(
        operation: FileOperation,
        filename: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            filename: filename.into(),
            detail: detail.into(),
        }
    }

    /// Text shown to the user when the operation fails.
    #[must_use]
    pub fn message(&self) -> String {
        match self.operation {
            FileOperation::Load => format!("Unable to open file {}", self.filename),
            FileOperation::Save => format!("Unable to save file {}", self.filename),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum PamphletError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    ImageLoad(#[from] ImageLoadError),
}
