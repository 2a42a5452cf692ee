use serde::Serialize;

use crate::{ImageHandle, PamphletError};

/// One member of the network.
///
/// The image handle and the image path are independent fields: setting one
/// never updates the other.
#[derive(Debug, Clone, Serialize, Eq, PartialEq)]
pub struct Profile {
    name: String,
    status: String,
    image_path: String,
    image: Option<ImageHandle>,
    friends: Vec<String>,
}

impl Profile {
    /// Create a profile with no status, no image and no friends.
    ///
    /// # Errors
    /// Returns [`PamphletError::InvalidArgument`] when `name` is empty, only
    /// whitespace, or contains a line break.
    pub fn new(name: impl Into<String>) -> Result<Self, PamphletError> {
        let name = name.into();
        if !is_storable_name(&name) {
            return Err(PamphletError::InvalidArgument(
                "profile name MUST be non-blank and free of line breaks".to_string(),
            ));
        }

        Ok(Self {
            name,
            status: String::new(),
            image_path: String::new(),
            image: None,
            friends: Vec::new(),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Empty when no status has been set.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    #[must_use]
    pub fn image(&self) -> Option<&ImageHandle> {
        self.image.as_ref()
    }

    pub fn set_image(&mut self, image: ImageHandle) {
        self.image = Some(image);
    }

    pub fn clear_image(&mut self) {
        self.image = None;
    }

    /// Filename last used to set the image, empty if none.
    #[must_use]
    pub fn image_path(&self) -> &str {
        &self.image_path
    }

    pub fn set_image_path(&mut self, path: impl Into<String>) {
        self.image_path = path.into();
    }

    /// Append `name` to the friend list.
    ///
    /// Returns `false` and leaves the list untouched when `name` is already a
    /// friend or could not be a profile name.
    pub fn add_friend(&mut self, name: &str) -> bool {
        if !is_storable_name(name) || self.has_friend(name) {
            return false;
        }
        self.friends.push(name.to_string());
        true
    }

    /// Returns `true` when `name` was present and has been removed.
    pub fn remove_friend(&mut self, name: &str) -> bool {
        match self.friends.iter().position(|friend| friend == name) {
            Some(index) => {
                self.friends.remove(index);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn has_friend(&self, name: &str) -> bool {
        self.friends.iter().any(|friend| friend == name)
    }

    /// Friend names in the order they were added.
    #[must_use]
    pub fn friends(&self) -> &[String] {
        &self.friends
    }
}

/// Names are written one per line in network files, and an empty line ends
/// a friend block.
fn is_storable_name(name: &str) -> bool {
    !name.trim().is_empty() && !name.contains(['\n', '\r'])
}
