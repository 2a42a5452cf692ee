use std::path::Path;

use facepamphlet_core::{
    FileError, FriendshipOutcome, FsImageLoader, ImageLoader, LoadReport, PamphletError, Profile,
    ProfileStore,
};
use serde::Serialize;

const NO_SELECTION_MESSAGE: &str =
    "No profile displayed, please lookup or add a profile and try again";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AddProfileOutcome {
    Created { profile: Profile },
    AlreadyExisted { profile: Profile },
}

impl AddProfileOutcome {
    #[must_use]
    pub fn profile(&self) -> &Profile {
        match self {
            Self::Created { profile } | Self::AlreadyExisted { profile } => profile,
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Created { .. } => "New profile created".to_string(),
            Self::AlreadyExisted { profile } => {
                format!("A profile with the name {} already exists", profile.name())
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeleteProfileOutcome {
    Deleted { name: String },
    NotFound { name: String },
}

impl DeleteProfileOutcome {
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Deleted { name } => format!("Profile of {name} deleted"),
            Self::NotFound { name } => format!("A profile with the name {name} does not exist"),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LookupOutcome {
    Found { profile: Profile },
    NotFound { name: String },
}

impl LookupOutcome {
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Found { profile } => format!("Displaying {}", profile.name()),
            Self::NotFound { name } => format!("A profile with the name {name} does not exist"),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StatusOutcome {
    Updated { profile: Profile },
    NoSelection { selected: String },
}

impl StatusOutcome {
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Updated { profile } => format!("Status updated to {}", profile.status()),
            Self::NoSelection { .. } => NO_SELECTION_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PictureOutcome {
    Updated { profile: Profile },
    /// No filename was given.
    Unchanged { profile: Profile },
    NoSelection { selected: String },
}

impl PictureOutcome {
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Updated { .. } => "Picture updated".to_string(),
            Self::Unchanged { .. } => "Picture unchanged".to_string(),
            Self::NoSelection { .. } => NO_SELECTION_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FriendOutcome {
    Added { profile: Profile, friend: String },
    AlreadyFriends { profile: Profile, friend: String },
    FriendNotFound { profile: Profile, friend: String },
    NoSelection { selected: String },
}

impl FriendOutcome {
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Added { friend, .. } => format!("{friend} added as a friend"),
            Self::AlreadyFriends { profile, friend } => {
                format!("{} already has {friend} as a friend", profile.name())
            }
            Self::FriendNotFound { friend, .. } => format!("{friend} does not exist"),
            Self::NoSelection { .. } => NO_SELECTION_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FileOutcome {
    Loaded {
        filename: String,
        report: LoadReport,
    },
    Saved { filename: String },
}

impl FileOutcome {
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Loaded { filename, .. } => format!("Loaded file {filename}"),
            Self::Saved { filename } => format!("Saved file {filename}"),
        }
    }
}

/// Controller-facing operations over one profile network.
///
/// There is no ambient selection: operations that act on "the current
/// profile" take its name as `selected`.
#[derive(Debug, Clone, Default)]
pub struct FacePamphlet<L = FsImageLoader> {
    store: ProfileStore,
    loader: L,
}

impl<L: ImageLoader> FacePamphlet<L> {
    #[must_use]
    pub fn new(loader: L) -> Self {
        Self {
            store: ProfileStore::new(),
            loader,
        }
    }

    #[must_use]
    pub fn from_store(store: ProfileStore, loader: L) -> Self {
        Self { store, loader }
    }

    /// Load the network persisted at `data_path`, or start empty when the
    /// file does not exist yet.
    ///
    /// # Errors
    /// Returns [`FileError`] when an existing file cannot be read or parsed.
    pub fn open(data_path: &Path, loader: L) -> Result<Self, FileError> {
        let mut pamphlet = Self::new(loader);
        if data_path.exists() {
            pamphlet.store.read_data_file(data_path, &pamphlet.loader)?;
        } else {
            tracing::debug!(path = %data_path.display(), "no network file yet; starting empty");
        }
        Ok(pamphlet)
    }

    /// # Errors
    /// Returns [`FileError`] when the network cannot be written to `data_path`.
    pub fn persist(&self, data_path: &Path) -> Result<(), FileError> {
        self.store.save_data_file(data_path)
    }

    #[must_use]
    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    /// Create a profile named `name`, or return the existing one untouched.
    ///
    /// # Errors
    /// Returns [`PamphletError::InvalidArgument`] when `name` is blank.
    pub fn add_profile(&mut self, name: &str) -> Result<AddProfileOutcome, PamphletError> {
        if let Some(existing) = self.store.get_profile(name) {
            return Ok(AddProfileOutcome::AlreadyExisted {
                profile: existing.clone(),
            });
        }

        let profile = Profile::new(name)?;
        self.store.add_profile(profile.clone());
        Ok(AddProfileOutcome::Created { profile })
    }

    pub fn delete_profile(&mut self, name: &str) -> DeleteProfileOutcome {
        if !self.store.contains_profile(name) {
            return DeleteProfileOutcome::NotFound {
                name: name.to_string(),
            };
        }
        self.store.delete_profile(name);
        DeleteProfileOutcome::Deleted {
            name: name.to_string(),
        }
    }

    #[must_use]
    pub fn lookup_profile(&self, name: &str) -> LookupOutcome {
        match self.store.get_profile(name) {
            Some(profile) => LookupOutcome::Found {
                profile: profile.clone(),
            },
            None => LookupOutcome::NotFound {
                name: name.to_string(),
            },
        }
    }

    pub fn list_profiles(&self) -> impl Iterator<Item = &Profile> {
        self.store.profiles()
    }

    pub fn change_status(&mut self, selected: &str, status: &str) -> StatusOutcome {
        let Some(profile) = self.store.get_profile_mut(selected) else {
            return StatusOutcome::NoSelection {
                selected: selected.to_string(),
            };
        };
        profile.set_status(status);
        StatusOutcome::Updated {
            profile: profile.clone(),
        }
    }

    /// Load `filename` as the selected profile's picture.
    ///
    /// The image handle and its filename are always set together. An empty
    /// filename leaves the profile unchanged.
    ///
    /// # Errors
    /// Returns [`PamphletError::ImageLoad`] when the image cannot be loaded;
    /// the profile keeps its previous picture.
    pub fn change_picture(
        &mut self,
        selected: &str,
        filename: &str,
    ) -> Result<PictureOutcome, PamphletError> {
        let Some(profile) = self.store.get_profile_mut(selected) else {
            return Ok(PictureOutcome::NoSelection {
                selected: selected.to_string(),
            });
        };
        if filename.is_empty() {
            return Ok(PictureOutcome::Unchanged {
                profile: profile.clone(),
            });
        }

        let image = self.loader.load_image(filename)?;
        profile.set_image(image);
        profile.set_image_path(filename);
        Ok(PictureOutcome::Updated {
            profile: profile.clone(),
        })
    }

    pub fn add_friend(&mut self, selected: &str, friend: &str) -> FriendOutcome {
        let outcome = self.store.establish_friendship(selected, friend);
        let Some(profile) = self.store.get_profile(selected).cloned() else {
            return FriendOutcome::NoSelection {
                selected: selected.to_string(),
            };
        };

        let friend = friend.to_string();
        match outcome {
            FriendshipOutcome::Added => FriendOutcome::Added { profile, friend },
            FriendshipOutcome::AlreadyFriends => FriendOutcome::AlreadyFriends { profile, friend },
            FriendshipOutcome::MissingProfile { .. } => {
                FriendOutcome::FriendNotFound { profile, friend }
            }
        }
    }

    /// Replace the whole network with the contents of `path`.
    ///
    /// # Errors
    /// Returns [`FileError`] when the file cannot be read or parsed; the
    /// current network is kept.
    pub fn load_file(&mut self, path: &Path) -> Result<FileOutcome, FileError> {
        let report = self.store.read_data_file(path, &self.loader)?;
        Ok(FileOutcome::Loaded {
            filename: path.display().to_string(),
            report,
        })
    }

    /// # Errors
    /// Returns [`FileError`] when the file cannot be written.
    pub fn save_file(&self, path: &Path) -> Result<FileOutcome, FileError> {
        self.store.save_data_file(path)?;
        Ok(FileOutcome::Saved {
            filename: path.display().to_string(),
        })
    }
}
