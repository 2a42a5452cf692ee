use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Serialize;

use crate::codec::{decode_from_reader, encode_to_writer, LoadReport};
use crate::{FileError, FileOperation, ImageLoader, Profile};

#[derive(Debug, Clone, Serialize, Eq, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FriendshipOutcome {
    /// Both profiles now list each other.
    Added,
    /// The first profile already listed the second; nothing changed.
    AlreadyFriends,
    /// The named profile is not in the store; nothing changed.
    MissingProfile { name: String },
}

/// Name-keyed collection of profiles.
///
/// Names are case-sensitive. Iteration and serialization follow ascending
/// name order.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ProfileStore {
    profiles: BTreeMap<String, Profile>,
}

impl ProfileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `profile`, entirely replacing any profile with the same name.
    ///
    /// Returns the replaced profile.
    pub fn add_profile(&mut self, profile: Profile) -> Option<Profile> {
        let name = profile.name().to_string();
        let replaced = self.profiles.insert(name, profile);
        tracing::debug!(replaced = replaced.is_some(), "added profile");
        replaced
    }

    #[must_use]
    pub fn get_profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn get_profile_mut(&mut self, name: &str) -> Option<&mut Profile> {
        self.profiles.get_mut(name)
    }

    #[must_use]
    pub fn contains_profile(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    /// Remove `name` from the store and from every remaining friend list.
    ///
    /// The friend-list cleanup runs even when `name` was not a stored profile.
    pub fn delete_profile(&mut self, name: &str) -> Option<Profile> {
        let removed = self.profiles.remove(name);
        let mut cleaned = 0_usize;
        for profile in self.profiles.values_mut() {
            if profile.remove_friend(name) {
                cleaned += 1;
            }
        }
        tracing::debug!(name, removed = removed.is_some(), cleaned, "deleted profile");
        removed
    }

    /// Make `name` and `friend` friends of each other.
    ///
    /// `friend` is added to `name`'s list; only when that was a new entry is
    /// `name` added to `friend`'s list. Nothing is mutated when either
    /// profile is missing. A profile may befriend itself, in which case its
    /// own name appears once in its list.
    pub fn establish_friendship(&mut self, name: &str, friend: &str) -> FriendshipOutcome {
        for required in [name, friend] {
            if !self.profiles.contains_key(required) {
                return FriendshipOutcome::MissingProfile {
                    name: required.to_string(),
                };
            }
        }

        let Some(profile) = self.profiles.get_mut(name) else {
            return FriendshipOutcome::MissingProfile {
                name: name.to_string(),
            };
        };
        if !profile.add_friend(friend) {
            return FriendshipOutcome::AlreadyFriends;
        }
        if let Some(other) = self.profiles.get_mut(friend) {
            other.add_friend(name);
        }

        tracing::debug!(name, friend, "established friendship");
        FriendshipOutcome::Added
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn clear(&mut self) {
        self.profiles.clear();
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn profiles(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.values()
    }

    /// Write every profile to `path` in the network file format.
    ///
    /// # Errors
    /// Returns [`FileError`] when the file cannot be created or written.
    pub fn save_data_file(&self, path: &Path) -> Result<(), FileError> {
        let filename = path.display().to_string();
        let file = File::create(path)
            .map_err(|err| FileError::new(FileOperation::Save, &filename, err.to_string()))?;
        encode_to_writer(self, file)
            .map_err(|err| FileError::new(FileOperation::Save, &filename, err.to_string()))?;

        tracing::info!(filename = %filename, profiles = self.len(), "saved network file");
        Ok(())
    }

    /// Replace the contents of the store with the network read from `path`.
    ///
    /// The file is parsed completely before anything is replaced, so on error
    /// the store is left as it was. Images that fail to load are reported in
    /// the returned [`LoadReport`] and do not fail the load.
    ///
    /// # Errors
    /// Returns [`FileError`] when the file cannot be opened, read, or parsed.
    pub fn read_data_file<L>(&mut self, path: &Path, loader: &L) -> Result<LoadReport, FileError>
    where
        L: ImageLoader + ?Sized,
    {
        let filename = path.display().to_string();
        let file = File::open(path)
            .map_err(|err| FileError::new(FileOperation::Load, &filename, err.to_string()))?;
        let (loaded, report) = decode_from_reader(BufReader::new(file), loader)
            .map_err(|err| FileError::new(FileOperation::Load, &filename, err.to_string()))?;

        *self = loaded;
        tracing::info!(
            filename = %filename,
            profiles = report.profiles,
            image_warnings = report.image_warnings.len(),
            "loaded network file"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use proptest::prelude::*;

    use super::*;
    use crate::{ImageFormat, ImageHandle, ImageLoadError};

    struct AcceptAll;

    impl ImageLoader for AcceptAll {
        fn load_image(&self, filename: &str) -> Result<ImageHandle, ImageLoadError> {
            Ok(ImageHandle::new(filename, ImageFormat::Png, filename.as_bytes()))
        }
    }

    fn unique_temp_path(prefix: &str) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_else(|err| panic!("clock should be >= UNIX_EPOCH: {err}"))
            .as_nanos();
        std::env::temp_dir().join(format!("{prefix}-{now}.txt"))
    }

    fn profile(name: &str) -> Profile {
        Profile::new(name).unwrap_or_else(|err| panic!("fixture profile {name}: {err}"))
    }

    fn store_with(names: &[&str]) -> ProfileStore {
        let mut store = ProfileStore::new();
        for name in names {
            store.add_profile(profile(name));
        }
        store
    }

    fn friends_of<'a>(store: &'a ProfileStore, name: &str) -> &'a [String] {
        match store.get_profile(name) {
            Some(profile) => profile.friends(),
            None => panic!("profile {name} should exist"),
        }
    }

    #[test]
    fn friendship_requires_both_profiles() {
        let mut store = store_with(&["Alice"]);

        assert_eq!(
            store.establish_friendship("Alice", "Bob"),
            FriendshipOutcome::MissingProfile {
                name: "Bob".to_string(),
            }
        );
        assert!(friends_of(&store, "Alice").is_empty());

        store.add_profile(profile("Bob"));
        assert_eq!(store.establish_friendship("Alice", "Bob"), FriendshipOutcome::Added);
        assert_eq!(friends_of(&store, "Alice"), ["Bob".to_string()]);
        assert_eq!(friends_of(&store, "Bob"), ["Alice".to_string()]);
    }

    #[test]
    fn missing_selected_profile_is_reported_before_friend() {
        let mut store = store_with(&["Bob"]);
        assert_eq!(
            store.establish_friendship("Alice", "Bob"),
            FriendshipOutcome::MissingProfile {
                name: "Alice".to_string(),
            }
        );
        assert!(friends_of(&store, "Bob").is_empty());
    }

    #[test]
    fn repeated_friendship_is_idempotent() {
        let mut store = store_with(&["Alice", "Bob"]);
        assert_eq!(store.establish_friendship("Alice", "Bob"), FriendshipOutcome::Added);
        assert_eq!(store.establish_friendship("Alice", "Bob"), FriendshipOutcome::AlreadyFriends);
        assert_eq!(store.establish_friendship("Bob", "Alice"), FriendshipOutcome::AlreadyFriends);

        assert_eq!(friends_of(&store, "Alice"), ["Bob".to_string()]);
        assert_eq!(friends_of(&store, "Bob"), ["Alice".to_string()]);
    }

    #[test]
    fn no_reciprocation_when_first_side_already_listed() {
        let mut store = store_with(&["Alice", "Bob"]);
        if let Some(alice) = store.get_profile_mut("Alice") {
            alice.add_friend("Bob");
        }

        assert_eq!(store.establish_friendship("Alice", "Bob"), FriendshipOutcome::AlreadyFriends);
        assert!(friends_of(&store, "Bob").is_empty());
    }

    #[test]
    fn self_friendship_lists_the_name_once() {
        let mut store = store_with(&["Alice"]);
        assert_eq!(store.establish_friendship("Alice", "Alice"), FriendshipOutcome::Added);
        assert_eq!(friends_of(&store, "Alice"), ["Alice".to_string()]);
    }

    #[test]
    fn delete_removes_name_from_every_friend_list() {
        let mut store = store_with(&["Alice", "Bob", "Carol"]);
        store.establish_friendship("Bob", "Alice");
        store.establish_friendship("Carol", "Alice");
        store.establish_friendship("Bob", "Carol");

        let removed = store.delete_profile("Alice");
        assert_eq!(removed.map(|profile| profile.name().to_string()), Some("Alice".to_string()));
        assert!(!store.contains_profile("Alice"));
        assert_eq!(friends_of(&store, "Bob"), ["Carol".to_string()]);
        assert_eq!(friends_of(&store, "Carol"), ["Bob".to_string()]);
    }

    #[test]
    fn delete_of_unknown_name_still_cleans_dangling_references() {
        let mut store = store_with(&["Bob"]);
        if let Some(bob) = store.get_profile_mut("Bob") {
            bob.add_friend("Ghost");
            bob.add_friend("Carol");
        }

        assert!(store.delete_profile("Ghost").is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(friends_of(&store, "Bob"), ["Carol".to_string()]);
    }

    #[test]
    fn names_are_case_sensitive() {
        let store = store_with(&["Alice", "alice"]);
        assert_eq!(store.len(), 2);
        assert!(store.contains_profile("Alice"));
        assert!(store.contains_profile("alice"));
        assert!(!store.contains_profile("ALICE"));
        assert!(store.get_profile("ALICE").is_none());
    }

    #[test]
    fn add_profile_replaces_without_merging() {
        let mut store = ProfileStore::new();
        let mut first = profile("Alice");
        first.set_status("first");
        first.add_friend("Bob");
        let mut second = profile("Alice");
        second.set_status("second");

        assert!(store.add_profile(first.clone()).is_none());
        assert_eq!(store.add_profile(second.clone()), Some(first));
        assert_eq!(store.get_profile("Alice"), Some(&second));
        assert!(friends_of(&store, "Alice").is_empty());
    }

    #[test]
    fn names_iterate_in_ascending_order() {
        let mut store = store_with(&["carol", "Bob", "alice"]);
        assert_eq!(store.names().collect::<Vec<_>>(), vec!["Bob", "alice", "carol"]);

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn save_then_read_round_trips_through_a_file() {
        let path = unique_temp_path("fp-store-round-trip");
        let mut store = store_with(&["Alice", "Bob", "Carol"]);
        store.establish_friendship("Alice", "Bob");
        store.establish_friendship("Alice", "Carol");
        if let Some(alice) = store.get_profile_mut("Alice") {
            alice.set_status("coding");
            alice.set_image(ImageHandle::new("alice.png", ImageFormat::Png, b"alice.png"));
            alice.set_image_path("alice.png");
        }

        if let Err(err) = store.save_data_file(&path) {
            panic!("save should succeed: {err}");
        }
        let mut reloaded = ProfileStore::new();
        let report = match reloaded.read_data_file(&path, &AcceptAll) {
            Ok(report) => report,
            Err(err) => panic!("load should succeed: {err}"),
        };

        assert_eq!(report.profiles, 3);
        assert!(report.image_warnings.is_empty());
        assert_eq!(reloaded, store);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn failed_read_leaves_store_unchanged() {
        let path = unique_temp_path("fp-store-truncated");
        fs::write(&path, "2\nAlice\n\n\n\nBob\n")
            .unwrap_or_else(|err| panic!("failed to write {}: {err}", path.display()));

        let mut store = store_with(&["Zed"]);
        let before = store.clone();
        match store.read_data_file(&path, &AcceptAll) {
            Err(err) => {
                assert_eq!(err.operation, FileOperation::Load);
                assert_eq!(err.filename, path.display().to_string());
            }
            Ok(report) => panic!("truncated file should fail, got {report:?}"),
        }
        assert_eq!(store, before);

        let missing = unique_temp_path("fp-store-missing");
        match store.read_data_file(&missing, &AcceptAll) {
            Err(err) => assert_eq!(err.message(), format!("Unable to open file {}", missing.display())),
            Ok(report) => panic!("missing file should fail, got {report:?}"),
        }
        assert_eq!(store, before);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn save_into_missing_directory_is_a_file_error() {
        let dir = unique_temp_path("fp-store-no-such-dir");
        let path = dir.join("network.txt");
        let store = store_with(&["Alice"]);

        match store.save_data_file(&path) {
            Err(err) => {
                assert_eq!(err.operation, FileOperation::Save);
                assert_eq!(err.message(), format!("Unable to save file {}", path.display()));
            }
            Ok(()) => panic!("save into a missing directory should fail"),
        }
    }

    proptest! {
        #[test]
        fn property_friendships_stay_symmetric_under_adds_and_deletes(
            ops in proptest::collection::vec((0_usize..5, 0_usize..5, any::<bool>()), 0..60)
        ) {
            let names = ["a", "b", "c", "d", "e"];
            let mut store = store_with(&names);
            for (left, right, delete) in ops {
                if delete {
                    store.delete_profile(names[left]);
                    store.add_profile(profile(names[left]));
                } else if left != right {
                    store.establish_friendship(names[left], names[right]);
                }
            }

            for profile in store.profiles() {
                for friend in profile.friends() {
                    let Some(other) = store.get_profile(friend) else {
                        return Err(TestCaseError::fail(format!("dangling friend {friend}")));
                    };
                    prop_assert!(other.has_friend(profile.name()));
                }
            }
        }
    }
}
