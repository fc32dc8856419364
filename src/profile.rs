use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File, create_dir_all};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};
use thiserror::Error;

const PROFILES_FILE: &str = "profiles.json";

/// Membership tier of a profile
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Membership {
    #[default]
    Free,
    Pro,
}

/// User profile row
///
/// Keyed by the identity provider's user id. Timestamps are UTC and
/// serialize as RFC 3339 strings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: String,
    #[serde(default)]
    pub membership: Membership,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(user_id: &str) -> Self {
        let now = Utc::now();
        Profile {
            user_id: user_id.to_string(),
            membership: Membership::Free,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a profile; absent fields are left alone
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    pub membership: Option<Membership>,
}

impl ProfileUpdate {
    fn apply(self, profile: &mut Profile) {
        if let Some(membership) = self.membership {
            profile.membership = membership;
        }
        profile.updated_at = Utc::now();
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("profile store io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("profile store holds malformed data: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("profile for '{0}' already exists")]
    Duplicate(String),
}

/// Persistence interface for profiles
///
/// Implementations must be shareable across request handlers.
pub trait ProfileRepository: Send + Sync {
    fn get_profile_by_user_id(&self, user_id: &str) -> Result<Option<Profile>, StoreError>;

    /// Inserts a fresh `free` profile. Fails with [`StoreError::Duplicate`]
    /// when the user already has one.
    fn create_profile(&self, user_id: &str) -> Result<Profile, StoreError>;

    /// Applies `update` and bumps `updated_at`; `None` when there is no such profile.
    fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<Option<Profile>, StoreError>;

    /// Removes the profile; removing a missing profile is not an error.
    fn delete_profile(&self, user_id: &str) -> Result<(), StoreError>;
}

/// Profiles kept in a single pretty-printed JSON file
///
/// Every operation reads the file, and every mutation rewrites it, under one
/// process-wide lock.
pub struct JsonProfileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonProfileStore {
    /// Opens the store inside `dir`, creating the directory and an empty
    /// `profiles.json` when they do not exist yet.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        if !dir.exists() {
            create_dir_all(dir)?;
        }
        let path = dir.join(PROFILES_FILE);
        if !path.exists() {
            let mut file = File::create(&path)?;
            file.write_all(b"{}")?;
            info!("created profile store at {}", path.display());
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, Profile>, StoreError> {
        let mut contents = String::new();
        File::open(&self.path)?.read_to_string(&mut contents)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, profiles: &BTreeMap<String, Profile>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(profiles)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl ProfileRepository for JsonProfileStore {
    fn get_profile_by_user_id(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.remove(user_id))
    }

    fn create_profile(&self, user_id: &str) -> Result<Profile, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut profiles = self.load()?;
        if profiles.contains_key(user_id) {
            return Err(StoreError::Duplicate(user_id.to_string()));
        }
        let profile = Profile::new(user_id);
        profiles.insert(user_id.to_string(), profile.clone());
        self.save(&profiles)?;
        Ok(profile)
    }

    fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<Option<Profile>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut profiles = self.load()?;
        let Some(profile) = profiles.get_mut(user_id) else {
            return Ok(None);
        };
        update.apply(profile);
        let updated = profile.clone();
        self.save(&profiles)?;
        Ok(Some(updated))
    }

    fn delete_profile(&self, user_id: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut profiles = self.load()?;
        if profiles.remove(user_id).is_some() {
            self.save(&profiles)?;
        }
        Ok(())
    }
}

/// In-process store, used by tests and when no database directory is wanted
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<String, Profile>>,
}

impl ProfileRepository for MemoryProfileStore {
    fn get_profile_by_user_id(&self, user_id: &str) -> Result<Option<Profile>, StoreError> {
        let profiles = self.profiles.read().unwrap_or_else(PoisonError::into_inner);
        Ok(profiles.get(user_id).cloned())
    }

    fn create_profile(&self, user_id: &str) -> Result<Profile, StoreError> {
        let mut profiles = self.profiles.write().unwrap_or_else(PoisonError::into_inner);
        if profiles.contains_key(user_id) {
            return Err(StoreError::Duplicate(user_id.to_string()));
        }
        let profile = Profile::new(user_id);
        profiles.insert(user_id.to_string(), profile.clone());
        Ok(profile)
    }

    fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<Option<Profile>, StoreError> {
        let mut profiles = self.profiles.write().unwrap_or_else(PoisonError::into_inner);
        Ok(profiles.get_mut(user_id).map(|profile| {
            update.apply(profile);
            profile.clone()
        }))
    }

    fn delete_profile(&self, user_id: &str) -> Result<(), StoreError> {
        let mut profiles = self.profiles.write().unwrap_or_else(PoisonError::into_inner);
        profiles.remove(user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lifecycle(store: &dyn ProfileRepository) {
        assert!(store.get_profile_by_user_id("user_1").unwrap().is_none());

        let created = store.create_profile("user_1").unwrap();
        assert_eq!(created.membership, Membership::Free);
        assert_eq!(created.created_at, created.updated_at);
        assert!(matches!(
            store.create_profile("user_1"),
            Err(StoreError::Duplicate(id)) if id == "user_1"
        ));

        let fetched = store.get_profile_by_user_id("user_1").unwrap().unwrap();
        assert_eq!(fetched, created);

        let updated = store
            .update_profile(
                "user_1",
                ProfileUpdate {
                    membership: Some(Membership::Pro),
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.membership, Membership::Pro);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);

        assert!(
            store
                .update_profile("nobody", ProfileUpdate::default())
                .unwrap()
                .is_none()
        );

        store.delete_profile("user_1").unwrap();
        store.delete_profile("user_1").unwrap();
        assert!(store.get_profile_by_user_id("user_1").unwrap().is_none());
    }

    #[test]
    fn memory_store_lifecycle() {
        lifecycle(&MemoryProfileStore::default());
    }

    #[test]
    fn json_store_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        lifecycle(&JsonProfileStore::open(dir.path().join("db")).unwrap());
    }

    #[test]
    fn json_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let created = JsonProfileStore::open(dir.path())
            .unwrap()
            .create_profile("user_2")
            .unwrap();

        let reopened = JsonProfileStore::open(dir.path()).unwrap();
        assert_eq!(
            reopened.get_profile_by_user_id("user_2").unwrap(),
            Some(created)
        );

        let raw = fs::read_to_string(reopened.path()).unwrap();
        assert!(raw.contains("\"userId\": \"user_2\""));
        assert!(raw.contains("\"membership\": \"free\""));
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonProfileStore::open(dir.path()).unwrap();
        fs::write(store.path(), "not json").unwrap();
        assert!(matches!(
            store.get_profile_by_user_id("x"),
            Err(StoreError::Malformed(_))
        ));
    }
}
