//! Shell Profile Store
//!
//! Named shell launch configurations with JSON persistence. Built-in
//! profiles are re-derived from the shell catalog on every load and
//! merged by executable path; they can never be updated or deleted.
//! All mutating operations are serialized by one async lock spanning
//! read-modify-persist, and every mutation emits a change notification.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::events::{EventEmitter, ProfileChangeKind, ProfilesChanged, SubscriptionId};
use crate::models::{ShellKind, ShellProfile};
use crate::shells::ShellCatalog;

/// File name of the persisted profile list
const PROFILES_FILE: &str = "profiles.json";

struct StoreState {
    loaded: bool,
    profiles: Vec<ShellProfile>,
    /// Externally selected default (mirrors the host's app settings)
    preferred_default_id: Option<String>,
}

/// JSON-persisted store of shell launch profiles
pub struct ProfileStore {
    catalog: Arc<ShellCatalog>,
    storage_path: PathBuf,
    state: Mutex<StoreState>,
    events: EventEmitter<ProfilesChanged>,
}

impl ProfileStore {
    /// Create a store persisting to the platform data directory
    pub fn new(catalog: Arc<ShellCatalog>) -> Result<Self> {
        let base = dirs::data_dir()
            .ok_or_else(|| Error::Other("could not determine data directory".to_string()))?;
        Ok(Self::with_path(
            catalog,
            base.join("termbridge").join(PROFILES_FILE),
        ))
    }

    /// Create a store persisting to a specific file (used by tests)
    pub fn with_path(catalog: Arc<ShellCatalog>, storage_path: PathBuf) -> Self {
        Self {
            catalog,
            storage_path,
            state: Mutex::new(StoreState {
                loaded: false,
                profiles: Vec::new(),
                preferred_default_id: None,
            }),
            events: EventEmitter::new(),
        }
    }

    /// Subscribe to profile change notifications
    pub fn on_change<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ProfilesChanged) + Send + Sync + 'static,
    {
        self.events.subscribe(callback)
    }

    /// Remove a change subscription
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Record the host's explicitly selected default profile id.
    ///
    /// Takes precedence over the `is_default` flag when resolving
    /// `get_default`; persistence of the selection belongs to the host's
    /// settings store.
    pub async fn set_preferred_default(&self, profile_id: Option<String>) {
        let mut state = self.state.lock().await;
        state.preferred_default_id = profile_id;
    }

    /// All profiles, ordered by sort order then name
    pub async fn list(&self) -> Result<Vec<ShellProfile>> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;
        let mut profiles = state.profiles.clone();
        profiles.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(profiles)
    }

    /// Profiles fit to show in a picker.
    ///
    /// Filters out built-ins whose executable has disappeared since
    /// detection; user-defined profiles are always listed.
    pub async fn list_visible(&self) -> Result<Vec<ShellProfile>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|p| !p.is_built_in || p.shell_path.exists())
            .collect())
    }

    /// Look up one profile by id
    pub async fn get_by_id(&self, profile_id: &str) -> Result<Option<ShellProfile>> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;
        Ok(state.profiles.iter().find(|p| p.id == profile_id).cloned())
    }

    /// Resolve the default profile.
    ///
    /// Resolution order: host-selected id, then the `is_default` flag,
    /// then the first profile in sorted order.
    pub async fn get_default(&self) -> Result<ShellProfile> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;

        if let Some(preferred) = &state.preferred_default_id {
            if let Some(profile) = state.profiles.iter().find(|p| &p.id == preferred) {
                return Ok(profile.clone());
            }
        }

        if let Some(profile) = state.profiles.iter().find(|p| p.is_default) {
            return Ok(profile.clone());
        }

        let mut sorted: Vec<&ShellProfile> = state.profiles.iter().collect();
        sorted.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        sorted
            .first()
            .map(|p| (*p).clone())
            .ok_or_else(|| Error::Other("no shell profiles available".to_string()))
    }

    /// First profile matching a shell kind, preferring the default
    pub async fn find_by_kind(&self, kind: ShellKind) -> Result<Option<ShellProfile>> {
        let default = self.get_default().await.ok();
        if let Some(default) = default {
            if default.shell_kind == kind {
                return Ok(Some(default));
            }
        }
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|p| p.shell_kind == kind))
    }

    /// Create a user-defined profile
    pub async fn create(&self, mut profile: ShellProfile) -> Result<ShellProfile> {
        self.validate_profile(&profile).await?;

        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;

        if state
            .profiles
            .iter()
            .any(|p| p.name.eq_ignore_ascii_case(&profile.name))
        {
            return Err(Error::DuplicateProfileName { name: profile.name });
        }

        if profile.id.is_empty() || state.profiles.iter().any(|p| p.id == profile.id) {
            profile.id = Uuid::new_v4().to_string();
        }
        if profile.shell_kind == ShellKind::Unknown {
            profile.shell_kind = ShellCatalog::classify_shell(&profile.shell_path);
        }
        profile.is_built_in = false;
        profile.is_default = false;
        profile.touch();

        state.profiles.push(profile.clone());
        self.persist(&state)?;
        drop(state);

        info!(id = %profile.id, name = %profile.name, "created shell profile");
        self.events.emit(&ProfilesChanged {
            kind: ProfileChangeKind::Added,
            profile_id: Some(profile.id.clone()),
            profile: Some(profile.clone()),
        });
        Ok(profile)
    }

    /// Update a user-defined profile
    pub async fn update(&self, mut profile: ShellProfile) -> Result<ShellProfile> {
        self.validate_profile(&profile).await?;

        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;

        let index = state
            .profiles
            .iter()
            .position(|p| p.id == profile.id)
            .ok_or_else(|| Error::ProfileNotFound {
                profile_id: profile.id.clone(),
            })?;

        let existing = &state.profiles[index];
        if existing.is_built_in {
            return Err(Error::BuiltInProfileImmutable {
                name: existing.name.clone(),
            });
        }
        if state
            .profiles
            .iter()
            .any(|p| p.id != profile.id && p.name.eq_ignore_ascii_case(&profile.name))
        {
            return Err(Error::DuplicateProfileName { name: profile.name });
        }

        if profile.shell_kind == ShellKind::Unknown {
            profile.shell_kind = ShellCatalog::classify_shell(&profile.shell_path);
        }
        profile.is_built_in = false;
        profile.created_at = state.profiles[index].created_at;
        profile.touch();

        state.profiles[index] = profile.clone();
        self.persist(&state)?;
        drop(state);

        self.events.emit(&ProfilesChanged {
            kind: ProfileChangeKind::Updated,
            profile_id: Some(profile.id.clone()),
            profile: Some(profile.clone()),
        });
        Ok(profile)
    }

    /// Delete a user-defined profile
    pub async fn delete(&self, profile_id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;

        let index = state
            .profiles
            .iter()
            .position(|p| p.id == profile_id)
            .ok_or_else(|| Error::ProfileNotFound {
                profile_id: profile_id.to_string(),
            })?;

        if state.profiles[index].is_built_in {
            return Err(Error::BuiltInProfileImmutable {
                name: state.profiles[index].name.clone(),
            });
        }

        let removed = state.profiles.remove(index);
        if state.preferred_default_id.as_deref() == Some(profile_id) {
            state.preferred_default_id = None;
        }
        self.persist(&state)?;
        drop(state);

        info!(id = %removed.id, name = %removed.name, "deleted shell profile");
        self.events.emit(&ProfilesChanged {
            kind: ProfileChangeKind::Deleted,
            profile_id: Some(removed.id.clone()),
            profile: Some(removed),
        });
        Ok(())
    }

    /// Make a profile the default
    pub async fn set_default(&self, profile_id: &str) -> Result<ShellProfile> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;

        let index = state
            .profiles
            .iter()
            .position(|p| p.id == profile_id)
            .ok_or_else(|| Error::ProfileNotFound {
                profile_id: profile_id.to_string(),
            })?;

        for profile in state.profiles.iter_mut() {
            profile.is_default = false;
        }
        state.profiles[index].is_default = true;
        state.preferred_default_id = Some(profile_id.to_string());
        self.persist(&state)?;

        let profile = state.profiles[index].clone();
        drop(state);

        self.events.emit(&ProfilesChanged {
            kind: ProfileChangeKind::DefaultChanged,
            profile_id: Some(profile.id.clone()),
            profile: Some(profile.clone()),
        });
        Ok(profile)
    }

    /// Copy a profile into a new user-defined profile
    pub async fn duplicate(&self, profile_id: &str) -> Result<ShellProfile> {
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;

        let source = state
            .profiles
            .iter()
            .find(|p| p.id == profile_id)
            .cloned()
            .ok_or_else(|| Error::ProfileNotFound {
                profile_id: profile_id.to_string(),
            })?;

        let mut copy = source.clone();
        copy.id = Uuid::new_v4().to_string();
        copy.name = unique_copy_name(&source.name, &state.profiles);
        copy.is_built_in = false;
        copy.is_default = false;
        copy.created_at = chrono::Utc::now();
        copy.touch();

        state.profiles.push(copy.clone());
        self.persist(&state)?;
        drop(state);

        self.events.emit(&ProfilesChanged {
            kind: ProfileChangeKind::Added,
            profile_id: Some(copy.id.clone()),
            profile: Some(copy.clone()),
        });
        Ok(copy)
    }

    /// Discard everything and re-derive built-ins from the catalog
    pub async fn reset_to_defaults(&self) -> Result<()> {
        let mut state = self.state.lock().await;

        state.profiles.clear();
        state.preferred_default_id = None;
        state.loaded = false;
        self.ensure_loaded(&mut state).await?;
        self.persist(&state)?;
        drop(state);

        info!("reset shell profiles to detected defaults");
        self.events.emit(&ProfilesChanged {
            kind: ProfileChangeKind::Reset,
            profile_id: None,
            profile: None,
        });
        Ok(())
    }

    /// Import profiles from a JSON array; returns the number imported.
    ///
    /// Imported profiles always become user-defined; entries whose name
    /// collides with an existing profile are skipped.
    pub async fn import_json(&self, json: &str) -> Result<usize> {
        let imported: Vec<ShellProfile> =
            serde_json::from_str(json).map_err(|e| Error::ProfileImportFailed {
                reason: e.to_string(),
            })?;

        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;

        let mut count = 0;
        for mut profile in imported {
            if state
                .profiles
                .iter()
                .any(|p| p.name.eq_ignore_ascii_case(&profile.name))
            {
                debug!(name = %profile.name, "skipping import, name exists");
                continue;
            }
            if profile.id.is_empty() || state.profiles.iter().any(|p| p.id == profile.id) {
                profile.id = Uuid::new_v4().to_string();
            }
            profile.is_built_in = false;
            profile.is_default = false;
            profile.touch();
            state.profiles.push(profile);
            count += 1;
        }

        if count > 0 {
            self.persist(&state)?;
        }
        drop(state);

        if count > 0 {
            self.events.emit(&ProfilesChanged {
                kind: ProfileChangeKind::Added,
                profile_id: None,
                profile: None,
            });
        }
        Ok(count)
    }

    /// Export profiles as pretty-printed JSON; all of them when `ids` is `None`
    pub async fn export_json(&self, ids: Option<&[String]>) -> Result<String> {
        let profiles = self.list().await?;
        let selected: Vec<&ShellProfile> = match ids {
            Some(ids) => profiles.iter().filter(|p| ids.contains(&p.id)).collect(),
            None => profiles.iter().collect(),
        };
        Ok(serde_json::to_string_pretty(&selected)?)
    }

    /// Path the profile list persists to
    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    async fn validate_profile(&self, profile: &ShellProfile) -> Result<()> {
        if profile.name.trim().is_empty() {
            return Err(Error::Other("profile name cannot be empty".to_string()));
        }
        if profile.shell_path.as_os_str().is_empty() {
            return Err(Error::InvalidShellPath {
                path: String::new(),
                reason: "path cannot be empty".to_string(),
            });
        }
        if !self.catalog.validate_path(&profile.shell_path).await {
            return Err(Error::InvalidShellPath {
                path: profile.shell_path.display().to_string(),
                reason: "not a runnable shell".to_string(),
            });
        }
        Ok(())
    }

    /// Load the persisted list and merge freshly detected built-ins.
    ///
    /// Caller holds the state lock; the catalog call is awaited under it
    /// intentionally, since all store operations serialize on this lock.
    async fn ensure_loaded(&self, state: &mut StoreState) -> Result<()> {
        if state.loaded {
            return Ok(());
        }

        let mut profiles: Vec<ShellProfile> = if self.storage_path.exists() {
            let text = fs::read_to_string(&self.storage_path)?;
            serde_json::from_str(&text)?
        } else {
            Vec::new()
        };

        let detected = self.catalog.list_available_shells().await;
        let has_default = profiles.iter().any(|p| p.is_default);
        let mut sort_order = profiles
            .iter()
            .filter(|p| p.is_built_in)
            .map(|p| p.sort_order)
            .max()
            .unwrap_or(-1);

        for shell in &detected {
            let already_present = profiles
                .iter()
                .any(|p| p.is_built_in && p.shell_path == shell.path);
            if already_present {
                continue;
            }
            sort_order += 1;
            let mut built_in = ShellProfile::built_in(shell, sort_order);
            if has_default {
                built_in.is_default = false;
            }
            profiles.push(built_in);
        }

        debug!(
            total = profiles.len(),
            detected = detected.len(),
            "loaded shell profiles"
        );

        state.profiles = profiles;
        state.loaded = true;
        Ok(())
    }

    fn persist(&self, state: &StoreState) -> Result<()> {
        if let Some(parent) = self.storage_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&state.profiles)?;
        if let Err(e) = fs::write(&self.storage_path, &json) {
            warn!(path = %self.storage_path.display(), error = %e, "failed to persist profiles");
            return Err(e.into());
        }
        Ok(())
    }
}

/// Pick a "name (copy)" style name not already taken
fn unique_copy_name(base: &str, existing: &[ShellProfile]) -> String {
    let mut candidate = format!("{} (copy)", base);
    let mut counter = 2;
    while existing
        .iter()
        .any(|p| p.name.eq_ignore_ascii_case(&candidate))
    {
        candidate = format!("{} (copy {})", base, counter);
        counter += 1;
    }
    candidate
}
