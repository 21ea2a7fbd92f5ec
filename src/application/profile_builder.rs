// Profile builder - serialized profile/screen edits published as snapshots
use crate::application::profile_store::ProfileStore;
use crate::domain::data_field::DataField;
use crate::domain::layout::{LayoutDataField, LayoutError, LayoutScreen, THREE_STACKED_TEMPLATE_ID};
use crate::domain::profile::{
    DEFAULT_PROFILE_ID, DataFieldProfile, StarterTemplate, default_profile, starter_screens,
};
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, watch};
use uuid::Uuid;

const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);

/// Recoverable failure of a builder operation, kept in the snapshot until cleared.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuilderError {
    #[error("cannot modify read-only profile")]
    ReadOnlyProfile,
    #[error("cannot delete default profile")]
    DeleteDefault,
    #[error("zone '{0}' is already occupied")]
    ZoneOccupied(String),
    #[error("screen already holds the maximum of {0} fields")]
    MaxFieldsReached(usize),
    #[error("zone '{0}' does not exist on this screen")]
    UnknownZone(String),
    #[error("cannot remove the only screen")]
    LastScreen,
    #[error("no screen ids left in this profile")]
    ScreenIdsExhausted,
    #[error("no active profile")]
    NoActiveProfile,
    #[error("profile '{0}' not found")]
    ProfileNotFound(String),
    #[error("screen {0} not found")]
    ScreenNotFound(u32),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("profile store failed: {0}")]
    Store(String),
    #[error("profile store did not answer within {0:?}")]
    StoreTimeout(Duration),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuilderState {
    /// Default profile first, then the stored user profiles
    pub profiles: Vec<DataFieldProfile>,
    pub active_profile: Option<DataFieldProfile>,
    pub selected_screen_id: u32,
    pub is_loading: bool,
    pub error: Option<BuilderError>,
}

impl BuilderState {
    pub fn profile(&self, id: &str) -> Option<&DataFieldProfile> {
        self.profiles.iter().find(|p| p.id() == id)
    }

    pub fn selected_screen(&self) -> Option<&LayoutScreen> {
        self.active_profile
            .as_ref()
            .and_then(|p| p.screen(self.selected_screen_id))
    }
}

#[derive(Debug, Clone)]
pub struct BuilderSettings {
    pub store_timeout: Duration,
    /// Template id for screens created by `add_screen`
    pub new_screen_template: String,
}

impl Default for BuilderSettings {
    fn default() -> Self {
        Self {
            store_timeout: DEFAULT_STORE_TIMEOUT,
            new_screen_template: THREE_STACKED_TEMPLATE_ID.to_string(),
        }
    }
}

/// Owns the published [`BuilderState`]. Mutations run one at a time and a
/// snapshot is only published once the store call behind it has resolved.
pub struct ProfileBuilder {
    store: Arc<dyn ProfileStore>,
    settings: BuilderSettings,
    state: watch::Sender<BuilderState>,
    mutation: Mutex<()>,
}

impl ProfileBuilder {
    pub fn new(store: Arc<dyn ProfileStore>, settings: BuilderSettings) -> Self {
        let (state, _) = watch::channel(BuilderState::default());
        Self {
            store,
            settings,
            state,
            mutation: Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> BuilderState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BuilderState> {
        self.state.subscribe()
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|s| s.error = None);
    }

    pub async fn load(&self) {
        let _guard = self.mutation.lock().await;
        self.state.send_modify(|s| s.is_loading = true);
        if let Err(e) = self.reload(None, None).await {
            self.fail("load", e);
        }
    }

    pub async fn create_profile(&self, name: &str, template: Option<StarterTemplate>) {
        let _guard = self.mutation.lock().await;
        if let Err(e) = self.try_create_profile(name, template.unwrap_or_default()).await {
            self.fail("create_profile", e);
        }
    }

    pub async fn duplicate_profile(&self, source_id: &str, name: &str) {
        let _guard = self.mutation.lock().await;
        if let Err(e) = self.try_duplicate_profile(source_id, name).await {
            self.fail("duplicate_profile", e);
        }
    }

    pub async fn delete_profile(&self, id: &str) {
        let _guard = self.mutation.lock().await;
        if let Err(e) = self.try_delete_profile(id).await {
            self.fail("delete_profile", e);
        }
    }

    pub async fn update_profile(&self, profile: DataFieldProfile) {
        let _guard = self.mutation.lock().await;
        if let Err(e) = self.try_update_profile(profile, None).await {
            self.fail("update_profile", e);
        }
    }

    pub async fn rename_profile(&self, id: &str, name: &str) {
        let _guard = self.mutation.lock().await;
        let result = match self.snapshot().profile(id) {
            Some(profile) => self.try_update_profile(profile.renamed(name), None).await,
            None => Err(BuilderError::ProfileNotFound(id.to_string())),
        };
        if let Err(e) = result {
            self.fail("rename_profile", e);
        }
    }

    pub async fn select_profile(&self, id: &str) {
        let _guard = self.mutation.lock().await;
        let Some(profile) = self.snapshot().profile(id).cloned() else {
            tracing::warn!("select_profile: profile {} not found, ignoring", id);
            return;
        };
        let first_screen = profile.screens().first().map_or(0, LayoutScreen::id);
        tracing::debug!("Selected profile {}", id);
        self.state.send_modify(|s| {
            s.active_profile = Some(profile);
            s.selected_screen_id = first_screen;
        });
    }

    pub async fn select_screen(&self, screen_id: u32) {
        let _guard = self.mutation.lock().await;
        let exists = self
            .snapshot()
            .active_profile
            .is_some_and(|p| p.screen(screen_id).is_some());
        if !exists {
            tracing::warn!("select_screen: screen {} not in active profile, ignoring", screen_id);
            return;
        }
        self.state.send_modify(|s| s.selected_screen_id = screen_id);
    }

    pub async fn add_field_to_screen(
        &self,
        screen_id: u32,
        zone_id: &str,
        data_field: &'static DataField,
    ) {
        let _guard = self.mutation.lock().await;
        if let Err(e) = self.try_add_field(screen_id, zone_id, data_field).await {
            self.fail("add_field_to_screen", e);
        }
    }

    /// Replace the field in `field.zone_id` wholesale: metric, visualization
    /// type and payload all come from `field`.
    pub async fn update_field(&self, screen_id: u32, field: LayoutDataField) {
        let _guard = self.mutation.lock().await;
        if let Err(e) = self.try_update_field(screen_id, field).await {
            self.fail("update_field", e);
        }
    }

    pub async fn remove_field(&self, screen_id: u32, zone_id: &str) {
        let _guard = self.mutation.lock().await;
        if let Err(e) = self.try_remove_field(screen_id, zone_id).await {
            self.fail("remove_field", e);
        }
    }

    pub async fn add_screen(&self) {
        let _guard = self.mutation.lock().await;
        if let Err(e) = self.try_add_screen().await {
            self.fail("add_screen", e);
        }
    }

    pub async fn remove_screen(&self, screen_id: u32) {
        let _guard = self.mutation.lock().await;
        if let Err(e) = self.try_remove_screen(screen_id).await {
            self.fail("remove_screen", e);
        }
    }

    async fn try_create_profile(
        &self,
        name: &str,
        template: StarterTemplate,
    ) -> Result<(), BuilderError> {
        let id = Uuid::new_v4().to_string();
        let profile =
            DataFieldProfile::new_user(&id, name, starter_screens(template)?, Utc::now())?;
        let first_screen = profile.screens().first().map(LayoutScreen::id);

        self.call_store("save", self.store.save(&profile)).await?;
        tracing::info!("Created profile {} ({}) from {:?}", id, name, template);
        self.reload(Some(id), first_screen).await
    }

    async fn try_duplicate_profile(&self, source_id: &str, name: &str) -> Result<(), BuilderError> {
        let Some(source) = self.snapshot().profile(source_id).cloned() else {
            tracing::warn!("duplicate_profile: source {} not found, ignoring", source_id);
            return Ok(());
        };
        let copy = source.duplicate_as(Uuid::new_v4().to_string(), name, Utc::now());
        let first_screen = copy.screens().first().map(LayoutScreen::id);

        self.call_store("save", self.store.save(&copy)).await?;
        tracing::info!("Duplicated profile {} as {}", source_id, copy.id());
        self.reload(Some(copy.id().to_string()), first_screen).await
    }

    async fn try_delete_profile(&self, id: &str) -> Result<(), BuilderError> {
        let snapshot = self.snapshot();
        let target = snapshot
            .profile(id)
            .ok_or_else(|| BuilderError::ProfileNotFound(id.to_string()))?;
        if target.is_default() {
            return Err(BuilderError::DeleteDefault);
        }
        let was_active = snapshot
            .active_profile
            .as_ref()
            .is_some_and(|p| p.id() == id);

        self.call_store("delete", self.store.delete(id)).await?;
        tracing::info!("Deleted profile {}", id);
        if was_active {
            self.reload(Some(DEFAULT_PROFILE_ID.to_string()), None).await
        } else {
            self.reload(None, None).await
        }
    }

    async fn try_update_profile(
        &self,
        profile: DataFieldProfile,
        selected_screen: Option<u32>,
    ) -> Result<(), BuilderError> {
        let stored_read_only = self
            .snapshot()
            .profile(profile.id())
            .is_some_and(|p| p.is_read_only());
        if profile.is_read_only() || profile.is_default() || stored_read_only {
            return Err(BuilderError::ReadOnlyProfile);
        }

        self.call_store("save", self.store.save(&profile)).await?;
        tracing::debug!("Saved profile {}", profile.id());
        self.reload(Some(profile.id().to_string()), selected_screen).await
    }

    async fn try_add_field(
        &self,
        screen_id: u32,
        zone_id: &str,
        data_field: &'static DataField,
    ) -> Result<(), BuilderError> {
        let profile = self.editable_active_profile()?;
        let screen = profile
            .screen(screen_id)
            .ok_or(BuilderError::ScreenNotFound(screen_id))?;
        if !screen.template().has_zone(zone_id) {
            return Err(BuilderError::UnknownZone(zone_id.to_string()));
        }
        if screen.zone_ids_in_use().contains(zone_id) {
            return Err(BuilderError::ZoneOccupied(zone_id.to_string()));
        }
        if screen.is_full() {
            return Err(BuilderError::MaxFieldsReached(screen.max_fields()));
        }

        let updated_screen = screen.with_field_added(LayoutDataField::text(data_field, zone_id))?;
        let updated = profile
            .with_screen(screen_id, |_| updated_screen)
            .ok_or(BuilderError::ScreenNotFound(screen_id))?;
        tracing::debug!("Adding {} to zone {} of screen {}", data_field.name, zone_id, screen_id);
        self.try_update_profile(updated, None).await
    }

    async fn try_update_field(
        &self,
        screen_id: u32,
        field: LayoutDataField,
    ) -> Result<(), BuilderError> {
        let profile = self.editable_active_profile()?;
        let Some(screen) = profile.screen(screen_id) else {
            tracing::warn!("update_field: screen {} not found, ignoring", screen_id);
            return Ok(());
        };
        let zone_id = field.zone_id.clone();
        let Some(updated_screen) = screen.with_field_replaced(field) else {
            tracing::warn!(
                "update_field: zone {} on screen {} is empty, ignoring",
                zone_id,
                screen_id
            );
            return Ok(());
        };
        let updated = profile
            .with_screen(screen_id, |_| updated_screen)
            .ok_or(BuilderError::ScreenNotFound(screen_id))?;
        self.try_update_profile(updated, None).await
    }

    async fn try_remove_field(&self, screen_id: u32, zone_id: &str) -> Result<(), BuilderError> {
        let profile = self.editable_active_profile()?;
        let screen = profile
            .screen(screen_id)
            .ok_or(BuilderError::ScreenNotFound(screen_id))?;
        let Some(updated_screen) = screen.without_field(zone_id) else {
            tracing::warn!(
                "remove_field: zone {} on screen {} is empty, ignoring",
                zone_id,
                screen_id
            );
            return Ok(());
        };
        let updated = profile
            .with_screen(screen_id, |_| updated_screen)
            .ok_or(BuilderError::ScreenNotFound(screen_id))?;
        self.try_update_profile(updated, None).await
    }

    async fn try_add_screen(&self) -> Result<(), BuilderError> {
        let profile = self.editable_active_profile()?;
        let id = profile
            .next_screen_id()
            .ok_or(BuilderError::ScreenIdsExhausted)?;
        let screen = LayoutScreen::new(
            id,
            format!("Screen {id}"),
            &self.settings.new_screen_template,
            Vec::new(),
        )?;
        let mut screens = profile.screens().to_vec();
        screens.push(screen);
        let updated = profile.with_screens(screens)?;
        tracing::debug!("Adding screen {} to profile {}", id, profile.id());
        self.try_update_profile(updated, Some(id)).await
    }

    async fn try_remove_screen(&self, screen_id: u32) -> Result<(), BuilderError> {
        let profile = self.editable_active_profile()?;
        if profile.screen(screen_id).is_none() {
            return Err(BuilderError::ScreenNotFound(screen_id));
        }
        if profile.screens().len() == 1 {
            return Err(BuilderError::LastScreen);
        }
        let screens: Vec<LayoutScreen> = profile
            .screens()
            .iter()
            .filter(|s| s.id() != screen_id)
            .cloned()
            .collect();
        let selected = if self.snapshot().selected_screen_id == screen_id {
            screens.first().map(LayoutScreen::id)
        } else {
            None
        };
        let updated = profile.with_screens(screens)?;
        self.try_update_profile(updated, selected).await
    }

    fn editable_active_profile(&self) -> Result<DataFieldProfile, BuilderError> {
        let profile = self
            .snapshot()
            .active_profile
            .ok_or(BuilderError::NoActiveProfile)?;
        if profile.is_read_only() {
            return Err(BuilderError::ReadOnlyProfile);
        }
        Ok(profile)
    }

    /// Fetch stored profiles and publish a fresh snapshot. `active_id` falls
    /// back to the current active profile, then to the default profile.
    async fn reload(
        &self,
        active_id: Option<String>,
        selected_screen: Option<u32>,
    ) -> Result<(), BuilderError> {
        let stored = self.call_store("load", self.store.load()).await?;

        let mut profiles = Vec::with_capacity(stored.len() + 1);
        profiles.push(default_profile()?);
        for profile in stored {
            if profile.is_default() || profile.id() == DEFAULT_PROFILE_ID {
                tracing::warn!("Ignoring stored profile that claims the default id");
                continue;
            }
            profiles.push(profile);
        }

        let current = self.snapshot();
        let active_id = active_id.or_else(|| current.active_profile.map(|p| p.id().to_string()));
        let active = active_id
            .and_then(|id| profiles.iter().find(|p| p.id() == id))
            .or_else(|| profiles.first())
            .cloned();

        let wanted = selected_screen.unwrap_or(current.selected_screen_id);
        let selected_screen_id = active.as_ref().map_or(0, |p| {
            if p.screen(wanted).is_some() {
                wanted
            } else {
                p.screens().first().map_or(0, LayoutScreen::id)
            }
        });

        tracing::debug!(
            "Loaded {} profiles, active={:?}, screen={}",
            profiles.len(),
            active.as_ref().map(|p| p.id().to_string()),
            selected_screen_id
        );
        self.state.send_modify(|s| {
            s.profiles = profiles;
            s.active_profile = active;
            s.selected_screen_id = selected_screen_id;
            s.is_loading = false;
        });
        Ok(())
    }

    async fn call_store<T, F>(&self, operation: &str, call: F) -> Result<T, BuilderError>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        match tokio::time::timeout(self.settings.store_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::error!("Profile store {} failed: {:#}", operation, e);
                Err(BuilderError::Store(format!("{e:#}")))
            }
            Err(_) => {
                tracing::error!(
                    "Profile store {} timed out after {:?}",
                    operation,
                    self.settings.store_timeout
                );
                Err(BuilderError::StoreTimeout(self.settings.store_timeout))
            }
        }
    }

    fn fail(&self, operation: &str, error: BuilderError) {
        tracing::warn!("{} rejected: {}", operation, error);
        self.state.send_modify(|s| {
            s.error = Some(error);
            s.is_loading = false;
        });
    }
}
