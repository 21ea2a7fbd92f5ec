// In-memory profile store, used for tests and `store.kind = "memory"`
use crate::application::profile_store::ProfileStore;
use crate::domain::profile::{DEFAULT_PROFILE_ID, DataFieldProfile};
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::RwLock;

#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<Vec<DataFieldProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn load(&self) -> Result<Vec<DataFieldProfile>> {
        let profiles = self
            .profiles
            .read()
            .map_err(|_| anyhow!("profile store lock poisoned"))?;
        Ok(profiles.clone())
    }

    async fn save(&self, profile: &DataFieldProfile) -> Result<()> {
        if profile.is_default() {
            bail!("the default profile is never persisted");
        }
        if profile.id() == DEFAULT_PROFILE_ID {
            bail!("profile id '{}' is reserved", DEFAULT_PROFILE_ID);
        }
        let mut profiles = self
            .profiles
            .write()
            .map_err(|_| anyhow!("profile store lock poisoned"))?;
        match profiles.iter_mut().find(|p| p.id() == profile.id()) {
            Some(existing) => *existing = profile.touched(Utc::now()),
            None => profiles.push(profile.clone()),
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut profiles = self
            .profiles
            .write()
            .map_err(|_| anyhow!("profile store lock poisoned"))?;
        profiles.retain(|p| p.id() != id);
        Ok(())
    }
}
