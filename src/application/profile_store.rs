// Store trait for persisted user profiles
use crate::domain::profile::DataFieldProfile;
use async_trait::async_trait;

/// Persistence for user profiles. The default profile is never stored.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// All user profiles, in store order
    async fn load(&self) -> anyhow::Result<Vec<DataFieldProfile>>;

    /// Insert or overwrite by id. Overwrites refresh `modified_at`.
    async fn save(&self, profile: &DataFieldProfile) -> anyhow::Result<()>;

    /// Remove by id; unknown ids are not an error
    async fn delete(&self, id: &str) -> anyhow::Result<()>;
}
