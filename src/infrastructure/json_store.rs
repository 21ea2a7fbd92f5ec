// JSON file profile store
use crate::application::profile_store::ProfileStore;
use crate::domain::profile::{DEFAULT_PROFILE_ID, DataFieldProfile};
use crate::infrastructure::profile_record::ProfileRecord;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Keeps every user profile in one JSON array. Writes go through a sibling
/// temp file and a rename so a crash never leaves a truncated file behind.
/// Entries that do not parse as records stay in the file untouched; they are
/// skipped on load and carried over on save.
pub struct JsonProfileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Raw array entries; a broken entry never hides its neighbours.
    async fn read_entries(&self) -> Result<Vec<Value>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read {}", self.path.display()));
            }
        };
        serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    async fn write_entries(&self, entries: &[Value]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_vec_pretty(entries).context("Failed to serialize profiles")?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for JsonProfileStore {
    async fn load(&self) -> Result<Vec<DataFieldProfile>> {
        let entries = self.read_entries().await?;
        let mut profiles = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            let record = match serde_json::from_value::<ProfileRecord>(entry) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!("Skipping malformed profile entry {}: {}", index, e);
                    continue;
                }
            };
            if record.is_default || record.id == DEFAULT_PROFILE_ID {
                tracing::warn!("Ignoring stored default profile {}", record.id);
                continue;
            }
            let id = record.id.clone();
            match DataFieldProfile::try_from(record) {
                Ok(profile) => profiles.push(profile),
                Err(e) => tracing::warn!("Skipping invalid profile {}: {}", id, e),
            }
        }
        tracing::debug!("Loaded {} profiles from {}", profiles.len(), self.path.display());
        Ok(profiles)
    }

    async fn save(&self, profile: &DataFieldProfile) -> Result<()> {
        if profile.is_default() {
            bail!("the default profile is never persisted");
        }
        if profile.id() == DEFAULT_PROFILE_ID {
            bail!("profile id '{}' is reserved", DEFAULT_PROFILE_ID);
        }
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries().await?;
        let mut record = ProfileRecord::from(profile);
        let existing = entries
            .iter()
            .position(|e| entry_id(e) == Some(profile.id()));
        if existing.is_some() {
            record.modified_at = Utc::now().timestamp_millis();
        }
        let value = serde_json::to_value(&record).context("Failed to serialize profile")?;
        match existing {
            Some(index) => entries[index] = value,
            None => entries.push(value),
        }
        self.write_entries(&entries).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries().await?;
        let before = entries.len();
        entries.retain(|e| entry_id(e) != Some(id));
        if entries.len() == before {
            return Ok(());
        }
        self.write_entries(&entries).await
    }
}

fn entry_id(entry: &Value) -> Option<&str> {
    entry.get("id").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::{StarterTemplate, starter_screens};
    use uuid::Uuid;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("glasses-layout-{}", Uuid::new_v4()))
            .join("profiles.json")
    }

    fn profile(id: &str, name: &str) -> DataFieldProfile {
        DataFieldProfile::new_user(
            id,
            name,
            starter_screens(StarterTemplate::HeartRate).unwrap(),
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_store() {
        let store = JsonProfileStore::new(temp_path());
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_load_delete() {
        let path = temp_path();
        let store = JsonProfileStore::new(&path);
        let original = profile("a", "A");
        store.save(&original).await.unwrap();
        store.save(&profile("b", "B")).await.unwrap();
        store.save(&original.renamed("A2")).await.unwrap();

        let reopened = JsonProfileStore::new(&path);
        let loaded = reopened.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id(), "a");
        assert_eq!(loaded[0].name(), "A2");
        assert_eq!(loaded[0].screens(), original.screens());

        reopened.delete("a").await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id(), "b");

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }

    #[tokio::test]
    async fn test_invalid_records_are_skipped() {
        let path = temp_path();
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        let json = r#"[
            {"id":"ok","name":"Ok","createdAt":0,"modifiedAt":0,
             "screens":[{"id":1,"name":"S","templateId":"single","dataFields":[]}]},
            {"id":"bad","name":"Bad","createdAt":0,"modifiedAt":0,
             "screens":[{"id":1,"name":"S","templateId":"hexagon","dataFields":[]}]},
            {"id":"default","name":"Default","isDefault":true,"createdAt":0,"modifiedAt":0,
             "screens":[{"id":1,"name":"S","dataFields":[]}]}
        ]"#;
        tokio::fs::write(&path, json).await.unwrap();

        let loaded = JsonProfileStore::new(&path).load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id(), "ok");

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }

    #[tokio::test]
    async fn test_malformed_entry_does_not_hide_others() {
        let path = temp_path();
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        let json = r#"[
            {"id":"nameless","createdAt":0,"modifiedAt":0,
             "screens":[{"id":1,"name":"S","templateId":"single","dataFields":[]}]},
            {"id":"ok","name":"Ok","createdAt":0,"modifiedAt":0,
             "screens":[{"id":1,"name":"S","templateId":"single","dataFields":[]}]},
            42
        ]"#;
        tokio::fs::write(&path, json).await.unwrap();

        let store = JsonProfileStore::new(&path);
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id(), "ok");

        store.save(&profile("new", "New")).await.unwrap();
        store.delete("ok").await.unwrap();
        let raw: Vec<Value> =
            serde_json::from_slice(&tokio::fs::read(&path).await.unwrap()).unwrap();
        assert_eq!(raw.len(), 3);
        assert_eq!(entry_id(&raw[0]), Some("nameless"));
        assert_eq!(raw[1], Value::from(42));
        assert_eq!(store.load().await.unwrap()[0].id(), "new");

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }

    #[tokio::test]
    async fn test_default_id_is_reserved() {
        let path = temp_path();
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        let json = r#"[
            {"id":"default","name":"Mine","createdAt":0,"modifiedAt":0,
             "screens":[{"id":1,"name":"S","templateId":"single","dataFields":[]}]},
            {"id":"ok","name":"Ok","createdAt":0,"modifiedAt":0,
             "screens":[{"id":1,"name":"S","templateId":"single","dataFields":[]}]}
        ]"#;
        tokio::fs::write(&path, json).await.unwrap();

        let store = JsonProfileStore::new(&path);
        let ids: Vec<String> = store
            .load()
            .await
            .unwrap()
            .iter()
            .map(|p| p.id().to_string())
            .collect();
        assert_eq!(ids, vec!["ok".to_string()]);
        assert!(store.save(&profile(DEFAULT_PROFILE_ID, "Mine")).await.is_err());

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }
}
