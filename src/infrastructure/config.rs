use crate::application::profile_builder::BuilderSettings;
use crate::domain::layout::{THREE_STACKED_TEMPLATE_ID, template_for};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub store: StoreSettings,
    pub layout: LayoutSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub listen_addr: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Json,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    pub kind: StoreKind,
    pub path: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LayoutSettings {
    pub new_screen_template: String,
}

impl AppConfig {
    /// Builder settings, rejecting template ids the layout model does not know.
    pub fn builder_settings(&self) -> anyhow::Result<BuilderSettings> {
        template_for(&self.layout.new_screen_template)?;
        Ok(BuilderSettings {
            store_timeout: Duration::from_millis(self.store.timeout_ms),
            new_screen_template: self.layout.new_screen_template.clone(),
        })
    }
}

fn builder_with_defaults() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(config::Config::builder()
        .set_default("server.listen_addr", "0.0.0.0:8080")?
        .set_default("store.kind", "json")?
        .set_default("store.path", "data/profiles.json")?
        .set_default("store.timeout_ms", 2000_i64)?
        .set_default("layout.new_screen_template", THREE_STACKED_TEMPLATE_ID)?)
}

/// Defaults, then `config/builder.*` if present, then `GLASSES__*` env vars.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = builder_with_defaults()?
        .add_source(config::File::with_name("config/builder").required(false))
        .add_source(config::Environment::with_prefix("GLASSES").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
