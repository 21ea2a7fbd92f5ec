// Application state for HTTP handlers
use crate::application::profile_builder::ProfileBuilder;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub builder: Arc<ProfileBuilder>,
}
