// Presentation layer - HTTP surface over the profile builder
pub mod app_state;
pub mod handlers;
