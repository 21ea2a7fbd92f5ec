// Layout builder for ride-metric screens on a small glasses display
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
