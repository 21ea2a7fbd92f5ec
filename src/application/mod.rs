// Application layer - profile store contract and the builder state machine
pub mod profile_builder;
pub mod profile_store;
