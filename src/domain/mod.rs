// Domain layer - metric catalog, visualization geometry and layout model
pub mod data_field;
pub mod layout;
pub mod profile;
pub mod visualization;
