//! Configuration module: project-level settings from `.nspm.toml`.

pub mod settings;

pub use settings::Settings;
