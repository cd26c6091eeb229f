//! Configuration loading (`credvault.toml` plus environment overrides).

pub mod settings;

pub use settings::Settings;
