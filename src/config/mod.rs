//! Configuration loading (`passvault.toml`).

pub mod settings;

pub use settings::Settings;
