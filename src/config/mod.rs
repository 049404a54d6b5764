//! Configuration Module
//!
//! Client settings and the multi-source loader.

pub mod loader;
pub mod settings;

pub use loader::ConfigLoader;
pub use settings::{Settings, SettingsPatch};
