//! Run configuration and project settings

pub mod nomdev_toml;
pub mod options;

pub use nomdev_toml::ProjectSettings;
pub use options::{Arch, Configuration};
