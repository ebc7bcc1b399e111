//! BrickForge Settings Crate
//!
//! Handles application configuration: file formats, defaults and validation.

pub mod config;
pub mod error;

pub use config::{Config, InstructionSettings, LibrarySettings, LoggingSettings};
pub use error::{SettingsError, SettingsResult};
