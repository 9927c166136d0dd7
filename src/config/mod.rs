//! Configuration module for sqlweave.
//!
//! Handles dialect selection, naming conventions and compile switches.

mod settings;

pub use settings::{DialectSettings, Settings, SettingsError};
