//! Services module
//!
//! State and lifecycle logic that the app surface calls into: global
//! defaults and the note registry.

pub mod notes;
pub mod settings;

pub use notes::NoteRegistry;
pub use settings::{GlobalSettings, SettingsService};
