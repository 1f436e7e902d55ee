//! Application configuration constants
//!
//! Central location for default values, validation boundaries and on-disk
//! names used throughout the application.

use crate::models::Color;

// ===== Note Geometry =====

/// Initial x position of a new note window in pixels
pub const NOTE_DEFAULT_X: i32 = 100;
/// Initial y position of a new note window in pixels
pub const NOTE_DEFAULT_Y: i32 = 100;
/// Initial width of a new note window; also its initial resize floor
pub const NOTE_DEFAULT_WIDTH: i32 = 300;
/// Initial height of a new note window; also its initial resize floor
pub const NOTE_DEFAULT_HEIGHT: i32 = 300;

/// Smallest size the note settings surface accepts for width/height
pub const NOTE_SETTINGS_MIN_SIZE: i32 = 300;
/// Largest size the note settings surface accepts for width/height
pub const NOTE_SETTINGS_MAX_SIZE: i32 = 2000;

// ===== Note Appearance =====

/// Title given to freshly created notes
pub const NOTE_DEFAULT_TITLE: &str = "Title Here";

/// Fully opaque
pub const NOTE_DEFAULT_TRANSPARENCY: f32 = 1.0;

/// Lowest transparency the note settings surface offers, in percent
pub const MIN_TRANSPARENCY_PERCENT: u32 = 5;
/// Highest transparency the note settings surface offers, in percent
pub const MAX_TRANSPARENCY_PERCENT: u32 = 100;

/// Text typed with no explicit color
pub const DEFAULT_TEXT_COLOR: Color = Color::rgb(0, 0, 0);

/// Character inserted by the bullet toolbar action
pub const BULLET_PREFIX: &str = "\u{2022} ";

// ===== Global Defaults =====

/// Light yellow note background
pub const DEFAULT_BACKGROUND: Color = Color::rgb(255, 255, 224);
/// Light blue toolbar
pub const DEFAULT_TOOLBAR_COLOR: Color = Color::rgb(204, 229, 241);
pub const DEFAULT_FONT_FAMILY: &str = "Arial";
pub const DEFAULT_FONT_SIZE: u32 = 14;

/// Smallest default font size offered by the settings surface
pub const MIN_FONT_SIZE: u32 = 8;
/// Largest default font size offered by the settings surface
pub const MAX_FONT_SIZE: u32 = 72;

// ===== On-disk Layout =====

/// Metadata for every note, relative to the storage location
pub const NOTES_DATA_FILE: &str = "notes_data.properties";
/// Directory holding one RTF file per note, relative to the storage location
pub const CONTENT_DIR: &str = "notes_rtf";
/// Extension of per-note content files
pub const CONTENT_EXTENSION: &str = "rtf";
/// Global settings file, relative to the config directory
pub const SETTINGS_FILE: &str = "global_settings.properties";

/// Header comment of the metadata file
pub const NOTES_DATA_COMMENT: &str = "Notes Data";
/// Header comment of the settings file
pub const SETTINGS_COMMENT: &str = "Global Settings";

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "STICKIES_CONFIG_DIR";
/// Subdirectory created under the platform config dir
pub const CONFIG_DIR_NAME: &str = "stickies";
