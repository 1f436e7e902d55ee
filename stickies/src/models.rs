//! Note models
//!
//! Rust structs representing a note and its appearance.
//! All models use serde so the command surface can print them as JSON.

use crate::config;
use crate::rich_text::{StyledText, TextStyle};
use crate::services::settings::GlobalSettings;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// An 8-bit RGBA color
///
/// Persisted as a packed `0xAARRGGBB` integer written in signed decimal,
/// so opaque white is stored as `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_argb(packed: u32) -> Self {
        Self {
            a: (packed >> 24) as u8,
            r: (packed >> 16) as u8,
            g: (packed >> 8) as u8,
            b: packed as u8,
        }
    }

    pub fn to_argb(self) -> u32 {
        (u32::from(self.a) << 24)
            | (u32::from(self.r) << 16)
            | (u32::from(self.g) << 8)
            | u32::from(self.b)
    }

    /// Packed form as written to property files
    pub fn to_packed(self) -> i32 {
        self.to_argb() as i32
    }

    /// Parse the packed decimal form. Accepts both the signed form and the
    /// unsigned form of the same 32 bits.
    pub fn parse_packed(value: &str) -> std::result::Result<Self, String> {
        let packed: i64 = value.trim().parse().map_err(|e| format!("{}", e))?;
        if packed < i64::from(i32::MIN) || packed > i64::from(u32::MAX) {
            return Err("packed color out of 32-bit range".to_string());
        }
        Ok(Self::from_argb(packed as u32))
    }

    pub fn is_opaque(self) -> bool {
        self.a == 255
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_opaque() {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.a, self.r, self.g, self.b)
        }
    }
}

/// Accepts `#RRGGBB`, `#AARRGGBB`, the same with a `0x` prefix, or the
/// packed decimal form.
impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let hex = s
            .strip_prefix('#')
            .or_else(|| s.strip_prefix("0x"))
            .or_else(|| s.strip_prefix("0X"));

        let Some(hex) = hex else {
            return Self::parse_packed(s);
        };

        let packed = u32::from_str_radix(hex, 16).map_err(|e| format!("{}", e))?;
        match hex.len() {
            6 => Ok(Self::from_argb(0xFF00_0000 | packed)),
            8 => Ok(Self::from_argb(packed)),
            _ => Err(format!("expected 6 or 8 hex digits, got {}", hex.len())),
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Visibility of a live note. Deleted notes leave the registry entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteState {
    Visible,
    Hidden,
}

/// A sticky note: window geometry, flags, appearance and content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: String,
    pub title: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Floor for interactive resize
    pub min_width: i32,
    pub min_height: i32,
    pub locked: bool,
    pub always_on_top: bool,
    /// Opacity in (0, 1]
    pub transparency: f32,
    pub background_color: Color,
    pub toolbar_color: Color,
    pub font_family: String,
    pub font_size: u32,
    pub content: StyledText,
}

impl NoteRecord {
    /// Build a fresh note from the current global defaults
    pub fn from_defaults(settings: &GlobalSettings) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: config::NOTE_DEFAULT_TITLE.to_string(),
            x: config::NOTE_DEFAULT_X,
            y: config::NOTE_DEFAULT_Y,
            width: config::NOTE_DEFAULT_WIDTH,
            height: config::NOTE_DEFAULT_HEIGHT,
            min_width: config::NOTE_DEFAULT_WIDTH,
            min_height: config::NOTE_DEFAULT_HEIGHT,
            locked: false,
            always_on_top: false,
            transparency: config::NOTE_DEFAULT_TRANSPARENCY,
            background_color: settings.default_background,
            toolbar_color: settings.default_toolbar_color,
            font_family: settings.default_font_family.clone(),
            font_size: settings.default_font_size,
            content: StyledText::new(),
        }
    }

    /// Style applied to text typed without explicit formatting
    pub fn typing_style(&self) -> TextStyle {
        TextStyle::new(&self.font_family, self.font_size)
    }

    /// Name of the RTF file holding this note's content
    pub fn content_file_name(&self) -> String {
        format!("{}.{}", self.id, config::CONTENT_EXTENSION)
    }

    /// Interactive resize: never shrinks below the min bounds
    pub fn resize(&mut self, width: i32, height: i32) {
        self.width = width.max(self.min_width);
        self.height = height.max(self.min_height);
    }

    /// Width chosen explicitly in note settings. It also becomes the
    /// width floor; the height and its floor are left alone.
    pub fn set_explicit_width(&mut self, width: i32) {
        let width = clamp_settings_size(width);
        if width < self.min_width {
            tracing::debug!(
                "Note {} width floor lowered from {} to {}",
                self.id,
                self.min_width,
                width
            );
        }
        self.width = width;
        self.min_width = width;
    }

    /// Height chosen explicitly in note settings. It also becomes the
    /// height floor; the width and its floor are left alone.
    pub fn set_explicit_height(&mut self, height: i32) {
        let height = clamp_settings_size(height);
        if height < self.min_height {
            tracing::debug!(
                "Note {} height floor lowered from {} to {}",
                self.id,
                self.min_height,
                height
            );
        }
        self.height = height;
        self.min_height = height;
    }
}

fn clamp_settings_size(value: i32) -> i32 {
    value.clamp(config::NOTE_SETTINGS_MIN_SIZE, config::NOTE_SETTINGS_MAX_SIZE)
}

/// Entry of the notes list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteSummary {
    pub id: String,
    pub title: String,
    pub state: NoteState,
}
