//! Settings service
//!
//! Manages the global defaults new notes are created with, persisted as a
//! flat property file. Every setter saves immediately.

use crate::config;
use crate::error::{AppError, Result};
use crate::models::Color;
use crate::storage::Properties;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const BACKGROUND_KEY: &str = "globalBgColor";
const TOOLBAR_COLOR_KEY: &str = "globalToolbarColor";
const FONT_FAMILY_KEY: &str = "globalFontFamily";
const FONT_SIZE_KEY: &str = "globalFontSize";
const STORAGE_LOCATION_KEY: &str = "dataStorageLocation";

/// Defaults applied to notes at creation time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSettings {
    pub default_background: Color,
    pub default_toolbar_color: Color,
    pub default_font_family: String,
    pub default_font_size: u32,
    /// Directory holding the notes metadata file and content directory
    pub storage_location: PathBuf,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            default_background: config::DEFAULT_BACKGROUND,
            default_toolbar_color: config::DEFAULT_TOOLBAR_COLOR,
            default_font_family: config::DEFAULT_FONT_FAMILY.to_string(),
            default_font_size: config::DEFAULT_FONT_SIZE,
            storage_location: absolute(Path::new(".")),
        }
    }
}

/// Service for managing global settings
pub struct SettingsService {
    settings_path: PathBuf,
    settings: GlobalSettings,
}

impl SettingsService {
    pub fn new(config_dir: &Path) -> Self {
        Self {
            settings_path: config_dir.join(config::SETTINGS_FILE),
            settings: GlobalSettings::default(),
        }
    }

    /// Directory the settings file lives in when none is given.
    ///
    /// `$STICKIES_CONFIG_DIR`, then the platform config dir, then the
    /// current directory.
    pub fn default_config_dir() -> PathBuf {
        if let Ok(dir) = std::env::var(config::CONFIG_DIR_ENV) {
            return PathBuf::from(dir);
        }

        dirs::config_dir()
            .map(|dir| dir.join(config::CONFIG_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn settings(&self) -> &GlobalSettings {
        &self.settings
    }

    pub fn path(&self) -> &Path {
        &self.settings_path
    }

    /// Load settings from disk.
    ///
    /// An absent file leaves the defaults in place. Keys missing from the
    /// file keep their current value. Fields are applied in file order and
    /// the first malformed one aborts the load, so earlier fields stay
    /// applied.
    pub fn load(&mut self) -> Result<()> {
        let Some(props) = Properties::load(&self.settings_path)? else {
            tracing::info!("Settings file not found, using defaults");
            return Ok(());
        };

        if let Some(raw) = props.get(BACKGROUND_KEY) {
            self.settings.default_background =
                Color::parse_packed(raw).map_err(|e| AppError::parse(BACKGROUND_KEY, raw, e))?;
        }

        if let Some(raw) = props.get(TOOLBAR_COLOR_KEY) {
            self.settings.default_toolbar_color =
                Color::parse_packed(raw).map_err(|e| AppError::parse(TOOLBAR_COLOR_KEY, raw, e))?;
        }

        if let Some(family) = props.get(FONT_FAMILY_KEY) {
            self.settings.default_font_family = family.to_string();
        }

        if let Some(size) = props.get_parsed::<u32>(FONT_SIZE_KEY)? {
            if size == 0 {
                return Err(AppError::parse(FONT_SIZE_KEY, "0", "font size must be positive"));
            }
            self.settings.default_font_size = size;
        }

        if let Some(location) = props.get(STORAGE_LOCATION_KEY) {
            self.settings.storage_location = absolute(Path::new(location));
        }

        tracing::info!("Settings loaded from {:?}", self.settings_path);

        Ok(())
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<()> {
        let mut props = Properties::new();
        props.set(BACKGROUND_KEY, self.settings.default_background.to_packed());
        props.set(TOOLBAR_COLOR_KEY, self.settings.default_toolbar_color.to_packed());
        props.set(FONT_FAMILY_KEY, &self.settings.default_font_family);
        props.set(FONT_SIZE_KEY, self.settings.default_font_size);
        props.set(
            STORAGE_LOCATION_KEY,
            self.settings.storage_location.to_string_lossy(),
        );

        props.store(&self.settings_path, config::SETTINGS_COMMENT)?;
        tracing::info!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }

    pub fn set_default_background(&mut self, color: Color) -> Result<()> {
        self.settings.default_background = color;
        self.save()
    }

    pub fn set_default_toolbar_color(&mut self, color: Color) -> Result<()> {
        self.settings.default_toolbar_color = color;
        self.save()
    }

    pub fn set_default_font_family(&mut self, family: &str) -> Result<()> {
        if family.trim().is_empty() {
            return Err(AppError::Validation("Font family cannot be empty".to_string()));
        }
        self.settings.default_font_family = family.to_string();
        self.save()
    }

    /// Update the default font size (8 to 72 points)
    pub fn set_default_font_size(&mut self, size: u32) -> Result<()> {
        if !(config::MIN_FONT_SIZE..=config::MAX_FONT_SIZE).contains(&size) {
            return Err(AppError::Validation(format!(
                "Font size must be between {} and {}",
                config::MIN_FONT_SIZE,
                config::MAX_FONT_SIZE
            )));
        }
        self.settings.default_font_size = size;
        self.save()
    }

    /// Change where notes are stored. Stored as an absolute path.
    pub fn set_storage_location(&mut self, location: &Path) -> Result<()> {
        self.settings.storage_location = absolute(location);
        self.save()
    }
}

/// Parse a font size typed by the user
pub fn parse_font_size(input: &str) -> Result<u32> {
    match input.trim().parse::<u32>() {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(AppError::Validation(format!("Invalid font size: '{}'", input))),
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) if path == Path::new(".") => cwd,
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_service() -> (SettingsService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let service = SettingsService::new(temp_dir.path());
        (service, temp_dir)
    }

    #[test]
    fn test_defaults_when_file_absent() {
        let (mut service, _temp) = create_test_service();

        service.load().unwrap();

        let settings = service.settings();
        assert_eq!(settings.default_background, Color::rgb(255, 255, 224));
        assert_eq!(settings.default_toolbar_color, Color::rgb(204, 229, 241));
        assert_eq!(settings.default_font_family, "Arial");
        assert_eq!(settings.default_font_size, 14);
        assert!(settings.storage_location.is_absolute());

        // Loading never creates the file
        assert!(!service.path().exists());
    }

    #[test]
    fn test_settings_persistence() {
        let temp_dir = TempDir::new().unwrap();
        let storage = temp_dir.path().join("notes");

        // Update settings through one service, drop it
        {
            let mut service = SettingsService::new(temp_dir.path());
            service.set_default_background(Color::rgb(10, 20, 30)).unwrap();
            service.set_default_toolbar_color(Color::rgb(40, 50, 60)).unwrap();
            service.set_default_font_family("Georgia").unwrap();
            service.set_default_font_size(18).unwrap();
            service.set_storage_location(&storage).unwrap();
        }

        // A new service sees every change
        {
            let mut service = SettingsService::new(temp_dir.path());
            service.load().unwrap();
            let settings = service.settings();
            assert_eq!(settings.default_background, Color::rgb(10, 20, 30));
            assert_eq!(settings.default_toolbar_color, Color::rgb(40, 50, 60));
            assert_eq!(settings.default_font_family, "Georgia");
            assert_eq!(settings.default_font_size, 18);
            assert_eq!(settings.storage_location, storage);
        }
    }

    #[test]
    fn test_file_format() {
        let (service, _temp) = create_test_service();
        service.save().unwrap();

        let props = Properties::load(service.path()).unwrap().unwrap();
        assert_eq!(props.get("globalBgColor"), Some("-32"));
        assert_eq!(props.get("globalToolbarColor"), Some("-3349007"));
        assert_eq!(props.get("globalFontFamily"), Some("Arial"));
        assert_eq!(props.get("globalFontSize"), Some("14"));
        assert!(Path::new(props.get("dataStorageLocation").unwrap()).is_absolute());
    }

    #[test]
    fn test_missing_keys_keep_defaults() {
        let (mut service, _temp) = create_test_service();
        std::fs::write(service.path(), "globalFontFamily=Courier\n").unwrap();

        service.load().unwrap();

        assert_eq!(service.settings().default_font_family, "Courier");
        assert_eq!(service.settings().default_font_size, 14);
        assert_eq!(service.settings().default_background, Color::rgb(255, 255, 224));
    }

    #[test]
    fn test_malformed_field_fails_load_after_earlier_fields() {
        let (mut service, _temp) = create_test_service();
        std::fs::write(
            service.path(),
            "globalBgColor=-16777216\nglobalFontFamily=Courier\nglobalFontSize=big\ndataStorageLocation=/srv/notes\n",
        )
        .unwrap();

        let result = service.load();

        assert!(matches!(result, Err(AppError::Parse { ref key, .. }) if key == "globalFontSize"));
        assert_eq!(service.settings().default_background, Color::rgb(0, 0, 0));
        assert_eq!(service.settings().default_font_family, "Courier");
        assert_ne!(service.settings().storage_location, PathBuf::from("/srv/notes"));
    }

    #[test]
    fn test_font_size_validation() {
        let (mut service, _temp) = create_test_service();

        assert!(matches!(
            service.set_default_font_size(7),
            Err(AppError::Validation(_))
        ));
        assert!(service.set_default_font_size(73).is_err());
        assert!(!service.path().exists());

        service.set_default_font_size(72).unwrap();
        assert_eq!(service.settings().default_font_size, 72);
    }

    #[test]
    fn test_parse_font_size() {
        assert_eq!(parse_font_size(" 12 ").unwrap(), 12);
        assert!(parse_font_size("twelve").is_err());
        assert!(parse_font_size("0").is_err());
        assert!(parse_font_size("-3").is_err());
    }

    #[test]
    fn test_relative_storage_location_made_absolute() {
        let (mut service, _temp) = create_test_service();

        service.set_storage_location(Path::new("relative/notes")).unwrap();

        assert!(service.settings().storage_location.is_absolute());
        assert!(service.settings().storage_location.ends_with("relative/notes"));
    }
}
