//! Settings commands

use super::SettingsArgs;
use crate::app::App;
use crate::error::Result;
use crate::services::settings::parse_font_size;

/// Apply any given changes, then print the current defaults
pub fn handle_settings(app: &mut App, args: SettingsArgs) -> Result<()> {
    // Validate before anything is saved
    let font_size = args.font_size.as_deref().map(parse_font_size).transpose()?;

    let service = app.settings_service();
    if let Some(color) = args.background {
        service.set_default_background(color)?;
    }
    if let Some(color) = args.toolbar {
        service.set_default_toolbar_color(color)?;
    }
    if let Some(family) = &args.font {
        service.set_default_font_family(family)?;
    }
    if let Some(size) = font_size {
        service.set_default_font_size(size)?;
    }
    if let Some(location) = &args.storage {
        app.set_storage_location(location)?;
    }

    let settings = app.settings();
    println!("background:   {}", settings.default_background);
    println!("toolbar:      {}", settings.default_toolbar_color);
    println!("font:         {} {}", settings.default_font_family, settings.default_font_size);
    println!("storage:      {}", settings.storage_location.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{execute, Cli};
    use crate::error::AppError;
    use crate::models::Color;
    use crate::services::SettingsService;
    use clap::Parser;
    use tempfile::TempDir;

    fn create_test_app(temp_dir: &TempDir) -> App {
        let mut settings = SettingsService::new(temp_dir.path());
        settings.set_storage_location(&temp_dir.path().join("data")).unwrap();
        App::setup(temp_dir.path()).unwrap()
    }

    fn settings_command(args: &[&str]) -> SettingsArgs {
        let cli = Cli::try_parse_from(std::iter::once("stickies").chain(args.iter().copied())).unwrap();
        match cli.command {
            crate::commands::Commands::Settings(args) => args,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_change_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = create_test_app(&temp_dir);
        let storage = temp_dir.path().join("notes");

        let args = settings_command(&[
            "settings",
            "--background",
            "#FFEEDD",
            "--font",
            "Verdana",
            "--font-size",
            "20",
            "--storage",
            storage.to_str().unwrap(),
        ]);
        handle_settings(&mut app, args).unwrap();

        assert_eq!(app.settings().default_background, Color::rgb(0xFF, 0xEE, 0xDD));
        assert_eq!(app.settings().default_font_family, "Verdana");
        assert_eq!(app.settings().default_font_size, 20);
        assert_eq!(app.notes().storage_root(), storage.as_path());

        // New notes pick up the new defaults
        let id = app.new_note();
        assert_eq!(app.notes().get(&id).unwrap().font_size, 20);
    }

    #[test]
    fn test_invalid_font_size_changes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = create_test_app(&temp_dir);

        let cli = Cli::try_parse_from(["stickies", "settings", "--font", "Verdana", "--font-size", "big"]).unwrap();
        let result = execute(&mut app, cli.command);

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(app.settings().default_font_family, "Arial");

        let args = settings_command(&["settings", "--font-size", "100"]);
        assert!(handle_settings(&mut app, args).is_err());
        assert_eq!(app.settings().default_font_size, 14);
    }
}
