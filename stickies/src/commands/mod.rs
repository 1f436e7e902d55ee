//! Command-line surface
//!
//! Stands in for the tray menu and the settings dialogs:
//! - `notes`: note lifecycle, editing and formatting
//! - `settings`: global defaults
//!
//! Every invocation starts the app, runs one command, then quits through
//! the tray's Quit action so everything is saved.

pub mod notes;
pub mod settings;

use crate::app::{App, TrayAction};
use crate::error::Result;
use crate::models::Color;
use crate::services::SettingsService;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub use notes::*;
pub use settings::*;

#[derive(Parser, Debug)]
#[command(name = "stickies")]
#[command(version, about = "Sticky notes kept in plain files")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding global_settings.properties
    #[arg(long, global = true, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a note from the global defaults
    New {
        /// Title for the new note
        #[arg(long)]
        title: Option<String>,
    },

    /// List notes in order
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one note
    Show {
        /// Note id or unique id prefix
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change a note's title, text or geometry
    Edit(EditArgs),

    /// Start a bullet line at the end of a note
    Bullet {
        id: String,

        /// Text following the bullet
        #[arg(default_value = "")]
        text: String,
    },

    /// Format a range of a note's text
    Format(FormatArgs),

    /// Lock or unlock a note's text
    ToggleLock { id: String },

    /// Keep a note above other windows, or stop doing so
    ToggleOnTop { id: String },

    /// Change a note's colors or transparency
    Style {
        id: String,

        #[arg(long)]
        background: Option<Color>,

        #[arg(long)]
        toolbar: Option<Color>,

        /// Opacity in percent (5-100)
        #[arg(long)]
        transparency: Option<u32>,
    },

    /// Close a note's window
    Hide { id: String },

    /// Show a note and bring it to the front
    Activate { id: String },

    /// Delete a note and its content file
    Delete {
        id: String,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Show or change the global defaults
    Settings(SettingsArgs),

    /// Print a note's content as RTF
    Export { id: String },
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    /// Replace the note's text
    #[arg(long)]
    pub text: Option<String>,

    #[arg(long, requires = "y", allow_negative_numbers = true)]
    pub x: Option<i32>,

    #[arg(long, requires = "x", allow_negative_numbers = true)]
    pub y: Option<i32>,

    /// Width from note settings; also becomes the smallest width
    #[arg(long)]
    pub width: Option<i32>,

    /// Height from note settings; also becomes the smallest height
    #[arg(long)]
    pub height: Option<i32>,

    /// Resize as if dragged; never below the smallest size
    #[arg(long, requires = "resize_height")]
    pub resize_width: Option<i32>,

    #[arg(long, requires = "resize_width")]
    pub resize_height: Option<i32>,
}

#[derive(Args, Debug)]
pub struct FormatArgs {
    pub id: String,

    /// First character to format
    #[arg(long)]
    pub start: usize,

    /// One past the last character to format
    #[arg(long)]
    pub end: usize,

    #[arg(long, conflicts_with = "no_bold")]
    pub bold: bool,

    #[arg(long)]
    pub no_bold: bool,

    #[arg(long, conflicts_with = "no_italic")]
    pub italic: bool,

    #[arg(long)]
    pub no_italic: bool,

    /// Font family
    #[arg(long)]
    pub font: Option<String>,

    /// Font size in points
    #[arg(long)]
    pub size: Option<u32>,

    #[arg(long)]
    pub color: Option<Color>,
}

#[derive(Args, Debug)]
pub struct SettingsArgs {
    /// Default note background
    #[arg(long)]
    pub background: Option<Color>,

    /// Default toolbar color
    #[arg(long)]
    pub toolbar: Option<Color>,

    /// Default font family
    #[arg(long)]
    pub font: Option<String>,

    /// Default font size (8-72)
    #[arg(long)]
    pub font_size: Option<String>,

    /// Directory notes are stored in
    #[arg(long)]
    pub storage: Option<PathBuf>,
}

/// Run one command against a freshly started app, then quit
pub fn run(cli: Cli) -> Result<()> {
    let config_dir = cli
        .config_dir
        .unwrap_or_else(SettingsService::default_config_dir);

    let mut app = App::setup(&config_dir)?;
    execute(&mut app, cli.command)?;
    app.handle(TrayAction::Quit)?;

    Ok(())
}

/// Dispatch a parsed command
pub fn execute(app: &mut App, command: Commands) -> Result<()> {
    match command {
        Commands::New { title } => handle_new(app, title),
        Commands::List { json } => handle_list(app, json),
        Commands::Show { id, json } => handle_show(app, &id, json),
        Commands::Edit(args) => handle_edit(app, args),
        Commands::Bullet { id, text } => handle_bullet(app, &id, &text),
        Commands::Format(args) => handle_format(app, args),
        Commands::ToggleLock { id } => handle_toggle_lock(app, &id),
        Commands::ToggleOnTop { id } => handle_toggle_on_top(app, &id),
        Commands::Style {
            id,
            background,
            toolbar,
            transparency,
        } => handle_style(app, &id, background, toolbar, transparency),
        Commands::Hide { id } => handle_hide(app, &id),
        Commands::Activate { id } => handle_activate(app, &id),
        Commands::Delete { id, yes } => handle_delete(app, &id, yes),
        Commands::Settings(args) => handle_settings(app, args),
        Commands::Export { id } => handle_export(app, &id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_edit_with_negative_position() {
        let cli = Cli::try_parse_from(["stickies", "edit", "abc", "--x", "-20", "--y", "40"]).unwrap();
        match cli.command {
            Commands::Edit(args) => {
                assert_eq!(args.x, Some(-20));
                assert_eq!(args.y, Some(40));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_color_arguments() {
        let cli = Cli::try_parse_from(["stickies", "style", "abc", "--background", "#FFCCDD"]).unwrap();
        match cli.command {
            Commands::Style { background, .. } => {
                assert_eq!(background, Some(Color::rgb(0xFF, 0xCC, 0xDD)));
            }
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(Cli::try_parse_from(["stickies", "style", "abc", "--toolbar", "teal"]).is_err());
    }

    #[test]
    fn test_position_needs_both_coordinates() {
        assert!(Cli::try_parse_from(["stickies", "edit", "abc", "--x", "5"]).is_err());
        assert!(Cli::try_parse_from(["stickies", "format", "abc", "--start", "0", "--end", "1", "--bold", "--no-bold"]).is_err());
    }
}
