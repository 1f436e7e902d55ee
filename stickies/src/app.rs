//! Application state and initialization
//!
//! `App` owns the settings service and the note registry and is the one
//! object front ends talk to. Tray menu entries arrive as [`TrayAction`]s.

use crate::error::Result;
use crate::models::NoteSummary;
use crate::services::{GlobalSettings, NoteRegistry, SettingsService};
use std::path::Path;

/// Entries of the tray menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayAction {
    NewNote,
    NotesList,
    Settings,
    Quit,
}

/// What a tray action produced, for the caller to present
#[derive(Debug, Clone, PartialEq)]
pub enum TrayOutcome {
    Created(String),
    NotesList(Vec<NoteSummary>),
    Settings(GlobalSettings),
    Quit,
}

/// Central application state
pub struct App {
    settings: SettingsService,
    notes: NoteRegistry,
}

impl App {
    /// Application setup - called once on startup.
    ///
    /// A damaged settings file is logged and the defaults (plus whatever
    /// loaded before the bad field) are used. A notes file with a malformed
    /// `count` fails setup so the next save cannot overwrite it.
    pub fn setup(config_dir: &Path) -> Result<Self> {
        tracing::info!("Initializing application");
        tracing::info!("Config directory: {:?}", config_dir);

        let mut settings = SettingsService::new(config_dir);
        if let Err(e) = settings.load() {
            tracing::error!("Failed to load settings from {:?}: {}", settings.path(), e);
        }

        let storage_root = settings.settings().storage_location.clone();
        tracing::info!("Storage location: {:?}", storage_root);

        let mut notes = NoteRegistry::new(&storage_root);
        notes.load_all(settings.settings())?;

        tracing::info!("Application initialized successfully");

        Ok(Self { settings, notes })
    }

    pub fn settings(&self) -> &GlobalSettings {
        self.settings.settings()
    }

    pub fn settings_service(&mut self) -> &mut SettingsService {
        &mut self.settings
    }

    pub fn notes(&self) -> &NoteRegistry {
        &self.notes
    }

    pub fn notes_mut(&mut self) -> &mut NoteRegistry {
        &mut self.notes
    }

    /// Create a note from the current global defaults
    pub fn new_note(&mut self) -> String {
        self.notes.create_note(self.settings.settings())
    }

    /// Move note storage to another directory and remember it
    pub fn set_storage_location(&mut self, location: &Path) -> Result<()> {
        self.settings.set_storage_location(location)?;
        let root = self.settings.settings().storage_location.clone();
        self.notes.relocate(&root);
        self.notes.save_all()
    }

    /// Dispatch a tray menu entry
    pub fn handle(&mut self, action: TrayAction) -> Result<TrayOutcome> {
        tracing::debug!("Tray action: {:?}", action);

        match action {
            TrayAction::NewNote => Ok(TrayOutcome::Created(self.new_note())),
            TrayAction::NotesList => Ok(TrayOutcome::NotesList(self.notes.list_notes())),
            TrayAction::Settings => Ok(TrayOutcome::Settings(self.settings().clone())),
            TrayAction::Quit => {
                self.quit()?;
                Ok(TrayOutcome::Quit)
            }
        }
    }

    /// Save everything: notes first, then global settings
    pub fn quit(&self) -> Result<()> {
        tracing::info!("Quitting, saving {} notes", self.notes.len());

        let notes = self.notes.save_all();
        if let Err(e) = &notes {
            tracing::error!("Failed to save notes on quit: {}", e);
        }

        self.settings.save()?;
        notes
    }
}
