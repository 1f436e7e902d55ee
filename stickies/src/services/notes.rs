//! Notes service
//!
//! The note registry: the ordered collection of live notes and their
//! lifecycle. Every mutation rewrites the metadata file before returning.

use crate::config;
use crate::error::{AppError, Result};
use crate::models::{Color, NoteRecord, NoteState, NoteSummary};
use crate::rich_text::{StylePatch, StyledText};
use crate::services::settings::GlobalSettings;
use crate::storage::{note_codec, ContentStore, Properties};
use std::collections::HashSet;
use std::ops::Range;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Note {
    record: NoteRecord,
    state: NoteState,
}

/// Registry of live notes, in creation order
pub struct NoteRegistry {
    notes: Vec<Note>,
    storage_root: PathBuf,
    content: ContentStore,
    last_activated: Option<String>,
}

impl NoteRegistry {
    pub fn new(storage_root: &Path) -> Self {
        Self {
            notes: Vec::new(),
            storage_root: storage_root.to_path_buf(),
            content: ContentStore::new(storage_root),
            last_activated: None,
        }
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.storage_root.join(config::NOTES_DATA_FILE)
    }

    pub fn content_store(&self) -> &ContentStore {
        &self.content
    }

    /// Point the registry at another storage directory. Files under the old
    /// one are left alone; the next save writes to the new one.
    pub fn relocate(&mut self, storage_root: &Path) {
        tracing::info!(
            "Relocating notes from {:?} to {:?}",
            self.storage_root,
            storage_root
        );
        self.storage_root = storage_root.to_path_buf();
        self.content = ContentStore::new(storage_root);
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Create a note from the current global defaults
    pub fn create_note(&mut self, defaults: &GlobalSettings) -> String {
        let record = NoteRecord::from_defaults(defaults);
        let id = record.id.clone();

        tracing::info!("Creating new note: {}", id);

        self.notes.push(Note {
            record,
            state: NoteState::Visible,
        });
        self.last_activated = Some(id.clone());
        self.persist(&id);

        id
    }

    /// Entries for the notes list, in registry order
    pub fn list_notes(&self) -> Vec<NoteSummary> {
        self.notes
            .iter()
            .map(|note| NoteSummary {
                id: note.record.id.clone(),
                title: note.record.title.clone(),
                state: note.state,
            })
            .collect()
    }

    pub fn get(&self, id: &str) -> Result<&NoteRecord> {
        Ok(&self.notes[self.position(id)?].record)
    }

    pub fn state(&self, id: &str) -> Result<NoteState> {
        Ok(self.notes[self.position(id)?].state)
    }

    pub fn records(&self) -> impl Iterator<Item = &NoteRecord> {
        self.notes.iter().map(|note| &note.record)
    }

    /// Note most recently shown or brought to front
    pub fn last_activated(&self) -> Option<&str> {
        self.last_activated.as_deref()
    }

    /// Show a note and bring it to the front
    pub fn activate(&mut self, id: &str) -> Result<()> {
        let index = self.position(id)?;
        self.notes[index].state = NoteState::Visible;
        self.last_activated = Some(id.to_string());

        tracing::debug!("Activated note: {}", id);
        self.persist(id);
        Ok(())
    }

    /// Close a note's window. The note is saved first, then hidden.
    pub fn hide(&mut self, id: &str) -> Result<()> {
        let index = self.position(id)?;
        self.persist(id);
        self.notes[index].state = NoteState::Hidden;

        if self.last_activated.as_deref() == Some(id) {
            self.last_activated = None;
        }

        tracing::debug!("Hid note: {}", id);
        Ok(())
    }

    /// Remove a note for good. Confirmation is the caller's job.
    pub fn delete_note(&mut self, id: &str) -> Result<()> {
        let index = self.position(id)?;

        tracing::info!("Deleting note: {}", id);

        self.notes.remove(index);
        if self.last_activated.as_deref() == Some(id) {
            self.last_activated = None;
        }

        if let Err(e) = self.content.delete(id) {
            tracing::warn!("Failed to delete content for {}: {}", id, e);
        }

        if let Err(e) = self.write_metadata() {
            tracing::error!("Failed to save notes after deleting {}: {}", id, e);
        }

        tracing::info!("Note deleted successfully: {}", id);
        Ok(())
    }

    pub fn set_title(&mut self, id: &str, title: &str) -> Result<()> {
        self.update(id, |note| {
            note.title = title.to_string();
            Ok(())
        })
    }

    /// Replace a note's content. Locked notes are read-only.
    pub fn set_content(&mut self, id: &str, content: StyledText) -> Result<()> {
        self.update(id, |note| {
            ensure_unlocked(note)?;
            note.content = content;
            Ok(())
        })
    }

    /// Apply formatting to a character range of a note's content.
    /// Font sizes outside 8 to 72 points are rejected.
    pub fn format_content(&mut self, id: &str, range: Range<usize>, patch: &StylePatch) -> Result<()> {
        if let Some(size) = patch.font_size {
            if !(config::MIN_FONT_SIZE..=config::MAX_FONT_SIZE).contains(&size) {
                return Err(AppError::Validation(format!(
                    "Font size must be between {} and {}",
                    config::MIN_FONT_SIZE,
                    config::MAX_FONT_SIZE
                )));
            }
        }
        if patch.font_family.as_deref().is_some_and(|f| f.trim().is_empty()) {
            return Err(AppError::Validation("Font family cannot be empty".to_string()));
        }

        self.update(id, |note| {
            ensure_unlocked(note)?;
            note.content.apply(range, patch);
            Ok(())
        })
    }

    /// Start a new bullet line at the end of a note, followed by `text`
    pub fn add_bullet(&mut self, id: &str, text: &str) -> Result<()> {
        self.update(id, |note| {
            ensure_unlocked(note)?;
            let style = note.typing_style();
            if !note.content.is_empty() && !note.content.text().ends_with('\n') {
                note.content.push("\n", &style);
            }
            note.content.push(config::BULLET_PREFIX, &style);
            note.content.push(text, &style);
            Ok(())
        })
    }

    pub fn move_to(&mut self, id: &str, x: i32, y: i32) -> Result<()> {
        self.update(id, |note| {
            note.x = x;
            note.y = y;
            Ok(())
        })
    }

    /// Interactive resize, clamped up to the note's min bounds
    pub fn resize(&mut self, id: &str, width: i32, height: i32) -> Result<()> {
        self.update(id, |note| {
            note.resize(width, height);
            Ok(())
        })
    }

    /// Width and/or height chosen in note settings. Each given dimension
    /// also becomes that dimension's resize floor.
    pub fn set_size(&mut self, id: &str, width: Option<i32>, height: Option<i32>) -> Result<()> {
        self.update(id, |note| {
            if let Some(width) = width {
                note.set_explicit_width(width);
            }
            if let Some(height) = height {
                note.set_explicit_height(height);
            }
            Ok(())
        })
    }

    pub fn toggle_locked(&mut self, id: &str) -> Result<bool> {
        let mut locked = false;
        self.update(id, |note| {
            note.locked = !note.locked;
            locked = note.locked;
            Ok(())
        })?;
        Ok(locked)
    }

    pub fn toggle_always_on_top(&mut self, id: &str) -> Result<bool> {
        let mut on_top = false;
        self.update(id, |note| {
            note.always_on_top = !note.always_on_top;
            on_top = note.always_on_top;
            Ok(())
        })?;
        Ok(on_top)
    }

    /// Set opacity in percent (5 to 100)
    pub fn set_transparency_percent(&mut self, id: &str, percent: u32) -> Result<()> {
        if !(config::MIN_TRANSPARENCY_PERCENT..=config::MAX_TRANSPARENCY_PERCENT).contains(&percent) {
            return Err(AppError::Validation(format!(
                "Transparency must be between {}% and {}%",
                config::MIN_TRANSPARENCY_PERCENT,
                config::MAX_TRANSPARENCY_PERCENT
            )));
        }

        self.update(id, |note| {
            note.transparency = percent as f32 / 100.0;
            Ok(())
        })
    }

    pub fn set_background_color(&mut self, id: &str, color: Color) -> Result<()> {
        self.update(id, |note| {
            note.background_color = color;
            Ok(())
        })
    }

    pub fn set_toolbar_color(&mut self, id: &str, color: Color) -> Result<()> {
        self.update(id, |note| {
            note.toolbar_color = color;
            Ok(())
        })
    }

    /// Write metadata and every content file
    pub fn save_all(&self) -> Result<()> {
        self.content.initialize()?;

        let mut first_error = None;
        for note in &self.notes {
            if let Err(e) = self.content.write(&note.record.id, &note.record.content) {
                tracing::error!("Failed to save content for {}: {}", note.record.id, e);
                first_error.get_or_insert(e);
            }
        }

        self.write_metadata()?;

        tracing::info!("Saved {} notes to {:?}", self.notes.len(), self.storage_root);

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Replace the registry with the notes stored on disk.
    ///
    /// A missing metadata file means no notes. A malformed `count` aborts
    /// and leaves the registry untouched. Returns the number loaded.
    pub fn load_all(&mut self, defaults: &GlobalSettings) -> Result<usize> {
        let path = self.metadata_path();
        let Some(props) = Properties::load(&path)? else {
            tracing::info!("No notes file at {:?}", path);
            self.notes.clear();
            return Ok(0);
        };

        let count = note_codec::read_count(&props)?;
        let indices = note_codec::stored_indices(&props, count);
        if indices.len() < count {
            tracing::warn!(
                "Notes file declares {} notes but only {} have stored fields; skipping the rest",
                count,
                indices.len()
            );
        }

        let mut notes = Vec::with_capacity(indices.len());
        let mut seen = HashSet::with_capacity(indices.len());
        for index in indices {
            let decoded = note_codec::decode(index, &props, defaults);
            let mut record = decoded.record;

            if !seen.insert(record.id.clone()) {
                let id = Uuid::new_v4().to_string();
                tracing::warn!("Note {} repeats id {}, assigning {}", index, record.id, id);
                record.id = id.clone();
                seen.insert(id);
            }

            if let Some(file) = decoded.content_file {
                record.content = self.content.read_file(&file);
            }

            notes.push(Note {
                record,
                state: NoteState::Visible,
            });
        }

        let loaded = notes.len();
        self.notes = notes;
        self.last_activated = None;

        tracing::info!("Loaded {} notes from {:?}", loaded, path);

        Ok(loaded)
    }

    /// Save after a mutation: all metadata plus the changed note's content.
    /// Failures are logged and never returned.
    pub fn persist(&self, changed_id: &str) {
        if let Err(e) = self.write_metadata() {
            tracing::error!("Failed to save notes metadata: {}", e);
        }

        if let Some(note) = self.notes.iter().find(|n| n.record.id == changed_id) {
            if let Err(e) = self.content.write(changed_id, &note.record.content) {
                tracing::error!("Failed to save content for {}: {}", changed_id, e);
            }
        }
    }

    fn write_metadata(&self) -> Result<()> {
        let props = note_codec::encode_all(self.records());
        props.store(&self.metadata_path(), config::NOTES_DATA_COMMENT)
    }

    fn update<F>(&mut self, id: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut NoteRecord) -> Result<()>,
    {
        let index = self.position(id)?;
        f(&mut self.notes[index].record)?;
        self.persist(id);
        Ok(())
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.notes
            .iter()
            .position(|note| note.record.id == id)
            .ok_or_else(|| AppError::NoteNotFound(id.to_string()))
    }
}

fn ensure_unlocked(note: &NoteRecord) -> Result<()> {
    if note.locked {
        return Err(AppError::NoteLocked(note.id.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rich_text::TextStyle;
    use tempfile::TempDir;

    fn create_test_registry() -> (NoteRegistry, GlobalSettings, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let settings = GlobalSettings {
            storage_location: temp_dir.path().to_path_buf(),
            ..GlobalSettings::default()
        };
        let registry = NoteRegistry::new(temp_dir.path());
        (registry, settings, temp_dir)
    }

    #[test]
    fn test_create_note_uses_defaults() {
        let (mut registry, mut settings, _temp) = create_test_registry();
        settings.default_font_family = "Georgia".to_string();
        settings.default_background = Color::rgb(1, 2, 3);

        let id = registry.create_note(&settings);
        let note = registry.get(&id).unwrap();

        assert_eq!(note.title, "Title Here");
        assert_eq!((note.x, note.y), (100, 100));
        assert_eq!((note.width, note.height), (300, 300));
        assert_eq!((note.min_width, note.min_height), (300, 300));
        assert_eq!(note.transparency, 1.0);
        assert_eq!(note.font_family, "Georgia");
        assert_eq!(note.background_color, Color::rgb(1, 2, 3));
        assert!(note.content.is_empty());
        assert_eq!(registry.state(&id).unwrap(), NoteState::Visible);

        // Creation persists
        assert!(registry.metadata_path().exists());
        assert!(registry.content_store().exists(&id));
    }

    #[test]
    fn test_defaults_are_not_retroactive() {
        let (mut registry, mut settings, _temp) = create_test_registry();
        let first = registry.create_note(&settings);

        settings.default_font_size = 30;
        let second = registry.create_note(&settings);

        assert_eq!(registry.get(&first).unwrap().font_size, 14);
        assert_eq!(registry.get(&second).unwrap().font_size, 30);
    }

    #[test]
    fn test_list_notes_in_creation_order() {
        let (mut registry, settings, _temp) = create_test_registry();
        let a = registry.create_note(&settings);
        let b = registry.create_note(&settings);
        registry.set_title(&b, "Second").unwrap();

        let list = registry.list_notes();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, a);
        assert_eq!(list[1].id, b);
        assert_eq!(list[1].title, "Second");
    }

    #[test]
    fn test_unknown_note() {
        let (mut registry, _settings, _temp) = create_test_registry();

        assert!(matches!(registry.get("nope"), Err(AppError::NoteNotFound(_))));
        assert!(matches!(registry.set_title("nope", "x"), Err(AppError::NoteNotFound(_))));
        assert!(registry.delete_note("nope").is_err());
    }

    #[test]
    fn test_hide_and_activate() {
        let (mut registry, settings, _temp) = create_test_registry();
        let a = registry.create_note(&settings);
        let b = registry.create_note(&settings);
        assert_eq!(registry.last_activated(), Some(b.as_str()));

        registry.hide(&a).unwrap();
        assert_eq!(registry.state(&a).unwrap(), NoteState::Hidden);

        registry.activate(&a).unwrap();
        assert_eq!(registry.state(&a).unwrap(), NoteState::Visible);
        assert_eq!(registry.last_activated(), Some(a.as_str()));
    }

    #[test]
    fn test_delete_removes_only_that_note() {
        let (mut registry, settings, _temp) = create_test_registry();
        let keep = registry.create_note(&settings);
        let gone = registry.create_note(&settings);

        registry.delete_note(&gone).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.get(&keep).is_ok());
        assert!(!registry.content_store().exists(&gone));
        assert!(registry.content_store().exists(&keep));
        assert_eq!(registry.last_activated(), None);
    }

    #[test]
    fn test_locked_note_rejects_content_changes() {
        let (mut registry, settings, _temp) = create_test_registry();
        let id = registry.create_note(&settings);
        let style = TextStyle::new("Arial", 14);
        registry
            .set_content(&id, StyledText::plain("fixed", &style))
            .unwrap();

        assert!(registry.toggle_locked(&id).unwrap());

        let bold = StylePatch {
            bold: Some(true),
            ..StylePatch::default()
        };
        assert!(matches!(
            registry.set_content(&id, StyledText::plain("changed", &style)),
            Err(AppError::NoteLocked(_))
        ));
        assert!(matches!(
            registry.format_content(&id, 0..5, &bold),
            Err(AppError::NoteLocked(_))
        ));
        assert!(registry.add_bullet(&id, "x").is_err());
        assert_eq!(registry.get(&id).unwrap().content.text(), "fixed");

        // Title and geometry stay editable
        registry.set_title(&id, "Still editable").unwrap();
        registry.move_to(&id, 5, 6).unwrap();

        assert!(!registry.toggle_locked(&id).unwrap());
        registry.format_content(&id, 0..5, &bold).unwrap();
        assert!(registry.get(&id).unwrap().content.runs().all(|span| span.style.bold));
    }

    #[test]
    fn test_add_bullet() {
        let (mut registry, settings, _temp) = create_test_registry();
        let id = registry.create_note(&settings);

        registry.add_bullet(&id, "Milk").unwrap();
        registry.add_bullet(&id, "Eggs").unwrap();

        assert_eq!(
            registry.get(&id).unwrap().content.text(),
            "\u{2022} Milk\n\u{2022} Eggs"
        );
    }

    #[test]
    fn test_resize_respects_min_bounds() {
        let (mut registry, settings, _temp) = create_test_registry();
        let id = registry.create_note(&settings);

        registry.resize(&id, 120, 800).unwrap();
        let note = registry.get(&id).unwrap();
        assert_eq!((note.width, note.height), (300, 800));

        registry.set_size(&id, Some(500), Some(5000)).unwrap();
        let note = registry.get(&id).unwrap();
        assert_eq!((note.width, note.height), (500, 2000));
        assert_eq!((note.min_width, note.min_height), (500, 2000));

        registry.resize(&id, 400, 400).unwrap();
        let note = registry.get(&id).unwrap();
        assert_eq!((note.width, note.height), (500, 2000));
    }

    #[test]
    fn test_transparency_percent() {
        let (mut registry, settings, _temp) = create_test_registry();
        let id = registry.create_note(&settings);

        registry.set_transparency_percent(&id, 50).unwrap();
        assert_eq!(registry.get(&id).unwrap().transparency, 0.5);

        assert!(matches!(
            registry.set_transparency_percent(&id, 4),
            Err(AppError::Validation(_))
        ));
        assert!(registry.set_transparency_percent(&id, 101).is_err());
        assert_eq!(registry.get(&id).unwrap().transparency, 0.5);
    }

    #[test]
    fn test_every_mutation_is_saved() {
        let (mut registry, settings, temp) = create_test_registry();
        let id = registry.create_note(&settings);

        registry.set_title(&id, "Saved at once").unwrap();
        registry.toggle_always_on_top(&id).unwrap();
        registry.set_toolbar_color(&id, Color::rgb(9, 9, 9)).unwrap();

        let mut reloaded = NoteRegistry::new(temp.path());
        assert_eq!(reloaded.load_all(&settings).unwrap(), 1);
        let note = reloaded.get(&id).unwrap();
        assert_eq!(note.title, "Saved at once");
        assert!(note.always_on_top);
        assert_eq!(note.toolbar_color, Color::rgb(9, 9, 9));
    }

    #[test]
    fn test_load_without_file_is_empty() {
        let (mut registry, settings, _temp) = create_test_registry();

        assert_eq!(registry.load_all(&settings).unwrap(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_malformed_count_aborts_load() {
        let (mut registry, settings, temp) = create_test_registry();
        let id = registry.create_note(&settings);
        std::fs::write(temp.path().join("notes_data.properties"), "count=lots\n").unwrap();

        assert!(matches!(
            registry.load_all(&settings),
            Err(AppError::Parse { ref key, .. }) if key == "count"
        ));
        assert!(registry.get(&id).is_ok());
    }

    #[test]
    fn test_duplicate_ids_made_unique() {
        let (mut registry, settings, temp) = create_test_registry();
        std::fs::write(
            temp.path().join("notes_data.properties"),
            "count=2\nnote.0.id=same\nnote.1.id=same\n",
        )
        .unwrap();

        assert_eq!(registry.load_all(&settings).unwrap(), 2);
        let list = registry.list_notes();
        assert_eq!(list[0].id, "same");
        assert_ne!(list[1].id, "same");
    }

    #[test]
    fn test_relocate() {
        let (mut registry, settings, _temp) = create_test_registry();
        let id = registry.create_note(&settings);
        let other = TempDir::new().unwrap();

        registry.relocate(other.path());
        registry.save_all().unwrap();

        assert_eq!(registry.storage_root(), other.path());
        assert!(other.path().join("notes_data.properties").exists());
        assert!(other.path().join("notes_rtf").join(format!("{}.rtf", id)).exists());
    }

    #[test]
    fn test_set_single_dimension() {
        let (mut registry, settings, _temp) = create_test_registry();
        let id = registry.create_note(&settings);
        registry.resize(&id, 300, 900).unwrap();

        registry.set_size(&id, Some(500), None).unwrap();
        let note = registry.get(&id).unwrap();
        assert_eq!((note.width, note.height), (500, 900));
        assert_eq!((note.min_width, note.min_height), (500, 300));

        registry.set_size(&id, None, Some(350)).unwrap();
        let note = registry.get(&id).unwrap();
        assert_eq!((note.width, note.height), (500, 350));
        assert_eq!((note.min_width, note.min_height), (500, 350));
    }

    #[test]
    fn test_count_beyond_stored_entries() {
        let (mut registry, settings, temp) = create_test_registry();
        let path = temp.path().join("notes_data.properties");

        std::fs::write(&path, "count=3\nnote.0.id=only\nnote.0.title=Only note\n").unwrap();
        assert_eq!(registry.load_all(&settings).unwrap(), 1);
        assert_eq!(registry.list_notes()[0].id, "only");

        std::fs::write(&path, "count=18446744073709551615\nnote.0.id=only\n").unwrap();
        assert_eq!(registry.load_all(&settings).unwrap(), 1);

        // Nothing invented is written back
        registry.save_all().unwrap();
        let mut reloaded = NoteRegistry::new(temp.path());
        assert_eq!(reloaded.load_all(&settings).unwrap(), 1);
    }

    #[test]
    fn test_path_like_id_stays_inside_content_dir() {
        let (mut registry, settings, temp) = create_test_registry();
        let data = temp.path().join("a").join("b");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(
            data.join("notes_data.properties"),
            "count=1\nnote.0.id=../../escaped\nnote.0.title=Sneaky\n",
        )
        .unwrap();

        registry.relocate(&data);
        registry.load_all(&settings).unwrap();
        registry.save_all().unwrap();

        let id = registry.list_notes()[0].id.clone();
        assert_ne!(id, "../../escaped");
        assert!(data.join("notes_rtf").join(format!("{}.rtf", id)).exists());
        assert!(!temp.path().join("a").join("escaped.rtf").exists());
        assert!(!temp.path().join("escaped.rtf").exists());
    }

    #[test]
    fn test_format_rejects_bad_font_size() {
        let (mut registry, settings, _temp) = create_test_registry();
        let id = registry.create_note(&settings);
        registry.add_bullet(&id, "text").unwrap();

        for size in [0, 7, 73, u32::MAX] {
            let patch = StylePatch {
                font_size: Some(size),
                ..StylePatch::default()
            };
            assert!(matches!(
                registry.format_content(&id, 0..3, &patch),
                Err(AppError::Validation(_))
            ));
        }

        let patch = StylePatch {
            font_size: Some(72),
            ..StylePatch::default()
        };
        registry.format_content(&id, 0..3, &patch).unwrap();
    }
}
