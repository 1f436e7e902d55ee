//! Note commands

use super::{EditArgs, FormatArgs};
use crate::app::App;
use crate::error::{AppError, Result};
use crate::models::{Color, NoteState};
use crate::rich_text::{rtf, StylePatch, StyledText};

/// Resolve a full id or a unique prefix of one
pub fn resolve_id(app: &App, id: &str) -> Result<String> {
    if app.notes().get(id).is_ok() {
        return Ok(id.to_string());
    }

    let mut matches = app
        .notes()
        .records()
        .filter(|note| note.id.starts_with(id))
        .map(|note| note.id.clone());

    match (matches.next(), matches.next()) {
        (Some(found), None) if !id.is_empty() => Ok(found),
        (Some(_), Some(_)) => Err(AppError::Validation(format!(
            "Id prefix '{}' matches more than one note",
            id
        ))),
        _ => Err(AppError::NoteNotFound(id.to_string())),
    }
}

pub fn handle_new(app: &mut App, title: Option<String>) -> Result<()> {
    let id = app.new_note();
    if let Some(title) = title {
        app.notes_mut().set_title(&id, &title)?;
    }

    println!("Created note {}", id);
    Ok(())
}

pub fn handle_list(app: &mut App, json: bool) -> Result<()> {
    let notes = app.notes().list_notes();

    if json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
        return Ok(());
    }

    if notes.is_empty() {
        println!("No notes");
        return Ok(());
    }

    for note in notes {
        let marker = match note.state {
            NoteState::Visible => ' ',
            NoteState::Hidden => 'h',
        };
        println!("{} {}  {}", marker, note.id, note.title);
    }
    Ok(())
}

pub fn handle_show(app: &mut App, id: &str, json: bool) -> Result<()> {
    let id = resolve_id(app, id)?;
    let note = app.notes().get(&id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(note)?);
        return Ok(());
    }

    println!("{}", note.title);
    println!("  id:           {}", note.id);
    println!("  position:     {}, {}", note.x, note.y);
    println!(
        "  size:         {}x{} (min {}x{})",
        note.width, note.height, note.min_width, note.min_height
    );
    println!("  locked:       {}", note.locked);
    println!("  on top:       {}", note.always_on_top);
    println!("  transparency: {:.0}%", note.transparency * 100.0);
    println!("  background:   {}", note.background_color);
    println!("  toolbar:      {}", note.toolbar_color);
    println!("  font:         {} {}", note.font_family, note.font_size);
    println!();
    println!("{}", note.content.text());
    Ok(())
}

pub fn handle_edit(app: &mut App, args: EditArgs) -> Result<()> {
    let id = resolve_id(app, &args.id)?;
    let notes = app.notes_mut();

    if let Some(title) = &args.title {
        notes.set_title(&id, title)?;
    }

    if let Some(text) = &args.text {
        let style = notes.get(&id)?.typing_style();
        notes.set_content(&id, StyledText::plain(text, &style))?;
    }

    if let (Some(x), Some(y)) = (args.x, args.y) {
        notes.move_to(&id, x, y)?;
    }

    if args.width.is_some() || args.height.is_some() {
        notes.set_size(&id, args.width, args.height)?;
    }

    if let (Some(width), Some(height)) = (args.resize_width, args.resize_height) {
        notes.resize(&id, width, height)?;
    }

    println!("Updated note {}", id);
    Ok(())
}

pub fn handle_bullet(app: &mut App, id: &str, text: &str) -> Result<()> {
    let id = resolve_id(app, id)?;
    app.notes_mut().add_bullet(&id, text)
}

pub fn handle_format(app: &mut App, args: FormatArgs) -> Result<()> {
    let id = resolve_id(app, &args.id)?;

    let patch = StylePatch {
        bold: flag_pair(args.bold, args.no_bold),
        italic: flag_pair(args.italic, args.no_italic),
        font_family: args.font,
        font_size: args.size,
        color: args.color,
    };

    if patch.is_empty() {
        return Err(AppError::Validation("Nothing to format".to_string()));
    }
    if args.start >= args.end {
        return Err(AppError::Validation(format!(
            "Empty range {}..{}",
            args.start, args.end
        )));
    }

    app.notes_mut()
        .format_content(&id, args.start..args.end, &patch)
}

pub fn handle_toggle_lock(app: &mut App, id: &str) -> Result<()> {
    let id = resolve_id(app, id)?;
    let locked = app.notes_mut().toggle_locked(&id)?;

    println!("{} {}", if locked { "Locked" } else { "Unlocked" }, id);
    Ok(())
}

pub fn handle_toggle_on_top(app: &mut App, id: &str) -> Result<()> {
    let id = resolve_id(app, id)?;
    let on_top = app.notes_mut().toggle_always_on_top(&id)?;

    println!("Always on top {}: {}", if on_top { "on" } else { "off" }, id);
    Ok(())
}

pub fn handle_style(
    app: &mut App,
    id: &str,
    background: Option<Color>,
    toolbar: Option<Color>,
    transparency: Option<u32>,
) -> Result<()> {
    let id = resolve_id(app, id)?;
    let notes = app.notes_mut();

    if let Some(percent) = transparency {
        notes.set_transparency_percent(&id, percent)?;
    }
    if let Some(color) = background {
        notes.set_background_color(&id, color)?;
    }
    if let Some(color) = toolbar {
        notes.set_toolbar_color(&id, color)?;
    }
    Ok(())
}

pub fn handle_hide(app: &mut App, id: &str) -> Result<()> {
    let id = resolve_id(app, id)?;
    app.notes_mut().hide(&id)
}

pub fn handle_activate(app: &mut App, id: &str) -> Result<()> {
    let id = resolve_id(app, id)?;
    app.notes_mut().activate(&id)
}

pub fn handle_delete(app: &mut App, id: &str, yes: bool) -> Result<()> {
    let id = resolve_id(app, id)?;

    if !yes {
        let title = &app.notes().get(&id)?.title;
        return Err(AppError::Validation(format!(
            "Pass --yes to delete '{}' ({})",
            title, id
        )));
    }

    app.notes_mut().delete_note(&id)?;
    println!("Deleted note {}", id);
    Ok(())
}

pub fn handle_export(app: &mut App, id: &str) -> Result<()> {
    let id = resolve_id(app, id)?;
    print!("{}", rtf::write(&app.notes().get(&id)?.content));
    Ok(())
}

fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}
