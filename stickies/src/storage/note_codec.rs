//! Note metadata mapping
//!
//! Converts between [`NoteRecord`]s and the flat `note.<i>.<field>` keys of
//! the metadata file. The index is the note's position in the registry.
//! Content is not part of the metadata; only the content file name is.

use crate::error::Result;
use crate::models::{Color, NoteRecord};
use crate::services::settings::GlobalSettings;
use crate::storage::content_store::is_valid_id;
use crate::storage::Properties;
use std::collections::BTreeSet;
use std::fmt::Display;
use std::str::FromStr;
use uuid::Uuid;

pub const COUNT_KEY: &str = "count";

const ID: &str = "id";
const TITLE: &str = "title";
const X: &str = "x";
const Y: &str = "y";
const WIDTH: &str = "width";
const HEIGHT: &str = "height";
const LOCKED: &str = "locked";
const ON_TOP: &str = "ontop";
const TRANSPARENCY: &str = "transparency";
const BACKGROUND: &str = "noteBackground";
const TOOLBAR_COLOR: &str = "toolbarColor";
const FONT_FAMILY: &str = "fontFamily";
const FONT_SIZE: &str = "fontSize";
const MIN_WIDTH: &str = "minWidth";
const MIN_HEIGHT: &str = "minHeight";
const CONTENT_FILE: &str = "contentFile";

/// A note rebuilt from metadata, before its content is loaded
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedNote {
    pub record: NoteRecord,
    pub content_file: Option<String>,
}

fn key(index: usize, field: &str) -> String {
    format!("note.{}.{}", index, field)
}

/// Metadata entries for every note, in order, with the count
pub fn encode_all<'a>(notes: impl IntoIterator<Item = &'a NoteRecord>) -> Properties {
    let mut props = Properties::new();
    // Reserve the first line for the count
    props.set(COUNT_KEY, 0);

    let mut count = 0;
    for (index, note) in notes.into_iter().enumerate() {
        encode(index, note, &mut props);
        count = index + 1;
    }

    props.set(COUNT_KEY, count);
    props
}

/// Write one note's metadata under index `index`
pub fn encode(index: usize, note: &NoteRecord, props: &mut Properties) {
    props.set(key(index, ID), &note.id);
    props.set(key(index, TITLE), &note.title);
    props.set(key(index, X), note.x);
    props.set(key(index, Y), note.y);
    props.set(key(index, WIDTH), note.width);
    props.set(key(index, HEIGHT), note.height);
    props.set(key(index, LOCKED), note.locked);
    props.set(key(index, ON_TOP), note.always_on_top);
    props.set(key(index, TRANSPARENCY), format!("{:?}", note.transparency));
    props.set(key(index, BACKGROUND), note.background_color.to_packed());
    props.set(key(index, TOOLBAR_COLOR), note.toolbar_color.to_packed());
    props.set(key(index, FONT_FAMILY), &note.font_family);
    props.set(key(index, FONT_SIZE), note.font_size);
    props.set(key(index, MIN_WIDTH), note.min_width);
    props.set(key(index, MIN_HEIGHT), note.min_height);
    props.set(key(index, CONTENT_FILE), note.content_file_name());
}

/// Number of stored notes. Absent means none; a malformed value aborts the
/// whole load.
pub fn read_count(props: &Properties) -> Result<usize> {
    Ok(props.get_parsed::<usize>(COUNT_KEY)?.unwrap_or(0))
}

/// Indices below `count` with at least one stored field, in order.
/// `count` itself is never trusted for allocation or iteration.
pub fn stored_indices(props: &Properties, count: usize) -> Vec<usize> {
    let indices: BTreeSet<usize> = props
        .iter()
        .filter_map(|(key, _)| {
            let (index, _) = key.strip_prefix("note.")?.split_once('.')?;
            index.parse().ok()
        })
        .filter(|&index| index < count)
        .collect();
    indices.into_iter().collect()
}

/// Rebuild the note stored under `index`.
///
/// Missing or malformed fields fall back to the value a new note would get
/// from `defaults`, except `minWidth`/`minHeight` which default to the
/// loaded size (older files lack them).
pub fn decode(index: usize, props: &Properties, defaults: &GlobalSettings) -> DecodedNote {
    let fallback = NoteRecord::from_defaults(defaults);

    let id = match props.get(&key(index, ID)).map(str::trim) {
        Some(id) if is_valid_id(id) => id.to_string(),
        Some(id) if !id.is_empty() => {
            let fresh = Uuid::new_v4().to_string();
            tracing::warn!("Note {} has unusable id {:?}, assigning {}", index, id, fresh);
            fresh
        }
        _ => {
            let id = Uuid::new_v4().to_string();
            tracing::warn!("Note {} has no id, assigning {}", index, id);
            id
        }
    };

    let title = match props.get(&key(index, TITLE)) {
        Some(title) => title.to_string(),
        None => {
            tracing::warn!("Note {} has no title", index);
            fallback.title.clone()
        }
    };

    let width = field(props, index, WIDTH, fallback.width);
    let height = field(props, index, HEIGHT, fallback.height);
    let min_width = optional_field(props, index, MIN_WIDTH).unwrap_or(width);
    let min_height = optional_field(props, index, MIN_HEIGHT).unwrap_or(height);

    let transparency = field(props, index, TRANSPARENCY, fallback.transparency);
    let transparency = if transparency > 0.0 && transparency <= 1.0 {
        transparency
    } else {
        tracing::warn!("Note {} transparency {} out of range", index, transparency);
        fallback.transparency
    };

    let font_size = match field(props, index, FONT_SIZE, fallback.font_size) {
        0 => fallback.font_size,
        size => size,
    };

    let font_family = match props.get(&key(index, FONT_FAMILY)) {
        Some(family) => family.to_string(),
        None => {
            tracing::warn!("Note {} has no font family", index);
            fallback.font_family.clone()
        }
    };

    let mut record = NoteRecord {
        id,
        title,
        x: field(props, index, X, fallback.x),
        y: field(props, index, Y, fallback.y),
        width,
        height,
        min_width,
        min_height,
        locked: flag(props, index, LOCKED),
        always_on_top: flag(props, index, ON_TOP),
        transparency,
        background_color: color(props, index, BACKGROUND, fallback.background_color),
        toolbar_color: color(props, index, TOOLBAR_COLOR, fallback.toolbar_color),
        font_family,
        font_size,
        content: fallback.content,
    };

    if record.width < record.min_width || record.height < record.min_height {
        tracing::debug!("Note {} stored below its resize floor, growing it", index);
        record.resize(record.width, record.height);
    }

    DecodedNote {
        record,
        content_file: props.get(&key(index, CONTENT_FILE)).map(str::to_string),
    }
}

fn field<T>(props: &Properties, index: usize, name: &str, fallback: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match props.get_parsed(&key(index, name)) {
        Ok(Some(value)) => value,
        Ok(None) => {
            tracing::warn!("Note {} is missing '{}', using {}", index, name, fallback);
            fallback
        }
        Err(e) => {
            tracing::warn!("{}; using {}", e, fallback);
            fallback
        }
    }
}

fn optional_field<T>(props: &Properties, index: usize, name: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    props.get_parsed(&key(index, name)).unwrap_or_else(|e| {
        tracing::warn!("{}", e);
        None
    })
}

fn flag(props: &Properties, index: usize, name: &str) -> bool {
    props.get_bool(&key(index, name)).unwrap_or_else(|e| {
        tracing::warn!("{}; using false", e);
        None
    }) == Some(true)
}

fn color(props: &Properties, index: usize, name: &str, fallback: Color) -> Color {
    let key = key(index, name);
    match props.get(&key).map(Color::parse_packed) {
        Some(Ok(color)) => color,
        Some(Err(reason)) => {
            tracing::warn!("Invalid color for '{}': {}; using {}", key, reason, fallback);
            fallback
        }
        None => {
            tracing::warn!("Note {} is missing '{}', using {}", index, name, fallback);
            fallback
        }
    }
}
