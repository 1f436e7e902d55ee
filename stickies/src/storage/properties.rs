//! Flat key-value files
//!
//! Reads and writes the `.properties` syntax: one `key=value` per logical
//! line, `#`/`!` comments, backslash continuations and `\uXXXX` escapes.
//! Output is pure ASCII and keeps insertion order so files diff cleanly.

use crate::error::{AppError, Result};
use chrono::Utc;
use indexmap::IndexMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Ordered key-value entries of a property file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: IndexMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        self.entries.insert(key.into(), value.to_string());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parse a value with `FromStr`; `Ok(None)` when the key is absent
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| AppError::parse(key, raw, e)),
        }
    }

    /// `true`/`false`, case-insensitive
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                _ => Err(AppError::parse(key, raw, "expected true or false")),
            },
        }
    }

    /// Parse property-file text
    pub fn parse(input: &str) -> Result<Self> {
        let mut props = Self::new();
        let mut lines = input.lines();

        while let Some(line) = lines.next() {
            let line = trim_leading_blanks(line);
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let mut logical = line.to_string();
            while ends_with_continuation(&logical) {
                logical.pop();
                match lines.next() {
                    Some(next) => logical.push_str(trim_leading_blanks(next)),
                    None => break,
                }
            }

            let (key, value) = split_entry(&logical);
            props.set(unescape(key)?, unescape(value)?);
        }

        Ok(props)
    }

    /// Render as property-file text with a comment and timestamp header
    pub fn render(&self, comment: &str) -> String {
        let mut out = String::new();
        out.push('#');
        out.push_str(&escape(comment, false));
        out.push('\n');
        let _ = writeln!(out, "#{}", Utc::now().format("%a %b %d %H:%M:%S UTC %Y"));

        for (key, value) in &self.entries {
            out.push_str(&escape(key, true));
            out.push('=');
            out.push_str(&escape(value, false));
            out.push('\n');
        }
        out
    }

    /// Read a property file; `Ok(None)` when it does not exist
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(path)?;
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            // Older writers used ISO-8859-1
            Err(e) => e.into_bytes().iter().map(|&b| char::from(b)).collect(),
        };

        Self::parse(&text).map(Some)
    }

    /// Overwrite a property file, creating its directory if needed
    pub fn store(&self, path: &Path, comment: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Write to temp file first, then rename over the target
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, self.render(comment))?;
        fs::rename(&temp_path, path)?;

        tracing::debug!("Wrote {} properties to {:?}", self.len(), path);
        Ok(())
    }
}

fn trim_leading_blanks(line: &str) -> &str {
    line.trim_start_matches([' ', '\t', '\u{000C}'])
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Split a logical line at the first unescaped `=`, `:` or blank
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' | '\u{000C}' => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let mut rest = trim_leading_blanks(&line[key_end..]);
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = trim_leading_blanks(stripped);
    }
    (key, rest)
}

fn unescape(raw: &str) -> Result<String> {
    let mut units: Vec<u16> = Vec::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u16; 2];
            units.extend_from_slice(c.encode_utf16(&mut buf));
            continue;
        }

        let Some(escaped) = chars.next() else {
            break;
        };
        match escaped {
            't' => units.push(u16::from(b'\t')),
            'n' => units.push(u16::from(b'\n')),
            'r' => units.push(u16::from(b'\r')),
            'f' => units.push(0x0C),
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                let unit = u16::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .ok_or_else(|| AppError::parse("\\u", &hex, "malformed unicode escape"))?;
                units.push(unit);
            }
            other => {
                let mut buf = [0u16; 2];
                units.extend_from_slice(other.encode_utf16(&mut buf));
            }
        }
    }

    Ok(String::from_utf16_lossy(&units))
}

fn escape(raw: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    for (i, c) in raw.chars().enumerate() {
        match c {
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{000C}' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            c if (' '..='~').contains(&c) => out.push(c),
            c => {
                let mut buf = [0u16; 2];
                for unit in c.encode_utf16(&mut buf) {
                    let _ = write!(out, "\\u{:04X}", unit);
                }
            }
        }
    }
    out
}
