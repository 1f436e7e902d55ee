//! Styled text
//!
//! A toolkit-independent rich text value: the note body as a sequence of
//! runs, each with one character style. Runs are kept normalized: never
//! empty, and two neighbours never share a style.
//!
//! The on-disk form lives in [`rtf`].

pub mod rtf;

use crate::config;
use crate::models::Color;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Character-level formatting
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub font_family: String,
    /// Size in points
    pub font_size: u32,
    pub color: Color,
}

impl TextStyle {
    pub fn new(font_family: &str, font_size: u32) -> Self {
        Self {
            bold: false,
            italic: false,
            font_family: font_family.to_string(),
            font_size,
            color: config::DEFAULT_TEXT_COLOR,
        }
    }

    /// Merge the fields set in `patch` into this style
    pub fn apply(&mut self, patch: &StylePatch) {
        if let Some(bold) = patch.bold {
            self.bold = bold;
        }
        if let Some(italic) = patch.italic {
            self.italic = italic;
        }
        if let Some(family) = &patch.font_family {
            self.font_family = family.clone();
        }
        if let Some(size) = patch.font_size {
            self.font_size = size;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self::new(config::DEFAULT_FONT_FAMILY, config::DEFAULT_FONT_SIZE)
    }
}

/// A partial style; `None` leaves the existing attribute untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StylePatch {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub font_family: Option<String>,
    pub font_size: Option<u32>,
    pub color: Option<Color>,
}

impl StylePatch {
    pub fn is_empty(&self) -> bool {
        self.bold.is_none()
            && self.italic.is_none()
            && self.font_family.is_none()
            && self.font_size.is_none()
            && self.color.is_none()
    }
}

/// Text sharing a single style
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    pub style: TextStyle,
}

/// A run as seen from outside, with its character range in the full text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span<'a> {
    pub range: Range<usize>,
    pub text: &'a str,
    pub style: &'a TextStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Run>", into = "Vec<Run>")]
pub struct StyledText {
    runs: Vec<Run>,
}

impl StyledText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plain(text: &str, style: &TextStyle) -> Self {
        let mut styled = Self::new();
        styled.push(text, style);
        styled
    }

    /// Append text, extending the last run when the style matches
    pub fn push(&mut self, text: &str, style: &TextStyle) {
        if text.is_empty() {
            return;
        }
        match self.runs.last_mut() {
            Some(last) if last.style == *style => last.text.push_str(text),
            _ => self.runs.push(Run {
                text: text.to_string(),
                style: style.clone(),
            }),
        }
    }

    pub fn push_char(&mut self, c: char, style: &TextStyle) {
        match self.runs.last_mut() {
            Some(last) if last.style == *style => last.text.push(c),
            _ => self.runs.push(Run {
                text: c.to_string(),
                style: style.clone(),
            }),
        }
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    pub fn char_len(&self) -> usize {
        self.runs.iter().map(|run| run.text.chars().count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn runs(&self) -> impl Iterator<Item = Span<'_>> {
        let mut offset = 0;
        self.runs.iter().map(move |run| {
            let start = offset;
            offset += run.text.chars().count();
            Span {
                range: start..offset,
                text: &run.text,
                style: &run.style,
            }
        })
    }

    /// Apply a patch to the characters in `range` (character offsets).
    /// The range is clamped to the text; an empty range changes nothing.
    pub fn apply(&mut self, range: Range<usize>, patch: &StylePatch) {
        let len = self.char_len();
        let start = range.start.min(len);
        let end = range.end.min(len);
        if start >= end || patch.is_empty() {
            return;
        }

        let mut out = StyledText::new();
        let mut offset = 0;
        for run in std::mem::take(&mut self.runs) {
            let run_start = offset;
            let run_end = offset + run.text.chars().count();
            offset = run_end;

            let lo = start.clamp(run_start, run_end) - run_start;
            let hi = end.clamp(run_start, run_end) - run_start;

            let (before, rest) = split_at_char(&run.text, lo);
            let (middle, after) = split_at_char(rest, hi - lo);

            out.push(before, &run.style);
            if !middle.is_empty() {
                let mut style = run.style.clone();
                style.apply(patch);
                out.push(middle, &style);
            }
            out.push(after, &run.style);
        }
        *self = out;
    }
}

impl From<Vec<Run>> for StyledText {
    fn from(runs: Vec<Run>) -> Self {
        let mut styled = StyledText::new();
        for run in runs {
            styled.push(&run.text, &run.style);
        }
        styled
    }
}

impl From<StyledText> for Vec<Run> {
    fn from(styled: StyledText) -> Self {
        styled.runs
    }
}

fn split_at_char(s: &str, n: usize) -> (&str, &str) {
    let idx = s.char_indices().nth(n).map_or(s.len(), |(i, _)| i);
    s.split_at(idx)
}
