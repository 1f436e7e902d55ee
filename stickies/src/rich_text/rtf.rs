//! RTF encoding for styled text
//!
//! The writer produces a small, regular subset: a font table, a color
//! table, then one `\plain`-prefixed control sequence per run. The reader
//! understands that subset plus what common word processors emit (nested
//! groups, ignorable destinations, `\'hh` and `\uN` escapes), dropping
//! anything it does not model.

use super::{StyledText, TextStyle};
use crate::config;
use crate::error::{AppError, Result};
use crate::models::Color;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::iter::Peekable;
use std::str::Chars;

/// Size the reader assumes before any `\fs` (RTF default is 24 half-points)
const RTF_DEFAULT_FONT_SIZE: u32 = 12;

/// Control words longer than this are malformed
const MAX_CONTROL_WORD_LEN: usize = 32;

/// Destinations whose text is never part of the note body
const SKIPPED_DESTINATIONS: &[&str] = &[
    "stylesheet",
    "info",
    "pict",
    "object",
    "header",
    "headerl",
    "headerr",
    "headerf",
    "footer",
    "footerl",
    "footerr",
    "footerf",
    "footnote",
    "listtable",
    "listoverridetable",
    "rsidtbl",
    "revtbl",
    "xmlnstbl",
    "themedata",
    "colorschememapping",
    "latentstyles",
    "datastore",
    "fldinst",
];

// ===== Writer =====

/// Serialize styled text as an RTF document
pub fn write(text: &StyledText) -> String {
    let mut fonts: Vec<&str> = Vec::new();
    let mut colors: Vec<Color> = Vec::new();
    for span in text.runs() {
        if !fonts.contains(&span.style.font_family.as_str()) {
            fonts.push(&span.style.font_family);
        }
        let color = Color::rgb(span.style.color.r, span.style.color.g, span.style.color.b);
        if !colors.contains(&color) {
            colors.push(color);
        }
    }
    if fonts.is_empty() {
        fonts.push(config::DEFAULT_FONT_FAMILY);
    }

    let mut out = String::from("{\\rtf1\\ansi\\ansicpg1252\\deff0\\uc1\n{\\fonttbl");
    for (index, family) in fonts.iter().enumerate() {
        let _ = write!(out, "{{\\f{}\\fnil ", index);
        escape_into(&mut out, &family.replace(';', ""));
        out.push_str(";}");
    }
    out.push_str("}\n{\\colortbl;");
    for color in &colors {
        let _ = write!(out, "\\red{}\\green{}\\blue{};", color.r, color.g, color.b);
    }
    out.push_str("}\n");

    for span in text.runs() {
        let font = fonts
            .iter()
            .position(|f| *f == span.style.font_family)
            .unwrap_or(0);
        let rgb = Color::rgb(span.style.color.r, span.style.color.g, span.style.color.b);
        let color = colors.iter().position(|c| *c == rgb).map_or(0, |i| i + 1);

        let _ = write!(
            out,
            "\\plain\\f{}\\fs{}\\cf{}",
            font,
            span.style.font_size.clamp(config::MIN_FONT_SIZE, config::MAX_FONT_SIZE) * 2,
            color
        );
        if span.style.bold {
            out.push_str("\\b");
        }
        if span.style.italic {
            out.push_str("\\i");
        }
        out.push(' ');
        escape_into(&mut out, span.text);
    }

    out.push_str("}\n");
    out
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '\n' => out.push_str("\\par\n"),
            '\t' => out.push_str("\\tab "),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\'{:02x}", c as u32);
            }
            c if c.is_ascii() => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(out, "\\u{}?", *unit as i16);
                }
            }
        }
    }
}

// ===== Reader =====

#[derive(Debug, Clone, PartialEq)]
enum Token {
    GroupStart,
    GroupEnd,
    Control { word: String, param: Option<i32> },
    Symbol(char),
    Hex(u8),
    Text(char),
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        loop {
            let Some(c) = self.chars.next() else {
                return Ok(None);
            };
            return match c {
                '{' => Ok(Some(Token::GroupStart)),
                '}' => Ok(Some(Token::GroupEnd)),
                '\\' => self.control().map(Some),
                '\r' | '\n' => continue,
                c => Ok(Some(Token::Text(c))),
            };
        }
    }

    fn control(&mut self) -> Result<Token> {
        let Some(c) = self.chars.next() else {
            return Err(AppError::Rtf("trailing backslash".to_string()));
        };

        match c {
            c if c.is_ascii_alphabetic() => {
                let mut word = String::from(c);
                while let Some(&next) = self.chars.peek() {
                    if !next.is_ascii_alphabetic() {
                        break;
                    }
                    word.push(next);
                    self.chars.next();
                    if word.len() > MAX_CONTROL_WORD_LEN {
                        return Err(AppError::Rtf(format!("control word too long: {}", word)));
                    }
                }

                let param = self.param()?;

                if self.chars.peek() == Some(&' ') {
                    self.chars.next();
                }

                Ok(Token::Control { word, param })
            }
            '\'' => {
                let hi = self.chars.next().and_then(|c| c.to_digit(16));
                let lo = self.chars.next().and_then(|c| c.to_digit(16));
                match (hi, lo) {
                    (Some(hi), Some(lo)) => Ok(Token::Hex((hi * 16 + lo) as u8)),
                    _ => Err(AppError::Rtf("malformed \\' escape".to_string())),
                }
            }
            '\r' | '\n' => Ok(Token::Control {
                word: "par".to_string(),
                param: None,
            }),
            c => Ok(Token::Symbol(c)),
        }
    }

    fn param(&mut self) -> Result<Option<i32>> {
        let mut digits = String::new();
        if self.chars.peek() == Some(&'-') {
            digits.push('-');
            self.chars.next();
        }
        while let Some(&next) = self.chars.peek() {
            if !next.is_ascii_digit() {
                break;
            }
            digits.push(next);
            self.chars.next();
        }

        match digits.as_str() {
            "" => Ok(None),
            "-" => Err(AppError::Rtf("dangling '-' after control word".to_string())),
            d => d
                .parse::<i32>()
                .map(Some)
                .map_err(|e| AppError::Rtf(format!("bad control parameter {}: {}", d, e))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Destination {
    Body,
    FontTable,
    ColorTable,
    Skip,
}

#[derive(Debug, Clone)]
struct GroupState {
    style: TextStyle,
    destination: Destination,
    unicode_skip: usize,
}

#[derive(Default)]
struct ColorEntry {
    red: u8,
    green: u8,
    blue: u8,
    set: bool,
}

struct Reader {
    stack: Vec<GroupState>,
    fonts: HashMap<i32, String>,
    colors: Vec<Option<Color>>,
    default_font: i32,
    font_number: Option<i32>,
    font_name: String,
    color: ColorEntry,
    pending_skip: usize,
    high_surrogate: Option<u16>,
    out: StyledText,
}

/// Parse an RTF document into styled text
pub fn read(input: &str) -> Result<StyledText> {
    let mut lexer = Lexer::new(input.trim_start());

    if lexer.next_token()? != Some(Token::GroupStart) {
        return Err(AppError::Rtf("document does not start with '{'".to_string()));
    }
    match lexer.next_token()? {
        Some(Token::Control { word, .. }) if word == "rtf" => {}
        _ => return Err(AppError::Rtf("missing \\rtf header".to_string())),
    }

    let mut reader = Reader::new();
    while let Some(token) = lexer.next_token()? {
        if !reader.handle(token)? {
            return Ok(reader.out);
        }
    }

    Err(AppError::Rtf("unterminated group".to_string()))
}

impl Reader {
    fn new() -> Self {
        let mut reader = Self {
            stack: Vec::new(),
            fonts: HashMap::new(),
            colors: Vec::new(),
            default_font: 0,
            font_number: None,
            font_name: String::new(),
            color: ColorEntry::default(),
            pending_skip: 0,
            high_surrogate: None,
            out: StyledText::new(),
        };
        let style = reader.plain_style();
        reader.stack.push(GroupState {
            style,
            destination: Destination::Body,
            unicode_skip: 1,
        });
        reader
    }

    fn state(&mut self) -> &mut GroupState {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn plain_style(&self) -> TextStyle {
        let family = self
            .fonts
            .get(&self.default_font)
            .map_or(config::DEFAULT_FONT_FAMILY, String::as_str);
        TextStyle::new(family, RTF_DEFAULT_FONT_SIZE)
    }

    /// Returns false once the outermost group closes
    fn handle(&mut self, token: Token) -> Result<bool> {
        match token {
            Token::GroupStart => {
                let state = self.state().clone();
                self.stack.push(state);
            }
            Token::GroupEnd => {
                if self.state().destination == Destination::FontTable {
                    self.commit_font();
                }
                self.stack.pop();
                if self.stack.is_empty() {
                    return Ok(false);
                }
            }
            Token::Control { word, param } => self.control(&word, param),
            Token::Symbol(c) => self.symbol(c),
            Token::Hex(byte) => {
                if self.pending_skip > 0 {
                    self.pending_skip -= 1;
                } else {
                    self.text(decode_cp1252(byte));
                }
            }
            Token::Text(c) => {
                if self.pending_skip > 0 {
                    self.pending_skip -= 1;
                } else {
                    self.text(c);
                }
            }
        }
        Ok(true)
    }

    fn control(&mut self, word: &str, param: Option<i32>) {
        match word {
            "fonttbl" => self.state().destination = Destination::FontTable,
            "colortbl" => self.state().destination = Destination::ColorTable,
            w if SKIPPED_DESTINATIONS.contains(&w) => {
                self.state().destination = Destination::Skip
            }
            _ => {}
        }

        // Unicode escapes carry text in every destination, font names included
        if self.state().destination != Destination::Skip {
            match word {
                "uc" => {
                    self.state().unicode_skip = param.unwrap_or(1).max(0) as usize;
                    return;
                }
                "u" => {
                    let unit = param.unwrap_or(0) as i16 as u16;
                    self.unicode_unit(unit);
                    self.pending_skip = self.state().unicode_skip;
                    return;
                }
                _ => {}
            }
        }

        match self.state().destination {
            Destination::Skip => {}
            Destination::FontTable => {
                if word == "f" {
                    self.commit_font();
                    self.font_number = param;
                }
            }
            Destination::ColorTable => {
                let value = param.unwrap_or(0).clamp(0, 255) as u8;
                match word {
                    "red" => self.color.red = value,
                    "green" => self.color.green = value,
                    "blue" => self.color.blue = value,
                    _ => return,
                }
                self.color.set = true;
            }
            Destination::Body => self.body_control(word, param),
        }
    }

    fn body_control(&mut self, word: &str, param: Option<i32>) {
        let on = param != Some(0);
        match word {
            "deff" => self.default_font = param.unwrap_or(0),
            "plain" => {
                let style = self.plain_style();
                self.state().style = style;
            }
            "b" => self.state().style.bold = on,
            "i" => self.state().style.italic = on,
            "f" => {
                let family = param.and_then(|n| self.fonts.get(&n).cloned());
                if let Some(family) = family {
                    self.state().style.font_family = family;
                }
            }
            "fs" => {
                let half_points = param.unwrap_or(24).max(2);
                self.state().style.font_size = (half_points / 2) as u32;
            }
            "cf" => {
                let color = param
                    .and_then(|n| usize::try_from(n).ok())
                    .and_then(|n| self.colors.get(n).copied())
                    .flatten()
                    .unwrap_or(config::DEFAULT_TEXT_COLOR);
                self.state().style.color = color;
            }
            "par" | "line" => self.text('\n'),
            "tab" => self.text('\t'),
            "bullet" => self.text('\u{2022}'),
            "emdash" => self.text('\u{2014}'),
            "endash" => self.text('\u{2013}'),
            "emspace" | "enspace" | "qmspace" => self.text(' '),
            "lquote" => self.text('\u{2018}'),
            "rquote" => self.text('\u{2019}'),
            "ldblquote" => self.text('\u{201C}'),
            "rdblquote" => self.text('\u{201D}'),
            _ => {}
        }
    }

    fn symbol(&mut self, c: char) {
        match c {
            '*' => self.state().destination = Destination::Skip,
            '\\' | '{' | '}' => self.text(c),
            '~' => self.text('\u{00A0}'),
            '_' => self.text('\u{2011}'),
            _ => {}
        }
    }

    fn unicode_unit(&mut self, unit: u16) {
        match unit {
            0xD800..=0xDBFF => {
                if self.high_surrogate.replace(unit).is_some() {
                    self.emit(char::REPLACEMENT_CHARACTER);
                }
            }
            0xDC00..=0xDFFF => {
                let c = self
                    .high_surrogate
                    .take()
                    .map(|high| {
                        0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(unit) - 0xDC00)
                    })
                    .and_then(char::from_u32)
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                self.emit(c);
            }
            _ => {
                let c = char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER);
                self.text(c);
            }
        }
    }

    fn text(&mut self, c: char) {
        if self.high_surrogate.take().is_some() {
            self.emit(char::REPLACEMENT_CHARACTER);
        }
        self.emit(c);
    }

    fn emit(&mut self, c: char) {
        match self.state().destination {
            Destination::Body => {
                let last = self.stack.len() - 1;
                self.out.push_char(c, &self.stack[last].style);
            }
            Destination::FontTable => {
                if c == ';' {
                    self.commit_font();
                } else {
                    self.font_name.push(c);
                }
            }
            Destination::ColorTable => {
                if c == ';' {
                    let entry = std::mem::take(&mut self.color);
                    self.colors
                        .push(entry.set.then(|| Color::rgb(entry.red, entry.green, entry.blue)));
                }
            }
            Destination::Skip => {}
        }
    }

    fn commit_font(&mut self) {
        let name = std::mem::take(&mut self.font_name);
        if let Some(number) = self.font_number.take() {
            self.fonts.insert(number, name.trim().to_string());
        }
    }
}

/// Windows-1252 byte to char; unassigned bytes map to the C1 control
fn decode_cp1252(byte: u8) -> char {
    const HIGH: [char; 32] = [
        '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}',
        '\u{2021}', '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}',
        '\u{017D}', '\u{008F}', '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}',
        '\u{2022}', '\u{2013}', '\u{2014}', '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}',
        '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
    ];
    match byte {
        0x80..=0x9F => HIGH[usize::from(byte - 0x80)],
        b => char::from(b),
    }
}
