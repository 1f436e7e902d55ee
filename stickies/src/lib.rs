//! Stickies library
//!
//! Persistence and lifecycle core of a sticky-notes app: global defaults,
//! note records, styled text with its RTF form, and the note registry.

pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod rich_text;
pub mod services;
pub mod storage;
