//! Storage module
//!
//! On-disk formats: the flat property files holding settings and note
//! metadata, and the per-note RTF content files.

pub mod content_store;
pub mod note_codec;
pub mod properties;

pub use content_store::ContentStore;
pub use properties::Properties;
