//! Notes-to-MIDI WASM API
//!
//! This module provides the JavaScript-facing API. It includes shared
//! utilities for serialization and console logging, and the conversion
//! functions organized by what they produce.
//!
//! # Module Structure
//!
//! - `helpers`: Serialization, settings decoding, error handling and logging
//! - `types`: Request and response shapes that only exist at the JS boundary
//! - `convert`: `.notes` conversion, event sequencing and file-name parsing
//! - `export`: MIDI message bytes for players

pub mod helpers;
pub mod convert;
pub mod export;

pub use convert::{build_notes_file_map, convert_notes, parse_notes_file_name, sequence_events};
pub use export::encode_track;
