//! Parsing module for LilyPond event-listener output
//!
//! This module contains the parsing logic for `.notes` files (one event per
//! line) and for the `stem-staff.notes` file names the listener writes.

pub mod file_name;
pub mod notes_file;

// Re-export commonly used types
pub use file_name::*;
pub use notes_file::*;
