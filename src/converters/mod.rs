//! Format converters
//!
//! This module contains the converter from LilyPond listener output to MIDI
//! events.

pub mod notes_to_midi;

// Re-export for convenience
pub use notes_to_midi::{
    conductor_events,
    convert_notes,
    raw_events,
    ConversionSettings,
    Rendition,
    StaffSource,
    VoiceTrack,
};
