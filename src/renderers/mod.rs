//! Renderers module for the notes-to-MIDI converter
//!
//! This module contains the output side of the pipeline: turning sequenced
//! MIDI events into `midly` track events and raw MIDI message bytes.

pub mod midi;

// Re-export commonly used functions
pub use midi::{conductor_track, encode_live, encode_stream, track_events};
