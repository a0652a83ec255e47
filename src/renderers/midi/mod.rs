//! MIDI event stream rendering
//!
//! Converts [`MidiEvent`](crate::models::MidiEvent) sequences into `midly`
//! structures. Only the event stream is produced; wrapping tracks in a
//! Standard MIDI File container is left to the caller.
//!
//! # Usage
//! ```rust,ignore
//! use lilynotes_wasm::renderers::midi::{track_events, encode_stream};
//!
//! let track = track_events(&rendition.tracks[0].events, rendition.time_mode)?;
//! let bytes = encode_stream(&rendition.tracks[0].events)?;
//! ```

pub mod defaults;
pub mod track;

// Re-export main rendering functions
pub use defaults::{
    assign_channel, DEFAULT_STACCATO_FACTOR, DEFAULT_STRESS_INCREMENT, DEFAULT_TEMPO_MICROS,
    DEFAULT_TPQ, DEFAULT_VELOCITY, DEFAULT_VOLUME, MAX_MELODIC_CHANNELS, MAX_VOICES,
};
pub use track::{conductor_track, encode_live, encode_stream, track_events};
