//! Voice allocation
//!
//! A staff's `.notes` file interleaves every note the staff plays. This
//! module splits them into monophonic voices (one MIDI channel each),
//! merges tied notes and records the marks (dynamics, hairpins, time
//! signatures) the performer needs.

pub mod staff;
pub mod voice;

pub use staff::{Staff, TempoChange, TimeSignatureChange};
pub use voice::{Mark, Note, TimedMark, Voice, VoiceItem};
