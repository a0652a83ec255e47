//! Error types for notes-to-MIDI conversion
//!
//! Each pipeline stage has its own error enum; [`ConversionError`] wraps
//! them all for callers that run the whole pipeline.

use thiserror::Error;

use crate::models::Rational;

/// Failures while ordering raw note events into MIDI events
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// A note stop with no sounding note to release
    #[error("event {index}: note stop for pitch {pitch} on channel {channel} at {time} has no matching note start")]
    MalformedEvent {
        index: usize,
        pitch: u8,
        channel: u8,
        time: Rational,
    },

    /// Input time went backwards and re-sorting is disabled
    #[error("event {index}: time {time} is earlier than the previous event at {previous}")]
    OutOfOrder {
        index: usize,
        time: Rational,
        previous: Rational,
    },

    #[error("event {index}: pitch {pitch} on channel {channel} restarted at {time} while still sounding")]
    OverlappingNote {
        index: usize,
        pitch: u8,
        channel: u8,
        time: Rational,
    },

    #[error("pitch {pitch} on channel {channel} started at {time} is never stopped")]
    UnterminatedNote { pitch: u8, channel: u8, time: Rational },

    #[error("event {index}: pitch {pitch} is outside the MIDI range 0-127")]
    PitchOutOfRange { index: usize, pitch: u8 },

    #[error("event {index}: channel {channel} is outside the MIDI range 0-15")]
    ChannelOutOfRange { index: usize, channel: u8 },

    #[error("event {index}: negative time {time}")]
    NegativeTime { index: usize, time: Rational },
}

/// Failures while reading a `.notes` file into voices
///
/// Every variant carries the 1-based line number of the offending event.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NotesError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    /// The listener writes events in time order; going backwards usually
    /// means two LilyPond runs were appended to the same file
    #[error("line {line}: time {time} is earlier than the previous event at {previous}")]
    OutOfOrder {
        line: usize,
        time: Rational,
        previous: Rational,
    },

    #[error("line {line}: tie on pitch {pitch} started in bar {start_bar} cannot reach bar {bar}")]
    TieTooLong {
        line: usize,
        pitch: u8,
        start_bar: i64,
        bar: i64,
    },

    #[error("line {line}: tied pitch {pitch} starts at {start} but the tied note ends at {busy_until}")]
    TieGap {
        line: usize,
        pitch: u8,
        start: Rational,
        busy_until: Rational,
    },

    #[error("line {line}: more than {max} simultaneous voices")]
    TooManyVoices { line: usize, max: usize },

    #[error("line {line}: '{event}' has no preceding note to apply to")]
    NoPrecedingNote { line: usize, event: &'static str },

    #[error("line {line}: hairpin starts before the previous one was closed by a dynamic")]
    NestedHairpin { line: usize },
}

/// Failures while splitting listener output file names
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileNameError {
    #[error("'{0}' is not a .notes file")]
    NotNotesFile(String),

    #[error("'{0}' has no staff part (expected stem-staff.notes)")]
    MissingStaff(String),
}

/// Failures while loading or validating [`ConversionSettings`](crate::converters::ConversionSettings)
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON settings: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML settings: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported settings format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Failures while turning MIDI events into midly events or bytes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("delta time {0} does not fit in a MIDI variable-length quantity")]
    DeltaOverflow(u64),

    #[error("midi write error: {0}")]
    Midi(String),
}

/// Top-level conversion error type
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("staff '{staff}': {source}")]
    Notes {
        staff: String,
        #[source]
        source: NotesError,
    },

    #[error("track '{track}': {source}")]
    Sequence {
        track: String,
        #[source]
        source: SequenceError,
    },

    /// Every voice needs its own melodic channel
    #[error("{voices} voices need more than the {max} melodic MIDI channels")]
    TooManyChannels { voices: usize, max: usize },

    #[error(transparent)]
    FileName(#[from] FileNameError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Render(#[from] RenderError),
}
