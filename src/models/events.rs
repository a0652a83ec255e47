//! Event types on both sides of the sequencer
//!
//! [`RawEvent`]s describe what the score says (a pitch starts or stops at a
//! musical moment); [`MidiEvent`]s describe what a MIDI writer must emit
//! (note-on/note-off at a tick).

use serde::{Deserialize, Serialize};

use crate::models::Rational;
use crate::renderers::midi::defaults::DEFAULT_VELOCITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawEventKind {
    NoteStart,
    NoteStop,
}

/// A pitch onset or release at a musical position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Position in whole notes from the start of the score
    #[serde(with = "crate::models::serde_helpers::rational")]
    pub time: Rational,
    /// MIDI note number (60 = middle C)
    pub pitch: u8,
    pub kind: RawEventKind,
    /// MIDI channel 0-15, one per voice
    pub channel: u8,
    /// Onset velocity; ignored for `NoteStop`
    #[serde(default = "default_velocity")]
    pub velocity: u8,
}

fn default_velocity() -> u8 {
    DEFAULT_VELOCITY
}

impl RawEvent {
    pub fn start(time: Rational, pitch: u8, channel: u8, velocity: u8) -> Self {
        Self {
            time,
            pitch,
            kind: RawEventKind::NoteStart,
            channel,
            velocity,
        }
    }

    pub fn stop(time: Rational, pitch: u8, channel: u8) -> Self {
        Self {
            time,
            pitch,
            kind: RawEventKind::NoteStop,
            channel,
            velocity: 0,
        }
    }

    /// Identity of a sounding note: only one may be active per (pitch, channel)
    pub fn key(&self) -> (u8, u8) {
        (self.pitch, self.channel)
    }

    pub fn is_start(&self) -> bool {
        self.kind == RawEventKind::NoteStart
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MidiEventKind {
    NoteOn,
    NoteOff,
}

/// A note-on or note-off ready for a MIDI writer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiEvent {
    /// Absolute tick or delta-tick, depending on the [`TimeMode`] that produced it
    pub time: u64,
    pub kind: MidiEventKind,
    pub pitch: u8,
    pub velocity: u8,
    pub channel: u8,
}

impl MidiEvent {
    pub fn note_on(time: u64, pitch: u8, velocity: u8, channel: u8) -> Self {
        Self {
            time,
            kind: MidiEventKind::NoteOn,
            pitch,
            velocity,
            channel,
        }
    }

    pub fn note_off(time: u64, pitch: u8, channel: u8) -> Self {
        Self {
            time,
            kind: MidiEventKind::NoteOff,
            pitch,
            velocity: 0,
            channel,
        }
    }

    pub fn is_note_on(&self) -> bool {
        self.kind == MidiEventKind::NoteOn
    }
}

/// How [`MidiEvent::time`] is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeMode {
    /// Ticks since the start of the score
    #[default]
    Absolute,
    /// Ticks since the previous event
    Delta,
}

/// Score-wide meta information for the conductor track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConductorEventKind {
    Tempo { micros_per_quarter: u32 },
    TimeSignature { numerator: u8, denominator: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConductorEvent {
    /// Absolute tick
    pub tick: u64,
    #[serde(flatten)]
    pub kind: ConductorEventKind,
}
