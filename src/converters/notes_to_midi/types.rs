//! Type definitions for notes-to-MIDI conversion
//!
//! - Public API types (ConversionSettings, StaffSource, Rendition)
//! - Per-voice output tracks

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::SettingsError;
use crate::models::{ConductorEvent, MidiEvent, Rational, TimeMode};
use crate::renderers::midi::defaults::{
    DEFAULT_STACCATO_FACTOR, DEFAULT_STRESS_INCREMENT, DEFAULT_TEMPO_MICROS, DEFAULT_TPQ,
    DEFAULT_VOLUME, MAX_VOICES,
};
use crate::sequencer::SequencerOptions;
use crate::utils::tick_length;

// ============================================================================
// SETTINGS
// ============================================================================

/// Configuration options for conversion
///
/// Missing fields take their defaults, so `{}` is a valid settings document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionSettings {
    /// MIDI resolution
    pub ticks_per_quarter: u16,

    /// Whether emitted event times are absolute ticks or deltas
    pub time_mode: TimeMode,

    /// Sort raw events by time instead of rejecting out-of-order input
    pub resort: bool,

    /// Apply dynamics, hairpins, staccato and beat stress
    pub articulate: bool,

    /// Fraction of an unslurred note's length that is played
    pub staccato_factor: f64,

    /// Velocity added on stressed beats
    pub stress_increment: u8,

    /// Voice volume (0..=1) before the first dynamic
    pub initial_volume: f64,

    /// Most simultaneous voices per staff
    pub max_voices: usize,

    /// Tempo in microseconds per quarter when the score sets none
    pub default_tempo: u32,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            ticks_per_quarter: DEFAULT_TPQ,
            time_mode: TimeMode::Absolute,
            resort: false,
            articulate: true,
            staccato_factor: DEFAULT_STACCATO_FACTOR,
            stress_increment: DEFAULT_STRESS_INCREMENT,
            initial_volume: DEFAULT_VOLUME,
            max_voices: MAX_VOICES,
            default_tempo: DEFAULT_TEMPO_MICROS,
        }
    }
}

impl ConversionSettings {
    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_yaml(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_yaml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a `.json`, `.yaml` or `.yml` file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let text = fs::read_to_string(path)?;

        match extension.as_str() {
            "json" => Self::from_json(&text),
            "yaml" | "yml" => Self::from_yaml(&text),
            _ => Err(SettingsError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.ticks_per_quarter == 0 || self.ticks_per_quarter > 0x7FFF {
            return Err(SettingsError::Invalid(format!(
                "ticks_per_quarter must be in 1..=32767, got {}",
                self.ticks_per_quarter
            )));
        }
        if !(self.staccato_factor > 0.0 && self.staccato_factor <= 1.0) {
            return Err(SettingsError::Invalid(format!(
                "staccato_factor must be in (0, 1], got {}",
                self.staccato_factor
            )));
        }
        if !(0.0..=1.0).contains(&self.initial_volume) {
            return Err(SettingsError::Invalid(format!(
                "initial_volume must be in [0, 1], got {}",
                self.initial_volume
            )));
        }
        if self.stress_increment > 127 {
            return Err(SettingsError::Invalid(format!(
                "stress_increment must be at most 127, got {}",
                self.stress_increment
            )));
        }
        if !(1..=16).contains(&self.max_voices) {
            return Err(SettingsError::Invalid(format!(
                "max_voices must be in 1..=16, got {}",
                self.max_voices
            )));
        }
        if self.default_tempo == 0 || self.default_tempo > 0x00FF_FFFF {
            return Err(SettingsError::Invalid(format!(
                "default_tempo must be in 1..=16777215 microseconds, got {}",
                self.default_tempo
            )));
        }
        Ok(())
    }

    pub fn sequencer_options(&self) -> SequencerOptions {
        SequencerOptions {
            ticks_per_quarter: self.ticks_per_quarter,
            time_mode: self.time_mode,
            resort: self.resort,
        }
    }

    /// Timing slack for deciding whether a voice is free: one tick
    pub fn tolerance(&self) -> Rational {
        tick_length(self.ticks_per_quarter)
    }

    /// Staccato factor as an exact ratio
    pub fn staccato_ratio(&self) -> Rational {
        Rational::approximate_float(self.staccato_factor).unwrap_or_else(|| Rational::from_integer(1))
    }
}

// ============================================================================
// INPUT / OUTPUT
// ============================================================================

/// Contents of one staff's `.notes` file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffSource {
    /// Staff part of the file name (`unnamed-staff`, `alto`, ...)
    pub name: String,
    pub text: String,
}

/// One performed voice, ready for a MIDI track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceTrack {
    /// `<staff>-voice<n>`
    pub name: String,
    pub staff: String,
    /// Voice number inside the staff, from 1
    pub voice: usize,
    pub channel: u8,
    pub events: Vec<MidiEvent>,
}

/// Result of converting a score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rendition {
    pub title: String,
    pub ticks_per_quarter: u16,
    pub time_mode: TimeMode,
    /// Tempo and time signature events, absolute ticks
    pub conductor: Vec<ConductorEvent>,
    pub tracks: Vec<VoiceTrack>,
}

impl Rendition {
    /// All note events of all tracks
    pub fn event_count(&self) -> usize {
        self.tracks.iter().map(|t| t.events.len()).sum()
    }
}
