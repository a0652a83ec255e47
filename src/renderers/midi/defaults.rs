//! Default values for MIDI rendering
//!
//! Provides the defaults for resolution, tempo, velocity, articulation and
//! channel assignment.

/// Default ticks per quarter note (MIDI resolution)
/// 384 = 2^7 * 3 keeps triplets and dotted values exact
pub const DEFAULT_TPQ: u16 = 384;

/// Default tempo in microseconds per quarter note (120 BPM)
pub const DEFAULT_TEMPO_MICROS: u32 = 500_000;

/// Default MIDI velocity (1-127, where 64 is "normal")
pub const DEFAULT_VELOCITY: u8 = 64;

/// Starting volume of a voice before any dynamic, between mp and mf
pub const DEFAULT_VOLUME: f64 = 0.65;

/// Fraction of a note's written length that is actually played
pub const DEFAULT_STACCATO_FACTOR: f64 = 0.875;

/// Velocity added to a note on the downbeat (2/3 of it on secondary stresses)
pub const DEFAULT_STRESS_INCREMENT: u8 = 9;

/// Most simultaneous voices a single staff may open
pub const MAX_VOICES: usize = 6;

/// Channels available to voices: all 16 except drums
pub const MAX_MELODIC_CHANNELS: usize = 15;

/// Assign MIDI channel from voice index
/// - Channels 0-15 are available
/// - Channel 9 (10 in 1-indexed) is reserved for drums
/// - Skip channel 9 for melodic instruments
pub fn assign_channel(voice_index: usize) -> u8 {
    let channel = voice_index % 16;
    if channel >= 9 {
        // Skip channel 9 (drums), map 9→10, 10→11, etc.
        ((channel + 1) % 16) as u8
    } else {
        channel as u8
    }
}
