//! `.notes` to MIDI event converter
//!
//! The converter follows a four-stage pipeline per staff:
//! 1. **Parse**: read the listener's event lines
//! 2. **Allocate**: split notes into monophonic voices, merging ties
//! 3. **Perform**: apply dynamics, hairpins, staccato and beat stress
//! 4. **Sequence**: pair note starts and stops into MIDI events
//!
//! Every voice becomes one [`VoiceTrack`] on its own channel, so a score may
//! use at most 15 voices across all staves. Tempo and time signature changes
//! from all staves are merged into the conductor events.
//!
//! # Basic Usage
//!
//! ```ignore
//! use lilynotes_wasm::converters::{convert_notes, ConversionSettings, StaffSource};
//!
//! let staff = StaffSource {
//!     name: "unnamed-staff".into(),
//!     text: "0.000000 note 60 4 0.250000 0 0.000000\n".into(),
//! };
//! let rendition = convert_notes("song", &[staff], &ConversionSettings::default())?;
//! assert_eq!(rendition.tracks[0].events.len(), 2);
//! ```

pub mod types;

pub use types::{ConversionSettings, Rendition, StaffSource, VoiceTrack};

use log::info;

use crate::errors::ConversionError;
use crate::models::{ConductorEvent, ConductorEventKind, RawEvent};
use crate::performer::perform_voice;
use crate::renderers::midi::{assign_channel, MAX_MELODIC_CHANNELS};
use crate::sequencer::Sequencer;
use crate::utils::whole_notes_to_ticks;
use crate::voicing::{Note, Staff};

/// Convert the `.notes` files of one score into MIDI event tracks
///
/// # Arguments
///
/// * `title` - Score name, usually the file stem
/// * `staves` - One entry per `.notes` file, in score order
/// * `settings` - Conversion settings
///
/// # Returns
///
/// * `Ok(Rendition)` - Conductor events plus one track per voice
/// * `Err(ConversionError)` - The first staff or track that failed, or
///   `TooManyChannels` when the voices cannot each get a channel
pub fn convert_notes(
    title: &str,
    staves: &[StaffSource],
    settings: &ConversionSettings,
) -> Result<Rendition, ConversionError> {
    settings.validate()?;
    let sequencer = Sequencer::new(settings.sequencer_options());

    let mut parsed = Vec::with_capacity(staves.len());
    for source in staves {
        let staff = Staff::from_notes(source.name.as_str(), &source.text, settings).map_err(|source_error| {
            ConversionError::Notes {
                staff: source.name.clone(),
                source: source_error,
            }
        })?;
        parsed.push(staff);
    }

    let voices: usize = parsed.iter().map(|staff| staff.voices().len()).sum();
    if voices > MAX_MELODIC_CHANNELS {
        return Err(ConversionError::TooManyChannels {
            voices,
            max: MAX_MELODIC_CHANNELS,
        });
    }

    let mut tracks = Vec::with_capacity(voices);
    for staff in &parsed {
        for voice in staff.voices() {
            let name = format!("{}-voice{}", staff.name, voice.index + 1);
            let channel = assign_channel(tracks.len());
            let notes = perform_voice(voice, settings).map_err(|source| ConversionError::Notes {
                staff: staff.name.clone(),
                source,
            })?;

            let events = sequencer
                .sequence(raw_events(&notes, channel))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| ConversionError::Sequence {
                    track: name.clone(),
                    source,
                })?;

            tracks.push(VoiceTrack {
                name,
                staff: staff.name.clone(),
                voice: voice.index + 1,
                channel,
                events,
            });
        }
    }

    let conductor = conductor_events(&parsed, settings);
    let rendition = Rendition {
        title: title.to_string(),
        ticks_per_quarter: settings.ticks_per_quarter,
        time_mode: settings.time_mode,
        conductor,
        tracks,
    };
    info!(
        "converted '{}': {} staves, {} tracks, {} events",
        rendition.title,
        staves.len(),
        rendition.tracks.len(),
        rendition.event_count()
    );
    Ok(rendition)
}

/// Note starts and stops for one voice, stably sorted by time
pub fn raw_events(notes: &[Note], channel: u8) -> Vec<RawEvent> {
    let mut events: Vec<RawEvent> = notes
        .iter()
        .flat_map(|note| {
            [
                RawEvent::start(note.start, note.pitch, channel, note.velocity()),
                RawEvent::stop(note.end(), note.pitch, channel),
            ]
        })
        .collect();
    events.sort_by_key(|event| event.time);
    events
}

/// Tempo and time signature events of all staves, in tick order
///
/// A tempo is always present at tick 0. Staves usually repeat the same
/// changes, so duplicates are dropped.
pub fn conductor_events(staves: &[Staff], settings: &ConversionSettings) -> Vec<ConductorEvent> {
    let tpq = settings.ticks_per_quarter;
    let tick = |time| whole_notes_to_ticks(time, tpq).max(0) as u64;

    let mut events: Vec<ConductorEvent> = Vec::new();
    for staff in staves {
        events.extend(staff.tempos().iter().map(|tempo| ConductorEvent {
            tick: tick(tempo.time),
            kind: ConductorEventKind::Tempo {
                micros_per_quarter: tempo.micros_per_quarter,
            },
        }));
        events.extend(staff.time_signatures().iter().map(|sig| ConductorEvent {
            tick: tick(sig.time),
            kind: ConductorEventKind::TimeSignature {
                numerator: sig.beats.min(255) as u8,
                denominator: sig.beat_type.min(128) as u8,
            },
        }));
    }

    let has_initial_tempo = events
        .iter()
        .any(|event| event.tick == 0 && matches!(event.kind, ConductorEventKind::Tempo { .. }));
    if !has_initial_tempo {
        events.push(ConductorEvent {
            tick: 0,
            kind: ConductorEventKind::Tempo {
                micros_per_quarter: settings.default_tempo,
            },
        });
    }

    events.sort_by_key(|event| event.tick);
    let mut unique: Vec<ConductorEvent> = Vec::with_capacity(events.len());
    for event in events {
        if !unique.contains(&event) {
            unique.push(event);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MidiEvent, Rational, TimeMode};

    fn source(name: &str, text: &str) -> StaffSource {
        StaffSource {
            name: name.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_single_note() {
        let settings = ConversionSettings {
            articulate: false,
            ..ConversionSettings::default()
        };
        let rendition = convert_notes("song", &[source("unnamed-staff", "0 note 60 1 1 0 0\n")], &settings).unwrap();

        assert_eq!(rendition.tracks.len(), 1);
        assert_eq!(rendition.tracks[0].name, "unnamed-staff-voice1");
        assert_eq!(
            rendition.tracks[0].events,
            vec![MidiEvent::note_on(0, 60, 82, 0), MidiEvent::note_off(1536, 60, 0)]
        );
        assert_eq!(
            rendition.conductor,
            vec![ConductorEvent {
                tick: 0,
                kind: ConductorEventKind::Tempo {
                    micros_per_quarter: 500_000
                }
            }]
        );
    }

    #[test]
    fn test_voices_get_their_own_channels() {
        let text = "0 note 60 2 0.5 0 0\n0 note 64 2 0.5 0 0\n";
        let rendition = convert_notes(
            "song",
            &[source("upper", text), source("lower", text)],
            &ConversionSettings::default(),
        )
        .unwrap();

        let channels: Vec<u8> = rendition.tracks.iter().map(|t| t.channel).collect();
        assert_eq!(channels, vec![0, 1, 2, 3]);
        assert_eq!(rendition.tracks[2].name, "lower-voice1");
        assert!(rendition.tracks.iter().all(|t| t.events.iter().all(|e| e.channel == t.channel)));
    }

    #[test]
    fn test_more_voices_than_channels() {
        let chord: String = (0..6).map(|i| format!("0 note {} 4 0.25 0 0\n", 60 + i)).collect();
        let staves = [source("a", &chord), source("b", &chord), source("c", &chord)];

        let err = convert_notes("song", &staves, &ConversionSettings::default()).unwrap_err();

        assert!(matches!(err, ConversionError::TooManyChannels { voices: 18, max: 15 }));
    }

    #[test]
    fn test_fifteen_voices_get_distinct_channels() {
        let chord: String = (0..5).map(|i| format!("0 note {} 4 0.25 0 0\n", 60 + i)).collect();
        let staves = [source("a", &chord), source("b", &chord), source("c", &chord)];

        let rendition = convert_notes("song", &staves, &ConversionSettings::default()).unwrap();

        let mut channels: Vec<u8> = rendition.tracks.iter().map(|t| t.channel).collect();
        assert_eq!(channels.len(), 15);
        assert!(!channels.contains(&9));
        channels.sort_unstable();
        channels.dedup();
        assert_eq!(channels.len(), 15);
    }

    #[test]
    fn test_repeated_pitch_releases_before_restart() {
        let settings = ConversionSettings {
            articulate: false,
            ..ConversionSettings::default()
        };
        let rendition = convert_notes(
            "song",
            &[source("unnamed-staff", "0 note 60 4 0.25 0 0\n0.25 note 60 4 0.25 0 0.25\n")],
            &settings,
        )
        .unwrap();

        let kinds: Vec<(u64, bool)> = rendition.tracks[0]
            .events
            .iter()
            .map(|e| (e.time, e.is_note_on()))
            .collect();
        assert_eq!(kinds, vec![(0, true), (384, false), (384, true), (768, false)]);
    }

    #[test]
    fn test_conductor_merges_staves() {
        let text = "0 time-sig 3 4\n0 tempo 320\n0 note 60 4 0.25 0 0\n0.75 time-sig 2 4\n0.75 note 62 4 0.25 1 0\n";
        let rendition = convert_notes(
            "song",
            &[source("upper", text), source("lower", text)],
            &ConversionSettings::default(),
        )
        .unwrap();

        assert_eq!(
            rendition.conductor,
            vec![
                ConductorEvent {
                    tick: 0,
                    kind: ConductorEventKind::Tempo {
                        micros_per_quarter: 750_000
                    }
                },
                ConductorEvent {
                    tick: 0,
                    kind: ConductorEventKind::TimeSignature {
                        numerator: 3,
                        denominator: 4
                    }
                },
                ConductorEvent {
                    tick: 1152,
                    kind: ConductorEventKind::TimeSignature {
                        numerator: 2,
                        denominator: 4
                    }
                },
            ]
        );
    }

    #[test]
    fn test_delta_mode() {
        let settings = ConversionSettings {
            time_mode: TimeMode::Delta,
            articulate: false,
            ..ConversionSettings::default()
        };
        let rendition = convert_notes(
            "song",
            &[source("unnamed-staff", "0 note 60 4 0.25 0 0\n0.5 note 62 4 0.25 0 0.5\n")],
            &settings,
        )
        .unwrap();

        let times: Vec<u64> = rendition.tracks[0].events.iter().map(|e| e.time).collect();
        assert_eq!(times, vec![0, 384, 384, 384]);
        assert_eq!(rendition.time_mode, TimeMode::Delta);
    }

    #[test]
    fn test_errors_name_the_staff() {
        let err = convert_notes("song", &[source("alto", "0 tie\n")], &ConversionSettings::default()).unwrap_err();
        assert!(matches!(err, ConversionError::Notes { ref staff, .. } if staff == "alto"));
        assert!(err.to_string().starts_with("staff 'alto': line 1"));
    }

    #[test]
    fn test_raw_events_are_time_ordered() {
        let note = |start: Rational, pitch| Note {
            line: 1,
            pitch,
            start,
            duration: Rational::new(1, 2),
            volume: 0.65,
            position: Default::default(),
            slurred: false,
        };
        let events = raw_events(&[note(Rational::from_integer(0), 60), note(Rational::new(1, 4), 64)], 3);

        let times: Vec<Rational> = events.iter().map(|e| e.time).collect();
        assert_eq!(
            times,
            vec![
                Rational::from_integer(0),
                Rational::new(1, 4),
                Rational::new(1, 2),
                Rational::new(3, 4)
            ]
        );
        assert!(events.iter().all(|e| e.channel == 3));
    }
}
