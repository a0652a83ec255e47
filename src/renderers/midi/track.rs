//! Conversion of sequenced events into midly track events and live bytes

use midly::live::LiveEvent;
use midly::{MetaMessage, MidiMessage, Track, TrackEvent, TrackEventKind};

use crate::errors::RenderError;
use crate::models::{ConductorEvent, ConductorEventKind, MidiEvent, MidiEventKind, TimeMode};

/// Largest value a MIDI variable-length quantity can hold
const MAX_VLQ: u64 = 0x0FFF_FFFF;

/// Largest tempo a Set Tempo meta event can hold
const MAX_TEMPO_MICROS: u32 = 0x00FF_FFFF;

/// Build a `midly` track from sequenced note events
///
/// # Arguments
/// * `events` - Sequenced events, sorted by time
/// * `mode` - How `events` express time; absolute ticks are converted to deltas
///
/// # Returns
/// Track events with delta times, terminated by `EndOfTrack`
pub fn track_events(events: &[MidiEvent], mode: TimeMode) -> Result<Track<'static>, RenderError> {
    let mut track = Vec::with_capacity(events.len() + 1);

    for event in events {
        track.push(TrackEvent {
            delta: vlq(event.time)?.into(),
            kind: TrackEventKind::Midi {
                channel: event.channel.into(),
                message: midi_message(event),
            },
        });
    }

    if mode == TimeMode::Absolute {
        convert_to_delta_times(&mut track);
    }

    track.push(end_of_track());
    Ok(track)
}

/// Build the tempo and time signature events of a conductor track
pub fn conductor_track(conductor: &[ConductorEvent]) -> Result<Track<'static>, RenderError> {
    let mut sorted = conductor.to_vec();
    sorted.sort_by_key(|e| e.tick);

    let mut track = Vec::with_capacity(sorted.len() + 1);
    for event in &sorted {
        let message = match event.kind {
            ConductorEventKind::Tempo { micros_per_quarter } => {
                if micros_per_quarter == 0 || micros_per_quarter > MAX_TEMPO_MICROS {
                    return Err(RenderError::Midi(format!(
                        "tempo of {} microseconds per quarter is out of range",
                        micros_per_quarter
                    )));
                }
                MetaMessage::Tempo(micros_per_quarter.into())
            }
            ConductorEventKind::TimeSignature { numerator, denominator } => {
                if !denominator.is_power_of_two() {
                    return Err(RenderError::Midi(format!(
                        "time signature denominator {} is not a power of two",
                        denominator
                    )));
                }
                MetaMessage::TimeSignature(
                    numerator,
                    denominator.trailing_zeros() as u8,
                    24, // MIDI clocks per metronome click
                    8,  // 32nd notes per quarter note
                )
            }
        };
        track.push(TrackEvent {
            delta: vlq(event.tick)?.into(),
            kind: TrackEventKind::Meta(message),
        });
    }

    convert_to_delta_times(&mut track);
    track.push(end_of_track());
    Ok(track)
}

/// Encode a single event as raw MIDI message bytes (no timing)
pub fn encode_live(event: &MidiEvent) -> Result<Vec<u8>, RenderError> {
    let live = LiveEvent::Midi {
        channel: event.channel.into(),
        message: midi_message(event),
    };
    let mut out = Vec::with_capacity(3);
    live.write_std(&mut out)
        .map_err(|e| RenderError::Midi(format!("Failed to encode MIDI message: {}", e)))?;
    Ok(out)
}

/// Encode events back to back, the way a live MIDI port would receive them
pub fn encode_stream(events: &[MidiEvent]) -> Result<Vec<u8>, RenderError> {
    let mut out = Vec::with_capacity(events.len() * 3);
    for event in events {
        out.extend(encode_live(event)?);
    }
    Ok(out)
}

fn midi_message(event: &MidiEvent) -> MidiMessage {
    match event.kind {
        MidiEventKind::NoteOn => MidiMessage::NoteOn {
            key: event.pitch.into(),
            vel: event.velocity.into(),
        },
        MidiEventKind::NoteOff => MidiMessage::NoteOff {
            key: event.pitch.into(),
            vel: 0.into(),
        },
    }
}

fn vlq(ticks: u64) -> Result<u32, RenderError> {
    if ticks > MAX_VLQ {
        return Err(RenderError::DeltaOverflow(ticks));
    }
    Ok(ticks as u32)
}

fn end_of_track() -> TrackEvent<'static> {
    TrackEvent {
        delta: 0.into(),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    }
}

/// Convert absolute tick times to delta times (time since previous event)
fn convert_to_delta_times(events: &mut [TrackEvent]) {
    let mut prev_tick = 0u32;
    for event in events.iter_mut() {
        let current_tick = event.delta.as_int();
        let delta = current_tick.saturating_sub(prev_tick);
        event.delta = delta.into();
        prev_tick = current_tick;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_note() -> Vec<MidiEvent> {
        vec![
            MidiEvent::note_on(0, 60, 100, 0),
            MidiEvent::note_off(1536, 60, 0),
        ]
    }

    #[test]
    fn test_track_events_absolute_become_deltas() {
        let events = vec![
            MidiEvent::note_on(100, 60, 64, 0),
            MidiEvent::note_off(200, 60, 0),
            MidiEvent::note_on(200, 62, 64, 0),
            MidiEvent::note_off(500, 62, 0),
        ];

        let track = track_events(&events, TimeMode::Absolute).expect("Failed to build track");

        let deltas: Vec<u32> = track.iter().map(|e| e.delta.as_int()).collect();
        assert_eq!(deltas, vec![100, 100, 0, 300, 0]);
        assert!(matches!(track.last().unwrap().kind, TrackEventKind::Meta(MetaMessage::EndOfTrack)));
    }

    #[test]
    fn test_track_events_delta_mode_is_untouched() {
        let events = vec![
            MidiEvent::note_on(10, 60, 64, 3),
            MidiEvent::note_off(20, 60, 3),
        ];

        let track = track_events(&events, TimeMode::Delta).expect("Failed to build track");

        assert_eq!(track[0].delta.as_int(), 10);
        assert_eq!(track[1].delta.as_int(), 20);
        match track[0].kind {
            TrackEventKind::Midi { channel, message } => {
                assert_eq!(channel.as_int(), 3);
                assert_eq!(message, MidiMessage::NoteOn { key: 60u8.into(), vel: 64u8.into() });
            }
            other => panic!("expected a note on, got {:?}", other),
        }
    }

    #[test]
    fn test_track_events_rejects_huge_ticks() {
        let events = vec![MidiEvent::note_on(MAX_VLQ + 1, 60, 64, 0)];
        assert_eq!(
            track_events(&events, TimeMode::Absolute),
            Err(RenderError::DeltaOverflow(MAX_VLQ + 1))
        );
    }

    #[test]
    fn test_conductor_track() {
        let conductor = vec![
            ConductorEvent {
                tick: 1536,
                kind: ConductorEventKind::Tempo { micros_per_quarter: 750_000 },
            },
            ConductorEvent {
                tick: 0,
                kind: ConductorEventKind::TimeSignature { numerator: 6, denominator: 8 },
            },
            ConductorEvent {
                tick: 0,
                kind: ConductorEventKind::Tempo { micros_per_quarter: 500_000 },
            },
        ];

        let track = conductor_track(&conductor).expect("Failed to build conductor track");

        assert_eq!(track.len(), 4);
        assert_eq!(track[0].kind, TrackEventKind::Meta(MetaMessage::TimeSignature(6, 3, 24, 8)));
        assert_eq!(track[1].kind, TrackEventKind::Meta(MetaMessage::Tempo(500_000u32.into())));
        assert_eq!(track[2].delta.as_int(), 1536);
        assert_eq!(track[2].kind, TrackEventKind::Meta(MetaMessage::Tempo(750_000u32.into())));
    }

    #[test]
    fn test_conductor_track_rejects_odd_denominator() {
        let conductor = vec![ConductorEvent {
            tick: 0,
            kind: ConductorEventKind::TimeSignature { numerator: 3, denominator: 5 },
        }];
        assert!(conductor_track(&conductor).is_err());
    }

    #[test]
    fn test_encode_live() {
        let events = single_note();
        assert_eq!(encode_live(&events[0]).unwrap(), vec![0x90, 60, 100]);
        assert_eq!(encode_live(&events[1]).unwrap(), vec![0x80, 60, 0]);
    }

    #[test]
    fn test_encode_stream_uses_channel() {
        let events = vec![
            MidiEvent::note_on(0, 64, 80, 2),
            MidiEvent::note_off(384, 64, 2),
        ];
        assert_eq!(encode_stream(&events).unwrap(), vec![0x92, 64, 80, 0x82, 64, 0]);
    }
}
