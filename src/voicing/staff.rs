//! Staff: all the voices read from one `.notes` file
//!
//! Events arrive in time order. Notes are routed to a voice, ties and slurs
//! apply to the voice that took the previous note, and score-wide marks are
//! copied into every voice that exists when they occur.

use std::collections::BTreeSet;

use log::{debug, info};

use crate::converters::ConversionSettings;
use crate::errors::NotesError;
use crate::models::{Dynamic, Rational};
use crate::parse::{parse_notes, NotesEvent, NotesEventKind, SlurEdge};

use super::voice::{Mark, Note, TimedMark, Voice};

/// Beats per bar until the first time signature
pub const DEFAULT_BEATS_PER_BAR: u32 = 4;

/// Tempo change in microseconds per quarter note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempoChange {
    pub time: Rational,
    pub micros_per_quarter: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignatureChange {
    pub time: Rational,
    pub beats: u32,
    pub beat_type: u32,
}

#[derive(Debug, Clone)]
pub struct Staff {
    pub name: String,
    voices: Vec<Voice>,
    /// Voices whose last note waits for a tied continuation
    tied: BTreeSet<usize>,
    last_voice: Option<usize>,
    last_time: Option<Rational>,
    volume: f64,
    beats_per_bar: u32,
    tempos: Vec<TempoChange>,
    time_signatures: Vec<TimeSignatureChange>,
    tolerance: Rational,
    max_voices: usize,
}

impl Staff {
    pub fn new(name: impl Into<String>, settings: &ConversionSettings) -> Self {
        Self {
            name: name.into(),
            voices: Vec::new(),
            tied: BTreeSet::new(),
            last_voice: None,
            last_time: None,
            volume: settings.initial_volume,
            beats_per_bar: DEFAULT_BEATS_PER_BAR,
            tempos: Vec::new(),
            time_signatures: Vec::new(),
            tolerance: settings.tolerance(),
            max_voices: settings.max_voices,
        }
    }

    /// Parse a `.notes` file and allocate all of its notes
    pub fn from_notes(name: impl Into<String>, text: &str, settings: &ConversionSettings) -> Result<Self, NotesError> {
        let mut staff = Self::new(name, settings);
        for event in parse_notes(text)? {
            staff.process(&event)?;
        }
        info!(
            "staff '{}': {} voices, {} notes",
            staff.name,
            staff.voices.len(),
            staff.voices.iter().map(|v| v.notes().count()).sum::<usize>()
        );
        Ok(staff)
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn tempos(&self) -> &[TempoChange] {
        &self.tempos
    }

    pub fn time_signatures(&self) -> &[TimeSignatureChange] {
        &self.time_signatures
    }

    pub fn beats_per_bar(&self) -> u32 {
        self.beats_per_bar
    }

    /// Handle one listener event
    pub fn process(&mut self, event: &NotesEvent) -> Result<(), NotesError> {
        if let Some(previous) = self.last_time {
            if event.time < previous {
                return Err(NotesError::OutOfOrder {
                    line: event.line,
                    time: event.time,
                    previous,
                });
            }
        }
        self.last_time = Some(event.time);
        debug!("{}", event);

        match &event.kind {
            NotesEventKind::Note {
                pitch,
                duration,
                position,
            } => {
                let note = Note {
                    line: event.line,
                    pitch: *pitch,
                    start: event.time,
                    duration: *duration,
                    volume: self.volume,
                    position: *position,
                    slurred: false,
                };
                self.process_note(note)
            }
            NotesEventKind::Tempo(value) => {
                let micros = (240.0 / value * 1e6).round().clamp(1.0, f64::from(0x00FF_FFFF_u32));
                self.tempos.push(TempoChange {
                    time: event.time,
                    micros_per_quarter: micros as u32,
                });
                Ok(())
            }
            NotesEventKind::Tie => {
                let index = self.preceding_voice(event)?;
                self.voices[index].prep_tie();
                self.tied.insert(index);
                Ok(())
            }
            NotesEventKind::Slur(edge) => {
                let index = self.preceding_voice(event)?;
                match edge {
                    SlurEdge::Start => self.voices[index].prep_slur(),
                    SlurEdge::End => self.voices[index].end_slur(),
                }
                Ok(())
            }
            NotesEventKind::TimeSignature { beats, beat_type } => {
                self.broadcast(event, Mark::TimeSignature { beats: *beats });
                self.beats_per_bar = *beats;
                self.time_signatures.push(TimeSignatureChange {
                    time: event.time,
                    beats: *beats,
                    beat_type: beat_type.unwrap_or(4),
                });
                Ok(())
            }
            NotesEventKind::Dynamic(dynamic) => {
                self.set_dynamic(event, *dynamic);
                Ok(())
            }
            NotesEventKind::Hairpin(kind) => {
                self.broadcast(event, Mark::Hairpin(*kind));
                Ok(())
            }
        }
    }

    fn process_note(&mut self, note: Note) -> Result<(), NotesError> {
        let index = self.find_free_voice(&note)?;
        let voice = &mut self.voices[index];
        if voice.tied_pitch().is_some() {
            debug!("using tied voice {} for pitch {}", index + 1, note.pitch);
        }
        if voice.append_note(note, self.tolerance)? {
            self.tied.remove(&index);
        }
        self.last_voice = Some(index);
        Ok(())
    }

    /// Pick the voice a note belongs to, creating one when none fits
    fn find_free_voice(&mut self, note: &Note) -> Result<usize, NotesError> {
        for &index in &self.tied {
            let voice = &self.voices[index];
            if let Some(start_bar) = voice.tie_start_bar() {
                if start_bar + 2 <= note.position.bar {
                    return Err(NotesError::TieTooLong {
                        line: note.line,
                        pitch: voice.tied_pitch().unwrap_or(note.pitch),
                        start_bar,
                        bar: note.position.bar,
                    });
                }
            }
            if voice.tied_pitch() == Some(note.pitch) {
                return Ok(index);
            }
        }

        let free = self.voices.iter().position(|voice| {
            !voice.is_busy(note.start, self.tolerance)
                && voice.tied_pitch().map_or(true, |pitch| pitch == note.pitch)
        });
        match free {
            Some(index) => Ok(index),
            None => self.create_voice(note.line),
        }
    }

    fn create_voice(&mut self, line: usize) -> Result<usize, NotesError> {
        if self.voices.len() >= self.max_voices {
            return Err(NotesError::TooManyVoices {
                line,
                max: self.max_voices,
            });
        }
        let index = self.voices.len();
        debug!("staff '{}': new voice {}", self.name, index + 1);
        self.voices.push(Voice::new(index, self.volume, self.beats_per_bar));
        Ok(index)
    }

    fn preceding_voice(&self, event: &NotesEvent) -> Result<usize, NotesError> {
        self.last_voice.ok_or(NotesError::NoPrecedingNote {
            line: event.line,
            event: event.kind.name(),
        })
    }

    fn broadcast(&mut self, event: &NotesEvent, mark: Mark) {
        let mark = TimedMark {
            line: event.line,
            time: event.time,
            mark,
        };
        for voice in &mut self.voices {
            voice.append_mark(mark);
        }
    }

    fn set_dynamic(&mut self, event: &NotesEvent, dynamic: Dynamic) {
        self.broadcast(event, Mark::Dynamic(dynamic));
        self.volume = dynamic.volume();
        for voice in &mut self.voices {
            voice.set_volume(self.volume);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voicing::VoiceItem;

    fn staff(text: &str) -> Result<Staff, NotesError> {
        Staff::from_notes("unnamed-staff", text, &ConversionSettings::default())
    }

    #[test]
    fn test_sequential_notes_share_a_voice() {
        let staff = staff(
            "0 note 60 4 0.25 0 0\n\
             0.25 note 62 4 0.25 0 0.25\n\
             0.5 note 64 2 0.5 0 0.5\n",
        )
        .unwrap();

        assert_eq!(staff.voices().len(), 1);
        assert_eq!(staff.voices()[0].notes().count(), 3);
    }

    #[test]
    fn test_chord_spreads_over_voices() {
        let staff = staff(
            "0 note 60 4 0.25 0 0\n\
             0 note 64 4 0.25 0 0\n\
             0 note 67 4 0.25 0 0\n\
             0.25 note 72 4 0.25 0 0.25\n",
        )
        .unwrap();

        assert_eq!(staff.voices().len(), 3);
        let first: Vec<u8> = staff.voices()[0].notes().map(|n| n.pitch).collect();
        assert_eq!(first, vec![60, 72]);
    }

    #[test]
    fn test_tie_merges_notes() {
        let staff = staff(
            "0 note 60 2 0.5 0 0\n\
             0 tie\n\
             0 note 64 4 0.25 0 0\n\
             0.25 note 65 4 0.25 0 0.25\n\
             0.5 note 60 2 0.5 0 0.5\n",
        )
        .unwrap();

        let tied: Vec<&Note> = staff.voices()[0].notes().collect();
        assert_eq!(tied.len(), 1);
        assert_eq!(tied[0].duration, Rational::from_integer(1));
        assert_eq!(staff.voices()[1].notes().count(), 2);
    }

    #[test]
    fn test_tie_too_long() {
        let result = staff(
            "0 note 60 1 1 0 0\n\
             0 tie\n\
             1 note 62 1 1 1 0\n\
             2 note 60 1 1 2 0\n",
        );
        assert!(matches!(result, Err(NotesError::TieTooLong { start_bar: 0, bar: 2, .. })));
    }

    #[test]
    fn test_tie_without_note() {
        assert!(matches!(
            staff("0 tie\n"),
            Err(NotesError::NoPrecedingNote { line: 1, event: "tie" })
        ));
        assert!(matches!(
            staff("0 slur -1\n"),
            Err(NotesError::NoPrecedingNote { line: 1, event: "slur" })
        ));
    }

    #[test]
    fn test_too_many_voices() {
        let chord: String = (0..7).map(|i| format!("0 note {} 4 0.25 0 0\n", 60 + i)).collect();
        assert!(matches!(staff(&chord), Err(NotesError::TooManyVoices { line: 7, max: 6 })));
    }

    #[test]
    fn test_out_of_order_events() {
        assert!(matches!(
            staff("0.5 note 60 4 0.25 0 0.5\n0.25 note 62 4 0.25 0 0.25\n"),
            Err(NotesError::OutOfOrder { line: 2, .. })
        ));
    }

    #[test]
    fn test_marks_and_conductor_changes() {
        let staff = staff(
            "0 time-sig 6 8\n\
             0 tempo 320\n\
             0 note 60 4 0.25 0 0\n\
             0.25 dynamic f\n\
             0.25 note 62 4 0.25 0 0.5\n\
             0.5 note 64 4 0.25 0 0.5\n\
             0.5 note 67 4 0.25 0 0.5\n",
        )
        .unwrap();

        assert_eq!(staff.beats_per_bar(), 6);
        assert_eq!(
            staff.tempos(),
            &[TempoChange {
                time: Rational::from_integer(0),
                micros_per_quarter: 750_000
            }]
        );
        assert_eq!(staff.time_signatures()[0].beat_type, 8);

        let voice = &staff.voices()[0];
        assert!(voice
            .items()
            .iter()
            .any(|item| matches!(item, VoiceItem::Mark(TimedMark { mark: Mark::Dynamic(Dynamic::F), .. }))));
        assert_eq!(voice.initial_beats_per_bar(), 6);

        // created after the dynamic
        let late = &staff.voices()[1];
        assert_eq!(late.initial_volume(), Dynamic::F.volume());
        assert_eq!(late.items().len(), 1);
    }
}
