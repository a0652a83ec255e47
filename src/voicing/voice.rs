//! A voice: one monophonic line of a staff
//!
//! A voice holds a chronological list of notes and marks plus the state
//! needed while notes are still arriving: when it becomes free, whether its
//! last note is tied to the next one, and whether a slur is open.

use crate::errors::NotesError;
use crate::models::{Dynamic, Rational, ScorePosition};
use crate::parse::HairpinKind;

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// Line of the `.notes` file that started this note
    pub line: usize,
    pub pitch: u8,
    /// Onset in whole notes
    pub start: Rational,
    /// Length in whole notes
    pub duration: Rational,
    /// Fraction of full velocity, 0..=1
    pub volume: f64,
    pub position: ScorePosition,
    /// Inside a slur: played legato
    pub slurred: bool,
}

impl Note {
    pub fn end(&self) -> Rational {
        self.start + self.duration
    }

    /// Lengthen by a tied continuation
    pub fn extend(&mut self, by: Rational) {
        self.duration += by;
    }

    /// Shorten by `factor` unless the note is slurred
    pub fn staccato(&mut self, factor: Rational) {
        if !self.slurred {
            self.duration *= factor;
        }
    }

    pub fn accent(&mut self, increment: f64) {
        self.volume = (self.volume + increment).min(1.0);
    }

    pub fn velocity(&self) -> u8 {
        ((self.volume * 127.0).floor() as i64).clamp(1, 127) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mark {
    Dynamic(Dynamic),
    Hairpin(HairpinKind),
    TimeSignature { beats: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedMark {
    pub line: usize,
    pub time: Rational,
    pub mark: Mark,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VoiceItem {
    Note(Note),
    Mark(TimedMark),
}

impl VoiceItem {
    pub fn time(&self) -> Rational {
        match self {
            VoiceItem::Note(note) => note.start,
            VoiceItem::Mark(mark) => mark.time,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Voice {
    /// Position of the voice in its staff, from 0
    pub index: usize,
    items: Vec<VoiceItem>,
    /// Index into `items` of the most recent note
    last_note: Option<usize>,
    busy_until: Rational,
    /// Bar where a pending tie started
    tie_start_bar: Option<i64>,
    slurred: bool,
    volume: f64,
    initial_volume: f64,
    initial_beats_per_bar: u32,
}

impl Voice {
    /// A new voice inherits the staff's current volume and meter
    pub fn new(index: usize, volume: f64, beats_per_bar: u32) -> Self {
        Self {
            index,
            items: Vec::new(),
            last_note: None,
            busy_until: Rational::from_integer(0),
            tie_start_bar: None,
            slurred: false,
            volume,
            initial_volume: volume,
            initial_beats_per_bar: beats_per_bar,
        }
    }

    pub fn items(&self) -> &[VoiceItem] {
        &self.items
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.items.iter().filter_map(|item| match item {
            VoiceItem::Note(note) => Some(note),
            VoiceItem::Mark(_) => None,
        })
    }

    pub fn last_note(&self) -> Option<&Note> {
        match self.items.get(self.last_note?) {
            Some(VoiceItem::Note(note)) => Some(note),
            _ => None,
        }
    }

    fn last_note_mut(&mut self) -> Option<&mut Note> {
        match self.items.get_mut(self.last_note?) {
            Some(VoiceItem::Note(note)) => Some(note),
            _ => None,
        }
    }

    pub fn busy_until(&self) -> Rational {
        self.busy_until
    }

    /// Whether a note starting at `time` would overlap this voice's last note
    pub fn is_busy(&self, time: Rational, tolerance: Rational) -> bool {
        time < self.busy_until - tolerance
    }

    pub fn tie_start_bar(&self) -> Option<i64> {
        self.tie_start_bar
    }

    /// Pitch waiting for a tied continuation
    pub fn tied_pitch(&self) -> Option<u8> {
        self.tie_start_bar?;
        self.last_note().map(|note| note.pitch)
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }

    pub fn initial_volume(&self) -> f64 {
        self.initial_volume
    }

    pub fn initial_beats_per_bar(&self) -> u32 {
        self.initial_beats_per_bar
    }

    /// Append a note, or extend the last note if a tie is pending
    ///
    /// Returns `true` when the note completed a tie.
    pub fn append_note(&mut self, mut note: Note, tolerance: Rational) -> Result<bool, NotesError> {
        let untied = if self.tie_start_bar.is_some() && self.last_note.is_some() {
            let gap = if note.start > self.busy_until {
                note.start - self.busy_until
            } else {
                self.busy_until - note.start
            };
            if gap > tolerance {
                return Err(NotesError::TieGap {
                    line: note.line,
                    pitch: note.pitch,
                    start: note.start,
                    busy_until: self.busy_until,
                });
            }

            self.busy_until += note.duration;
            self.tie_start_bar = None;
            if let Some(last) = self.last_note_mut() {
                last.extend(note.duration);
            }
            true
        } else {
            note.volume = self.volume;
            self.busy_until = note.end();
            self.last_note = Some(self.items.len());
            self.items.push(VoiceItem::Note(note));
            false
        };

        if self.slurred {
            if let Some(last) = self.last_note_mut() {
                last.slurred = true;
            }
        }

        Ok(untied)
    }

    pub fn append_mark(&mut self, mark: TimedMark) {
        self.items.push(VoiceItem::Mark(mark));
    }

    /// Flag the last note as tied to the next note of the same pitch
    pub fn prep_tie(&mut self) {
        if let Some(bar) = self.last_note().map(|note| note.position.bar) {
            self.tie_start_bar = Some(bar);
        }
    }

    /// Open a slur on the last note
    pub fn prep_slur(&mut self) {
        self.slurred = true;
        if let Some(last) = self.last_note_mut() {
            last.slurred = true;
        }
    }

    /// Close the slur; the closing note may be shortened again
    pub fn end_slur(&mut self) {
        self.slurred = false;
        if let Some(last) = self.last_note_mut() {
            last.slurred = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(numer: i64, denom: i64) -> Rational {
        Rational::new(numer, denom)
    }

    fn note(pitch: u8, start: Rational, duration: Rational) -> Note {
        Note {
            line: 1,
            pitch,
            start,
            duration,
            volume: 0.0,
            position: ScorePosition::default(),
            slurred: false,
        }
    }

    #[test]
    fn test_append_tracks_busy_time() {
        let mut voice = Voice::new(0, 0.65, 4);
        voice.append_note(note(60, r(0, 1), r(1, 4)), r(1, 1536)).unwrap();

        assert_eq!(voice.busy_until(), r(1, 4));
        assert!(voice.is_busy(r(1, 8), r(1, 1536)));
        assert!(!voice.is_busy(r(1, 4), r(1, 1536)));
        assert_eq!(voice.last_note().unwrap().volume, 0.65);
    }

    #[test]
    fn test_tie_extends_last_note() {
        let mut voice = Voice::new(0, 0.65, 4);
        voice.append_note(note(60, r(0, 1), r(1, 4)), r(1, 1536)).unwrap();
        voice.prep_tie();
        assert_eq!(voice.tied_pitch(), Some(60));

        let untied = voice.append_note(note(60, r(1, 4), r(1, 2)), r(1, 1536)).unwrap();

        assert!(untied);
        assert_eq!(voice.notes().count(), 1);
        assert_eq!(voice.last_note().unwrap().duration, r(3, 4));
        assert_eq!(voice.busy_until(), r(3, 4));
        assert_eq!(voice.tied_pitch(), None);
    }

    #[test]
    fn test_tie_with_gap_is_an_error() {
        let mut voice = Voice::new(0, 0.65, 4);
        voice.append_note(note(60, r(0, 1), r(1, 4)), r(1, 1536)).unwrap();
        voice.prep_tie();

        assert!(matches!(
            voice.append_note(note(60, r(1, 2), r(1, 4)), r(1, 1536)),
            Err(NotesError::TieGap { pitch: 60, .. })
        ));
    }

    #[test]
    fn test_slur_marks_notes() {
        let mut voice = Voice::new(0, 0.65, 4);
        voice.append_note(note(60, r(0, 1), r(1, 4)), r(1, 1536)).unwrap();
        voice.prep_slur();
        voice.append_note(note(62, r(1, 4), r(1, 4)), r(1, 1536)).unwrap();
        voice.append_note(note(64, r(1, 2), r(1, 4)), r(1, 1536)).unwrap();
        voice.end_slur();
        voice.append_note(note(65, r(3, 4), r(1, 4)), r(1, 1536)).unwrap();

        let slurred: Vec<bool> = voice.notes().map(|n| n.slurred).collect();
        assert_eq!(slurred, vec![true, true, false, false]);
    }

    #[test]
    fn test_note_velocity_and_staccato() {
        let mut n = note(60, r(0, 1), r(1, 4));
        n.volume = 0.65;
        assert_eq!(n.velocity(), 82);
        n.accent(1.0);
        assert_eq!(n.velocity(), 127);

        n.staccato(r(7, 8));
        assert_eq!(n.duration, r(7, 32));

        n.slurred = true;
        n.staccato(r(7, 8));
        assert_eq!(n.duration, r(7, 32));
    }

    #[test]
    fn test_silent_note_still_sounds() {
        let n = note(60, r(0, 1), r(1, 4));
        assert_eq!(n.velocity(), 1);
    }
}
