//! Performer: turns a voice's notes and marks into played notes
//!
//! The first pass walks the voice in arrival order and works out how fast
//! each hairpin changes the volume, which is only known once the closing
//! dynamic is reached. The second pass walks marks before notes at equal
//! times and applies volume, staccato and beat stress to every note.

use log::{debug, info};

use crate::converters::ConversionSettings;
use crate::errors::NotesError;
use crate::models::{Rational, ScorePosition};
use crate::utils::rational_to_f64;
use crate::voicing::{Mark, Note, Voice, VoiceItem};

/// Stressed positions inside a bar, as fractions of the bar
pub fn beat_structure(beats_per_bar: u32) -> Vec<Rational> {
    match beats_per_bar {
        6 | 8 => vec![Rational::from_integer(0), Rational::new(1, 2)],
        _ => vec![Rational::from_integer(0)],
    }
}

/// A crescendo or decrescendo with its volume change per beat
#[derive(Debug, Clone, Copy, PartialEq)]
struct Hairpin {
    start: ScorePosition,
    rate: f64,
}

pub struct Performer<'a> {
    voice: &'a Voice,
    settings: &'a ConversionSettings,
}

impl<'a> Performer<'a> {
    pub fn new(voice: &'a Voice, settings: &'a ConversionSettings) -> Self {
        Self { voice, settings }
    }

    /// Played notes in start order
    pub fn perform(&self) -> Result<Vec<Note>, NotesError> {
        let hairpins = self.hairpin_rates()?;
        let mut hairpins = hairpins.into_iter();

        let mut items: Vec<&VoiceItem> = self.voice.items().iter().collect();
        items.sort_by_key(|item| (item.time(), matches!(item, VoiceItem::Note(_))));

        let stress = f64::from(self.settings.stress_increment) / 127.0;
        let staccato = self.settings.staccato_ratio();
        let mut volume = self.voice.initial_volume();
        let mut beats_per_bar = self.voice.initial_beats_per_bar();
        let mut structure = beat_structure(beats_per_bar);
        let mut hairpin: Option<Hairpin> = None;
        let mut played = Vec::new();

        for item in items {
            match item {
                VoiceItem::Mark(mark) => match mark.mark {
                    Mark::Dynamic(dynamic) => {
                        volume = dynamic.volume();
                        hairpin = None;
                    }
                    Mark::Hairpin(_) => hairpin = hairpins.next(),
                    Mark::TimeSignature { beats } => {
                        beats_per_bar = beats;
                        structure = beat_structure(beats);
                        debug!("voice {} sees time-sig {} {:?}", self.voice.index + 1, beats, structure);
                    }
                },
                VoiceItem::Note(note) => {
                    let mut note = note.clone();
                    if self.settings.articulate {
                        let increment = hairpin.map_or(0.0, |h| {
                            rational_to_f64((note.position - h.start).as_beats(beats_per_bar)) * h.rate
                        });
                        note.volume = (volume + increment).clamp(0.0, 1.0);
                        note.staccato(staccato);
                        for &stressed in &structure {
                            if note.position.position == stressed {
                                let accent = if stressed == Rational::from_integer(0) {
                                    stress
                                } else {
                                    stress * 2.0 / 3.0
                                };
                                note.accent(accent);
                            }
                        }
                    }
                    played.push(note);
                }
            }
        }

        info!("voice {}: performed {} notes", self.voice.index + 1, played.len());
        Ok(played)
    }

    /// Volume change per beat of every hairpin, in the order they open
    fn hairpin_rates(&self) -> Result<Vec<Hairpin>, NotesError> {
        let mut rates = Vec::new();
        let mut volume = self.voice.initial_volume();
        let mut beats_per_bar = self.voice.initial_beats_per_bar();
        let mut position = ScorePosition::default();
        let mut open: Option<(ScorePosition, f64)> = None;

        for item in self.voice.items() {
            match item {
                VoiceItem::Note(note) => position = note.position,
                VoiceItem::Mark(mark) => match mark.mark {
                    Mark::Hairpin(_) => {
                        if open.is_some() {
                            return Err(NotesError::NestedHairpin { line: mark.line });
                        }
                        open = Some((position, volume));
                    }
                    Mark::Dynamic(dynamic) => {
                        volume = dynamic.volume();
                        if let Some((start, start_volume)) = open.take() {
                            let beats = rational_to_f64((position - start).as_beats(beats_per_bar));
                            let rate = if beats == 0.0 {
                                0.0
                            } else {
                                (volume - start_volume) / beats
                            };
                            debug!("hairpin from {} to {}: {:.4} per beat", start, position, rate);
                            rates.push(Hairpin { start, rate });
                        }
                    }
                    Mark::TimeSignature { beats } => beats_per_bar = beats,
                },
            }
        }

        if let Some((start, _)) = open {
            debug!("hairpin from {} never closed", start);
            rates.push(Hairpin { start, rate: 0.0 });
        }
        Ok(rates)
    }
}

/// Perform one voice with the given settings
pub fn perform_voice(voice: &Voice, settings: &ConversionSettings) -> Result<Vec<Note>, NotesError> {
    Performer::new(voice, settings).perform()
}
