//! `.notes` line grammar
//!
//! Every line is `<time> <type> <args...>`, whitespace separated, where
//! `<time>` is the moment in whole notes:
//!
//! ```text
//! 0.000000 time-sig 3 4
//! 0.000000 tempo 320
//! 0.000000 dynamic mf
//! 0.000000 note 67 4 0.250000 1 0.000000 point-and-click 3 4
//! 0.250000 tie
//! 0.250000 slur -1
//! 0.250000 cresc
//! ```
//!
//! Note arguments are: MIDI pitch, LilyPond length, duration in whole notes,
//! bar number and position inside the bar (fraction of the bar). Anything
//! after the bar position is origin information and is ignored.

use std::fmt;

use log::warn;

use crate::errors::NotesError;
use crate::models::{Dynamic, Rational, ScorePosition};
use crate::utils::parse_rational;

/// One parsed listener event
#[derive(Debug, Clone, PartialEq)]
pub struct NotesEvent {
    /// 1-based line number in the `.notes` file
    pub line: usize,
    /// Moment in whole notes
    pub time: Rational,
    pub kind: NotesEventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NotesEventKind {
    Note {
        pitch: u8,
        duration: Rational,
        position: ScorePosition,
    },
    /// Four times the quarter-note BPM, as the listener reports it
    Tempo(f64),
    Tie,
    Slur(SlurEdge),
    TimeSignature { beats: u32, beat_type: Option<u32> },
    Dynamic(Dynamic),
    Hairpin(HairpinKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlurEdge {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HairpinKind {
    Crescendo,
    Decrescendo,
}

impl NotesEventKind {
    /// Event type as written in the `.notes` file
    pub fn name(&self) -> &'static str {
        match self {
            NotesEventKind::Note { .. } => "note",
            NotesEventKind::Tempo(_) => "tempo",
            NotesEventKind::Tie => "tie",
            NotesEventKind::Slur(_) => "slur",
            NotesEventKind::TimeSignature { .. } => "time-sig",
            NotesEventKind::Dynamic(_) => "dynamic",
            NotesEventKind::Hairpin(HairpinKind::Crescendo) => "cresc",
            NotesEventKind::Hairpin(HairpinKind::Decrescendo) => "decresc",
        }
    }
}

impl fmt::Display for NotesEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} @ {}: {}", self.line, self.time, self.kind.name())
    }
}

/// Parse a whole `.notes` file
///
/// Blank lines are skipped; unrecognised event types are skipped with a
/// warning; anything else that does not parse is an error.
pub fn parse_notes(text: &str) -> Result<Vec<NotesEvent>, NotesError> {
    let mut events = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if let Some(event) = parse_line(index + 1, line)? {
            events.push(event);
        }
    }
    Ok(events)
}

/// Parse one line; `Ok(None)` for blank or unrecognised lines
pub fn parse_line(line: usize, text: &str) -> Result<Option<NotesEvent>, NotesError> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.is_empty() {
        return Ok(None);
    }
    let parser = LineParser { line, fields: &fields };

    let time = parser.rational(0, "time")?;
    if time < Rational::from_integer(0) {
        return Err(parser.error(format!("negative time {}", time)));
    }
    let event_type = parser.field(1, "event type")?;

    let kind = match event_type {
        "note" => {
            let pitch = parser.pitch(2)?;
            parser.field(3, "note length")?;
            let duration = parser.rational(4, "duration")?;
            if duration <= Rational::from_integer(0) {
                return Err(parser.error(format!("note duration {} must be positive", duration)));
            }
            let bar = parser.integer(5, "bar number")?;
            let position = parser.rational(6, "bar position")?;
            NotesEventKind::Note {
                pitch,
                duration,
                position: ScorePosition::new(bar, position),
            }
        }
        "tempo" => {
            let value = parser.float(2, "tempo")?;
            if value <= 0.0 {
                return Err(parser.error(format!("tempo {} must be positive", value)));
            }
            NotesEventKind::Tempo(value)
        }
        "tie" => NotesEventKind::Tie,
        "slur" => match parser.field(2, "slur direction")? {
            "-1" => NotesEventKind::Slur(SlurEdge::Start),
            "1" => NotesEventKind::Slur(SlurEdge::End),
            other => return Err(parser.error(format!("slur: unexpected arg {}", other))),
        },
        "time-sig" => {
            let beats = parser.integer(2, "beats per bar")?;
            if beats <= 0 {
                return Err(parser.error(format!("beats per bar {} must be positive", beats)));
            }
            let beat_type = match fields.get(3) {
                Some(_) => Some(parser.integer(3, "beat type")?),
                None => None,
            };
            NotesEventKind::TimeSignature {
                beats: beats as u32,
                beat_type: beat_type.map(|b| b.max(1) as u32),
            }
        }
        "dynamic" => {
            let mark = parser.field(2, "dynamic mark")?;
            NotesEventKind::Dynamic(mark.parse::<Dynamic>().map_err(|e| parser.error(e.to_string()))?)
        }
        "cresc" => NotesEventKind::Hairpin(HairpinKind::Crescendo),
        "decresc" => NotesEventKind::Hairpin(HairpinKind::Decrescendo),
        other => {
            warn!("event not recognised: {} at {} (line {})", other, fields[0], line);
            return Ok(None);
        }
    };

    Ok(Some(NotesEvent { line, time, kind }))
}

/// Field accessors that report errors against the current line
struct LineParser<'a> {
    line: usize,
    fields: &'a [&'a str],
}

impl<'a> LineParser<'a> {
    fn error(&self, message: impl Into<String>) -> NotesError {
        NotesError::Parse {
            line: self.line,
            message: message.into(),
        }
    }

    fn field(&self, index: usize, what: &str) -> Result<&'a str, NotesError> {
        self.fields
            .get(index)
            .copied()
            .ok_or_else(|| self.error(format!("missing {}", what)))
    }

    fn rational(&self, index: usize, what: &str) -> Result<Rational, NotesError> {
        let text = self.field(index, what)?;
        parse_rational(text).ok_or_else(|| self.error(format!("invalid {} '{}'", what, text)))
    }

    fn integer(&self, index: usize, what: &str) -> Result<i64, NotesError> {
        let text = self.field(index, what)?;
        text.parse()
            .map_err(|_| self.error(format!("invalid {} '{}'", what, text)))
    }

    fn float(&self, index: usize, what: &str) -> Result<f64, NotesError> {
        let text = self.field(index, what)?;
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(self.error(format!("invalid {} '{}'", what, text))),
        }
    }

    fn pitch(&self, index: usize) -> Result<u8, NotesError> {
        let value = self.integer(index, "pitch")?;
        u8::try_from(value)
            .ok()
            .filter(|pitch| *pitch <= 127)
            .ok_or_else(|| self.error(format!("pitch {} is outside the MIDI range 0-127", value)))
    }
}
