//! Event sequencer: raw note starts/stops to ordered MIDI events
//!
//! The sequencer is a pure transformation. It pulls [`RawEvent`]s from any
//! iterator and yields [`MidiEvent`]s lazily, one tick at a time:
//!
//! 1. **Validate** each event (pitch/channel range, non-negative time,
//!    non-decreasing time unless re-sorting is enabled)
//! 2. **Group** consecutive events that land on the same tick
//! 3. **Resolve** the group: stops of notes that were already sounding are
//!    applied before any start, so a note may end exactly where the next
//!    note of the same key begins. A note shorter than one tick gets its
//!    note-off right after its note-on, on the same tick.
//!
//! Pairing is tracked per `(pitch, channel)`. A stop without a sounding note
//! is a [`SequenceError::MalformedEvent`]; a start while the key is still
//! sounding is a [`SequenceError::OverlappingNote`]; input that ends with a
//! sounding note is a [`SequenceError::UnterminatedNote`].
//!
//! # Basic Usage
//!
//! ```ignore
//! use lilynotes_wasm::models::{RawEvent, Rational};
//! use lilynotes_wasm::sequencer::{sequence_events, SequencerOptions};
//!
//! let events = vec![
//!     RawEvent::start(Rational::from_integer(0), 60, 0, 90),
//!     RawEvent::stop(Rational::from_integer(1), 60, 0),
//! ];
//! let midi = sequence_events(events, &SequencerOptions::default())?;
//! assert_eq!(midi[1].time, 1536);
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::iter::Peekable;
use std::vec;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::errors::SequenceError;
use crate::models::{MidiEvent, MidiEventKind, Rational, RawEvent, TimeMode};
use crate::renderers::midi::defaults::DEFAULT_TPQ;
use crate::utils::whole_notes_to_ticks;

/// Options that control sequencing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerOptions {
    /// MIDI resolution used to quantize musical time
    pub ticks_per_quarter: u16,
    /// Whether emitted times are absolute ticks or deltas
    pub time_mode: TimeMode,
    /// Stably sort the input by time instead of rejecting out-of-order events
    pub resort: bool,
}

impl Default for SequencerOptions {
    fn default() -> Self {
        Self {
            ticks_per_quarter: DEFAULT_TPQ,
            time_mode: TimeMode::Absolute,
            resort: false,
        }
    }
}

/// Sequence a finite event list, collecting the result
pub fn sequence_events<I>(events: I, options: &SequencerOptions) -> Result<Vec<MidiEvent>, SequenceError>
where
    I: IntoIterator<Item = RawEvent>,
{
    Sequencer::new(*options).sequence(events).collect()
}

/// Reusable sequencer configured once and applied to many tracks
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequencer {
    options: SequencerOptions,
}

impl Sequencer {
    pub fn new(options: SequencerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SequencerOptions {
        &self.options
    }

    /// Start sequencing `events`
    ///
    /// Without re-sorting the input is consumed lazily; with re-sorting it
    /// is collected and stably sorted by time first.
    pub fn sequence<I>(&self, events: I) -> Sequence<I::IntoIter>
    where
        I: IntoIterator<Item = RawEvent>,
    {
        let source = if self.options.resort {
            let mut indexed: Vec<(usize, RawEvent)> = events.into_iter().enumerate().collect();
            indexed.sort_by(|a, b| a.1.time.cmp(&b.1.time));
            debug!("sequencer: re-sorted {} events", indexed.len());
            Source::Sorted(indexed.into_iter())
        } else {
            Source::Streaming(events.into_iter().enumerate())
        };

        Sequence {
            source: source.peekable(),
            options: self.options,
            previous_time: None,
            last_tick: 0,
            sounding: BTreeMap::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }
}

/// Input events tagged with their position in the original input
pub enum Source<I: Iterator<Item = RawEvent>> {
    Streaming(std::iter::Enumerate<I>),
    Sorted(vec::IntoIter<(usize, RawEvent)>),
}

impl<I: Iterator<Item = RawEvent>> Iterator for Source<I> {
    type Item = (usize, RawEvent);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Source::Streaming(inner) => inner.next(),
            Source::Sorted(inner) => inner.next(),
        }
    }
}

/// Lazy iterator of sequenced events
///
/// Yields `Err` at most once; the iterator is finished afterwards.
pub struct Sequence<I: Iterator<Item = RawEvent>> {
    source: Peekable<Source<I>>,
    options: SequencerOptions,
    previous_time: Option<Rational>,
    last_tick: u64,
    /// Sounding notes by (pitch, channel), with their start time
    sounding: BTreeMap<(u8, u8), Rational>,
    pending: VecDeque<MidiEvent>,
    finished: bool,
}

impl<I: Iterator<Item = RawEvent>> Sequence<I> {
    fn tick_of(&self, time: Rational) -> i64 {
        whole_notes_to_ticks(time, self.options.ticks_per_quarter)
    }

    /// Pull and validate the next input event
    fn next_input(&mut self) -> Result<Option<(usize, RawEvent)>, SequenceError> {
        let Some((index, event)) = self.source.next() else {
            return Ok(None);
        };

        if event.pitch > 127 {
            return Err(SequenceError::PitchOutOfRange { index, pitch: event.pitch });
        }
        if event.channel > 15 {
            return Err(SequenceError::ChannelOutOfRange { index, channel: event.channel });
        }
        if event.time < Rational::from_integer(0) {
            return Err(SequenceError::NegativeTime { index, time: event.time });
        }
        if let Some(previous) = self.previous_time {
            if event.time < previous {
                return Err(SequenceError::OutOfOrder { index, time: event.time, previous });
            }
        }
        self.previous_time = Some(event.time);

        Ok(Some((index, event)))
    }

    /// Read every event on the next tick and queue the resulting MIDI events
    ///
    /// Returns `false` once the input is exhausted.
    fn fill_group(&mut self) -> Result<bool, SequenceError> {
        let Some(first) = self.next_input()? else {
            return Ok(false);
        };
        let tick = self.tick_of(first.1.time);

        let mut group = vec![first];
        while let Some(&(_, peeked)) = self.source.peek() {
            if self.tick_of(peeked.time) != tick {
                break;
            }
            match self.next_input()? {
                Some(item) => group.push(item),
                None => break,
            }
        }

        trace!("sequencer: tick {} has {} events", tick, group.len());
        let tick = u64::try_from(tick).unwrap_or(0);

        // Stops of notes sounding before this tick go first
        let mut deferred: Vec<(usize, RawEvent)> = Vec::new();
        for &(index, event) in group.iter().filter(|(_, e)| !e.is_start()) {
            if self.sounding.remove(&event.key()).is_some() {
                self.emit(tick, MidiEventKind::NoteOff, &event);
            } else {
                deferred.push((index, event));
            }
        }

        for &(index, event) in group.iter().filter(|(_, e)| e.is_start()) {
            if self.sounding.contains_key(&event.key()) {
                return Err(SequenceError::OverlappingNote {
                    index,
                    pitch: event.pitch,
                    channel: event.channel,
                    time: event.time,
                });
            }
            self.sounding.insert(event.key(), event.time);
            self.emit(tick, MidiEventKind::NoteOn, &event);

            // A note shorter than one tick starts and stops on the same tick
            let short = deferred
                .iter()
                .position(|(_, stop)| stop.key() == event.key() && stop.time > event.time);
            if let Some(position) = short {
                let (_, stop) = deferred.remove(position);
                self.sounding.remove(&event.key());
                self.emit(tick, MidiEventKind::NoteOff, &stop);
            }
        }

        if let Some(&(index, event)) = deferred.first() {
            return Err(SequenceError::MalformedEvent {
                index,
                pitch: event.pitch,
                channel: event.channel,
                time: event.time,
            });
        }

        Ok(true)
    }

    fn emit(&mut self, tick: u64, kind: MidiEventKind, event: &RawEvent) {
        let time = match self.options.time_mode {
            TimeMode::Absolute => tick,
            TimeMode::Delta => tick - self.last_tick,
        };
        self.last_tick = tick;

        self.pending.push_back(match kind {
            MidiEventKind::NoteOn => MidiEvent::note_on(time, event.pitch, event.velocity, event.channel),
            MidiEventKind::NoteOff => MidiEvent::note_off(time, event.pitch, event.channel),
        });
    }
}

impl<I: Iterator<Item = RawEvent>> Iterator for Sequence<I> {
    type Item = Result<MidiEvent, SequenceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }
            if self.finished {
                return None;
            }

            match self.fill_group() {
                Ok(true) => continue,
                Ok(false) => {
                    self.finished = true;
                    let (&(pitch, channel), &time) = self.sounding.iter().next()?;
                    return Some(Err(SequenceError::UnterminatedNote { pitch, channel, time }));
                }
                Err(e) => {
                    self.finished = true;
                    self.pending.clear();
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Convert absolute-tick events to delta ticks
pub fn to_delta(events: &[MidiEvent]) -> Vec<MidiEvent> {
    let mut prev_tick = 0u64;
    events
        .iter()
        .map(|event| {
            let delta = event.time.saturating_sub(prev_tick);
            prev_tick = event.time;
            MidiEvent { time: delta, ..*event }
        })
        .collect()
}

/// Convert delta-tick events back to absolute ticks
pub fn to_absolute(events: &[MidiEvent]) -> Vec<MidiEvent> {
    let mut tick = 0u64;
    events
        .iter()
        .map(|event| {
            tick += event.time;
            MidiEvent { time: tick, ..*event }
        })
        .collect()
}
