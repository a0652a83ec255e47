//! Models module for the notes-to-MIDI converter
//!
//! This module contains the data models shared by every stage of the
//! pipeline: raw listener events, sequenced MIDI events, score positions
//! and dynamics.

pub mod dynamics;
pub mod events;
pub mod score_pos;
pub mod serde_helpers;

use num_rational::Rational64;

/// Musical time, measured in whole notes (a quarter note is `1/4`)
pub type Rational = Rational64;

// Re-export commonly used types
pub use dynamics::{Dynamic, UnknownDynamic};
pub use events::*;
pub use score_pos::ScorePosition;
