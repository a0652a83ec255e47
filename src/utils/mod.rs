//! Utility modules for the notes-to-MIDI converter
//!
//! Shared numeric helpers used by the parser, the voice allocator and the
//! sequencer.

pub mod rational;

// Re-export commonly used helpers
pub use rational::*;
