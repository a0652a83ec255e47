//! LilyPond Notes-to-MIDI WASM Module
//!
//! Converts the `.notes` event logs written by LilyPond's event-listener
//! extension into MIDI note-on/note-off event streams, one track per voice.
//! The core is plain Rust; `api` exposes it to JavaScript.

pub mod api;
pub mod converters;
pub mod errors;
pub mod models;
pub mod parse;
pub mod performer;
pub mod renderers;
pub mod sequencer;
pub mod utils;
pub mod voicing;

// Re-export commonly used types
pub use converters::{convert_notes, ConversionSettings, Rendition, StaffSource, VoiceTrack};
pub use errors::*;
pub use models::*;
pub use sequencer::{sequence_events, Sequencer, SequencerOptions};

use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    // A second instance in the same page finds the logger already set
    #[cfg(feature = "console_log")]
    let _ = console_log::init_with_level(log::Level::Debug);

    log::info!("Notes-to-MIDI WASM module initialized");
}
