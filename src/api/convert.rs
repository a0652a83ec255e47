//! Conversion operations for the WASM API
//!
//! - `.notes` files to per-voice MIDI event tracks
//! - Raw note starts/stops to ordered MIDI events
//! - Listener output file names to `(stem, staff)` pairs

use wasm_bindgen::prelude::*;

use crate::api::helpers::{conversion_error, deserialize, serialize, settings_from_js};
use crate::converters::StaffSource;
use crate::models::RawEvent;
use crate::sequencer::SequencerOptions;
use crate::{wasm_info, wasm_log, wasm_warn};

// ============================================================================
// Notes Conversion
// ============================================================================

/// Convert the `.notes` files of one score
///
/// # Parameters
/// * `title` - Score name, usually the shared file stem
/// * `staves` - Array of `{ name, text }`, one per `.notes` file
/// * `settings` - Optional `ConversionSettings` object
///
/// # Returns
/// `Rendition` object with conductor events and one track per voice
#[wasm_bindgen(js_name = convertNotes)]
pub fn convert_notes(title: String, staves: JsValue, settings: JsValue) -> Result<JsValue, JsValue> {
    wasm_info!("convertNotes called for '{}'", title);

    let staves: Vec<StaffSource> = deserialize(staves, "Invalid staves")?;
    let settings = settings_from_js(settings)?;
    wasm_log!("  {} staves, tpq={}", staves.len(), settings.ticks_per_quarter);

    let rendition = crate::converters::convert_notes(&title, &staves, &settings).map_err(conversion_error)?;

    if rendition.tracks.is_empty() {
        wasm_warn!("convertNotes: '{}' has no notes", title);
    }
    wasm_info!(
        "convertNotes completed: {} tracks, {} events",
        rendition.tracks.len(),
        rendition.event_count()
    );
    serialize(&rendition, "Failed to serialize rendition")
}

// ============================================================================
// Event Sequencing
// ============================================================================

/// Order raw note starts/stops into MIDI note-on/note-off events
///
/// # Parameters
/// * `events` - Array of `{ time, pitch, kind, channel, velocity }`
/// * `options` - Optional `{ ticks_per_quarter, time_mode, resort }`
#[wasm_bindgen(js_name = sequenceEvents)]
pub fn sequence_events(events: JsValue, options: JsValue) -> Result<JsValue, JsValue> {
    let events: Vec<RawEvent> = deserialize(events, "Invalid events")?;
    let options: SequencerOptions = if options.is_undefined() || options.is_null() {
        SequencerOptions::default()
    } else {
        deserialize(options, "Invalid sequencer options")?
    };
    wasm_log!("sequenceEvents called with {} events", events.len());

    let midi = crate::sequencer::sequence_events(events, &options).map_err(conversion_error)?;
    serialize(&midi, "Failed to serialize MIDI events")
}

// ============================================================================
// File Names
// ============================================================================

/// Split `stem-staff.notes` into `{ stem, staff }`
#[wasm_bindgen(js_name = parseNotesFileName)]
pub fn parse_notes_file_name(name: String) -> Result<JsValue, JsValue> {
    let parsed = crate::parse::parse_file_name(&name).map_err(conversion_error)?;
    serialize(&parsed, "Failed to serialize file name")
}

/// Group `.notes` paths by score stem, then by staff
#[wasm_bindgen(js_name = buildNotesFileMap)]
pub fn build_notes_file_map(paths: JsValue) -> Result<JsValue, JsValue> {
    let paths: Vec<String> = deserialize(paths, "Invalid paths")?;
    let map = crate::parse::build_file_map(paths.iter().map(String::as_str)).map_err(conversion_error)?;
    wasm_log!("buildNotesFileMap: {} scores", map.len());
    serialize(&map, "Failed to serialize file map")
}
