//! Export operations for the WASM API
//!
//! MIDI events are handed to players as raw message bytes. Writing a
//! Standard MIDI File is left to the caller.

use wasm_bindgen::prelude::*;
use js_sys;

use crate::api::helpers::{conversion_error, deserialize};
use crate::models::MidiEvent;
use crate::renderers::encode_stream;
use crate::wasm_info;

/// Encode sequenced events as back-to-back MIDI messages
///
/// Timing is not encoded; each event becomes its 3-byte status message.
///
/// # Parameters
/// * `events` - Array of `MidiEvent` objects, as returned by `sequenceEvents`
///
/// # Returns
/// Message bytes as Uint8Array
#[wasm_bindgen(js_name = encodeTrack)]
pub fn encode_track(events: JsValue) -> Result<js_sys::Uint8Array, JsValue> {
    let events: Vec<MidiEvent> = deserialize(events, "Invalid MIDI events")?;
    wasm_info!("encodeTrack called with {} events", events.len());

    let bytes = encode_stream(&events).map_err(conversion_error)?;

    // Convert to Uint8Array for JavaScript
    let uint8_array = js_sys::Uint8Array::new_with_length(bytes.len() as u32);
    uint8_array.copy_from(&bytes);

    wasm_info!("encodeTrack completed: {} bytes", bytes.len());
    Ok(uint8_array)
}
