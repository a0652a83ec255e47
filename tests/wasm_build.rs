//! WASM build test
//!
//! This module tests that the JavaScript-facing API works in a browser.

#![cfg(target_arch = "wasm32")]

use lilynotes_wasm::api::{convert_notes, encode_track, parse_notes_file_name, sequence_events};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn staves(text: &str) -> JsValue {
    let staves = vec![lilynotes_wasm::StaffSource {
        name: "unnamed-staff".to_string(),
        text: text.to_string(),
    }];
    serde_wasm_bindgen::to_value(&staves).unwrap()
}

#[wasm_bindgen_test]
fn test_convert_notes_with_default_settings() {
    let result = convert_notes("song".to_string(), staves("0 note 60 1 1 0 0\n"), JsValue::UNDEFINED);
    let rendition: lilynotes_wasm::Rendition = serde_wasm_bindgen::from_value(result.unwrap()).unwrap();

    assert_eq!(rendition.tracks.len(), 1);
    assert_eq!(rendition.tracks[0].events.len(), 2);
}

#[wasm_bindgen_test]
fn test_convert_notes_error_is_a_string() {
    let err = convert_notes("song".to_string(), staves("0 tie\n"), JsValue::NULL).unwrap_err();
    assert!(err.as_string().unwrap().contains("no preceding note"));
}

#[wasm_bindgen_test]
fn test_sequence_and_encode() {
    let events = vec![
        lilynotes_wasm::RawEvent::start(lilynotes_wasm::Rational::from_integer(0), 60, 0, 90),
        lilynotes_wasm::RawEvent::stop(lilynotes_wasm::Rational::from_integer(1), 60, 0),
    ];
    let midi = sequence_events(serde_wasm_bindgen::to_value(&events).unwrap(), JsValue::UNDEFINED).unwrap();

    let bytes = encode_track(midi).unwrap().to_vec();
    assert_eq!(bytes, vec![0x90, 60, 90, 0x80, 60, 0]);
}

#[wasm_bindgen_test]
fn test_parse_notes_file_name() {
    let parsed = parse_notes_file_name("hymn-alto.notes".to_string()).unwrap();
    let parsed: lilynotes_wasm::parse::NotesFileName = serde_wasm_bindgen::from_value(parsed).unwrap();

    assert_eq!(parsed.stem, "hymn");
    assert_eq!(parsed.staff, "alto");
}
