//! Listener output file names
//!
//! The event listener writes one file per staff, named
//! `<stem>-<staff>.notes` where `<stem>.ly` was the LilyPond input and the
//! staff may be `unnamed-staff`.

use std::collections::BTreeMap;

use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::FileNameError;

static NOTES_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[/\\])([^/\\.]+)\.notes$").expect("NOTES_FILE pattern"));

static NOTES_STAFF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^.-]+)-(.+)$").expect("NOTES_STAFF pattern"));

/// Stem and staff parts of a `.notes` file name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotesFileName {
    pub stem: String,
    pub staff: String,
}

/// stem -> staff -> path
pub type FileMap = BTreeMap<String, BTreeMap<String, String>>;

/// Split a path to a `.notes` file into its stem and staff parts
pub fn parse_file_name(path: &str) -> Result<NotesFileName, FileNameError> {
    let file = NOTES_FILE
        .captures(path)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| FileNameError::NotNotesFile(path.to_string()))?
        .as_str();

    let caps = NOTES_STAFF
        .captures(file)
        .ok_or_else(|| FileNameError::MissingStaff(path.to_string()))?;

    let name = NotesFileName {
        stem: caps[1].to_string(),
        staff: caps[2].to_string(),
    };
    info!("parse_file_name: stem '{}' staff '{}'", name.stem, name.staff);
    Ok(name)
}

/// Group `.notes` paths by stem, then by staff
pub fn build_file_map<'a, I>(paths: I) -> Result<FileMap, FileNameError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut map = FileMap::new();
    for path in paths {
        let name = parse_file_name(path)?;
        map.entry(name.stem)
            .or_default()
            .insert(name.staff, path.to_string());
    }
    Ok(map)
}
