//! Dynamic marks and the volumes they map to
//!
//! The volume table matches the one LilyPond's own MIDI backend uses
//! (`scm/midi.scm`), so a converted score sounds like LilyPond's MIDI output.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dynamic {
    Sf,
    Fffff,
    Ffff,
    Fff,
    Ff,
    F,
    Mf,
    Mp,
    P,
    Pp,
    Ppp,
    Pppp,
    Ppppp,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown dynamic mark '{0}'")]
pub struct UnknownDynamic(pub String);

impl Dynamic {
    /// Volume as a fraction of full MIDI velocity
    pub fn volume(self) -> f64 {
        match self {
            Dynamic::Sf => 1.00,
            Dynamic::Fffff => 0.95,
            Dynamic::Ffff => 0.92,
            Dynamic::Fff => 0.85,
            Dynamic::Ff => 0.80,
            Dynamic::F => 0.75,
            Dynamic::Mf => 0.68,
            Dynamic::Mp => 0.61,
            Dynamic::P => 0.55,
            Dynamic::Pp => 0.49,
            Dynamic::Ppp => 0.42,
            Dynamic::Pppp => 0.34,
            Dynamic::Ppppp => 0.25,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Dynamic::Sf => "sf",
            Dynamic::Fffff => "fffff",
            Dynamic::Ffff => "ffff",
            Dynamic::Fff => "fff",
            Dynamic::Ff => "ff",
            Dynamic::F => "f",
            Dynamic::Mf => "mf",
            Dynamic::Mp => "mp",
            Dynamic::P => "p",
            Dynamic::Pp => "pp",
            Dynamic::Ppp => "ppp",
            Dynamic::Pppp => "pppp",
            Dynamic::Ppppp => "ppppp",
        }
    }
}

impl FromStr for Dynamic {
    type Err = UnknownDynamic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "sf" => Dynamic::Sf,
            "fffff" => Dynamic::Fffff,
            "ffff" => Dynamic::Ffff,
            "fff" => Dynamic::Fff,
            "ff" => Dynamic::Ff,
            "f" => Dynamic::F,
            "mf" => Dynamic::Mf,
            "mp" => Dynamic::Mp,
            "p" => Dynamic::P,
            "pp" => Dynamic::Pp,
            "ppp" => Dynamic::Ppp,
            "pppp" => Dynamic::Pppp,
            "ppppp" => Dynamic::Ppppp,
            other => return Err(UnknownDynamic(other.to_string())),
        })
    }
}

impl fmt::Display for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dynamics() {
        assert_eq!("mf".parse::<Dynamic>(), Ok(Dynamic::Mf));
        assert_eq!("ppppp".parse::<Dynamic>(), Ok(Dynamic::Ppppp));
        assert_eq!("sfz".parse::<Dynamic>(), Err(UnknownDynamic("sfz".to_string())));
    }

    #[test]
    fn test_volumes_increase_with_loudness() {
        let ladder = [
            Dynamic::Ppppp, Dynamic::Pppp, Dynamic::Ppp, Dynamic::Pp, Dynamic::P,
            Dynamic::Mp, Dynamic::Mf, Dynamic::F, Dynamic::Ff, Dynamic::Fff,
            Dynamic::Ffff, Dynamic::Fffff, Dynamic::Sf,
        ];
        for pair in ladder.windows(2) {
            assert!(pair[0].volume() < pair[1].volume(), "{} should be softer than {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_name_round_trips_through_from_str() {
        assert_eq!(Dynamic::Fff.name().parse::<Dynamic>(), Ok(Dynamic::Fff));
    }
}
