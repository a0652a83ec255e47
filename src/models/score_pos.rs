//! Bar-relative score positions
//!
//! The listener reports every note's bar number and its position inside the
//! bar as a fraction of the bar. Positions are needed to find stressed beats
//! and to measure how many beats a hairpin spans.

use std::fmt;
use std::ops::Sub;

use serde::{Deserialize, Serialize};

use crate::models::Rational;
use crate::utils::rational_to_f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ScorePosition {
    pub bar: i64,
    /// Fraction of the bar already elapsed, in `[0, 1)`
    #[serde(with = "crate::models::serde_helpers::rational")]
    pub position: Rational,
}

impl ScorePosition {
    pub fn new(bar: i64, position: Rational) -> Self {
        Self { bar, position }
    }

    /// Build from `[bar, position]`; a fractional bar number is truncated
    pub fn from_array(array: [Rational; 2]) -> Self {
        Self::new(array[0].trunc().to_integer(), array[1])
    }

    pub fn as_array(&self) -> [Rational; 2] {
        [Rational::from_integer(self.bar), self.position]
    }

    /// Distance from the start of bar 0 in beats
    pub fn as_beats(&self, beats_per_bar: u32) -> Rational {
        (Rational::from_integer(self.bar) + self.position) * Rational::from_integer(i64::from(beats_per_bar))
    }

    pub fn bar_number(&self) -> i64 {
        self.bar
    }
}

impl Sub for ScorePosition {
    type Output = ScorePosition;

    fn sub(self, other: ScorePosition) -> ScorePosition {
        let mut bar = self.bar - other.bar;
        let mut position = self.position - other.position;
        if position < Rational::from_integer(0) {
            position += Rational::from_integer(1);
            bar -= 1;
        }
        ScorePosition { bar, position }
    }
}

impl fmt::Display for ScorePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[bar: {}, {}]", self.bar, rational_to_f64(self.position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(bar: i64, numer: i64, denom: i64) -> ScorePosition {
        ScorePosition::new(bar, Rational::new(numer, denom))
    }

    #[test]
    fn test_constructor_and_display() {
        let thing = pos(1, 1, 2);
        assert_eq!(thing.as_array(), [Rational::from_integer(1), Rational::new(1, 2)]);
        assert_eq!(thing.to_string(), "[bar: 1, 0.5]");
    }

    #[test]
    fn test_from_array() {
        let array = [Rational::from_integer(2), Rational::new(1, 4)];
        assert_eq!(ScorePosition::from_array(array).as_array(), array);
        assert_eq!(ScorePosition::from_array([Rational::new(5, 2), Rational::new(1, 4)]).bar, 2);
    }

    #[test]
    fn test_as_beats() {
        assert_eq!(pos(1, 1, 4).as_beats(3), Rational::new(15, 4));
        assert_eq!(pos(1, 1, 2).as_beats(4), Rational::from_integer(6));
    }

    #[test]
    fn test_equality() {
        assert_eq!(pos(1, 1, 4), pos(1, 2, 8));
        assert_ne!(pos(1, 1, 4), pos(2, 2, 3));
    }

    #[test]
    fn test_subtraction() {
        // 6 beats - 2 beats in 4/4
        assert_eq!(pos(1, 1, 2) - pos(0, 1, 2), pos(1, 0, 1));
        // borrow: 6 beats - 3 beats leaves 3 beats
        let diff = pos(1, 1, 2) - pos(0, 3, 4);
        assert_eq!(diff, pos(0, 3, 4));
        assert_eq!(diff.as_beats(4), Rational::from_integer(3));
    }

    #[test]
    fn test_subtraction_same_position_is_zero() {
        assert_eq!(pos(3, 1, 3) - pos(3, 1, 3), ScorePosition::default());
    }
}
