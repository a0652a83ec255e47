//! Serde serialization helpers for ensuring consistent JSON output
//!
//! Rationals travel as `"n/d"` strings so no precision is lost on the way
//! to JavaScript. Deserialization also accepts decimals and plain numbers.

/// `#[serde(with = "crate::models::serde_helpers::rational")]`
pub mod rational {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    use crate::models::Rational;
    use crate::utils::parse_rational;

    pub fn serialize<S>(value: &Rational, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Rational, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(RationalVisitor)
    }

    struct RationalVisitor;

    impl<'de> Visitor<'de> for RationalVisitor {
        type Value = Rational;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a rational as \"n/d\", a decimal string or a number")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Rational, E> {
            parse_rational(value)
                .ok_or_else(|| E::invalid_value(de::Unexpected::Str(value), &self))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Rational, E> {
            Ok(Rational::from_integer(value))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Rational, E> {
            i64::try_from(value)
                .map(Rational::from_integer)
                .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(value), &self))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Rational, E> {
            Rational::approximate_float(value)
                .ok_or_else(|| E::invalid_value(de::Unexpected::Float(value), &self))
        }
    }
}
