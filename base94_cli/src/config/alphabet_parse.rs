//! Validates a configured alphabet on deserialization.

use std::fmt;

use base94::Alphabet;
use serde::de::{Deserializer, Error, Visitor};

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Alphabet>, D::Error>
where
    D: Deserializer<'de>,
{
    struct AlphabetVisitor;
    impl Visitor<'_> for AlphabetVisitor {
        type Value = Option<Alphabet>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a string of 94 distinct printable ascii characters")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: Error,
        {
            v.parse().map(Some).map_err(E::custom)
        }
    }

    deserializer.deserialize_str(AlphabetVisitor)
}
