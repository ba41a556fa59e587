use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// An Authenticator Attestation ID identifies an authenticator model.
///
/// It is formatted as `V#M`, a four hex digit vendor ID and a four hex digit model ID separated by
/// a hash sign, e.g. `ABCD#0001`. The hex digits are case insensitive but kept as given.
#[typeshare(serialized_as = "String")]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Aaid(String);

/// The value is not of the `hex4#hex4` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidAaid(pub String);

impl fmt::Display for InvalidAaid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not an AAID of the form hex4#hex4", self.0)
    }
}

impl std::error::Error for InvalidAaid {}

impl Aaid {
    /// Length of the textual representation.
    pub const LEN: usize = 9;

    /// The textual representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the UTF-8 payload of a `TAG_AAID` leaf.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, InvalidAaid> {
        std::str::from_utf8(bytes)
            .map_err(|_| InvalidAaid(String::from_utf8_lossy(bytes).into_owned()))?
            .parse()
    }

    fn is_valid(value: &str) -> bool {
        let bytes = value.as_bytes();
        bytes.len() == Self::LEN
            && bytes[4] == b'#'
            && bytes[..4]
                .iter()
                .chain(&bytes[5..])
                .all(u8::is_ascii_hexdigit)
    }
}

impl FromStr for Aaid {
    type Err = InvalidAaid;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Self::is_valid(s) {
            Ok(Self(s.to_owned()))
        } else {
            Err(InvalidAaid(s.to_owned()))
        }
    }
}

impl TryFrom<String> for Aaid {
    type Error = InvalidAaid;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if Self::is_valid(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidAaid(value))
        }
    }
}

impl From<Aaid> for String {
    fn from(aaid: Aaid) -> Self {
        aaid.0
    }
}

impl fmt::Display for Aaid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Aaid;

    #[test]
    fn accepts_hex4_hash_hex4() {
        for valid in ["ABCD#0001", "abcd#ef01", "0000#FFFF"] {
            assert!(valid.parse::<Aaid>().is_ok(), "{valid}");
        }
    }

    #[test]
    fn rejects_everything_else() {
        for invalid in [
            "",
            "ABCD0001",
            "ABCD#001",
            "ABCD#00011",
            "GBCD#0001",
            "ABCD-0001",
            "ÄBC#0001",
        ] {
            assert!(invalid.parse::<Aaid>().is_err(), "{invalid}");
        }
    }

    #[test]
    fn deserialization_validates() {
        serde_json::from_str::<Aaid>(r#""ABCD#0001""#).expect("valid aaid");
        serde_json::from_str::<Aaid>(r#""nope""#).expect_err("invalid aaid");
    }
}
