use serde::Serialize;
use std::fmt;

/// Relative plausibility of a match, 1 to 100 inclusive.
///
/// Zero is not representable: "no signal" is expressed by a recognizer
/// returning no match at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Confidence(u8);

impl Confidence {
    pub const MAX: Confidence = Confidence(100);

    /// Returns `None` for 0 and for anything above 100.
    pub const fn new(value: u8) -> Option<Self> {
        if value == 0 || value > 100 {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Clamp an arbitrary score into range; scores at or below zero give `None`.
    pub fn from_score(score: i32) -> Option<Self> {
        Self::new(score.clamp(0, 100) as u8)
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
