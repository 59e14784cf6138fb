// WHY: recognizers are an open set, so the detector holds boxed trait objects and
// third parties can register their own without touching the engine

use std::sync::Arc;

use crate::charset_match::CharsetMatch;
use crate::confidence::Confidence;
use crate::sample::Sample;

pub mod unicode;
pub mod utf8;

pub use unicode::{Endian, Utf16Recognizer, Utf32Recognizer};
pub use utf8::{Utf8Recognizer, Utf8Scan};

/// A stateless heuristic that scores one candidate encoding against a sample.
///
/// Implementations must not fail on malformed input: malformed bytes are the
/// evidence being scored. Return `None` when the sample carries no
/// discriminating signal at all; a weak signal is a low-confidence match.
pub trait Recognizer: Send + Sync {
    /// Canonical encoding name this recognizer reports
    fn name(&self) -> &str;

    /// ISO language code, for recognizers tied to one language
    fn language(&self) -> Option<&str> {
        None
    }

    fn evaluate(&self, sample: &Arc<Sample>) -> Option<CharsetMatch>;
}

/// Build a match carrying the recognizer's own name and language
pub fn match_for<R: Recognizer + ?Sized>(
    recognizer: &R,
    sample: &Arc<Sample>,
    confidence: Confidence,
) -> CharsetMatch {
    CharsetMatch::new(
        Arc::clone(sample),
        confidence,
        recognizer.name(),
        recognizer.language().map(str::to_string),
    )
}

/// Built-in recognizers in registration order
pub fn default_recognizers() -> Vec<Box<dyn Recognizer>> {
    vec![
        Box::new(Utf8Recognizer),
        Box::new(Utf16Recognizer::new(Endian::Big)),
        Box::new(Utf16Recognizer::new(Endian::Little)),
        Box::new(Utf32Recognizer::new(Endian::Big)),
        Box::new(Utf32Recognizer::new(Endian::Little)),
    ]
}
