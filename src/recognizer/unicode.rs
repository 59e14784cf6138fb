// WHY: wide Unicode forms are recognized from their code unit shape alone: a BOM,
// zero bytes interleaved with Latin text, or code points that cannot exist

use std::sync::Arc;
use tracing::debug;

use super::{match_for, Recognizer};
use crate::charset_match::CharsetMatch;
use crate::confidence::Confidence;
use crate::sample::Sample;

/// Only the head of the sample is inspected for UTF-16
const UTF16_BYTES_TO_CHECK: usize = 30;

/// Starting score for UTF-16; ASCII text stays at this level
const UTF16_BASE_CONFIDENCE: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

impl Endian {
    fn unit16(self, a: u8, b: u8) -> u32 {
        match self {
            Endian::Big => u16::from_be_bytes([a, b]) as u32,
            Endian::Little => u16::from_le_bytes([a, b]) as u32,
        }
    }

    pub(crate) fn unit32(self, bytes: &[u8]) -> u32 {
        let quad = [bytes[0], bytes[1], bytes[2], bytes[3]];
        match self {
            Endian::Big => u32::from_be_bytes(quad),
            Endian::Little => u32::from_le_bytes(quad),
        }
    }
}

/// Zero code units count against UTF-16, Latin-range ones for it
fn adjust_confidence(code_unit: u32, confidence: i32) -> i32 {
    let adjusted = if code_unit == 0 {
        confidence - 10
    } else if (0x20..=0xFF).contains(&code_unit) || code_unit == 0x0A {
        confidence + 10
    } else {
        confidence
    };
    adjusted.clamp(0, 100)
}

/// UTF-16 in one byte order
#[derive(Debug, Clone, Copy)]
pub struct Utf16Recognizer {
    endian: Endian,
}

impl Utf16Recognizer {
    pub fn new(endian: Endian) -> Self {
        Self { endian }
    }

    fn score(&self, input: &[u8]) -> i32 {
        let bytes_to_check = input.len().min(UTF16_BYTES_TO_CHECK);
        let mut confidence = UTF16_BASE_CONFIDENCE;

        for index in (0..bytes_to_check.saturating_sub(1)).step_by(2) {
            let code_unit = self.endian.unit16(input[index], input[index + 1]);
            if index == 0 && code_unit == 0xFEFF {
                confidence = 100;
                // FF FE 00 00 is the UTF-32LE BOM
                if self.endian == Endian::Little && input.len() >= 4 && input[2] == 0 && input[3] == 0 {
                    confidence = 0;
                }
                break;
            }
            confidence = adjust_confidence(code_unit, confidence);
            if confidence == 0 || confidence == 100 {
                break;
            }
        }

        if bytes_to_check < 4 && confidence < 100 {
            0
        } else {
            confidence
        }
    }
}

impl Recognizer for Utf16Recognizer {
    fn name(&self) -> &str {
        match self.endian {
            Endian::Big => "UTF-16BE",
            Endian::Little => "UTF-16LE",
        }
    }

    fn evaluate(&self, sample: &Arc<Sample>) -> Option<CharsetMatch> {
        let confidence = Confidence::from_score(self.score(sample.bytes()));
        debug!(encoding = self.name(), ?confidence, "UTF-16 scan complete");
        confidence.map(|c| match_for(self, sample, c))
    }
}

/// UTF-32 in one byte order
#[derive(Debug, Clone, Copy)]
pub struct Utf32Recognizer {
    endian: Endian,
}

impl Utf32Recognizer {
    pub fn new(endian: Endian) -> Self {
        Self { endian }
    }

    fn score(&self, input: &[u8]) -> i32 {
        let limit = input.len() / 4 * 4;
        if limit == 0 {
            return 0;
        }

        let has_bom = self.endian.unit32(input) == 0xFEFF;
        let mut num_valid = 0usize;
        let mut num_invalid = 0usize;
        for quad in input[..limit].chunks_exact(4) {
            let ch = self.endian.unit32(quad);
            if ch >= 0x10FFFF || (0xD800..=0xDFFF).contains(&ch) {
                num_invalid += 1;
            } else {
                num_valid += 1;
            }
        }

        if has_bom && num_invalid == 0 {
            100
        } else if has_bom && num_valid > num_invalid * 10 {
            80
        } else if num_valid > 3 && num_invalid == 0 {
            100
        } else if num_valid > 0 && num_invalid == 0 {
            80
        } else if num_valid > num_invalid * 10 {
            25
        } else {
            0
        }
    }
}

impl Recognizer for Utf32Recognizer {
    fn name(&self) -> &str {
        match self.endian {
            Endian::Big => "UTF-32BE",
            Endian::Little => "UTF-32LE",
        }
    }

    fn evaluate(&self, sample: &Arc<Sample>) -> Option<CharsetMatch> {
        let confidence = Confidence::from_score(self.score(sample.bytes()));
        debug!(encoding = self.name(), ?confidence, "UTF-32 scan complete");
        confidence.map(|c| match_for(self, sample, c))
    }
}

/// Byte order named by a UTF-32 label; `encoding_rs` has no UTF-32 decoder
pub(crate) fn utf32_label(name: &str) -> Option<Endian> {
    if name.eq_ignore_ascii_case("UTF-32BE") {
        Some(Endian::Big)
    } else if name.eq_ignore_ascii_case("UTF-32LE") {
        Some(Endian::Little)
    } else {
        None
    }
}

/// Incremental UTF-32 decoder.
///
/// Invalid code points and a trailing partial unit become U+FFFD; a leading
/// BOM is dropped.
#[derive(Debug)]
pub(crate) struct Utf32Decoder {
    endian: Endian,
    pending: Vec<u8>,
    at_start: bool,
}

impl Utf32Decoder {
    pub(crate) fn new(endian: Endian) -> Self {
        Self {
            endian,
            pending: Vec::with_capacity(4),
            at_start: true,
        }
    }

    /// Decode all of `src` into `dst`; `last` flushes a dangling partial unit
    pub(crate) fn decode_to_string(&mut self, src: &[u8], dst: &mut String, last: bool) {
        self.pending.extend_from_slice(src);
        let whole = self.pending.len() / 4 * 4;
        for quad in self.pending[..whole].chunks_exact(4) {
            let unit = self.endian.unit32(quad);
            if self.at_start {
                self.at_start = false;
                if unit == 0xFEFF {
                    continue;
                }
            }
            dst.push(char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER));
        }
        self.pending.drain(..whole);

        if last && !self.pending.is_empty() {
            self.pending.clear();
            dst.push(char::REPLACEMENT_CHARACTER);
        }
    }
}
