// WHY: valid multi-byte UTF-8 sequences are unlikely to occur by chance in other
// encodings, so counting valid vs. broken sequences discriminates well

use std::sync::Arc;
use tracing::debug;

use super::{match_for, Recognizer};
use crate::charset_match::CharsetMatch;
use crate::confidence::Confidence;
use crate::sample::Sample;

pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Evidence gathered by one pass over the sample
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Utf8Scan {
    pub has_bom: bool,
    pub num_valid: usize,
    pub num_invalid: usize,
}

impl Utf8Scan {
    /// Count valid and broken multi-byte sequences.
    ///
    /// A leading BOM is recorded and excluded from the counts. When a
    /// continuation byte is missing, scanning resumes at the offending byte;
    /// a sequence cut off by the end of the bytes counts as broken.
    pub fn scan(bytes: &[u8]) -> Self {
        Self::scan_window(bytes, false)
    }

    /// Like [`Utf8Scan::scan`], but when `truncated` the bytes are a prefix of a
    /// longer stream and a sequence cut off at the end is not counted either way
    pub fn scan_window(bytes: &[u8], truncated: bool) -> Self {
        let has_bom = bytes.starts_with(&UTF8_BOM);
        let mut scan = Utf8Scan {
            has_bom,
            ..Default::default()
        };

        let mut i = if has_bom { UTF8_BOM.len() } else { 0 };
        while i < bytes.len() {
            let lead = bytes[i];
            i += 1;
            if lead & 0x80 == 0 {
                continue;
            }

            let mut trail = if lead & 0xE0 == 0xC0 {
                1
            } else if lead & 0xF0 == 0xE0 {
                2
            } else if lead & 0xF8 == 0xF0 {
                3
            } else {
                scan.num_invalid += 1;
                continue;
            };

            loop {
                match bytes.get(i) {
                    Some(b) if b & 0xC0 == 0x80 => {
                        i += 1;
                        trail -= 1;
                        if trail == 0 {
                            scan.num_valid += 1;
                            break;
                        }
                    }
                    None if truncated => break,
                    // truncated sequence, or running off the end
                    _ => {
                        scan.num_invalid += 1;
                        break;
                    }
                }
            }
        }
        scan
    }

    /// First matching rule wins; `None` when no rule applies
    pub fn confidence(&self) -> Option<Confidence> {
        let Utf8Scan {
            has_bom,
            num_valid,
            num_invalid,
        } = *self;

        let score = if has_bom && num_invalid == 0 {
            100
        } else if has_bom && num_valid > num_invalid * 10 {
            80
        } else if num_valid > 3 && num_invalid == 0 {
            100
        } else if num_valid > 0 && num_invalid == 0 {
            80
        } else if num_valid == 0 && num_invalid == 0 {
            // Plain ASCII. Must beat the 10 the UTF-16 recognizers give ASCII text
            15
        } else if num_valid > num_invalid * 10 {
            // probably corrupted UTF-8
            25
        } else {
            0
        };
        Confidence::new(score)
    }
}

/// BOM check plus multi-byte sequence validation
#[derive(Debug, Default, Clone, Copy)]
pub struct Utf8Recognizer;

impl Recognizer for Utf8Recognizer {
    fn name(&self) -> &str {
        "UTF-8"
    }

    fn evaluate(&self, sample: &Arc<Sample>) -> Option<CharsetMatch> {
        let scan = Utf8Scan::scan_window(sample.bytes(), sample.is_truncated());
        let confidence = scan.confidence();
        debug!(?scan, ?confidence, "UTF-8 scan complete");
        confidence.map(|c| match_for(self, sample, c))
    }
}
