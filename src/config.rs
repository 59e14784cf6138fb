use serde::{Deserialize, Serialize};

use crate::sample::DEFAULT_SAMPLE_CAP;

/// Configuration for detection runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Maximum look-ahead read from a stream before detection (default: 8000 bytes)
    pub sample_cap: usize,
    /// Matches below this confidence are not reported (default: 0, report all)
    pub min_confidence: u8,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sample_cap: DEFAULT_SAMPLE_CAP,
            min_confidence: 0,
        }
    }
}

impl DetectorConfig {
    /// WHY: a zero cap would hand every recognizer an empty sample
    pub fn effective_sample_cap(&self) -> usize {
        self.sample_cap.max(1)
    }
}
