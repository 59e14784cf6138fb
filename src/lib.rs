pub mod charset_match;
pub mod confidence;
pub mod config;
pub mod detector;
pub mod error;
pub mod recognizer;
pub mod report;
pub mod sample;

// Re-export main types for convenient access
pub use charset_match::{strip_directional_suffix, CharsetMatch, TextReader};
pub use confidence::Confidence;
pub use config::DetectorConfig;
pub use detector::CharsetDetector;
pub use error::{DecodeError, DecodeResult};
pub use recognizer::{Recognizer, Utf8Recognizer};
pub use report::{collect_input_files, detect_file, FileReport, MatchSummary, ReportOptions};
pub use sample::{Sample, DEFAULT_SAMPLE_CAP};
