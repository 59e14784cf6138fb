// WHY: the detector owns the recognizer registry and the current sample; every
// recognizer sees the same unmodified sample and only the outputs are ranked

use std::io::{self, Read, Seek};
use std::sync::Arc;
use tracing::{debug, info};

use crate::charset_match::CharsetMatch;
use crate::config::DetectorConfig;
use crate::recognizer::{default_recognizers, Recognizer};
use crate::sample::Sample;

/// Runs every registered recognizer over a sample and ranks the results
pub struct CharsetDetector {
    recognizers: Vec<Box<dyn Recognizer>>,
    sample: Option<Arc<Sample>>,
    config: DetectorConfig,
}

impl Default for CharsetDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl CharsetDetector {
    /// Create detector with the built-in recognizers and default configuration
    pub fn new() -> Self {
        Self::with_config(DetectorConfig::default())
    }

    pub fn with_config(config: DetectorConfig) -> Self {
        Self::with_recognizers(default_recognizers(), config)
    }

    /// Create detector with a custom recognizer set, evaluated in the given order
    pub fn with_recognizers(recognizers: Vec<Box<dyn Recognizer>>, config: DetectorConfig) -> Self {
        debug!("Created charset detector with {} recognizers", recognizers.len());
        Self {
            recognizers,
            sample: None,
            config,
        }
    }

    /// Add a recognizer after the existing ones
    pub fn register(&mut self, recognizer: Box<dyn Recognizer>) -> &mut Self {
        self.recognizers.push(recognizer);
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Distinct encoding names the registered recognizers can report
    pub fn supported_encodings(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::with_capacity(self.recognizers.len());
        for recognizer in &self.recognizers {
            if !names.contains(&recognizer.name()) {
                names.push(recognizer.name());
            }
        }
        names
    }

    /// Replace the sample under evaluation
    pub fn set_sample(&mut self, sample: Sample) -> &mut Self {
        self.sample = Some(Arc::new(sample));
        self
    }

    pub fn set_bytes(&mut self, bytes: impl Into<Vec<u8>>) -> &mut Self {
        self.set_sample(Sample::from_bytes(bytes))
    }

    /// Sample a forward-only stream; its matches can be decoded once
    pub fn set_reader<R>(&mut self, reader: R) -> io::Result<&mut Self>
    where
        R: Read + Send + 'static,
    {
        let sample = Sample::from_reader(reader, self.config.effective_sample_cap())?;
        Ok(self.set_sample(sample))
    }

    /// Sample a seekable stream; its matches can be decoded repeatedly
    pub fn set_seekable<R>(&mut self, reader: R) -> io::Result<&mut Self>
    where
        R: Read + Seek + Send + 'static,
    {
        let sample = Sample::from_seekable(reader, self.config.effective_sample_cap())?;
        Ok(self.set_sample(sample))
    }

    pub fn sample(&self) -> Option<&Arc<Sample>> {
        self.sample.as_ref()
    }

    /// Highest-confidence match for the current sample
    pub fn detect(&self) -> Option<CharsetMatch> {
        self.sample.as_ref().and_then(|sample| self.detect_in(sample))
    }

    /// All matches for the current sample, highest confidence first
    pub fn detect_all(&self) -> Vec<CharsetMatch> {
        match &self.sample {
            Some(sample) => self.detect_all_in(sample),
            None => Vec::new(),
        }
    }

    pub fn detect_in(&self, sample: &Arc<Sample>) -> Option<CharsetMatch> {
        self.detect_all_in(sample).into_iter().next()
    }

    /// Evaluate every recognizer against `sample` and rank the results.
    ///
    /// No short-circuiting: a later recognizer may tie or beat an earlier one.
    /// The sort is stable, so equal-confidence matches keep registration order.
    pub fn detect_all_in(&self, sample: &Arc<Sample>) -> Vec<CharsetMatch> {
        let mut matches: Vec<CharsetMatch> = Vec::with_capacity(self.recognizers.len());

        for recognizer in &self.recognizers {
            match recognizer.evaluate(sample) {
                Some(m) if m.confidence().get() >= self.config.min_confidence => {
                    debug!("{} matched with confidence {}", recognizer.name(), m.confidence());
                    matches.push(m);
                }
                Some(m) => {
                    debug!("{} below minimum confidence ({})", recognizer.name(), m.confidence());
                }
                None => {
                    debug!("{} found no signal", recognizer.name());
                }
            }
        }

        matches.sort_by(|a, b| b.cmp(a));

        info!(
            "Detection complete over {} bytes: {} matches from {} recognizers, best {}",
            sample.len(),
            matches.len(),
            self.recognizers.len(),
            matches.first().map(|m| m.name()).unwrap_or("none")
        );
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidence::Confidence;
    use crate::recognizer::match_for;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        name: &'static str,
        confidence: u8,
        calls: Arc<AtomicUsize>,
    }

    impl Recognizer for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn evaluate(&self, sample: &Arc<Sample>) -> Option<CharsetMatch> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Confidence::new(self.confidence).map(|c| match_for(self, sample, c))
        }
    }

    fn fixed(name: &'static str, confidence: u8, calls: &Arc<AtomicUsize>) -> Box<dyn Recognizer> {
        Box::new(Fixed {
            name,
            confidence,
            calls: Arc::clone(calls),
        })
    }

    #[test]
    fn test_every_recognizer_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut detector = CharsetDetector::with_recognizers(
            vec![fixed("A", 100, &calls), fixed("B", 0, &calls), fixed("C", 100, &calls)],
            DetectorConfig::default(),
        );
        detector.set_bytes(b"abc".to_vec());

        let all = detector.detect_all();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let names: Vec<&str> = all.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn test_ranking_and_determinism() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut detector = CharsetDetector::with_recognizers(
            vec![fixed("low", 20, &calls), fixed("high", 90, &calls), fixed("mid", 50, &calls)],
            DetectorConfig::default(),
        );
        detector.set_bytes(b"xyz".to_vec());

        let first: Vec<(String, u8)> = detector
            .detect_all()
            .iter()
            .map(|m| (m.name().to_string(), m.confidence().get()))
            .collect();
        let second: Vec<(String, u8)> = detector
            .detect_all()
            .iter()
            .map(|m| (m.name().to_string(), m.confidence().get()))
            .collect();

        assert_eq!(first, second);
        assert_eq!(first[0].0, "high");
        assert_eq!(first[2].0, "low");
        assert_eq!(detector.detect().map(|m| m.name().to_string()), Some("high".to_string()));
    }

    #[test]
    fn test_min_confidence_filter() {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = DetectorConfig {
            min_confidence: 30,
            ..Default::default()
        };
        let mut detector =
            CharsetDetector::with_recognizers(vec![fixed("low", 20, &calls), fixed("mid", 50, &calls)], config);
        detector.set_bytes(b"q".to_vec());
        let all = detector.detect_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name(), "mid");
    }

    #[test]
    fn test_no_sample_no_matches() {
        let detector = CharsetDetector::new();
        assert!(detector.detect().is_none());
        assert!(detector.detect_all().is_empty());
    }

    #[test]
    fn test_supported_encodings_are_distinct() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut detector = CharsetDetector::new();
        detector.register(fixed("UTF-8", 1, &calls));
        assert_eq!(
            detector.supported_encodings(),
            vec!["UTF-8", "UTF-16BE", "UTF-16LE", "UTF-32BE", "UTF-32LE"]
        );
    }

    #[test]
    fn test_ascii_prefers_utf8_over_utf16() {
        let mut detector = CharsetDetector::new();
        detector.set_bytes(b"Plain old ASCII text, nothing more.".to_vec());
        let all = detector.detect_all();
        assert_eq!(all[0].name(), "UTF-8");
        assert_eq!(all[0].confidence().get(), 15);
        assert!(all[1..].iter().all(|m| m.confidence().get() == 10));
    }

    #[test]
    fn test_sample_replacement() {
        let mut detector = CharsetDetector::new();
        detector.set_bytes("日本語のテキスト".as_bytes().to_vec());
        assert_eq!(detector.detect().map(|m| m.confidence().get()), Some(100));

        detector.set_bytes(vec![0xFF, 0xFE, b'h', 0, b'i', 0]);
        let best = detector.detect().unwrap();
        assert_eq!(best.name(), "UTF-16LE");
        assert_eq!(best.materialize(None).unwrap(), "hi");
    }
}
