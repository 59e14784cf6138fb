// Tests for the public detection API
// WHY: ranking, confidence range and the coarse match ordering are contracts callers sort on

use charsniff::{CharsetDetector, CharsetMatch, Confidence, Sample, Utf8Recognizer, Recognizer};
use std::cmp::Ordering;
use std::sync::Arc;

#[path = "integration/mod.rs"]
mod test_utils;
use test_utils::{utf16le_with_bom, utf32be_with_bom, utf8_with_bom};

fn inputs() -> Vec<Vec<u8>> {
    vec![
        Vec::new(),
        b"plain ascii".to_vec(),
        utf8_with_bom("bom and text"),
        "déjà vu, naïve, façade".as_bytes().to_vec(),
        b"caf\xE9 cr\xE8me br\xFBl\xE9e".to_vec(),
        utf16le_with_bom("wide text"),
        vec![0xFF; 64],
        (0u8..=255).collect(),
    ]
}

#[test]
fn test_detect_all_is_sorted_and_in_range() {
    let mut detector = CharsetDetector::new();
    for input in inputs() {
        detector.set_bytes(input);
        let matches = detector.detect_all();

        for pair in matches.windows(2) {
            assert!(pair[0].confidence() >= pair[1].confidence(), "matches must be non-increasing");
        }
        for m in &matches {
            let c = m.confidence().get();
            assert!((1..=100).contains(&c), "confidence {c} out of range");
        }
    }
}

#[test]
fn test_detect_returns_head_of_detect_all() {
    let mut detector = CharsetDetector::new();
    for input in inputs() {
        detector.set_bytes(input);
        let all = detector.detect_all();
        let best = detector.detect();
        assert_eq!(best.as_ref().map(|m| m.name()), all.first().map(|m| m.name()));
    }
}

#[test]
fn test_utf8_worked_examples() {
    let cases: Vec<(Vec<u8>, Option<u8>)> = vec![
        (Vec::new(), Some(15)),
        (utf8_with_bom("only ascii after the mark"), Some(100)),
        (vec![0xEF, 0xBB, 0xBF, 0xFF], None),
        ([0xE2, 0x82, 0xAC].repeat(4), Some(100)),
    ];

    for (bytes, expected) in cases {
        let sample = Arc::new(Sample::from_bytes(bytes.clone()));
        let confidence = Utf8Recognizer.evaluate(&sample).map(|m| m.confidence().get());
        assert_eq!(confidence, expected, "input {:02X?}", bytes);
    }
}

#[test]
fn test_equal_confidence_matches_compare_equal() {
    let sample = Arc::new(Sample::from_bytes(b"text".to_vec()));
    let eighty = Confidence::new(80).unwrap();
    let a = CharsetMatch::new(sample.clone(), eighty, "UTF-8", None);
    let b = CharsetMatch::new(sample.clone(), eighty, "Shift_JIS", Some("ja".to_string()));
    let c = CharsetMatch::new(sample, Confidence::new(81).unwrap(), "UTF-8", None);

    assert_eq!(a.cmp(&b), Ordering::Equal);
    assert_eq!(a, b, "encoding name is not part of equality");
    assert_ne!(a, c, "different confidence is never equal");
    assert_eq!(a.cmp(&c), Ordering::Less);
}

#[test]
fn test_buffer_round_trip() {
    let text = "Ünïcödé text — with a dash and 🦀";
    let mut detector = CharsetDetector::new();
    detector.set_bytes(text.as_bytes().to_vec());

    let best = detector.detect().expect("UTF-8 text should match");
    assert_eq!(best.name(), "UTF-8");
    assert_eq!(best.materialize(None).unwrap(), text);
    assert_eq!(best.materialize(Some(5)).unwrap(), "Ünïcö");
    assert_eq!(best.materialize(Some(5)).unwrap().chars().count(), 5);
}

#[test]
fn test_best_utf32_match_decodes() {
    let mut detector = CharsetDetector::new();
    detector.set_bytes(utf32be_with_bom("hello world"));

    let best = detector.detect().expect("BOM-marked UTF-32 should match");
    assert_eq!(best.name(), "UTF-32BE");
    assert_eq!(best.confidence().get(), 100);
    assert_eq!(best.materialize(None).unwrap(), "hello world");
    assert!(best.open().is_some());
}

#[test]
fn test_custom_recognizer_registration() {
    struct Hebrew;
    impl Recognizer for Hebrew {
        fn name(&self) -> &str {
            "ISO-8859-8_rtl"
        }
        fn language(&self) -> Option<&str> {
            Some("he")
        }
        fn evaluate(&self, sample: &Arc<Sample>) -> Option<CharsetMatch> {
            let hits = sample.bytes().iter().filter(|b| (0xE0..=0xFA).contains(*b)).count();
            Confidence::from_score(hits as i32 * 10).map(|c| charsniff::recognizer::match_for(self, sample, c))
        }
    }

    let mut detector = CharsetDetector::new();
    detector.register(Box::new(Hebrew));
    // "shalom" in ISO-8859-8
    detector.set_bytes(vec![0xF9, 0xEC, 0xE5, 0xED]);

    let best = detector.detect().expect("custom recognizer should win");
    assert_eq!(best.name(), "ISO-8859-8_rtl");
    assert_eq!(best.language(), Some("he"));
    assert_eq!(best.materialize(None).unwrap(), "שלום");
}
