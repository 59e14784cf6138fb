// WHY: a match only records what was recognized; text is produced on demand by
// re-reading the shared sample through the named encoding

use encoding_rs::{CoderResult, Decoder, Encoding};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::{self, Read};
use std::sync::Arc;
use tracing::debug;

use crate::confidence::Confidence;
use crate::error::{DecodeError, DecodeResult};
use crate::recognizer::unicode::{utf32_label, Utf32Decoder};
use crate::recognizer::Endian;
use crate::sample::{Sample, StreamLease};

/// Suffixes some recognizers append to signal rendering direction
pub const DIRECTIONAL_SUFFIXES: [&str; 2] = ["_rtl", "_ltr"];

/// Bytes pulled from the source per decoder step
const INPUT_CHUNK: usize = 4096;

/// Characters appended per step when materializing a stream-backed match
const MATERIALIZE_CHUNK: usize = 1024;

/// Strip a trailing directional marker, e.g. `ISO-8859-8_rtl` -> `ISO-8859-8`
pub fn strip_directional_suffix(name: &str) -> &str {
    DIRECTIONAL_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .filter(|base| !base.is_empty())
        .unwrap_or(name)
}

/// An encoding identified for a sample, with the confidence it was identified at.
///
/// Matches compare and order by confidence alone: two matches for different
/// encodings at the same confidence are equal. `detect_all` relies on this
/// ordering, so it is part of the API rather than an accident.
#[derive(Debug, Clone)]
pub struct CharsetMatch {
    confidence: Confidence,
    encoding: String,
    language: Option<String>,
    sample: Arc<Sample>,
}

impl CharsetMatch {
    pub fn new(
        sample: Arc<Sample>,
        confidence: Confidence,
        encoding: impl Into<String>,
        language: Option<String>,
    ) -> Self {
        Self {
            confidence,
            encoding: encoding.into(),
            language,
            sample,
        }
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    /// Canonical encoding name, possibly carrying a directional suffix
    pub fn name(&self) -> &str {
        &self.encoding
    }

    /// ISO code of the detected language, when the recognizer determined one
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn sample(&self) -> &Arc<Sample> {
        &self.sample
    }

    /// Name the decoder is looked up under
    pub fn decoder_name(&self) -> &str {
        strip_directional_suffix(&self.encoding)
    }

    fn resolve_encoding(&self) -> DecodeResult<TextEncoding> {
        let name = self.decoder_name();
        if let Some(endian) = utf32_label(name) {
            return Ok(TextEncoding::Utf32(endian));
        }
        Encoding::for_label(name.as_bytes())
            .map(TextEncoding::Standard)
            .ok_or_else(|| DecodeError::UnsupportedEncoding {
                name: name.to_string(),
            })
    }

    /// Open a text reader over the original data.
    ///
    /// For stream samples this takes the stream lease, so a second reader on the
    /// same sample fails until this one is dropped, and forward-only streams can
    /// be opened only once.
    pub fn try_open(&self) -> DecodeResult<TextReader<'_>> {
        // WHY: resolve first so an unknown name never burns a forward-only stream
        let encoding = self.resolve_encoding()?;
        let source = match self.sample.lease_stream()? {
            Some(lease) => ByteSource::Stream(lease),
            None => ByteSource::Buffer(self.sample.bytes()),
        };
        Ok(TextReader::new(source, encoding.new_decoder()))
    }

    /// Like [`CharsetMatch::try_open`], but yields `None` on failure
    pub fn open(&self) -> Option<TextReader<'_>> {
        match self.try_open() {
            Ok(reader) => Some(reader),
            Err(e) => {
                debug!("Could not open reader for {}: {}", self.encoding, e);
                None
            }
        }
    }

    /// Decode the original data to text, up to `max_chars` characters.
    /// `None` or `Some(0)` means no limit. A leading BOM is not part of the text.
    pub fn materialize(&self, max_chars: Option<usize>) -> DecodeResult<String> {
        let limit = max_chars.filter(|&n| n > 0);

        if let (Sample::Buffer { bytes }, TextEncoding::Standard(encoding)) =
            (&*self.sample, self.resolve_encoding()?)
        {
            let (text, _) = encoding.decode_with_bom_removal(bytes);
            return Ok(match limit {
                Some(n) => truncate_chars(&text, n).to_string(),
                None => text.into_owned(),
            });
        }

        let mut reader = self.try_open()?;
        let max = limit.unwrap_or(usize::MAX);
        let mut text = String::new();
        let mut count = 0;
        while count < max {
            let n = reader.read_chars(&mut text, (max - count).min(MATERIALIZE_CHUNK))?;
            if n == 0 {
                break;
            }
            count += n;
        }
        Ok(text)
    }
}

impl PartialEq for CharsetMatch {
    fn eq(&self, other: &Self) -> bool {
        self.confidence == other.confidence
    }
}

impl Eq for CharsetMatch {}

impl PartialOrd for CharsetMatch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CharsetMatch {
    fn cmp(&self, other: &Self) -> Ordering {
        self.confidence.cmp(&other.confidence)
    }
}

impl Hash for CharsetMatch {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.confidence.hash(state);
    }
}

impl fmt::Display for CharsetMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Match of {}", self.encoding)?;
        if let Some(language) = &self.language {
            write!(f, " in {}", language)?;
        }
        write!(f, " with confidence {}", self.confidence)
    }
}

#[derive(Debug, Clone, Copy)]
enum TextEncoding {
    Standard(&'static Encoding),
    Utf32(Endian),
}

impl TextEncoding {
    fn new_decoder(self) -> TextDecoder {
        match self {
            TextEncoding::Standard(encoding) => TextDecoder::Standard(encoding.new_decoder_with_bom_removal()),
            TextEncoding::Utf32(endian) => TextDecoder::Utf32(Utf32Decoder::new(endian)),
        }
    }
}

enum TextDecoder {
    Standard(Decoder),
    Utf32(Utf32Decoder),
}

impl TextDecoder {
    /// Room to reserve in the output before decoding `len` bytes
    fn output_hint(&self, len: usize) -> usize {
        match self {
            TextDecoder::Standard(decoder) => decoder.max_utf8_buffer_length(len).unwrap_or(INPUT_CHUNK * 3),
            TextDecoder::Utf32(_) => len + 8,
        }
    }

    /// Returns whether the input was fully consumed and how many bytes were read
    fn decode_to_string(&mut self, src: &[u8], dst: &mut String, last: bool) -> (bool, usize) {
        match self {
            TextDecoder::Standard(decoder) => {
                let (result, read, _) = decoder.decode_to_string(src, dst, last);
                (matches!(result, CoderResult::InputEmpty), read)
            }
            TextDecoder::Utf32(decoder) => {
                decoder.decode_to_string(src, dst, last);
                (true, src.len())
            }
        }
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

enum ByteSource<'a> {
    Buffer(&'a [u8]),
    Stream(StreamLease<'a>),
}

impl Read for ByteSource<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ByteSource::Buffer(bytes) => bytes.read(buf),
            ByteSource::Stream(lease) => lease.read(buf),
        }
    }
}

/// Incremental decoder over a match's sample.
///
/// Holds the sample's stream lease (if any) for its whole lifetime; dropping
/// the reader releases and rewinds the stream.
pub struct TextReader<'a> {
    source: ByteSource<'a>,
    decoder: TextDecoder,
    input: Box<[u8]>,
    input_start: usize,
    input_end: usize,
    input_eof: bool,
    decoded: String,
    decoded_pos: usize,
    finished: bool,
}

impl<'a> TextReader<'a> {
    fn new(source: ByteSource<'a>, decoder: TextDecoder) -> Self {
        Self {
            source,
            decoder,
            input: vec![0u8; INPUT_CHUNK].into_boxed_slice(),
            input_start: 0,
            input_end: 0,
            input_eof: false,
            decoded: String::new(),
            decoded_pos: 0,
            finished: false,
        }
    }

    /// Make sure undelivered text is buffered; `false` once the input is exhausted
    fn fill(&mut self) -> DecodeResult<bool> {
        loop {
            if self.decoded_pos < self.decoded.len() {
                return Ok(true);
            }
            if self.finished {
                return Ok(false);
            }
            self.decoded.clear();
            self.decoded_pos = 0;

            if self.input_start == self.input_end && !self.input_eof {
                let n = loop {
                    match self.source.read(&mut self.input) {
                        Ok(n) => break n,
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                        Err(e) => return Err(e.into()),
                    }
                };
                self.input_start = 0;
                self.input_end = n;
                self.input_eof = n == 0;
            }

            let src = &self.input[self.input_start..self.input_end];
            self.decoded.reserve(self.decoder.output_hint(src.len()));
            let (input_empty, read) = self.decoder.decode_to_string(src, &mut self.decoded, self.input_eof);
            self.input_start += read;

            if self.input_eof && input_empty {
                self.finished = true;
            }
        }
    }

    /// Append up to `max_chars` characters to `out`; returns how many were
    /// appended, 0 at end of input
    pub fn read_chars(&mut self, out: &mut String, max_chars: usize) -> DecodeResult<usize> {
        let mut count = 0;
        while count < max_chars && self.fill()? {
            let pending = &self.decoded[self.decoded_pos..];
            let take = pending
                .char_indices()
                .nth(max_chars - count)
                .map(|(i, _)| i)
                .unwrap_or(pending.len());
            let chunk = &pending[..take];
            count += chunk.chars().count();
            out.push_str(chunk);
            self.decoded_pos += take;
        }
        Ok(count)
    }

    /// Decode everything that remains
    pub fn read_to_end(&mut self) -> DecodeResult<String> {
        let mut text = String::new();
        while self.fill()? {
            text.push_str(&self.decoded[self.decoded_pos..]);
            self.decoded_pos = self.decoded.len();
        }
        Ok(text)
    }
}

impl Iterator for TextReader<'_> {
    type Item = DecodeResult<String>;

    /// Yields decoded text chunk by chunk
    fn next(&mut self) -> Option<Self::Item> {
        match self.fill() {
            Ok(true) => {
                let chunk = self.decoded[self.decoded_pos..].to_string();
                self.decoded_pos = self.decoded.len();
                Some(Ok(chunk))
            }
            Ok(false) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
