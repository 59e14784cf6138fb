// WHY: recognizers only need a statistically sufficient prefix, so stream input is
// captured as a bounded look-ahead window while the live handle is kept for decoding

use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};
use std::sync::{Mutex, MutexGuard, TryLockError};
use tracing::{debug, warn};

use crate::error::{DecodeError, DecodeResult};

/// Default look-ahead window for stream input, in bytes
pub const DEFAULT_SAMPLE_CAP: usize = 8000;

/// Object-safe view of a stream that can also seek
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// The live stream behind a stream-backed sample
enum StreamSource {
    /// Can be replayed from `origin` any number of times
    Seekable {
        reader: Box<dyn ReadSeek + Send>,
        origin: u64,
    },
    /// Positioned just past the window; usable by exactly one decode
    Forward {
        reader: Box<dyn Read + Send>,
        consumed: bool,
    },
}

/// Single-owner handle to the stream a sample was read from
pub struct LiveStream {
    source: Mutex<StreamSource>,
}

impl LiveStream {
    fn new(source: StreamSource) -> Self {
        Self {
            source: Mutex::new(source),
        }
    }
}

/// The byte evidence a detection run operates on.
///
/// Created once per detection request and never modified afterwards; shared
/// by every recognizer and every match produced from it.
pub enum Sample {
    /// Caller-supplied bytes, owned in full
    Buffer { bytes: Vec<u8> },
    /// Bounded look-ahead copy plus the stream it was read from
    Stream {
        window: Vec<u8>,
        stream: LiveStream,
        rewindable: bool,
        /// The window filled its cap, so the stream may continue past it
        truncated: bool,
    },
}

impl Sample {
    /// Build a sample from a discrete buffer (copied)
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        debug!("Created buffer sample of {} bytes", bytes.len());
        Sample::Buffer { bytes }
    }

    /// Build a sample from the first `len` bytes of `buffer`
    /// WHY: callers often hand over a reusable buffer whose capacity exceeds the data
    pub fn from_buffer(buffer: &[u8], len: usize) -> Self {
        Self::from_bytes(&buffer[..len.min(buffer.len())])
    }

    /// Read up to `cap` bytes of a forward-only stream as the look-ahead window.
    ///
    /// The stream can be decoded by one match only: the first decode replays the
    /// window and then continues reading from where the window ended.
    pub fn from_reader<R>(mut reader: R, cap: usize) -> io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        let window = read_window(&mut reader, cap)?;
        debug!("Created forward-only stream sample with {} byte window", window.len());
        Ok(Sample::Stream {
            truncated: window.len() == cap,
            window,
            stream: LiveStream::new(StreamSource::Forward {
                reader: Box::new(reader),
                consumed: false,
            }),
            rewindable: false,
        })
    }

    /// Read up to `cap` bytes of a seekable stream as the look-ahead window.
    ///
    /// The current position is remembered as the replay origin, so any number
    /// of matches can decode the stream one after another.
    pub fn from_seekable<R>(mut reader: R, cap: usize) -> io::Result<Self>
    where
        R: Read + Seek + Send + 'static,
    {
        let origin = reader.stream_position()?;
        let window = read_window(&mut reader, cap)?;
        // WHY: leave the stream where the caller handed it over
        reader.seek(SeekFrom::Start(origin))?;
        debug!("Created seekable stream sample with {} byte window at offset {}", window.len(), origin);
        Ok(Sample::Stream {
            truncated: window.len() == cap,
            window,
            stream: LiveStream::new(StreamSource::Seekable {
                reader: Box::new(reader),
                origin,
            }),
            rewindable: true,
        })
    }

    /// Bytes the recognizers see: the whole buffer, or the stream window
    pub fn bytes(&self) -> &[u8] {
        match self {
            Sample::Buffer { bytes } => bytes,
            Sample::Stream { window, .. } => window,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, Sample::Stream { .. })
    }

    /// Whether the bytes may stop short of the real end of the input
    pub fn is_truncated(&self) -> bool {
        match self {
            Sample::Buffer { .. } => false,
            Sample::Stream { truncated, .. } => *truncated,
        }
    }

    /// Whether the sample can be decoded more than once.
    /// Buffers always can; streams only when they support seeking.
    pub fn supports_rewind(&self) -> bool {
        match self {
            Sample::Buffer { .. } => true,
            Sample::Stream { rewindable, .. } => *rewindable,
        }
    }

    /// Acquire exclusive use of the live stream, positioned at the start of the data.
    ///
    /// Returns `Ok(None)` for buffer samples. The lease gives the stream back on
    /// drop, rewinding it when possible, so every exit path leaves it consistent.
    pub(crate) fn lease_stream(&self) -> DecodeResult<Option<StreamLease<'_>>> {
        let (window, stream) = match self {
            Sample::Buffer { .. } => return Ok(None),
            Sample::Stream { window, stream, .. } => (window, stream),
        };

        let mut guard = match stream.source.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return Err(DecodeError::StreamInUse),
            // WHY: a panicking reader still released the lease through Drop
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };

        match &mut *guard {
            StreamSource::Seekable { reader, origin } => {
                reader.seek(SeekFrom::Start(*origin))?;
            }
            StreamSource::Forward { consumed, .. } => {
                if *consumed {
                    return Err(DecodeError::StreamNotRewindable);
                }
            }
        }

        Ok(Some(StreamLease {
            guard,
            window: window.as_slice(),
            window_pos: 0,
        }))
    }
}

impl fmt::Debug for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sample::Buffer { bytes } => f.debug_struct("Buffer").field("len", &bytes.len()).finish(),
            Sample::Stream {
                window,
                rewindable,
                truncated,
                ..
            } => f
                .debug_struct("Stream")
                .field("window_len", &window.len())
                .field("rewindable", rewindable)
                .field("truncated", truncated)
                .finish(),
        }
    }
}

fn read_window<R: Read>(reader: &mut R, cap: usize) -> io::Result<Vec<u8>> {
    let mut window = Vec::with_capacity(cap.min(DEFAULT_SAMPLE_CAP));
    reader.by_ref().take(cap as u64).read_to_end(&mut window)?;
    Ok(window)
}

/// Scoped, exclusive access to a sample's live stream
pub(crate) struct StreamLease<'a> {
    guard: MutexGuard<'a, StreamSource>,
    window: &'a [u8],
    window_pos: usize,
}

impl Read for StreamLease<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut *self.guard {
            StreamSource::Seekable { reader, .. } => reader.read(buf),
            StreamSource::Forward { reader, .. } => {
                // Forward streams already gave up the window bytes; replay them first
                if self.window_pos < self.window.len() {
                    let n = (&self.window[self.window_pos..]).read(buf)?;
                    self.window_pos += n;
                    Ok(n)
                } else {
                    reader.read(buf)
                }
            }
        }
    }
}

impl Drop for StreamLease<'_> {
    fn drop(&mut self) {
        match &mut *self.guard {
            StreamSource::Seekable { reader, origin } => {
                if let Err(e) = reader.seek(SeekFrom::Start(*origin)) {
                    warn!("Failed to rewind sample stream after decode: {}", e);
                }
            }
            StreamSource::Forward { consumed, .. } => {
                *consumed = true;
            }
        }
    }
}
