// WHY: decode failures must stay distinguishable so callers can tell a wrong
// encoding name apart from a stream that was already used up

use thiserror::Error;

/// Failures surfaced by the lazy decode path of a [`crate::CharsetMatch`].
///
/// Detection itself never fails: malformed bytes are scored, and a recognizer
/// with nothing to say returns `None`.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The (suffix-stripped) encoding name has no decoder on this platform.
    #[error("no decoder available for encoding '{name}'")]
    UnsupportedEncoding { name: String },

    /// A second decode was attempted on a forward-only stream sample.
    #[error("sample stream was already consumed and cannot be rewound")]
    StreamNotRewindable,

    /// Another decode currently holds the sample stream.
    #[error("sample stream is held by another decode in progress")]
    StreamInUse,

    /// Reading from or rewinding the live stream failed.
    #[error("I/O error while decoding sample: {0}")]
    Io(#[from] std::io::Error),
}

pub type DecodeResult<T> = std::result::Result<T, DecodeError>;
