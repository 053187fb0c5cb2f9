use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

use derive_more::Display;

type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// A set of errors that can occur while pulling parts out of a multipart
/// stream and in the related helpers.
///
/// Every parse error is terminal: once the reader has reported one of these,
/// it stays in its failed state and repeats the same error on every further
/// call. The enum is therefore `Clone`, with shared causes held in [`Arc`].
#[derive(Display, Clone)]
#[non_exhaustive]
pub enum Error {
    /// A boundary line was not followed by CRLF or the closing `--`.
    #[display(fmt = "malformed boundary: expected CRLF or `--` after the boundary")]
    MalformedBoundary,

    /// A part's header block exceeded the configured maximum size.
    #[display(fmt = "part header block exceeded the maximum size limit: {} bytes", limit)]
    HeaderTooLarge { limit: usize },

    /// A part's header block failed to tokenize.
    #[display(fmt = "malformed part header: {}", _0)]
    MalformedHeader(httparse::Error),

    /// A part's header block ended without the header/body separator.
    #[display(fmt = "failed to read complete part headers")]
    IncompleteHeaders,

    /// The stream ended before the closing boundary was seen.
    #[display(fmt = "multipart stream ended before the closing boundary")]
    PrematureEndOfStream,

    /// The underlying byte source failed; its error is passed through opaquely.
    #[display(fmt = "stream read failed: {}", _0)]
    StreamReadFailed(SharedError),

    /// Failed to lock the shared multipart state for any changes.
    #[display(fmt = "failed to lock multipart state: {}", _0)]
    LockFailure(String),

    /// The `Content-Type` handed to [`parse_boundary`](crate::parse_boundary)
    /// is not a `multipart/*` media type.
    #[display(fmt = "Content-Type is not a multipart media type")]
    NotMultipart,

    /// No `boundary` parameter found in the `Content-Type` header.
    #[display(fmt = "multipart boundary not found in Content-Type")]
    NoBoundary,

    /// Failed to convert the `Content-Type` to a [`mime::Mime`] value.
    #[display(fmt = "failed to parse Content-Type as a mime type: {}", _0)]
    DecodeContentType(Arc<mime::FromStrError>),

    /// Failed to decode the part data as JSON in
    /// [`part.json()`](crate::Part::json).
    #[cfg(feature = "json")]
    #[display(fmt = "failed to decode part data as JSON: {}", _0)]
    DecodeJson(Arc<serde_json::Error>),
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for Error {}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string().eq(&other.to_string())
    }
}

impl Eq for Error {}
