use std::borrow::Cow;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use encoding_rs::{Encoding, UTF_8};
use futures_util::future;
use futures_util::stream::{Stream, TryStreamExt};
#[cfg(feature = "json")]
use serde::de::DeserializeOwned;

use crate::classify::PartKind;
use crate::constants;
use crate::headers::PartHeaders;
use crate::state::{MultipartState, StreamingStage};

/// One bounded read of a part's body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyChunk {
    /// A non-final chunk; more body bytes follow.
    More(Bytes),
    /// The final chunk of this body, possibly empty. Further reads keep
    /// returning `Complete` with empty bytes.
    Complete(Bytes),
}

impl BodyChunk {
    pub fn bytes(&self) -> &[u8] {
        match self {
            BodyChunk::More(bytes) | BodyChunk::Complete(bytes) => bytes,
        }
    }

    pub fn into_bytes(self) -> Bytes {
        match self {
            BodyChunk::More(bytes) | BodyChunk::Complete(bytes) => bytes,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, BodyChunk::Complete(_))
    }
}

/// One part of a multipart stream: its parsed headers plus pull access to
/// its body.
///
/// A `Part` is only valid until the reader advances past it. To keep the
/// underlying stream consistent, [`Multipart`](crate::Multipart) will not
/// yield the next part while one is alive; dropping a `Part` — fully read or
/// not — is what lets the reader move on, so avoid leaking this type.
/// Dropping it with body bytes still pending makes the reader discard the
/// rest of that body on the next [`next_part`](crate::Multipart::next_part)
/// call.
///
/// Body bytes arrive strictly in order, through [`read_chunk`](Self::read_chunk)
/// with an explicit chunk size or through the `Stream` impl with the
/// configured default. The `Stream` impl is also what makes nesting work: a
/// part whose own `Content-Type` is `multipart/*` can be fed into a second
/// [`Multipart`](crate::Multipart) bound to the inner boundary.
pub struct Part {
    state: Arc<Mutex<MultipartState>>,
    headers: PartHeaders,
    kind: PartKind,
    content_type: Option<mime::Mime>,
    idx: usize,
    default_chunk_size: usize,
    done: bool,
}

impl std::fmt::Debug for Part {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Part")
            .field("headers", &self.headers)
            .field("kind", &self.kind)
            .field("content_type", &self.content_type)
            .field("idx", &self.idx)
            .field("default_chunk_size", &self.default_chunk_size)
            .field("done", &self.done)
            .finish()
    }
}

impl Part {
    pub(crate) fn new(
        state: Arc<Mutex<MultipartState>>,
        headers: PartHeaders,
        idx: usize,
        default_chunk_size: usize,
    ) -> Self {
        let kind = PartKind::classify(&headers);
        let content_type = headers
            .get_str(constants::CONTENT_TYPE)
            .and_then(|val| val.parse::<mime::Mime>().ok());

        Part {
            state,
            headers,
            kind,
            content_type,
            idx,
            default_chunk_size,
            done: false,
        }
    }

    /// The `name` parameter of the part's `Content-Disposition`.
    pub fn name(&self) -> Option<&str> {
        self.kind.name()
    }

    /// The `filename` parameter of the part's `Content-Disposition`, present
    /// only on file parts. May be empty.
    pub fn file_name(&self) -> Option<&str> {
        match &self.kind {
            PartKind::File { file_name, .. } => Some(file_name),
            _ => None,
        }
    }

    /// The part's `Content-Type`, if present and parseable as a mime type.
    pub fn content_type(&self) -> Option<&mime::Mime> {
        self.content_type.as_ref()
    }

    /// The part's `Content-Transfer-Encoding`, passed through verbatim.
    pub fn transfer_encoding(&self) -> Option<&str> {
        self.headers.get_str(constants::CONTENT_TRANSFER_ENCODING)
    }

    /// The part's headers, in wire order and spelling.
    pub fn headers(&self) -> &PartHeaders {
        &self.headers
    }

    /// The classification of this part. Also available standalone as
    /// [`PartKind::classify`] on the returned headers.
    pub fn kind(&self) -> &PartKind {
        &self.kind
    }

    /// The zero-based position of this part in the stream.
    pub fn index(&self) -> usize {
        self.idx
    }

    /// Reads the next body chunk of at most `max_size` bytes.
    ///
    /// Exceeding `max_size` is never an error; the body just arrives in more
    /// [`BodyChunk::More`] pieces.
    pub async fn read_chunk(&mut self, max_size: usize) -> crate::Result<BodyChunk> {
        future::poll_fn(|cx| self.poll_chunk(cx, max_size)).await
    }

    /// Yields the next body chunk of at most the configured default chunk
    /// size, or `None` once the body is complete.
    pub async fn chunk(&mut self) -> crate::Result<Option<Bytes>> {
        self.try_next().await
    }

    /// Collects the whole body into one buffer.
    pub async fn bytes(mut self) -> crate::Result<Bytes> {
        let mut buf = BytesMut::new();

        while let Some(bytes) = self.chunk().await? {
            buf.extend_from_slice(&bytes);
        }

        Ok(buf.freeze())
    }

    /// Collects the whole body as UTF-8 text.
    pub async fn text(self) -> crate::Result<String> {
        self.text_with_charset("utf-8").await
    }

    /// Collects the whole body as text, honouring the part's `charset`
    /// parameter and falling back to `default_encoding`.
    pub async fn text_with_charset(self, default_encoding: &str) -> crate::Result<String> {
        let encoding_name = self
            .content_type()
            .and_then(|mime| mime.get_param(mime::CHARSET))
            .map(|charset| charset.as_str())
            .unwrap_or(default_encoding)
            .to_owned();

        let encoding = Encoding::for_label(encoding_name.as_bytes()).unwrap_or(UTF_8);

        let bytes = self.bytes().await?;

        match encoding.decode(&bytes).0 {
            Cow::Owned(text) => Ok(text),
            Cow::Borrowed(text) => Ok(String::from(text)),
        }
    }

    /// Deserializes the whole body as JSON.
    ///
    /// # Optional
    ///
    /// This requires the optional `json` feature to be enabled.
    #[cfg(feature = "json")]
    pub async fn json<T: DeserializeOwned>(self) -> crate::Result<T> {
        let bytes = self.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|err| crate::Error::DecodeJson(Arc::new(err)))
    }

    fn poll_chunk(&mut self, cx: &mut Context, max_size: usize) -> Poll<crate::Result<BodyChunk>> {
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(err) => return Poll::Ready(Err(crate::Error::LockFailure(err.to_string()))),
        };
        let state = &mut *guard;

        if let Some(err) = state.error.as_ref() {
            return Poll::Ready(Err(err.clone()));
        }

        if self.done {
            return Poll::Ready(Ok(BodyChunk::Complete(Bytes::new())));
        }

        if let Err(err) = state.buffer.poll_stream(cx) {
            return Poll::Ready(Err(state.fail(err)));
        }

        let delimiter = state.delimiter.clone();
        // A zero max size would never make progress.
        match state.buffer.read_part_data(&delimiter, max_size.max(1)) {
            Ok(Some((true, bytes))) => {
                self.done = true;
                Poll::Ready(Ok(BodyChunk::Complete(bytes)))
            }
            Ok(Some((false, bytes))) => Poll::Ready(Ok(BodyChunk::More(bytes))),
            Ok(None) => Poll::Pending,
            Err(err) => Poll::Ready(Err(state.fail(err))),
        }
    }
}

impl Stream for Part {
    type Item = crate::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.done {
            return Poll::Ready(None);
        }

        let max_size = this.default_chunk_size;
        match this.poll_chunk(cx, max_size) {
            Poll::Ready(Ok(BodyChunk::Complete(bytes))) => {
                if bytes.is_empty() {
                    Poll::Ready(None)
                } else {
                    Poll::Ready(Some(Ok(bytes)))
                }
            }
            Poll::Ready(Ok(BodyChunk::More(bytes))) => Poll::Ready(Some(Ok(bytes))),
            Poll::Ready(Err(err)) => {
                this.done = true;
                Poll::Ready(Some(Err(err)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for Part {
    fn drop(&mut self) {
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(err) => {
                log::error!("failed to lock multipart state while dropping a part: {}", err);
                return;
            }
        };
        let state = &mut *guard;

        match state.stage {
            StreamingStage::Eof | StreamingStage::Failed => {}
            _ if self.done => state.stage = StreamingStage::DeterminingBoundaryType,
            _ => state.stage = StreamingStage::CleaningPrevPartData,
        }

        state.is_prev_part_consumed = true;

        if let Some(waker) = state.next_part_waker.take() {
            waker.wake();
        }
    }
}
