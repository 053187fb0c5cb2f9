use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::stream::{Stream, TryStreamExt};
#[cfg(feature = "tokio-io")]
use tokio::io::AsyncRead;
#[cfg(feature = "tokio-io")]
use tokio_util::io::ReaderStream;

use crate::buffer::StreamBuffer;
use crate::constants;
use crate::constraints::Constraints;
use crate::headers::PartHeaders;
use crate::part::Part;
use crate::scan::{self, Scan};
use crate::state::{MultipartState, StreamingStage};

/// An incremental reader over a multipart byte stream.
///
/// Bound to one boundary and one byte source, it yields [`Part`]s strictly
/// in stream order, driven purely by caller pulls: all progress happens
/// inside [`next_part`](Self::next_part) and the part body reads, with no
/// background activity. It terminates irreversibly once the closing
/// `--boundary--` marker is seen, or in a terminal error on malformed input
/// or a premature end of the source.
///
/// To maintain consistency in the underlying stream, this will not yield
/// more than one [`Part`] at a time; dropping the current part (read or not)
/// is what moves the reader forward.
///
/// # Examples
///
/// ```
/// use partstream::Multipart;
/// use bytes::Bytes;
/// use std::convert::Infallible;
/// use futures_util::stream::once;
///
/// # async fn run() {
/// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
/// let stream = once(async move { Result::<Bytes, Infallible>::Ok(Bytes::from(data)) });
/// let mut multipart = Multipart::new(stream, "X-BOUNDARY");
///
/// while let Some(part) = multipart.next_part().await.unwrap() {
///     println!("part: {:?}", part.text().await)
/// }
/// # }
/// # tokio::runtime::Runtime::new().unwrap().block_on(run());
/// ```
pub struct Multipart {
    state: Arc<Mutex<MultipartState>>,
    constraints: Constraints,
}

impl Multipart {
    /// Constructs a reader over the given byte-chunk stream and boundary,
    /// with the default [`Constraints`].
    pub fn new<S, O, E, B>(stream: S, boundary: B) -> Multipart
    where
        S: Stream<Item = Result<O, E>> + Send + 'static,
        O: Into<Bytes> + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
        B: Into<String>,
    {
        Multipart::with_constraints(stream, boundary, Constraints::default())
    }

    /// Constructs a reader over the given byte-chunk stream and boundary.
    pub fn with_constraints<S, O, E, B>(stream: S, boundary: B, constraints: Constraints) -> Multipart
    where
        S: Stream<Item = Result<O, E>> + Send + 'static,
        O: Into<Bytes> + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
        B: Into<String>,
    {
        let stream = stream
            .map_ok(|bytes| bytes.into())
            .map_err(|err| crate::Error::StreamReadFailed(Arc::from(err.into())));

        let state = MultipartState::new(StreamBuffer::new(Box::pin(stream)), boundary.into());

        Multipart {
            state: Arc::new(Mutex::new(state)),
            constraints,
        }
    }

    /// Constructs a reader over the given [`AsyncRead`] reader and boundary.
    ///
    /// # Optional
    ///
    /// This requires the optional `tokio-io` feature to be enabled.
    #[cfg(feature = "tokio-io")]
    pub fn with_reader<R, B>(reader: R, boundary: B) -> Multipart
    where
        R: AsyncRead + Send + 'static,
        B: Into<String>,
    {
        Multipart::new(ReaderStream::new(reader), boundary)
    }

    /// Constructs a reader over the given [`AsyncRead`] reader and boundary,
    /// with explicit [`Constraints`].
    ///
    /// # Optional
    ///
    /// This requires the optional `tokio-io` feature to be enabled.
    #[cfg(feature = "tokio-io")]
    pub fn with_reader_with_constraints<R, B>(reader: R, boundary: B, constraints: Constraints) -> Multipart
    where
        R: AsyncRead + Send + 'static,
        B: Into<String>,
    {
        Multipart::with_constraints(ReaderStream::new(reader), boundary, constraints)
    }

    /// The boundary this reader is bound to.
    pub fn boundary(&self) -> crate::Result<String> {
        self.state
            .lock()
            .map(|state| state.boundary.clone())
            .map_err(|err| crate::Error::LockFailure(err.to_string()))
    }

    /// Yields the next [`Part`] if available, `None` once the closing
    /// boundary has been seen.
    ///
    /// If the previous part's body was not fully read, its remainder is
    /// discarded here first; skipping surfaces no errors of its own, only
    /// genuine stream or format failures. After a failure the reader is
    /// terminal and every further call reports the same error.
    pub async fn next_part(&mut self) -> crate::Result<Option<Part>> {
        self.try_next().await
    }

    /// Yields the next [`Part`] with its positional index as a tuple
    /// `(usize, Part)`.
    pub async fn next_part_with_idx(&mut self) -> crate::Result<Option<(usize, Part)>> {
        self.try_next().await.map(|part| part.map(|part| (part.index(), part)))
    }
}

impl Stream for Multipart {
    type Item = Result<Part, crate::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        let mut guard = match this.state.lock() {
            Ok(guard) => guard,
            Err(err) => return Poll::Ready(Some(Err(crate::Error::LockFailure(err.to_string())))),
        };
        let state = &mut *guard;

        if let Some(err) = state.error.as_ref() {
            return Poll::Ready(Some(Err(err.clone())));
        }

        if state.stage == StreamingStage::Eof {
            return Poll::Ready(None);
        }

        if !state.is_prev_part_consumed {
            state.next_part_waker = Some(cx.waker().clone());
            return Poll::Pending;
        }

        if let Err(err) = state.buffer.poll_stream(cx) {
            return Poll::Ready(Some(Err(state.fail(err))));
        }

        // Explicit discard loop for a part the caller abandoned: same body
        // scan as a normal read, chunks dropped instead of delivered.
        if state.stage == StreamingStage::CleaningPrevPartData {
            let delimiter = state.delimiter.clone();
            let chunk_size = this.constraints.default_chunk_size.max(1);
            loop {
                match state.buffer.read_part_data(&delimiter, chunk_size) {
                    Ok(Some((true, _))) => {
                        state.stage = StreamingStage::DeterminingBoundaryType;
                        break;
                    }
                    Ok(Some((false, _))) => continue,
                    Ok(None) => return Poll::Pending,
                    Err(err) => return Poll::Ready(Some(Err(state.fail(err)))),
                }
            }
        }

        if state.stage == StreamingStage::FindingFirstBoundary {
            // Only at the true stream start may the opening delimiter appear
            // without a leading CRLF.
            if state.at_stream_start {
                let open = state.delimiter.slice(constants::CRLF.len()..);
                if state.buffer.buf.len() < open.len() {
                    if open.starts_with(&state.buffer.buf) {
                        return if state.buffer.eof {
                            Poll::Ready(Some(Err(state.fail(crate::Error::PrematureEndOfStream))))
                        } else {
                            Poll::Pending
                        };
                    }
                    state.at_stream_start = false;
                } else if state.buffer.buf[..open.len()] == open[..] {
                    state.buffer.advance(open.len());
                    state.at_stream_start = false;
                    state.stage = StreamingStage::DeterminingBoundaryType;
                } else {
                    state.at_stream_start = false;
                }
            }

            if state.stage == StreamingStage::FindingFirstBoundary {
                let delimiter = state.delimiter.clone();
                match scan::find(&state.buffer.buf, &delimiter) {
                    Scan::Found(at) => {
                        state.buffer.advance(at + delimiter.len());
                        state.stage = StreamingStage::DeterminingBoundaryType;
                    }
                    Scan::Partial(at) => {
                        if state.buffer.eof {
                            return Poll::Ready(Some(Err(state.fail(crate::Error::PrematureEndOfStream))));
                        }
                        // Preamble bytes are never exposed; drop everything
                        // before the possible delimiter start.
                        state.buffer.advance(at);
                        return Poll::Pending;
                    }
                    Scan::NotFound => {
                        if state.buffer.eof {
                            return Poll::Ready(Some(Err(state.fail(crate::Error::PrematureEndOfStream))));
                        }
                        let len = state.buffer.buf.len();
                        state.buffer.advance(len);
                        return Poll::Pending;
                    }
                }
            }
        }

        // After any delimiter, the next two bytes decide: `--` closes the
        // whole stream, CRLF opens a part's header block.
        if state.stage == StreamingStage::DeterminingBoundaryType {
            let two = match state.buffer.peek(2) {
                Some(two) => [two[0], two[1]],
                None => {
                    return if state.buffer.eof {
                        Poll::Ready(Some(Err(state.fail(crate::Error::PrematureEndOfStream))))
                    } else {
                        Poll::Pending
                    };
                }
            };

            if two[..] == *constants::BOUNDARY_EXT.as_bytes() {
                // Closing marker; the epilogue is discarded without
                // inspection, so end-of-stream from here on is success.
                state.buffer.advance(2);
                state.stage = StreamingStage::Eof;
                log::trace!("multipart stream complete after {} part(s)", state.next_part_idx);
                return Poll::Ready(None);
            } else if two[..] == *constants::CRLF.as_bytes() {
                // The CRLF stays put: it opens the header block, so a part
                // without headers still terminates the block correctly.
                state.stage = StreamingStage::ReadingPartHeaders;
            } else {
                return Poll::Ready(Some(Err(state.fail(crate::Error::MalformedBoundary))));
            }
        }

        if state.stage == StreamingStage::ReadingPartHeaders {
            let limit = this.constraints.max_header_block_size;
            match state.buffer.read_until(constants::CRLF_CRLF.as_bytes(), limit) {
                Ok(Some(block)) => {
                    let headers = match PartHeaders::parse(&block[constants::CRLF.len()..]) {
                        Ok(headers) => headers,
                        Err(err) => return Poll::Ready(Some(Err(state.fail(err)))),
                    };

                    state.stage = StreamingStage::ReadingPartData;
                    state.is_prev_part_consumed = false;

                    let idx = state.next_part_idx;
                    state.next_part_idx += 1;

                    drop(guard);

                    let part = Part::new(
                        Arc::clone(&this.state),
                        headers,
                        idx,
                        this.constraints.default_chunk_size,
                    );

                    return Poll::Ready(Some(Ok(part)));
                }
                Ok(None) => {
                    return if state.buffer.eof {
                        Poll::Ready(Some(Err(state.fail(crate::Error::PrematureEndOfStream))))
                    } else {
                        Poll::Pending
                    };
                }
                Err(err) => return Poll::Ready(Some(Err(state.fail(err)))),
            }
        }

        state.next_part_waker = Some(cx.waker().clone());
        Poll::Pending
    }
}
