use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures_util::stream::Stream;
use memchr::memmem;

use crate::scan::{self, Scan};

pub(crate) type BodyStream = Pin<Box<dyn Stream<Item = crate::Result<Bytes>> + Send + 'static>>;

/// A resizable lookahead buffer over the source stream.
///
/// Owns the buffered-but-unconsumed bytes; bytes handed out by one of the
/// `read_*` methods are gone from the buffer and never re-delivered, while
/// bytes still needed to resolve a possibly-partial delimiter match are never
/// dropped.
pub(crate) struct StreamBuffer {
    pub(crate) eof: bool,
    pub(crate) buf: BytesMut,
    stream: BodyStream,
    /// Leading bytes already known to contain no delimiter start, so body
    /// reads never rescan them after a refill.
    scanned: usize,
}

impl StreamBuffer {
    pub fn new(stream: BodyStream) -> Self {
        StreamBuffer {
            eof: false,
            buf: BytesMut::new(),
            stream,
            scanned: 0,
        }
    }

    /// Pulls everything the source has ready into the buffer.
    ///
    /// Leaves the task waker registered with the source when it returns
    /// pending, which is what lets the callers below simply bail out with
    /// `Poll::Pending` once they run out of buffered bytes.
    pub fn poll_stream(&mut self, cx: &mut Context) -> crate::Result<()> {
        if self.eof {
            return Ok(());
        }

        loop {
            match self.stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(data))) => self.buf.extend_from_slice(&data),
                Poll::Ready(Some(Err(err))) => return Err(err),
                Poll::Ready(None) => {
                    self.eof = true;
                    return Ok(());
                }
                Poll::Pending => return Ok(()),
            }
        }
    }

    pub fn peek(&self, size: usize) -> Option<&[u8]> {
        if size <= self.buf.len() {
            Some(&self.buf[..size])
        } else {
            None
        }
    }

    /// Discards the first `size` buffered bytes.
    pub fn advance(&mut self, size: usize) {
        let _ = self.take(size);
    }

    /// Reads through the first occurrence of `pattern`, pattern included.
    ///
    /// `limit` bounds how far the search may reach; buffering past it without
    /// a match is a hard error, which is what keeps header-block accumulation
    /// from growing without bound.
    pub fn read_until(&mut self, pattern: &[u8], limit: usize) -> crate::Result<Option<Bytes>> {
        match memmem::find(&self.buf, pattern) {
            Some(idx) => {
                let end = idx + pattern.len();
                if end > limit {
                    return Err(crate::Error::HeaderTooLarge { limit });
                }
                Ok(Some(self.take(end)))
            }
            None => {
                if self.buf.len() > limit {
                    return Err(crate::Error::HeaderTooLarge { limit });
                }
                Ok(None)
            }
        }
    }

    /// Reads the next bounded chunk of the current part's body.
    ///
    /// Returns `(true, bytes)` when `bytes` is the final chunk: the delimiter
    /// was found within `max_size`, the body bytes before it are returned and
    /// the delimiter itself is consumed, leaving the buffer right after it.
    /// `(false, bytes)` is a non-final chunk of at most `max_size` bytes that
    /// cannot overlap any delimiter occurrence. `None` means no verdict is
    /// possible yet and more bytes must arrive first.
    pub fn read_part_data(&mut self, delimiter: &[u8], max_size: usize) -> crate::Result<Option<(bool, Bytes)>> {
        match scan::find(&self.buf[self.scanned..], delimiter) {
            Scan::Found(rel) => {
                let at = self.scanned + rel;
                if at > max_size {
                    self.scanned = at;
                    let bytes = self.take(max_size);
                    Ok(Some((false, bytes)))
                } else {
                    self.scanned = 0;
                    let bytes = self.buf.split_to(at).freeze();
                    let _ = self.buf.split_to(delimiter.len());
                    Ok(Some((true, bytes)))
                }
            }
            Scan::Partial(rel) => {
                let at = self.scanned + rel;
                if self.eof {
                    return Err(crate::Error::PrematureEndOfStream);
                }
                if at == 0 {
                    return Ok(None);
                }
                self.scanned = at;
                let bytes = self.take(at.min(max_size));
                Ok(Some((false, bytes)))
            }
            Scan::NotFound => {
                if self.eof {
                    return Err(crate::Error::PrematureEndOfStream);
                }
                if self.buf.is_empty() {
                    return Ok(None);
                }
                self.scanned = self.buf.len();
                let len = self.buf.len().min(max_size);
                let bytes = self.take(len);
                Ok(Some((false, bytes)))
            }
        }
    }

    fn take(&mut self, size: usize) -> Bytes {
        self.scanned = self.scanned.saturating_sub(size);
        self.buf.split_to(size).freeze()
    }
}
