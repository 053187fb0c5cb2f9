use std::task::Waker;

use bytes::Bytes;

use crate::buffer::StreamBuffer;
use crate::constants;

pub(crate) struct MultipartState {
    pub(crate) buffer: StreamBuffer,
    pub(crate) boundary: String,
    /// Precomputed `CRLF "--" boundary`, the delimiter preceding every
    /// boundary line but the first.
    pub(crate) delimiter: Bytes,
    pub(crate) stage: StreamingStage,
    /// Set together with `StreamingStage::Failed`; replayed on every call
    /// after the reader has failed.
    pub(crate) error: Option<crate::Error>,
    /// True until the first preamble byte is discarded; only at the true
    /// stream start may the first boundary appear without a leading CRLF.
    pub(crate) at_stream_start: bool,
    pub(crate) is_prev_part_consumed: bool,
    pub(crate) next_part_waker: Option<Waker>,
    pub(crate) next_part_idx: usize,
}

impl MultipartState {
    pub(crate) fn new(buffer: StreamBuffer, boundary: String) -> Self {
        let delimiter = Bytes::from(format!("{}{}{}", constants::CRLF, constants::BOUNDARY_EXT, boundary));

        MultipartState {
            buffer,
            boundary,
            delimiter,
            stage: StreamingStage::FindingFirstBoundary,
            error: None,
            at_stream_start: true,
            is_prev_part_consumed: true,
            next_part_waker: None,
            next_part_idx: 0,
        }
    }

    /// Moves the reader into its terminal failed state and hands the error
    /// back for immediate reporting.
    pub(crate) fn fail(&mut self, err: crate::Error) -> crate::Error {
        log::trace!("multipart reader failed: {}", err);
        self.stage = StreamingStage::Failed;
        self.error = Some(err.clone());
        err
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StreamingStage {
    /// Discarding the preamble up to and including the first boundary line.
    FindingFirstBoundary,
    /// Just past a boundary; the next two bytes pick between the terminal
    /// `--` and the CRLF that opens a part.
    DeterminingBoundaryType,
    ReadingPartHeaders,
    ReadingPartData,
    /// Discarding the rest of a part the caller abandoned.
    CleaningPrevPartData,
    Eof,
    Failed,
}
