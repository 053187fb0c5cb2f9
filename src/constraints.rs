use crate::constants;

/// The recognized reader options.
///
/// ```
/// use partstream::Constraints;
///
/// let constraints = Constraints::new()
///     .max_header_block_size(16 * 1024)
///     .default_chunk_size(1024 * 1024);
/// ```
#[derive(Debug, Clone)]
pub struct Constraints {
    pub(crate) max_header_block_size: usize,
    pub(crate) default_chunk_size: usize,
}

impl Constraints {
    /// Creates the default constraints: 64 KiB per header block and 8 MiB
    /// body chunks.
    pub fn new() -> Constraints {
        Constraints::default()
    }

    /// Sets the maximum size of one part's header block. Exceeding it is a
    /// hard [`HeaderTooLarge`](crate::Error::HeaderTooLarge) error, guarding
    /// against unbounded header accumulation.
    pub fn max_header_block_size(mut self, limit: usize) -> Constraints {
        self.max_header_block_size = limit;
        self
    }

    /// Sets the chunk size used when a part's body is read through its
    /// `Stream` impl or one of the collectors, and by the internal skip
    /// loop. Reads via [`Part::read_chunk`](crate::Part::read_chunk) take an
    /// explicit size instead.
    pub fn default_chunk_size(mut self, size: usize) -> Constraints {
        self.default_chunk_size = size;
        self
    }
}

impl Default for Constraints {
    fn default() -> Self {
        Constraints {
            max_header_block_size: constants::DEFAULT_MAX_HEADER_BLOCK_SIZE,
            default_chunk_size: constants::DEFAULT_CHUNK_SIZE,
        }
    }
}
