//! Boundary scanning over a partially buffered window.
//!
//! The scanner is stateless: it reports where a delimiter sits in the given
//! buffer, or that the buffer's tail could still turn into one once more
//! bytes arrive. The caller keeps bytes from a [`Scan::Partial`] index onward
//! across the next refill.

use memchr::{memchr_iter, memmem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scan {
    /// No occurrence, and the buffer cannot end in one.
    NotFound,
    /// The full delimiter starts at this index.
    Found(usize),
    /// The buffer's suffix starting at this index matches a strict prefix of
    /// the delimiter; a verdict needs more bytes.
    Partial(usize),
}

pub(crate) fn find(haystack: &[u8], delimiter: &[u8]) -> Scan {
    debug_assert!(!delimiter.is_empty());

    if let Some(idx) = memmem::find(haystack, delimiter) {
        return Scan::Found(idx);
    }

    // Only the last `delimiter.len() - 1` bytes can hold a strict prefix.
    let window = haystack.len().saturating_sub(delimiter.len() - 1);
    for rel in memchr_iter(delimiter[0], &haystack[window..]) {
        let at = window + rel;
        if delimiter.starts_with(&haystack[at..]) {
            return Scan::Partial(at);
        }
    }

    Scan::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELIM: &[u8] = b"\r\n--XYZ";

    #[test]
    fn test_found_at_start_and_end() {
        assert_eq!(find(b"\r\n--XYZ tail", DELIM), Scan::Found(0));
        assert_eq!(find(b"head\r\n--XYZ", DELIM), Scan::Found(4));
        assert_eq!(find(DELIM, DELIM), Scan::Found(0));
    }

    #[test]
    fn test_not_found() {
        assert_eq!(find(b"", DELIM), Scan::NotFound);
        assert_eq!(find(b"hello world", DELIM), Scan::NotFound);
        // A CR that cannot extend into the delimiter is not a partial match.
        assert_eq!(find(b"hello\rworld", DELIM), Scan::NotFound);
    }

    #[test]
    fn test_partial_suffixes() {
        assert_eq!(find(b"hello\r", DELIM), Scan::Partial(5));
        assert_eq!(find(b"hello\r\n", DELIM), Scan::Partial(5));
        assert_eq!(find(b"hello\r\n--XY", DELIM), Scan::Partial(5));
        // Haystack shorter than the delimiter.
        assert_eq!(find(b"\r\n--", DELIM), Scan::Partial(0));
    }

    #[test]
    fn test_partial_prefers_real_suffix_over_stray_cr() {
        // The CR at index 2 is a dead end; the suffix at 5 is live.
        assert_eq!(find(b"ab\rcd\r\n-", DELIM), Scan::Partial(5));
    }

    #[test]
    fn test_every_split_point_is_detected() {
        // Direct check of the retention contract: for each split of the
        // delimiter into head|tail, a buffer ending in the head must report
        // a partial match exactly at the head's start.
        let body = b"some body bytes ";
        for split in 1..DELIM.len() {
            let mut buf = body.to_vec();
            buf.extend_from_slice(&DELIM[..split]);
            assert_eq!(find(&buf, DELIM), Scan::Partial(body.len()), "split at {}", split);
        }
    }
}
