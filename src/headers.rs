use std::borrow::Cow;

use bytes::Bytes;
use memchr::memmem;

use crate::constants;

/// One header line of a part, name in its original spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    name: String,
    value: Bytes,
}

impl HeaderField {
    /// The header name exactly as it appeared on the wire.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw header value, surrounding whitespace trimmed.
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// The header value as UTF-8, if it is valid UTF-8.
    pub fn value_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.value).ok()
    }
}

/// The ordered headers of one part.
///
/// Insertion order is preserved and duplicate names are kept as separate
/// entries; lookups compare names case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartHeaders {
    fields: Vec<HeaderField>,
}

impl PartHeaders {
    /// Parses a header block terminated by the header/body empty-line
    /// separator. Folded continuation lines are unfolded into their owner
    /// line before tokenizing.
    pub(crate) fn parse(block: &[u8]) -> crate::Result<PartHeaders> {
        let unfolded = unfold(block);
        let mut raw = [httparse::EMPTY_HEADER; constants::MAX_HEADERS];

        match httparse::parse_headers(&unfolded, &mut raw) {
            Ok(httparse::Status::Complete((_, parsed))) => {
                let fields = parsed
                    .iter()
                    .map(|header| HeaderField {
                        name: header.name.to_owned(),
                        value: Bytes::copy_from_slice(trim_value(header.value)),
                    })
                    .collect();
                Ok(PartHeaders { fields })
            }
            Ok(httparse::Status::Partial) => Err(crate::Error::IncompleteHeaders),
            Err(err) => Err(crate::Error::MalformedHeader(err)),
        }
    }

    /// The first value for `name`, compared case-insensitively.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.get_all(name).next().map(HeaderField::value)
    }

    /// The first value for `name` as UTF-8.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get_all(name).next().and_then(HeaderField::value_str)
    }

    /// All entries for `name`, in insertion order.
    pub fn get_all<'a, 'b>(&'a self, name: &'b str) -> impl Iterator<Item = &'a HeaderField> + 'b
    where
        'a: 'b,
    {
        self.fields
            .iter()
            .filter(move |field| field.name.eq_ignore_ascii_case(name))
    }

    /// All entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &HeaderField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Removes the CRLF of folded (continuation) lines, leaving the leading
/// whitespace of the continuation as the joining character.
fn unfold(block: &[u8]) -> Cow<'_, [u8]> {
    let mut folds = memmem::find_iter(block, constants::CRLF.as_bytes())
        .filter(|&idx| matches!(block.get(idx + 2), Some(&b' ') | Some(&b'\t')))
        .peekable();

    if folds.peek().is_none() {
        return Cow::Borrowed(block);
    }

    let mut out = Vec::with_capacity(block.len());
    let mut last = 0;
    for idx in folds {
        out.extend_from_slice(&block[last..idx]);
        last = idx + constants::CRLF.len();
    }
    out.extend_from_slice(&block[last..]);
    Cow::Owned(out)
}

fn trim_value(mut value: &[u8]) -> &[u8] {
    while let [b' ' | b'\t', rest @ ..] = value {
        value = rest;
    }
    while let [rest @ .., b' ' | b'\t'] = value {
        value = rest;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_order_case_and_duplicates() {
        let block = b"Content-Disposition: form-data; name=\"a\"\r\nX-Tag: one\r\nx-tag: two\r\n\r\n";
        let headers = PartHeaders::parse(block).unwrap();

        let entries: Vec<(&str, &[u8])> = headers.iter().map(|f| (f.name(), f.value())).collect();
        assert_eq!(
            entries,
            vec![
                ("Content-Disposition", b"form-data; name=\"a\"" as &[u8]),
                ("X-Tag", b"one"),
                ("x-tag", b"two"),
            ]
        );

        assert_eq!(headers.get("content-disposition"), Some(b"form-data; name=\"a\"" as &[u8]));
        assert_eq!(headers.get("X-TAG"), Some(b"one" as &[u8]));
        assert_eq!(headers.get_all("x-tag").count(), 2);
    }

    #[test]
    fn test_parse_unfolds_continuation_lines() {
        let block = b"Content-Type: multipart/mixed;\r\n boundary=inner\r\n\r\n";
        let headers = PartHeaders::parse(block).unwrap();
        assert_eq!(headers.get_str("Content-Type"), Some("multipart/mixed; boundary=inner"));
    }

    #[test]
    fn test_parse_empty_block() {
        let headers = PartHeaders::parse(b"\r\n").unwrap();
        assert!(headers.is_empty());
    }

    #[test]
    fn test_parse_rejects_line_without_colon() {
        assert!(matches!(
            PartHeaders::parse(b"not a header line\r\n\r\n"),
            Err(crate::Error::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_value_whitespace_is_trimmed() {
        let headers = PartHeaders::parse(b"X-Pad:   padded \t\r\n\r\n").unwrap();
        assert_eq!(headers.get_str("X-Pad"), Some("padded"));
    }
}
