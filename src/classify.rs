use crate::constants;
use crate::headers::PartHeaders;

/// What a part is, judged from its headers.
///
/// A `filename` parameter in `Content-Disposition` — even an empty one —
/// marks a file upload; its absence marks a plain data field. A part with no
/// `Content-Disposition` at all is [`Unknown`](PartKind::Unknown) and the
/// caller decides the fallback policy. The `content_type` and
/// `transfer_encoding` values are passed through as opaque strings, without
/// validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartKind {
    /// A plain form field.
    Data { name: Option<String> },
    /// A file upload.
    File {
        name: Option<String>,
        file_name: String,
        content_type: Option<String>,
        transfer_encoding: Option<String>,
    },
    /// No `Content-Disposition` header was present.
    Unknown,
}

impl PartKind {
    pub fn classify(headers: &PartHeaders) -> PartKind {
        let disposition = match headers.get_str(constants::CONTENT_DISPOSITION) {
            Some(val) => val,
            None => return PartKind::Unknown,
        };

        let name = constants::CONTENT_DISPOSITION_FIELD_NAME_RE
            .captures(disposition)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().to_owned());

        let file_name = constants::CONTENT_DISPOSITION_FILE_NAME_RE
            .captures(disposition)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().to_owned());

        match file_name {
            Some(file_name) => PartKind::File {
                name,
                file_name,
                content_type: headers.get_str(constants::CONTENT_TYPE).map(str::to_owned),
                transfer_encoding: headers
                    .get_str(constants::CONTENT_TRANSFER_ENCODING)
                    .map(str::to_owned),
            },
            None => PartKind::Data { name },
        }
    }

    /// The `name` parameter of `Content-Disposition`, for both kinds.
    pub fn name(&self) -> Option<&str> {
        match self {
            PartKind::Data { name } | PartKind::File { name, .. } => name.as_deref(),
            PartKind::Unknown => None,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, PartKind::File { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(block: &[u8]) -> PartHeaders {
        PartHeaders::parse(block).unwrap()
    }

    #[test]
    fn test_classify_data() {
        let kind = PartKind::classify(&headers(b"Content-Disposition: form-data; name=\"a\"\r\n\r\n"));
        assert_eq!(kind, PartKind::Data { name: Some("a".to_owned()) });
        assert!(!kind.is_file());
    }

    #[test]
    fn test_classify_file_with_content_type() {
        let block = b"Content-Disposition: form-data; name=\"b\"; filename=\"f.txt\"\r\nContent-Type: text/plain\r\n\r\n";
        let kind = PartKind::classify(&headers(block));
        assert_eq!(
            kind,
            PartKind::File {
                name: Some("b".to_owned()),
                file_name: "f.txt".to_owned(),
                content_type: Some("text/plain".to_owned()),
                transfer_encoding: None,
            }
        );
    }

    #[test]
    fn test_classify_empty_filename_is_still_a_file() {
        let block = b"Content-Disposition: form-data; name=\"c\"; filename=\"\"\r\n\r\n";
        let kind = PartKind::classify(&headers(block));
        assert!(kind.is_file());
        assert_eq!(kind.name(), Some("c"));
    }

    #[test]
    fn test_classify_transfer_encoding_passthrough() {
        let block = b"Content-Disposition: attachment; filename=\"f.bin\"\r\nContent-Transfer-Encoding: base64\r\n\r\n";
        match PartKind::classify(&headers(block)) {
            PartKind::File { transfer_encoding, .. } => {
                assert_eq!(transfer_encoding.as_deref(), Some("base64"))
            }
            other => panic!("expected a file part, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_without_content_disposition() {
        let kind = PartKind::classify(&headers(b"Content-Type: text/plain\r\n\r\n"));
        assert_eq!(kind, PartKind::Unknown);
    }
}
