use lazy_static::lazy_static;
use regex::Regex;

/// Upper bound on one part's header block, boundary line CRLF included.
pub(crate) const DEFAULT_MAX_HEADER_BLOCK_SIZE: usize = 64 * 1024;
/// Chunk size used by the `Stream` impl on `Part` and the internal skip loop.
pub(crate) const DEFAULT_CHUNK_SIZE: usize = 8 * 1024 * 1024;

pub(crate) const MAX_HEADERS: usize = 32;
pub(crate) const BOUNDARY_EXT: &str = "--";
#[allow(dead_code)]
pub(crate) const CR: &str = "\r";
#[allow(dead_code)]
pub(crate) const LF: &str = "\n";
pub(crate) const CRLF: &str = "\r\n";
pub(crate) const CRLF_CRLF: &str = "\r\n\r\n";

pub(crate) const CONTENT_DISPOSITION: &str = "Content-Disposition";
pub(crate) const CONTENT_TYPE: &str = "Content-Type";
pub(crate) const CONTENT_TRANSFER_ENCODING: &str = "Content-Transfer-Encoding";

lazy_static! {
    pub(crate) static ref CONTENT_DISPOSITION_FIELD_NAME_RE: Regex = Regex::new(r#"name="([^"]+)""#).unwrap();
    // A present-but-empty filename still marks a file part, hence `*`.
    pub(crate) static ref CONTENT_DISPOSITION_FILE_NAME_RE: Regex = Regex::new(r#"filename="([^"]*)""#).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_field_name_re() {
        let val = r#"form-data; name="my_field""#;
        let name = CONTENT_DISPOSITION_FIELD_NAME_RE.captures(val).unwrap();
        assert_eq!(name.get(1).unwrap().as_str(), "my_field");

        let val = r#"form-data; name="my field""#;
        let name = CONTENT_DISPOSITION_FIELD_NAME_RE.captures(val).unwrap();
        assert_eq!(name.get(1).unwrap().as_str(), "my field");

        let val = r#"form-data; name="my_field"; filename="file abc.txt""#;
        let name = CONTENT_DISPOSITION_FIELD_NAME_RE.captures(val).unwrap();
        assert_eq!(name.get(1).unwrap().as_str(), "my_field");

        let val = "form-data; name=\"你好\"; filename=\"file abc.txt\"";
        let name = CONTENT_DISPOSITION_FIELD_NAME_RE.captures(val).unwrap();
        assert_eq!(name.get(1).unwrap().as_str(), "你好");
    }

    #[test]
    fn test_content_disposition_file_name_re() {
        let val = r#"form-data; name="my_field"; filename="file_name.txt""#;
        let file_name = CONTENT_DISPOSITION_FILE_NAME_RE.captures(val).unwrap();
        assert_eq!(file_name.get(1).unwrap().as_str(), "file_name.txt");

        let val = r#"form-data; filename="file-name.txt""#;
        let file_name = CONTENT_DISPOSITION_FILE_NAME_RE.captures(val).unwrap();
        assert_eq!(file_name.get(1).unwrap().as_str(), "file-name.txt");

        let val = "form-data; filename=\"কখগ-你好.txt\"";
        let file_name = CONTENT_DISPOSITION_FILE_NAME_RE.captures(val).unwrap();
        assert_eq!(file_name.get(1).unwrap().as_str(), "কখগ-你好.txt");

        let val = r#"form-data; name="empty"; filename="""#;
        let file_name = CONTENT_DISPOSITION_FILE_NAME_RE.captures(val).unwrap();
        assert_eq!(file_name.get(1).unwrap().as_str(), "");
    }
}
