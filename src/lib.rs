//! An incremental pull parser for `multipart/form-data` byte streams.
//!
//! `partstream` parses a multipart message out of a chunked byte source —
//! typically an HTTP request body whose fragments arrive in unpredictable
//! sizes — without ever buffering the whole message. The caller iterates
//! over parts with [`Multipart::next_part`], inspects each part's headers,
//! optionally classifies it as a plain field or a file upload with
//! [`PartKind`], and reads the body as a bounded sequence of byte chunks.
//!
//! Boundary delimiters split across arbitrary fragment borders are detected
//! correctly, an abandoned part is skipped automatically on the next
//! `next_part` call, and a part whose own `Content-Type` is `multipart/*`
//! can be parsed by feeding it into a second [`Multipart`] instance.
//!
//! # Examples
//!
//! ```
//! use partstream::Multipart;
//! use bytes::Bytes;
//! use std::convert::Infallible;
//! use futures_util::stream::once;
//!
//! # async fn run() {
//! let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
//! let stream = once(async move { Result::<Bytes, Infallible>::Ok(Bytes::from(data)) });
//! let mut multipart = Multipart::new(stream, "X-BOUNDARY");
//!
//! while let Some(part) = multipart.next_part().await.unwrap() {
//!     println!("part: {:?}", part.text().await)
//! }
//! # }
//! # tokio::runtime::Runtime::new().unwrap().block_on(run());
//! ```

pub use bytes;

pub use classify::PartKind;
pub use constraints::Constraints;
pub use error::Error;
pub use headers::{HeaderField, PartHeaders};
pub use multipart::Multipart;
pub use part::{BodyChunk, Part};

mod buffer;
mod classify;
mod constants;
mod constraints;
mod error;
mod headers;
mod multipart;
mod part;
mod scan;
mod state;

/// A Result type often returned from methods that can have `partstream`
/// errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Parses a `Content-Type` header value to extract the boundary of a
/// `multipart/*` media type.
///
/// The reader itself never looks at the enclosing message's headers; call
/// this on the outer `Content-Type` (or on a part's own one, for nested
/// multipart) before constructing a [`Multipart`].
pub fn parse_boundary<T: AsRef<str>>(content_type: T) -> crate::Result<String> {
    let mime = content_type
        .as_ref()
        .parse::<mime::Mime>()
        .map_err(|err| Error::DecodeContentType(std::sync::Arc::new(err)))?;

    if mime.type_() != mime::MULTIPART {
        return Err(Error::NotMultipart);
    }

    mime.get_param(mime::BOUNDARY)
        .map(|boundary| boundary.as_str().to_owned())
        .ok_or(Error::NoBoundary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_boundary() {
        let content_type = "multipart/form-data; boundary=ABCDEFG";
        assert_eq!(parse_boundary(content_type), Ok("ABCDEFG".to_owned()));

        let content_type = "multipart/form-data; boundary=------ABCDEFG";
        assert_eq!(parse_boundary(content_type), Ok("------ABCDEFG".to_owned()));

        let content_type = "multipart/mixed; boundary=INNER";
        assert_eq!(parse_boundary(content_type), Ok("INNER".to_owned()));

        let content_type = "multipart/form-data";
        assert_eq!(parse_boundary(content_type), Err(Error::NoBoundary));

        let content_type = "boundary=------ABCDEFG";
        assert!(parse_boundary(content_type).is_err());

        let content_type = "text/plain";
        assert_eq!(parse_boundary(content_type), Err(Error::NotMultipart));

        let content_type = "text/plain; boundary=------ABCDEFG";
        assert_eq!(parse_boundary(content_type), Err(Error::NotMultipart));
    }
}
