//! Response body shapes and text normalization.
//!
//! A transport may hand the body back as a pull-style reader or a push-style
//! chunk stream. [`ResponseBody::text_chunks`] is the single place both
//! shapes are normalized into an async sequence of decoded strings; the
//! multipart parser never sees the difference.

use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::transport::TransportError;

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// The two body shapes a transport may produce.
pub enum ResponseBody {
    /// Pull-style: an async reader the consumer drains with `read()`.
    Reader(Box<dyn AsyncRead + Send + Unpin>),
    /// Push-style: an async sequence of byte chunks.
    Chunks(BoxStream<'static, Result<Bytes, TransportError>>),
}

impl std::fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reader(_) => f.write_str("ResponseBody::Reader"),
            Self::Chunks(_) => f.write_str("ResponseBody::Chunks"),
        }
    }
}

impl ResponseBody {
    /// Builds a single-chunk push body from text. Mostly useful in tests and
    /// for synthetic responses.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        let bytes = Bytes::from(text.into());
        Self::Chunks(futures_util::stream::once(async move { Ok(bytes) }).boxed())
    }

    /// Normalizes the body into an async sequence of decoded UTF-8 strings.
    ///
    /// Incomplete multi-byte sequences at a chunk edge are carried over to
    /// the next chunk, so splitting the wire bytes at arbitrary positions
    /// never corrupts the decoded text. Dropping the returned stream releases
    /// the underlying reader or chunk source.
    #[must_use]
    pub fn text_chunks(self) -> BoxStream<'static, Result<String, TransportError>> {
        match self {
            Self::Chunks(chunks) => {
                let mut decoder = Utf8ChunkDecoder::new();
                chunks
                    .map(move |chunk| chunk.map(|bytes| decoder.decode(&bytes)))
                    .boxed()
            }
            Self::Reader(reader) => {
                let state = (reader, Utf8ChunkDecoder::new());
                futures_util::stream::unfold(state, |(mut reader, mut decoder)| async move {
                    let mut buf = vec![0u8; READ_BUFFER_SIZE];
                    match reader.read(&mut buf).await {
                        Ok(0) => None,
                        Ok(n) => Some((Ok(decoder.decode(&buf[..n])), (reader, decoder))),
                        Err(error) => {
                            Some((Err(TransportError::Body(error)), (reader, decoder)))
                        }
                    }
                })
                .boxed()
            }
        }
    }

    /// Drains the body and returns it as one decoded string.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if reading any chunk fails.
    pub async fn text(self) -> Result<String, TransportError> {
        self.text_chunks()
            .try_fold(String::new(), |mut acc, chunk| async move {
                acc.push_str(&chunk);
                Ok(acc)
            })
            .await
    }
}

/// Incremental UTF-8 decoder that buffers incomplete trailing sequences.
pub(crate) struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub(crate) const fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Decodes the next chunk of bytes, holding back any incomplete trailing
    /// multi-byte sequence until more input arrives.
    pub(crate) fn decode(&mut self, input: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(input);

        match std::str::from_utf8(&bytes) {
            Ok(text) => text.to_string(),
            Err(error) if error.error_len().is_none() => {
                // Incomplete sequence at the tail; keep it for the next chunk.
                let valid = error.valid_up_to();
                self.pending = bytes[valid..].to_vec();
                String::from_utf8_lossy(&bytes[..valid]).into_owned()
            }
            Err(_) => String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_text_collects_push_chunks() {
        let chunks = vec!["hello", " ", "world"];
        let stream = futures_util::stream::iter(
            chunks.into_iter().map(|c| Ok(Bytes::from_static(c.as_bytes()))),
        )
        .boxed();
        let body = ResponseBody::Chunks(stream);

        assert_eq!(body.text().await.unwrap(), "hello world");
    }

    #[tokio::test]
    async fn test_text_collects_pull_reader() {
        let reader = std::io::Cursor::new(b"pulled body".to_vec());
        let body = ResponseBody::Reader(Box::new(reader));

        assert_eq!(body.text().await.unwrap(), "pulled body");
    }

    #[tokio::test]
    async fn test_multibyte_codepoint_split_across_chunks() {
        // "日本" in UTF-8 is six bytes; split inside the second codepoint.
        let encoded = "日本".as_bytes();
        let stream = futures_util::stream::iter(vec![
            Ok(Bytes::copy_from_slice(&encoded[..4])),
            Ok(Bytes::copy_from_slice(&encoded[4..])),
        ])
        .boxed();
        let body = ResponseBody::Chunks(stream);

        assert_eq!(body.text().await.unwrap(), "日本");
    }

    #[test]
    fn test_decoder_holds_incomplete_tail() {
        let mut decoder = Utf8ChunkDecoder::new();
        let encoded = "é".as_bytes();

        assert_eq!(decoder.decode(&encoded[..1]), "");
        assert_eq!(decoder.decode(&encoded[1..]), "é");
    }

    #[test]
    fn test_decoder_replaces_invalid_bytes() {
        let mut decoder = Utf8ChunkDecoder::new();
        let decoded = decoder.decode(&[b'a', 0xFF, b'b']);
        assert!(decoded.starts_with('a'));
        assert!(decoded.ends_with('b'));
    }

    #[tokio::test]
    async fn test_from_text_round_trip() {
        let body = ResponseBody::from_text("{\"data\":{}}");
        assert_eq!(body.text().await.unwrap(), "{\"data\":{}}");
    }
}
