// src/archive/fetch.rs
// =============================================================================
// Issues the index query and exposes the body as a lazy sequence of lines.
//
// Index responses for big domains can be enormous, so we never hold the
// whole body in memory: chunks are pulled from the response as they arrive
// and split on '\n'. A trailing '\r' is stripped (CRLF bodies) and truly
// empty lines are dropped; nothing else about a line is touched.
//
// The sequence is single pass. Once consumed, the response is gone.
// =============================================================================

use crate::error::{HuntError, Result};
use futures::stream::{self, Stream};
use reqwest::{Client, Response};
use tracing::{debug, info};
use url::Url;

/// Line reader over a successful index response
pub struct ArchiveLines {
    url: String,
    response: Response,
    buf: LineBuffer,
    finished: bool,
}

/// Sends the index query. Transport failures and non-2xx statuses are
/// returned as fatal fetch errors before any line is produced.
pub async fn fetch_index(client: &Client, url: &Url) -> Result<ArchiveLines> {
    info!(%url, "fetching archive index");

    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|source| HuntError::Fetch {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(HuntError::FetchStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(ArchiveLines {
        url: url.to_string(),
        response,
        buf: LineBuffer::default(),
        finished: false,
    })
}

impl ArchiveLines {
    /// Next non-empty line, or None once the body is exhausted
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(line) = self.buf.next_line() {
                return Ok(Some(line));
            }
            if self.finished {
                // last line without a trailing newline
                return Ok(self.buf.finish());
            }

            match self.response.chunk().await {
                Ok(Some(chunk)) => self.buf.push(&chunk),
                Ok(None) => {
                    debug!(url = %self.url, "index body exhausted");
                    self.finished = true;
                }
                Err(source) => {
                    return Err(HuntError::Fetch {
                        url: self.url.clone(),
                        source,
                    })
                }
            }
        }
    }

    /// Adapts the reader into a `Stream` for the filter pass
    pub fn into_stream(self) -> impl Stream<Item = Result<String>> {
        stream::try_unfold(self, |mut lines| async move {
            Ok::<_, HuntError>(lines.next_line().await?.map(|line| (line, lines)))
        })
    }
}

/// Bytes received so far that don't yet form a complete line.
///
/// Chunk boundaries can fall anywhere, including between '\r' and '\n',
/// so nothing is decoded until the '\n' has arrived.
#[derive(Debug, Default)]
struct LineBuffer {
    bytes: Vec<u8>,
    // bytes of `bytes` already searched for a newline
    scanned: usize,
}

impl LineBuffer {
    fn push(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    /// Next complete non-empty line, or None if more input is needed
    fn next_line(&mut self) -> Option<String> {
        loop {
            let offset = match self.bytes[self.scanned..].iter().position(|b| *b == b'\n') {
                Some(offset) => offset,
                None => {
                    self.scanned = self.bytes.len();
                    return None;
                }
            };
            let end = self.scanned + offset;
            let raw: Vec<u8> = self.bytes.drain(..=end).collect();
            self.scanned = 0;
            if let Some(line) = decode_line(&raw[..raw.len() - 1]) {
                return Some(line);
            }
        }
    }

    /// Whatever is left once the body has ended
    fn finish(&mut self) -> Option<String> {
        let raw = std::mem::take(&mut self.bytes);
        self.scanned = 0;
        decode_line(&raw)
    }
}

fn decode_line(raw: &[u8]) -> Option<String> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    if raw.is_empty() {
        return None;
    }
    match String::from_utf8(raw.to_vec()) {
        Ok(line) => Some(line),
        Err(e) => {
            // invalid bytes become U+FFFD, so the saved URL differs from the index
            let line = String::from_utf8_lossy(e.as_bytes()).into_owned();
            debug!(%line, "index line is not valid UTF-8, decoded lossily");
            Some(line)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn serve(status: u16, body: &str) -> (MockServer, Url) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cdx/search/cdx"))
            .and(query_param("fl", "original"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;
        let url = crate::archive::index_query_url(&server.uri(), "a.com").unwrap();
        (server, url)
    }

    async fn read_all(url: &Url) -> Vec<String> {
        fetch_index(&Client::new(), url)
            .await
            .unwrap()
            .into_stream()
            .try_collect()
            .await
            .unwrap()
    }

    // Feeds `body` in pieces of `size` bytes and drains after every push
    fn split_in_chunks(body: &[u8], size: usize) -> Vec<String> {
        let mut buf = LineBuffer::default();
        let mut lines = Vec::new();
        for chunk in body.chunks(size) {
            buf.push(chunk);
            while let Some(line) = buf.next_line() {
                lines.push(line);
            }
        }
        lines.extend(buf.finish());
        lines
    }

    #[tokio::test]
    async fn test_lines_drop_only_empty_entries() {
        let (_server, url) = serve(
            200,
            "http://a.com/x.pdf\n\nhttp://a.com/y.exe\r\n  \nhttp://a.com/z.pdf?v=2",
        )
        .await;

        assert_eq!(
            read_all(&url).await,
            vec![
                "http://a.com/x.pdf",
                "http://a.com/y.exe",
                "  ",
                "http://a.com/z.pdf?v=2",
            ]
        );
    }

    #[test]
    fn test_chunk_boundaries_do_not_change_lines() {
        let body = b"http://a.com/1.pdf\r\n\r\nhttp://a.com/2.sql\n\nhttp://a.com/3.zip?x=1\r\nlast";
        let expected = vec![
            "http://a.com/1.pdf",
            "http://a.com/2.sql",
            "http://a.com/3.zip?x=1",
            "last",
        ];

        // every size from one byte (splits each CRLF pair) up to the whole body
        for size in 1..=body.len() {
            assert_eq!(split_in_chunks(body, size), expected, "chunk size {}", size);
        }
    }

    #[test]
    fn test_invalid_utf8_is_kept_lossily() {
        let lines = split_in_chunks(b"http://a.com/\xff.pdf\n", 4);
        assert_eq!(lines, vec!["http://a.com/\u{FFFD}.pdf"]);
    }

    #[tokio::test]
    async fn test_large_body_with_mixed_line_endings() {
        let mut body = String::new();
        let mut expected = Vec::new();
        for i in 0..60_000 {
            let line = format!("http://a.com/files/{:06}/document.pdf?rev={}", i, i % 7);
            body.push_str(&line);
            body.push_str(if i % 3 == 0 { "\r\n" } else { "\n" });
            if i % 11 == 0 {
                body.push_str("\r\n\n");
            }
            expected.push(line);
        }
        assert!(body.len() > 2_500_000);
        let (_server, url) = serve(200, &body).await;

        let lines = read_all(&url).await;

        assert_eq!(lines.len(), expected.len());
        assert_eq!(lines, expected);
    }

    #[tokio::test]
    async fn test_server_error_is_fetch_error() {
        let (_server, url) = serve(500, "oops").await;
        let result = fetch_index(&Client::new(), &url).await;
        assert!(matches!(
            result,
            Err(HuntError::FetchStatus { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_is_fetch_error() {
        let url = crate::archive::index_query_url("http://127.0.0.1:1", "a.com").unwrap();
        let result = fetch_index(&Client::new(), &url).await;
        assert!(matches!(result, Err(HuntError::Fetch { .. })));
    }

    #[tokio::test]
    async fn test_empty_body_yields_no_lines() {
        let (_server, url) = serve(200, "").await;
        assert!(read_all(&url).await.is_empty());
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why `response.chunk()` instead of `response.text()`?
//    - text() buffers the whole body before returning
//    - chunk() hands us bytes as they arrive, so memory stays bounded by the
//      longest line rather than the size of the index
//
// 2. Why keep a `scanned` offset?
//    - When a chunk has no '\n' we remember how far we looked, so the next
//      search starts at the new bytes instead of rescanning the old ones
//
// 3. What is `try_unfold`?
//    - It builds a Stream from a state value and an async step function
//    - Each step returns Ok(Some((item, next_state))), Ok(None) to end the
//      stream, or Err to fail it
// -----------------------------------------------------------------------------
