//! Streaming response handling.
//!
//! A streaming request hands back a [`StreamHandle`] as soon as the response
//! headers arrive. Turning it into a [`LineStream`] yields the body one
//! line at a time, exactly as the server sent it (framing prefixes such as
//! `data: ` included). Blank lines are keep-alive separators and are skipped.
//!
//! The line stream owns the connection. It is released when the stream is
//! exhausted, when it fails, or when the caller drops it early.

use bytes::{Bytes, BytesMut};
use futures::stream::{self, Stream, StreamExt};
use reqwest::StatusCode;
use std::fmt::Display;
use std::pin::Pin;
use tracing::{debug, trace};

use crate::client::ClientError;
use crate::http::api_error;

/// Single-pass stream of text lines from a streaming response body.
pub type LineStream = Pin<Box<dyn Stream<Item = Result<String, ClientError>> + Send>>;

/// A live streaming response whose body has not been read yet.
#[derive(Debug)]
pub struct StreamHandle {
    response: reqwest::Response,
}

impl StreamHandle {
    pub(crate) fn new(response: reqwest::Response) -> Self {
        Self { response }
    }

    /// HTTP status of the streaming response.
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    /// Apply the shared error normalization to a streaming response.
    ///
    /// Streaming calls skip normalization; use this to opt back in. On a
    /// non-success status the body is read and shaped into
    /// [`ClientError::Api`].
    pub async fn error_for_status(self) -> Result<Self, ClientError> {
        let status = self.response.status();
        if status.is_success() {
            return Ok(self);
        }
        let body = self.response.text().await?;
        Err(api_error(status, &body))
    }

    /// Consume the handle into a stream of non-empty body lines.
    pub fn into_lines(self) -> LineStream {
        Box::pin(lines(self.response.bytes_stream()))
    }

    /// Give back the underlying response.
    pub fn into_response(self) -> reqwest::Response {
        self.response
    }
}

struct LineState<S> {
    bytes: Pin<Box<S>>,
    buffer: BytesMut,
    done: bool,
}

/// Split a byte stream into UTF-8 lines.
///
/// Lines end at `\n`, `\r\n` or a lone `\r`. Empty lines are skipped. A
/// trailing line without a terminator is yielded when the byte stream ends.
/// The first transport error or invalid UTF-8 line ends the stream with
/// [`ClientError::Stream`]; nothing is yielded after it.
pub fn lines<S, E>(bytes: S) -> impl Stream<Item = Result<String, ClientError>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = LineState {
        bytes: Box::pin(bytes),
        buffer: BytesMut::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(raw) = take_line(&mut state.buffer, state.done) {
                if raw.is_empty() {
                    continue;
                }
                return match String::from_utf8(raw.to_vec()) {
                    Ok(line) => {
                        trace!(len = line.len(), "stream line");
                        Some((Ok(line), state))
                    }
                    Err(e) => {
                        state.done = true;
                        state.buffer.clear();
                        let err =
                            ClientError::Stream(format!("invalid UTF-8 in stream line: {}", e));
                        Some((Err(err), state))
                    }
                };
            }

            if state.done {
                debug!("stream ended");
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => state.buffer.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    state.done = true;
                    state.buffer.clear();
                    return Some((Err(ClientError::Stream(e.to_string())), state));
                }
                None => state.done = true,
            }
        }
    })
}

/// Take the next complete line off the buffer, without its terminator.
/// With `flush` set, an unterminated remainder counts as a line.
fn take_line(buffer: &mut BytesMut, flush: bool) -> Option<BytesMut> {
    let (end, terminator_len) = match buffer.iter().position(|&b| b == b'\n' || b == b'\r') {
        Some(pos) if buffer[pos] == b'\n' => (pos, 1),
        Some(pos) if pos + 1 < buffer.len() => {
            if buffer[pos + 1] == b'\n' {
                (pos, 2)
            } else {
                (pos, 1)
            }
        }
        // A trailing `\r` may be the first half of a `\r\n` split across chunks.
        Some(pos) if flush => (pos, 1),
        Some(_) => return None,
        None if flush && !buffer.is_empty() => return Some(buffer.split()),
        None => return None,
    };

    let mut line = buffer.split_to(end + terminator_len);
    line.truncate(end);
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(
        parts: Vec<Result<&'static str, &'static str>>,
    ) -> impl Stream<Item = Result<Bytes, String>> + Send {
        stream::iter(
            parts
                .into_iter()
                .map(|part| {
                    part.map(|s| Bytes::from_static(s.as_bytes()))
                        .map_err(str::to_string)
                })
                .collect::<Vec<_>>(),
        )
    }

    async fn collect(
        parts: Vec<Result<&'static str, &'static str>>,
    ) -> Vec<Result<String, ClientError>> {
        lines(chunks(parts)).collect().await
    }

    #[tokio::test]
    async fn test_lines_skip_blank_separators() {
        let out = collect(vec![Ok("data: one\n\ndata: two\n\n")]).await;
        let out: Vec<String> = out.into_iter().map(Result::unwrap).collect();
        assert_eq!(out, vec!["data: one", "data: two"]);
    }

    #[tokio::test]
    async fn test_lines_reassemble_across_chunks() {
        let out = collect(vec![Ok("data: {\"a\""), Ok(":1}\r"), Ok("\ndata: b\n")]).await;
        let out: Vec<String> = out.into_iter().map(Result::unwrap).collect();
        assert_eq!(out, vec!["data: {\"a\":1}", "data: b"]);
    }

    #[tokio::test]
    async fn test_lines_bare_carriage_return() {
        let out = collect(vec![Ok("data: one\rdata: two\r\r")]).await;
        let out: Vec<String> = out.into_iter().map(Result::unwrap).collect();
        assert_eq!(out, vec!["data: one", "data: two"]);
    }

    #[tokio::test]
    async fn test_lines_crlf_split_after_carriage_return() {
        let out = collect(vec![Ok("data: one\r"), Ok("\ndata: two\r"), Ok("data: three")]).await;
        let out: Vec<String> = out.into_iter().map(Result::unwrap).collect();
        assert_eq!(out, vec!["data: one", "data: two", "data: three"]);
    }

    #[tokio::test]
    async fn test_lines_multibyte_split_across_chunks() {
        let text = "data: héllo\n";
        let bytes = text.as_bytes();
        let split = text.find('é').unwrap() + 1;
        let parts = vec![
            Ok::<_, String>(Bytes::copy_from_slice(&bytes[..split])),
            Ok(Bytes::copy_from_slice(&bytes[split..])),
        ];
        let out: Vec<_> = lines(stream::iter(parts)).collect().await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].as_ref().unwrap(), "data: héllo");
    }

    #[tokio::test]
    async fn test_lines_flush_unterminated_tail() {
        let out = collect(vec![Ok("first\nlast")]).await;
        let out: Vec<String> = out.into_iter().map(Result::unwrap).collect();
        assert_eq!(out, vec!["first", "last"]);
    }

    #[tokio::test]
    async fn test_lines_empty_body() {
        assert!(collect(vec![]).await.is_empty());
        assert!(collect(vec![Ok("\n\r\n\n")]).await.is_empty());
    }

    #[tokio::test]
    async fn test_lines_transport_error_ends_stream() {
        let out = collect(vec![
            Ok("data: kept\n"),
            Err("connection reset"),
            Ok("data: never\n"),
        ])
        .await;

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].as_ref().unwrap(), "data: kept");
        match &out[1] {
            Err(ClientError::Stream(msg)) => assert_eq!(msg, "connection reset"),
            other => panic!("unexpected item: {other:?}"),
        }
        assert_eq!(
            out[1].as_ref().unwrap_err().to_string(),
            "Stream error: connection reset"
        );
    }

    #[tokio::test]
    async fn test_lines_partial_line_dropped_on_error() {
        let out = collect(vec![Ok("data: half"), Err("eof in chunk")]).await;
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0], Err(ClientError::Stream(_))));
    }

    #[tokio::test]
    async fn test_lines_invalid_utf8() {
        let parts = vec![
            Ok::<_, String>(Bytes::from_static(b"\xff\xfe\n")),
            Ok(Bytes::from_static(b"ok\n")),
        ];
        let out: Vec<_> = lines(stream::iter(parts)).collect().await;
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0], Err(ClientError::Stream(_))));
    }

    #[test]
    fn test_take_line() {
        let mut buffer = BytesMut::from("a\r\nb");
        assert_eq!(take_line(&mut buffer, false).unwrap(), "a");
        assert!(take_line(&mut buffer, false).is_none());
        assert_eq!(take_line(&mut buffer, true).unwrap(), "b");
        assert!(take_line(&mut buffer, true).is_none());
    }

    #[test]
    fn test_take_line_waits_on_trailing_carriage_return() {
        let mut buffer = BytesMut::from("a\r");
        assert!(take_line(&mut buffer, false).is_none());
        assert_eq!(buffer, "a\r");

        buffer.extend_from_slice(b"b");
        assert_eq!(take_line(&mut buffer, false).unwrap(), "a");
        assert_eq!(buffer, "b");

        let mut buffer = BytesMut::from("c\r");
        assert_eq!(take_line(&mut buffer, true).unwrap(), "c");
        assert!(buffer.is_empty());
    }
}
