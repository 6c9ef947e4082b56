//! Helpers for reading event-stream framed lines.
//!
//! The client yields streamed lines verbatim. Callers that want the payload
//! can classify each line here:
//!
//! ```text
//! data: {"choices":[{"delta":{"content":"Hel"}}]}
//! : keep-alive
//! data: [DONE]
//! ```

use serde_json::Value;

/// A classified event-stream line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SseLine<'a> {
    /// Payload after the `data:` marker
    Data(&'a str),
    /// The `[DONE]` end marker
    Done,
    /// Comment line, commonly used as a keep-alive
    Comment(&'a str),
    /// Any other field (`event:`, `id:`, ...) or unframed text
    Other(&'a str),
}

/// Classify a single streamed line.
///
/// # Example
/// ```
/// use deepseek_client::sse::{parse_sse_line, SseLine};
///
/// assert_eq!(parse_sse_line("data: {\"a\":1}"), SseLine::Data("{\"a\":1}"));
/// assert_eq!(parse_sse_line("data: [DONE]"), SseLine::Done);
/// assert_eq!(parse_sse_line(": keep-alive"), SseLine::Comment("keep-alive"));
/// ```
pub fn parse_sse_line(line: &str) -> SseLine<'_> {
    if let Some(data) = line.strip_prefix("data:") {
        let data = data.trim();
        if is_done_marker(data) {
            return SseLine::Done;
        }
        return SseLine::Data(data);
    }
    if let Some(comment) = line.strip_prefix(':') {
        return SseLine::Comment(comment.trim());
    }
    SseLine::Other(line)
}

/// Check if an SSE data payload marks the end of the stream.
pub fn is_done_marker(data: &str) -> bool {
    data == "[DONE]"
}

/// Extract `choices[0].delta.content` from a chat completion chunk payload.
///
/// Returns `None` when the payload is not JSON or carries no content delta.
pub fn delta_content(data: &str) -> Option<String> {
    let chunk: Value = serde_json::from_str(data).ok()?;
    chunk
        .pointer("/choices/0/delta/content")
        .and_then(Value::as_str)
        .map(str::to_string)
}
