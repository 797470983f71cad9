//! Token stream over the naming endpoint's line protocol.
//!
//! The endpoint answers with newline-delimited Server-Sent-Events lines:
//!
//! ```text
//! data: {"event":"cmpl","text":"sunset"}
//! data: {"event":"cmpl","text":"-beach.jpg"}
//! data: {"event":"all_done"}
//! ```
//!
//! `cmpl` events carry a token, an object with an `error` field aborts the
//! stream, and every other line is ignored. The byte stream is re-chunked into
//! lines, so a token split across network reads is handled.

use bytes::{Bytes, BytesMut};
use futures_util::stream::BoxStream;
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use tracing::trace;

use super::error::NamingError;

/// Event name of a completion token.
const COMPLETION_EVENT: &str = "cmpl";

/// Longest line accepted before the stream is abandoned.
pub(crate) const MAX_LINE_BYTES: usize = 64 * 1024;

/// One decoded `data:` payload.
#[derive(Debug, Default, Deserialize)]
struct StreamEvent {
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// Decodes one protocol line.
///
/// Returns `Ok(Some(token))` for a completion token, `Ok(None)` for lines to
/// skip, and `Err` for an in-stream error event or undecodable JSON.
pub(crate) fn parse_line(line: &str) -> Result<Option<String>, NamingError> {
    let Some(payload) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let payload = payload.trim();
    if payload.is_empty() {
        return Ok(None);
    }

    let event: Option<StreamEvent> =
        serde_json::from_str(payload).map_err(|source| NamingError::MalformedEvent {
            line: line.to_string(),
            source,
        })?;
    let Some(event) = event else {
        return Ok(None);
    };

    if let Some(error) = event.error {
        let message = match error {
            serde_json::Value::String(message) => message,
            other => other.to_string(),
        };
        return Err(NamingError::stream_error(message));
    }

    if event.event.as_deref() == Some(COMPLETION_EVENT) {
        return Ok(event.text);
    }
    Ok(None)
}

struct LineState<S> {
    stream: S,
    buf: BytesMut,
    url: String,
    done: bool,
}

/// Turns a response byte stream into a lazy stream of name tokens.
///
/// The stream ends when the response ends or after yielding the first error.
/// A line longer than [`MAX_LINE_BYTES`] is an error. Dropping the stream
/// early releases the underlying connection.
pub(crate) fn token_stream<S>(
    byte_stream: S,
    url: String,
) -> BoxStream<'static, Result<String, NamingError>>
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
{
    let state = LineState {
        stream: byte_stream.boxed(),
        buf: BytesMut::new(),
        url,
        done: false,
    };

    futures_util::stream::unfold(state, |mut st| async move {
        if st.done {
            return None;
        }

        loop {
            if let Some(line_end) = st.buf.iter().position(|&b| b == b'\n') {
                let line = st.buf.split_to(line_end + 1);
                if let Some(item) = decode(&line, &mut st.done) {
                    return Some((item, st));
                }
                continue;
            }

            if st.buf.len() > MAX_LINE_BYTES {
                st.done = true;
                st.buf.clear();
                return Some((
                    Err(NamingError::OversizedLine {
                        limit: MAX_LINE_BYTES,
                    }),
                    st,
                ));
            }

            match st.stream.next().await {
                Some(Ok(chunk)) => st.buf.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    st.done = true;
                    return Some((Err(NamingError::transport(st.url.clone(), e)), st));
                }
                None => {
                    // Trailing line without a newline.
                    st.done = true;
                    let rest = st.buf.split();
                    return decode(&rest, &mut st.done).map(|item| (item, st));
                }
            }
        }
    })
    .boxed()
}

/// Decodes a raw line; `None` means skip. Errors mark the stream done.
fn decode(raw: &[u8], done: &mut bool) -> Option<Result<String, NamingError>> {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim_end_matches(['\r', '\n']);
    trace!(line, "naming stream line");

    match parse_line(line) {
        Ok(Some(token)) => Some(Ok(token)),
        Ok(None) => None,
        Err(e) => {
            *done = true;
            Some(Err(e))
        }
    }
}
