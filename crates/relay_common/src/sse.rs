// --- File: crates/relay_common/src/sse.rs ---
//! Incremental parsing of SSE-style streamed responses.
//!
//! AI completion APIs stream newline-delimited `data: <json>` lines. The
//! collector buffers raw byte chunks, cuts them into complete lines, lets a
//! caller-supplied extractor pull the delta text out of each event, invokes
//! a per-delta callback and accumulates the full text. Lines that are not
//! `data:` events, carry invalid JSON or do not match the extractor are
//! skipped; `data: [DONE]` is a clean terminator.

use futures::StreamExt;
use serde_json::Value;

use crate::error::RelayError;

#[derive(Debug, Default)]
pub struct SseCollector {
    buffer: String,
    content: String,
}

impl SseCollector {
    pub fn new() -> Self {
        SseCollector::default()
    }

    /// Feeds one raw chunk. Partial trailing lines stay buffered until the
    /// next chunk completes them.
    pub fn push_chunk<F, C>(&mut self, chunk: &[u8], extract: &F, on_delta: &mut C)
    where
        F: Fn(&Value) -> Option<String>,
        C: FnMut(&str),
    {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));
        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            self.handle_line(line.trim(), extract, on_delta);
        }
    }

    fn handle_line<F, C>(&mut self, line: &str, extract: &F, on_delta: &mut C)
    where
        F: Fn(&Value) -> Option<String>,
        C: FnMut(&str),
    {
        let Some(payload) = line.strip_prefix("data: ") else {
            return;
        };
        if payload == "[DONE]" {
            return;
        }
        let Ok(event) = serde_json::from_str::<Value>(payload) else {
            // Skip invalid JSON
            return;
        };
        if let Some(delta) = extract(&event) {
            self.content.push_str(&delta);
            on_delta(&delta);
        }
    }

    /// Flushes any final unterminated line and returns the accumulated text.
    pub fn finish<F, C>(mut self, extract: &F, on_delta: &mut C) -> String
    where
        F: Fn(&Value) -> Option<String>,
        C: FnMut(&str),
    {
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.handle_line(line.trim(), extract, on_delta);
        }
        self.content
    }
}

/// Drives a [`SseCollector`] from a streamed reqwest response. Resolves
/// with the concatenation of all extracted deltas, in arrival order, after
/// the stream ends; a stream error rejects the whole call.
pub async fn collect_sse_stream<F, C>(
    response: reqwest::Response,
    extract: F,
    mut on_delta: C,
) -> Result<String, RelayError>
where
    F: Fn(&Value) -> Option<String>,
    C: FnMut(&str),
{
    let mut collector = SseCollector::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| RelayError::Transport(e.to_string()))?;
        collector.push_chunk(&chunk, &extract, &mut on_delta);
    }
    Ok(collector.finish(&extract, &mut on_delta))
}
