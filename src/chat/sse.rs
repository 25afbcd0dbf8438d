use std::pin::Pin;

use bytes::Bytes;
use futures::stream::{Stream, StreamExt};

use crate::error::ChatError;

use super::event::StreamEvent;

/// A lazy, finite, non-restartable sequence of decoded stream events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, ChatError>> + Send>>;

const DATA_PREFIX: &str = "data: ";

/// Turn a streaming HTTP response into a sequence of [`StreamEvent`]s.
///
/// Chunk boundaries carry no meaning: lines and multi-byte code points may
/// be split arbitrarily across reads and are reassembled before decoding.
/// A malformed payload line is skipped rather than terminating the stream.
pub fn event_stream(response: reqwest::Response) -> EventStream {
    let stream = response
        .bytes_stream()
        .scan(SseState::default(), |state, chunk| {
            let results = handle_chunk(state, chunk);
            async move { Some(results) }
        })
        .flat_map(futures::stream::iter);

    Box::pin(stream)
}

#[derive(Default)]
struct SseState {
    buffer: String,
    utf8_buffer: Vec<u8>,
}

fn handle_chunk(
    state: &mut SseState,
    chunk: Result<Bytes, reqwest::Error>,
) -> Vec<Result<StreamEvent, ChatError>> {
    let bytes = match chunk {
        Ok(bytes) => bytes,
        Err(err) => return vec![Err(ChatError::HttpError(err.to_string()))],
    };

    state.push_bytes(&bytes);
    state.drain_events()
}

impl SseState {
    fn push_bytes(&mut self, bytes: &[u8]) {
        self.utf8_buffer.extend_from_slice(bytes);
        match std::str::from_utf8(&self.utf8_buffer) {
            Ok(text) => {
                self.buffer.push_str(text);
                self.utf8_buffer.clear();
            }
            Err(err) => self.consume_valid_prefix(err.valid_up_to()),
        }
    }

    fn consume_valid_prefix(&mut self, valid_up_to: usize) {
        if valid_up_to == 0 {
            return;
        }

        let valid = String::from_utf8_lossy(&self.utf8_buffer[..valid_up_to]);
        self.buffer.push_str(&valid);
        self.utf8_buffer.drain(..valid_up_to);
    }

    fn drain_events(&mut self) -> Vec<Result<StreamEvent, ChatError>> {
        let mut results = Vec::new();
        while let Some(line) = self.next_line() {
            if let Some(event) = parse_line(&line) {
                results.push(Ok(event));
            }
        }
        results
    }

    fn next_line(&mut self) -> Option<String> {
        let pos = self.buffer.find('\n')?;
        let line = self.buffer[..pos].to_string();
        self.buffer.drain(..=pos);
        Some(line)
    }
}

fn parse_line(line: &str) -> Option<StreamEvent> {
    let payload = line.strip_prefix(DATA_PREFIX)?;
    match serde_json::from_str::<StreamEvent>(payload) {
        Ok(StreamEvent::Unknown) => None,
        Ok(event) => Some(event),
        Err(err) => {
            log::debug!("skipping malformed stream line: {err}");
            None
        }
    }
}

#[cfg(test)]
#[path = "sse_tests.rs"]
mod tests;
