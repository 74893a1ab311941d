//! Incremental decoder for a scrape job's response body.
//!
//! Turns a byte stream into `ScrapeEvent` values. Records may span chunks and
//! a chunk may hold several records; bytes are buffered until a whole JSON
//! value is available, including UTF-8 sequences split across chunks.

use bytes::Bytes;
use futures::stream::Stream;
use serde_json::Value;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::debug;

use crate::error::{Result, ScanError};
use crate::event::ScrapeEvent;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Stream adapter that converts raw response bytes into `ScrapeEvent` values.
///
/// Items are `Err(ScanError::ProtocolError)` for a record that could not be
/// classified (the stream keeps going) and `Err` of any other kind for a
/// transport failure, after which the stream ends.
pub struct StreamEventDecoder {
    inner: ByteStream,
    /// Decoded text; records before `offset` are already consumed.
    buffer: String,
    offset: usize,
    /// Trailing bytes of an incomplete UTF-8 sequence.
    pending: Vec<u8>,
    /// The unconsumed text holds no complete record yet.
    awaiting_input: bool,
    saw_terminal: bool,
    finished: bool,
}

impl StreamEventDecoder {
    pub fn new(byte_stream: impl Stream<Item = Result<Bytes>> + Send + 'static) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            buffer: String::new(),
            offset: 0,
            pending: Vec::new(),
            awaiting_input: false,
            saw_terminal: false,
            finished: false,
        }
    }

    /// True once a Completion or Error event has been yielded.
    pub fn saw_terminal(&self) -> bool {
        self.saw_terminal
    }

    /// True when the source ended before any terminal event was seen.
    pub fn ended_without_terminal(&self) -> bool {
        self.finished && !self.saw_terminal
    }

    /// Drop consumed text. Called once per chunk rather than once per record.
    fn compact(&mut self) {
        if self.offset > 0 {
            self.buffer.drain(..self.offset);
            self.offset = 0;
        }
    }

    fn push_bytes(&mut self, bytes: &[u8]) {
        self.compact();
        self.pending.extend_from_slice(bytes);
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    self.pending.clear();
                    return;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    self.buffer
                        .push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        // Incomplete sequence at the end: wait for the next chunk
                        None => {
                            self.pending.drain(..valid);
                            return;
                        }
                        Some(bad) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                    }
                }
            }
        }
    }

    fn emit(&mut self, record: Result<Value>) -> Result<ScrapeEvent> {
        let event = record.and_then(ScrapeEvent::from_value)?;
        if event.is_terminal() {
            self.saw_terminal = true;
        }
        Ok(event)
    }
}

impl Stream for StreamEventDecoder {
    type Item = Result<ScrapeEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if !this.awaiting_input {
                let (consumed, record) =
                    try_parse_record(&this.buffer[this.offset..], this.finished);
                this.offset += consumed;
                if let Some(record) = record {
                    return Poll::Ready(Some(this.emit(record)));
                }
                if this.finished {
                    return Poll::Ready(None);
                }
                this.awaiting_input = true;
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    debug!(len = bytes.len(), "received stream chunk");
                    this.push_bytes(&bytes);
                    // A partial record cannot complete without one of these
                    if bytes.iter().any(|b| matches!(b, b'}' | b']' | b'\n')) {
                        this.awaiting_input = false;
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    this.finished = true;
                    this.awaiting_input = false;
                    this.buffer.clear();
                    this.offset = 0;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    this.finished = true;
                    this.awaiting_input = false;
                    if !this.pending.is_empty() {
                        let tail = String::from_utf8_lossy(&this.pending).into_owned();
                        this.compact();
                        this.buffer.push_str(&tail);
                        this.pending.clear();
                    }
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Try to read one complete JSON value from the front of `input`.
///
/// Returns the number of bytes consumed and the record, if any. No record
/// means more input is needed. A syntax error consumes the offending line and
/// is reported once. With `at_end` set, an incomplete trailing value is
/// reported as truncated instead of waiting.
fn try_parse_record(input: &str, at_end: bool) -> (usize, Option<Result<Value>>) {
    let skipped = input.len() - input.trim_start().len();
    let rest = &input[skipped..];
    if rest.is_empty() {
        return (skipped, None);
    }

    let mut values = serde_json::Deserializer::from_str(rest).into_iter::<Value>();
    match values.next() {
        None => (skipped, None),
        Some(Ok(value)) => (skipped + values.byte_offset(), Some(Ok(value))),
        Some(Err(e)) if e.is_eof() => {
            if at_end {
                (
                    input.len(),
                    Some(Err(ScanError::ProtocolError(format!(
                        "truncated record at end of stream ({} bytes)",
                        rest.len()
                    )))),
                )
            } else {
                (skipped, None)
            }
        }
        Some(Err(e)) => {
            let line_end = match rest.find('\n') {
                Some(pos) => pos + 1,
                None if at_end => rest.len(),
                // The rest of the bad line has not arrived yet
                None => return (skipped, None),
            };
            let line = &rest[..line_end];
            (
                skipped + line_end,
                Some(Err(ScanError::ProtocolError(format!(
                    "malformed record ({}): {}",
                    e,
                    line.trim().chars().take(120).collect::<String>()
                )))),
            )
        }
    }
}
