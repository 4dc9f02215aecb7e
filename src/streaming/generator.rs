//! Text generation interface
//!
//! The control loop only needs "prompt in, continuation out". Tokens may be
//! surfaced through a side-channel callback while the continuation is being
//! produced, but the returned string is what every decision is based on.

use crate::errors::Result;
use async_trait::async_trait;

/// Marker the model would write before an observation it must not invent
pub const OBSERVATION_STOP: &str = "Observation:";

/// Stop sequences used by the control loop
pub const DEFAULT_STOP_SEQUENCES: &[&str] = &[OBSERVATION_STOP];

/// Per-token side channel
pub type TokenSink<'a> = &'a mut (dyn FnMut(&str) + Send);

/// Something that continues a prompt
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Continue `prompt`, halting before the first stop sequence
    ///
    /// The returned text never contains any of `stop`. Failures are reported
    /// as `AgentError::Generation`.
    async fn generate(
        &self,
        prompt: &str,
        stop: &[&str],
        on_token: Option<TokenSink<'_>>,
    ) -> Result<String>;

    /// Short label for logs and the `doctor` command
    fn name(&self) -> &str;
}

/// Byte offset of the earliest stop sequence that begins a line
///
/// A stop sequence only counts at the start of `text` or right after a
/// newline, so `Observation:` quoted inside an answer is left alone.
pub fn find_stop(text: &str, stop: &[&str]) -> Option<usize> {
    stop.iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            text.match_indices(s)
                .map(|(pos, _)| pos)
                .find(|&pos| pos == 0 || text[..pos].ends_with('\n'))
        })
        .min()
}

/// Where the still-undecided tail of `text` begins
///
/// The last line is held back while it could still grow into a stop sequence.
fn undecided_from(text: &str, stop: &[&str]) -> usize {
    let line_start = text.rfind('\n').map_or(0, |i| i + 1);
    let tail = &text[line_start..];
    if !tail.is_empty() && stop.iter().any(|s| !s.is_empty() && s.starts_with(tail)) {
        line_start
    } else {
        text.len()
    }
}

/// Incremental stop detection over streamed pieces
///
/// Pieces are forwarded to the token sink only once they cannot be part of a
/// stop sequence, so the side channel never shows text the continuation drops.
#[derive(Debug)]
pub struct StopScanner<'a> {
    stop: &'a [&'a str],
    text: String,
    released: usize,
    stopped: bool,
}

impl<'a> StopScanner<'a> {
    pub fn new(stop: &'a [&'a str]) -> Self {
        Self {
            stop,
            text: String::new(),
            released: 0,
            stopped: false,
        }
    }

    /// Append one piece; returns true once a stop sequence has been reached
    pub fn push(&mut self, piece: &str, on_token: &mut Option<TokenSink<'_>>) -> bool {
        if self.stopped {
            return true;
        }

        self.text.push_str(piece);
        let end = match find_stop(&self.text, self.stop) {
            Some(pos) => {
                self.text.truncate(pos);
                self.stopped = true;
                pos
            }
            None => undecided_from(&self.text, self.stop),
        };
        self.release(end, on_token);
        self.stopped
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Flush anything held back and return the continuation
    pub fn finish(mut self, on_token: &mut Option<TokenSink<'_>>) -> String {
        let end = self.text.len();
        self.release(end, on_token);
        self.text
    }

    fn release(&mut self, end: usize, on_token: &mut Option<TokenSink<'_>>) {
        if end <= self.released {
            return;
        }
        if let Some(sink) = on_token.as_deref_mut() {
            sink(&self.text[self.released..end]);
        }
        self.released = end;
    }
}

/// Cut `text` at the earliest line-initial stop sequence, if any
pub fn truncate_at_stop<'a>(text: &'a str, stop: &[&str]) -> &'a str {
    match find_stop(text, stop) {
        Some(pos) => &text[..pos],
        None => text,
    }
}
