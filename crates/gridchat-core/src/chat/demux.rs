//! Incremental `<think>…</think>` stream demultiplexer.
//!
//! Splits a backend delta stream into a reasoning channel and an answer
//! channel. Delta boundaries carry no meaning: either delimiter may arrive
//! split across any number of deltas, so the machine keeps a small rolling
//! buffer holding only the text that could still participate in a pending
//! delimiter match. Everything confirmed as not participating is flushed
//! immediately, which keeps incremental display latency low and the buffer
//! bounded.
//!
//! The machine is a pure transformation: no I/O, no persistence. Output is
//! deterministic and chunking-invariant -- feeding the same full text in any
//! delta split produces the same per-channel concatenations.

use gridchat_types::chat::StreamFragment;

/// Opening delimiter of a reasoning span.
pub const THINK_OPEN: &str = "<think>";
/// Closing delimiter of a reasoning span.
pub const THINK_CLOSE: &str = "</think>";

/// Whitespace allowance before the open delimiter. Backends emit at most a
/// newline or two of preamble; anything longer is answer text, which also
/// keeps the `SeekingOpen` buffer bounded on whitespace-only streams.
const MAX_PREAMBLE_BYTES: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// No delimiter decision yet. Buffered text is provisional: it is either
    /// leading whitespace that may precede `<think>`, or a partial prefix of
    /// the delimiter itself.
    SeekingOpen,
    /// Inside a reasoning span, watching for `</think>`.
    InThink,
    /// No reasoning span exists or it has closed; everything is answer text.
    Passthrough,
}

/// Streaming demultiplexer for a single backend response.
///
/// Feed deltas with [`push`](Self::push), then call
/// [`finish`](Self::finish) once the input stream ends to flush whatever
/// the machine was still holding back.
#[derive(Debug)]
pub struct ThinkDemux {
    state: State,
    buf: String,
}

impl Default for ThinkDemux {
    fn default() -> Self {
        Self::new()
    }
}

impl ThinkDemux {
    pub fn new() -> Self {
        Self {
            state: State::SeekingOpen,
            buf: String::new(),
        }
    }

    /// Consume one input delta and return the fragments it resolves.
    ///
    /// A reasoning span is only recognized at the start of the response
    /// (leading whitespace allowed, never emitted). The first character that
    /// rules the open delimiter out switches the machine to passthrough and
    /// releases the whole buffer as answer text, so nothing except the
    /// whitespace preamble of a detected span is ever dropped.
    pub fn push(&mut self, delta: &str) -> Vec<StreamFragment> {
        let mut out = Vec::new();
        self.buf.push_str(delta);

        loop {
            match self.state {
                State::SeekingOpen => {
                    let rest = self.buf.trim_start();
                    let preamble = self.buf.len() - rest.len();
                    // Checked before delimiter recognition so the outcome
                    // depends only on the accumulated text, never on how it
                    // was chunked into deltas.
                    if preamble > MAX_PREAMBLE_BYTES {
                        self.state = State::Passthrough;
                        continue;
                    }
                    if rest.starts_with(THINK_OPEN) {
                        // Drop the whitespace preamble and the delimiter.
                        let consumed = preamble + THINK_OPEN.len();
                        self.buf.drain(..consumed);
                        self.state = State::InThink;
                        continue;
                    }
                    if rest.len() < THINK_OPEN.len() && THINK_OPEN.starts_with(rest) {
                        // Still ambiguous: whitespace plus a partial "<think".
                        break;
                    }
                    self.state = State::Passthrough;
                    continue;
                }
                State::InThink => {
                    if let Some(pos) = self.buf.find(THINK_CLOSE) {
                        if pos > 0 {
                            out.push(StreamFragment::think(&self.buf[..pos]));
                        }
                        self.buf.drain(..pos + THINK_CLOSE.len());
                        self.state = State::Passthrough;
                        continue;
                    }
                    // Hold back only the longest suffix that could still be
                    // the start of the close delimiter.
                    let keep = partial_suffix_len(&self.buf, THINK_CLOSE);
                    let flush_to = self.buf.len() - keep;
                    if flush_to > 0 {
                        out.push(StreamFragment::think(&self.buf[..flush_to]));
                        self.buf.drain(..flush_to);
                    }
                    break;
                }
                State::Passthrough => {
                    if !self.buf.is_empty() {
                        out.push(StreamFragment::answer(std::mem::take(&mut self.buf)));
                    }
                    break;
                }
            }
        }

        out
    }

    /// Flush whatever the machine was retaining once input has ended.
    ///
    /// A stream that ends inside a reasoning span (close delimiter never
    /// arrived) is a soft condition, not an error: the retained text,
    /// including any partial close tag, is released as reasoning. A stream
    /// that ends while the open delimiter was still ambiguous releases the
    /// retained text as answer, since no reasoning span ever materialized.
    pub fn finish(&mut self) -> Option<StreamFragment> {
        let tail = std::mem::take(&mut self.buf);
        let state = std::mem::replace(&mut self.state, State::Passthrough);
        if tail.is_empty() {
            return None;
        }
        match state {
            State::InThink => Some(StreamFragment::think(tail)),
            State::SeekingOpen | State::Passthrough => Some(StreamFragment::answer(tail)),
        }
    }
}

/// Split a complete (non-streamed) response into reasoning and answer.
///
/// Runs the identical state machine over the whole text in one pass, so the
/// delimiter semantics match the streaming path exactly. Both channels are
/// trimmed of surrounding whitespace; reasoning is `None` when no span was
/// found or the span was empty.
pub fn split_completion(text: &str) -> (Option<String>, String) {
    let mut demux = ThinkDemux::new();
    let mut think = String::new();
    let mut answer = String::new();
    let mut saw_think = false;

    let mut absorb = |frag: StreamFragment| match frag.channel {
        gridchat_types::chat::FragmentChannel::Think => {
            saw_think = true;
            think.push_str(&frag.text);
        }
        gridchat_types::chat::FragmentChannel::Answer => answer.push_str(&frag.text),
    };

    for frag in demux.push(text) {
        absorb(frag);
    }
    if let Some(frag) = demux.finish() {
        absorb(frag);
    }

    let reasoning = if saw_think && !think.trim().is_empty() {
        Some(think.trim().to_string())
    } else {
        None
    };
    (reasoning, answer.trim().to_string())
}

/// Length of the longest suffix of `buf` that is a proper prefix of `pat`.
///
/// `pat` is ASCII; `buf` may be arbitrary UTF-8, so suffix candidates are
/// only considered at char boundaries.
fn partial_suffix_len(buf: &str, pat: &str) -> usize {
    let max = pat.len().saturating_sub(1).min(buf.len());
    for k in (1..=max).rev() {
        if !buf.is_char_boundary(buf.len() - k) {
            continue;
        }
        if pat.starts_with(&buf[buf.len() - k..]) {
            return k;
        }
    }
    0
}
