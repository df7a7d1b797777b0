//! Baudot (ITA2) decoding character sink.
//!
//! Ported from `gr::rtty::char_store` (`examples/original_source/src/dsp/rtty/char_store.cpp`):
//! a 5-bit-code-to-ASCII translator with letters/figures shift state, feeding
//! a bounded FIFO of completed strings that silently drops the oldest entry
//! on overflow.

use std::collections::VecDeque;
use std::sync::Mutex;

const SHIFT_FIGURES: u8 = 27;
const SHIFT_LETTERS: u8 = 31;

// Bit-exact per `spec.md` §6 (index = 5-bit Baudot code, NUL for unassigned slots).
const BAUDOT_LETTERS: [u8; 32] = [
    0, b'E', b'\n', b'A', b' ', b'S', b'I', b'U', b'\r', b'D', b'R', b'J', b'N', b'F', b'C', b'K',
    b'T', b'Z', b'L', b'W', b'H', b'Y', b'P', b'Q', b'O', b'B', b'G', 0, b'M', b'X', b'V', 0,
];
const BAUDOT_FIGURES: [u8; 32] = [
    0, b'3', b'\n', b'-', b' ', 0x07, b'8', b'7', b'\r', b'$', b'4', b'\'', b',', b'!', b':', b'(',
    b'5', b'+', b')', b'2', b'#', b'6', b'0', b'1', b'9', b'?', b'&', 0, b'.', b'/', b';', 0,
];

/// Translate a single 5-bit Baudot code in the given shift plane.
///
/// Returns `None` for a shift code (`LETTERS`/`FIGURES`), which carries no
/// character of its own and instead flips `figures` in the caller.
fn decode_code(code: u8, figures: bool) -> Option<u8> {
    let table = if figures { &BAUDOT_FIGURES } else { &BAUDOT_LETTERS };
    Some(table[(code & 0x1f) as usize])
}

struct SinkState {
    baudot: bool,
    figures: bool,
    capacity: usize,
    queue: VecDeque<String>,
    pending: String,
}

/// Bounded FIFO of decoded lines, fed by raw Baudot/ASCII bytes.
///
/// Each call to [`CharSink::push`] accumulates one string from the bytes
/// given and enqueues it once, matching `char_store::work`'s one-`store`-per-
/// `work()` behavior. When the queue is at capacity the oldest entry is
/// dropped silently, matching the original `boost::circular_buffer`.
pub struct CharSink {
    state: Mutex<SinkState>,
}

impl CharSink {
    pub fn new(capacity: usize, baudot: bool) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(SinkState {
                baudot,
                figures: false,
                capacity,
                queue: VecDeque::with_capacity(capacity),
                pending: String::new(),
            }),
        }
    }

    /// Toggle Baudot decoding. Matches the original: switching modes also
    /// resets the figures shift back to letters.
    pub fn set_baudot(&self, baudot: bool) {
        let mut state = self.state.lock().unwrap();
        state.baudot = baudot;
        state.figures = false;
    }

    pub fn baudot(&self) -> bool {
        self.state.lock().unwrap().baudot
    }

    /// Decode one batch of input bytes, appending to the pending line.
    /// Shift codes (27/31) update shift state and emit nothing. When
    /// `baudot` is false, bytes are appended verbatim (no masking), matching
    /// `char_store.cpp`'s `data += c` and the 8-bit-ASCII `word_len=8` path
    /// `spec.md` §6 recognizes.
    pub fn push(&self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let mut state = self.state.lock().unwrap();
        for &raw in bytes {
            if state.baudot {
                let code = raw & 0x1f;
                match code {
                    SHIFT_FIGURES => {
                        state.figures = true;
                        continue;
                    }
                    SHIFT_LETTERS => {
                        state.figures = false;
                        continue;
                    }
                    _ => {
                        if let Some(ch) = decode_code(code, state.figures) {
                            state.pending.push(ch as char);
                        }
                    }
                }
            } else {
                state.pending.push(raw as char);
            }
        }

        let line = std::mem::take(&mut state.pending);
        Self::store(&mut state, line);
    }

    fn store(state: &mut SinkState, line: String) {
        if state.queue.len() >= state.capacity {
            if state.queue.pop_front().is_some() {
                log::debug!("baudot: FIFO at capacity, dropped oldest entry");
            }
        }
        state.queue.push_back(line);
    }

    /// Pop the oldest decoded line, if any.
    pub fn pop(&self) -> Option<String> {
        self.state.lock().unwrap().queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.state.lock().unwrap().capacity
    }
}
