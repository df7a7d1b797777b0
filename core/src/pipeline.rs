//! End-to-end convenience wrapper chaining the three blocks together.
//!
//! `spec.md` §2 describes the system as three blocks driven by an external
//! streaming scheduler that repeatedly calls `forecast`/`work` until input or
//! output is exhausted. [`Pipeline`] *is* that scheduler for callers who just
//! want to push samples in and pull decoded text out, without reimplementing
//! the forecast/work driving loop themselves — the GUI dock widget and SDR
//! front end this crate leaves out of scope would otherwise have to.

use std::sync::Mutex;

use num_complex::Complex32;

use crate::async_framer::AsyncFramer;
use crate::baudot::CharSink;
use crate::fsk_demod::FskDemod;

/// Output samples requested per internal `work` call while draining
/// available input. Arbitrary but large enough to amortize mutex overhead
/// without unbounded intermediate buffers.
const DRAIN_BATCH: usize = 256;

struct Carry {
    samples: Vec<Complex32>,
    symbols: Vec<f32>,
}

/// FSK demodulator → async framer → Baudot character sink, wired together.
pub struct Pipeline {
    demod: FskDemod,
    framer: AsyncFramer,
    sink: CharSink,
    carry: Mutex<Carry>,
}

impl Pipeline {
    pub fn new(demod: FskDemod, framer: AsyncFramer, sink: CharSink) -> Self {
        Self {
            demod,
            framer,
            sink,
            carry: Mutex::new(Carry {
                samples: Vec::new(),
                symbols: Vec::new(),
            }),
        }
    }

    pub fn demod(&self) -> &FskDemod {
        &self.demod
    }

    pub fn framer(&self) -> &AsyncFramer {
        &self.framer
    }

    pub fn sink(&self) -> &CharSink {
        &self.sink
    }

    /// Feed complex baseband samples into the chain, driving them as far
    /// through FSK demod → framer → Baudot sink as the data currently
    /// allows. Fully decoded lines are queued on the sink; pull them with
    /// [`Pipeline::pop_line`].
    pub fn push_samples(&self, input: &[Complex32]) {
        let mut carry = self.carry.lock().unwrap();
        carry.samples.extend_from_slice(input);

        let mut demod_out = vec![0.0f32; DRAIN_BATCH];
        loop {
            let (produced, consumed) = self.demod.work(DRAIN_BATCH, &carry.samples, &mut demod_out);
            if consumed == 0 {
                break;
            }
            carry.samples.drain(..consumed);
            if produced > 0 {
                carry.symbols.extend_from_slice(&demod_out[..produced]);
            }
            if produced == 0 {
                break;
            }
        }

        let mut framer_out = vec![0u8; DRAIN_BATCH];
        loop {
            let (produced, consumed) = self.framer.work(DRAIN_BATCH, &carry.symbols, &mut framer_out);
            if consumed == 0 {
                break;
            }
            carry.symbols.drain(..consumed);
            if produced > 0 {
                self.sink.push(&framer_out[..produced]);
            }
        }
    }

    /// Pull the oldest decoded line, if any.
    pub fn pop_line(&self) -> Option<String> {
        self.sink.pop()
    }
}
