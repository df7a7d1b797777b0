//! Asynchronous start/stop framer.
//!
//! Ported from `gr::rtty::async_rx` (`examples/original_source/src/dsp/rtty/async_rx_impl.cpp`):
//! a bit-timing-free state machine that locates idle line, start bit, data
//! bits, optional parity and stop bit in a stream of signed symbol samples,
//! emitting one decoded byte per successfully framed character.

use std::sync::Mutex;

use crate::error::{Result, RttyError};

/// Stable discriminants match `spec.md` §6 for any external serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Parity {
    None = 0,
    Odd = 1,
    Even = 2,
    Mark = 3,
    Space = 4,
    DontCare = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FramerState {
    WaitIdle,
    CheckIdle,
    Idle,
    CheckStart,
    GetBit,
    CheckParity,
    CheckStop,
}

struct Config {
    sample_rate: f32,
    bit_rate: f32,
    word_len: u8,
    parity: Parity,
    bit_len: f32,
}

impl Config {
    fn recompute_bit_len(&mut self) {
        self.bit_len = self.sample_rate / self.bit_rate;
    }
}

struct FrameScratch {
    state: FramerState,
    word: u8,
    bit_pos: u8,
    bit_count: u8,
}

/// Async start/stop bit framer: demodulated real samples in, framed character
/// bytes out.
pub struct AsyncFramer {
    config: Mutex<Config>,
    frame: Mutex<FrameScratch>,
}

impl AsyncFramer {
    pub fn new(sample_rate: f32, bit_rate: f32, word_len: u8, parity: Parity) -> Result<Self> {
        validate_sample_rate(sample_rate)?;
        validate_bit_rate(bit_rate)?;
        validate_bit_len(sample_rate, bit_rate)?;
        validate_word_len(word_len)?;

        let mut config = Config {
            sample_rate,
            bit_rate,
            word_len,
            parity,
            bit_len: 0.0,
        };
        config.recompute_bit_len();

        Ok(Self {
            config: Mutex::new(config),
            frame: Mutex::new(FrameScratch {
                state: FramerState::WaitIdle,
                word: 0,
                bit_pos: 0,
                bit_count: 0,
            }),
        })
    }

    pub fn set_sample_rate(&self, sample_rate: f32) -> Result<()> {
        validate_sample_rate(sample_rate)?;
        let mut cfg = self.config.lock().unwrap();
        validate_bit_len(sample_rate, cfg.bit_rate)?;
        cfg.sample_rate = sample_rate;
        cfg.recompute_bit_len();
        Ok(())
    }

    pub fn sample_rate(&self) -> f32 {
        self.config.lock().unwrap().sample_rate
    }

    pub fn set_bit_rate(&self, bit_rate: f32) -> Result<()> {
        validate_bit_rate(bit_rate)?;
        let mut cfg = self.config.lock().unwrap();
        validate_bit_len(cfg.sample_rate, bit_rate)?;
        cfg.bit_rate = bit_rate;
        cfg.recompute_bit_len();
        Ok(())
    }

    pub fn bit_rate(&self) -> f32 {
        self.config.lock().unwrap().bit_rate
    }

    pub fn set_word_len(&self, word_len: u8) -> Result<()> {
        validate_word_len(word_len)?;
        self.config.lock().unwrap().word_len = word_len;
        Ok(())
    }

    pub fn word_len(&self) -> u8 {
        self.config.lock().unwrap().word_len
    }

    pub fn set_parity(&self, parity: Parity) {
        self.config.lock().unwrap().parity = parity;
    }

    pub fn parity(&self) -> Parity {
        self.config.lock().unwrap().parity
    }

    pub fn bit_len(&self) -> f32 {
        self.config.lock().unwrap().bit_len
    }

    /// Atomically return the framer to `WAIT_IDLE`. Safe to call while the
    /// pipeline is stopped; does not touch in-progress frame scratch beyond
    /// the state tag, matching `async_rx_impl::reset`.
    pub fn reset(&self) {
        self.frame.lock().unwrap().state = FramerState::WaitIdle;
    }

    pub fn forecast(&self, n_out: usize) -> usize {
        let cfg = self.config.lock().unwrap();
        let parity_bit = if cfg.parity == Parity::None { 0.0 } else { 1.0 };
        let frame_bits = cfg.word_len as f32 + 2.0 + parity_bit;
        (n_out as f32 * frame_bits * cfg.bit_len).ceil() as usize
    }

    /// Demodulate up to `n_out` characters out of `input`. Returns
    /// `(produced, consumed)`; `consumed` is the number of input samples the
    /// fractional bit cursor advanced past, rounded to the nearest sample as
    /// in the original block's `consume_each((int)roundf(in_count))`.
    pub fn work(&self, n_out: usize, input: &[f32], output: &mut [u8]) -> (usize, usize) {
        let (word_len, parity, bit_len) = {
            let cfg = self.config.lock().unwrap();
            (cfg.word_len, cfg.parity, cfg.bit_len)
        };
        let window = (bit_len.round().max(1.0)) as usize;
        let n_out = n_out.min(output.len());

        let mut frame = self.frame.lock().unwrap();
        let mut in_count: f32 = 0.0;
        let mut out_count = 0usize;

        while out_count < n_out {
            let pos = in_count.round().max(0.0) as usize;
            if pos + window > input.len() {
                break;
            }
            let s: f32 = input[pos..pos + window].iter().sum();

            match frame.state {
                FramerState::WaitIdle => {
                    if s > 0.0 {
                        in_count += bit_len / 2.0 + 1.0;
                        frame.state = FramerState::CheckIdle;
                    } else {
                        in_count += 1.0;
                    }
                }
                FramerState::CheckIdle => {
                    if s > 0.0 {
                        in_count += bit_len;
                        frame.word = 0;
                        frame.bit_pos = 0;
                        frame.bit_count = 0;
                        frame.state = FramerState::Idle;
                    } else {
                        in_count -= bit_len / 2.0;
                        frame.state = FramerState::WaitIdle;
                    }
                }
                FramerState::Idle => {
                    if s <= 0.0 {
                        in_count += bit_len / 2.0 + 1.0;
                        frame.state = FramerState::CheckStart;
                    } else {
                        in_count += 1.0;
                    }
                }
                FramerState::CheckStart => {
                    if s <= 0.0 {
                        in_count += bit_len;
                        frame.word = 0;
                        frame.bit_pos = 0;
                        frame.bit_count = 0;
                        frame.state = FramerState::GetBit;
                    } else {
                        in_count -= bit_len / 2.0;
                        frame.state = FramerState::Idle;
                    }
                }
                FramerState::GetBit => {
                    if s > 0.0 {
                        frame.word |= 1 << frame.bit_pos;
                        frame.bit_count += 1;
                    }
                    in_count += bit_len;
                    frame.bit_pos += 1;
                    if frame.bit_pos == word_len {
                        frame.state = if parity == Parity::None {
                            FramerState::CheckStop
                        } else {
                            FramerState::CheckParity
                        };
                    }
                }
                FramerState::CheckParity => {
                    let ones_odd = frame.bit_count & 1 == 1;
                    match parity {
                        Parity::None => {
                            frame.state = FramerState::CheckStop;
                        }
                        Parity::Odd => {
                            let pass = (s <= 0.0 && ones_odd) || (s > 0.0 && !ones_odd);
                            if pass {
                                in_count += bit_len;
                                frame.state = FramerState::CheckStop;
                            } else {
                                in_count += 1.0;
                                frame.state = if s >= 0.0 { FramerState::Idle } else { FramerState::WaitIdle };
                            }
                        }
                        Parity::Even => {
                            let pass = (s <= 0.0 && !ones_odd) || (s > 0.0 && ones_odd);
                            if pass {
                                in_count += bit_len;
                                frame.state = FramerState::CheckStop;
                            } else {
                                in_count += 1.0;
                                frame.state = if s >= 0.0 { FramerState::Idle } else { FramerState::WaitIdle };
                            }
                        }
                        Parity::Mark => {
                            if s > 0.0 {
                                in_count += bit_len;
                                frame.state = FramerState::CheckStop;
                            } else {
                                in_count += 1.0;
                                frame.state = FramerState::WaitIdle;
                            }
                        }
                        Parity::Space => {
                            if s <= 0.0 {
                                in_count += bit_len;
                                frame.state = FramerState::CheckStop;
                            } else {
                                in_count += 1.0;
                                frame.state = FramerState::Idle;
                            }
                        }
                        Parity::DontCare => {
                            in_count += bit_len;
                            frame.state = FramerState::CheckStop;
                        }
                    }
                }
                FramerState::CheckStop => {
                    if s > 0.0 {
                        output[out_count] = frame.word;
                        out_count += 1;
                        frame.state = FramerState::Idle;
                    } else {
                        log::debug!("async_framer: framing error, stop bit not mark");
                        frame.state = FramerState::WaitIdle;
                    }
                    in_count += bit_len;
                }
            }
        }

        let consumed = (in_count.round().max(0.0) as usize).min(input.len());
        (out_count, consumed)
    }
}

fn validate_sample_rate(sample_rate: f32) -> Result<()> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(RttyError::InvalidSampleRate(sample_rate));
    }
    Ok(())
}

fn validate_bit_rate(bit_rate: f32) -> Result<()> {
    if !bit_rate.is_finite() || bit_rate <= 0.0 {
        return Err(RttyError::InvalidBitRate(bit_rate));
    }
    Ok(())
}

/// `spec.md` §3 invariant: `bit_len = sample_rate / bit_rate > 1`. A ratio of
/// 1 or less leaves no room for the mid-bit sampling window the symbol test
/// integrates over.
fn validate_bit_len(sample_rate: f32, bit_rate: f32) -> Result<()> {
    let bit_len = sample_rate / bit_rate;
    if !(bit_len > 1.0) {
        return Err(RttyError::InvalidBitRate(bit_rate));
    }
    Ok(())
}

fn validate_word_len(word_len: u8) -> Result<()> {
    if word_len == 0 || word_len > 8 {
        return Err(RttyError::InvalidWordLen(word_len));
    }
    Ok(())
}

/// Test-only frame encoder: synthesizes a ±1 soft-decision sample stream for
/// a single async character, used purely as a fixture to drive the framer in
/// tests. This is not a transmit feature of the crate (`spec.md` §1 excludes
/// encode from the core's scope).
#[cfg(test)]
pub(crate) fn encode_frame_samples(
    byte: u8,
    word_len: u8,
    parity: Parity,
    bit_len: usize,
) -> Vec<f32> {
    let mut bits = vec![0.0f32; bit_len]; // start bit: space
    let mut ones = 0u32;
    for i in 0..word_len {
        let bit = (byte >> i) & 1;
        let level = if bit == 1 { 1.0 } else { -1.0 };
        if bit == 1 {
            ones += 1;
        }
        bits.extend(std::iter::repeat(level).take(bit_len));
    }
    if parity != Parity::None {
        let parity_mark = match parity {
            Parity::Odd => ones % 2 == 0, // need odd ones total, so parity bit makes it odd
            Parity::Even => ones % 2 == 1,
            Parity::Mark => true,
            Parity::Space => false,
            Parity::DontCare => true,
            Parity::None => unreachable!(),
        };
        let level = if parity_mark { 1.0 } else { -1.0 };
        bits.extend(std::iter::repeat(level).take(bit_len));
    }
    bits.extend(std::iter::repeat(1.0f32).take(bit_len)); // stop bit: mark
    bits
}
