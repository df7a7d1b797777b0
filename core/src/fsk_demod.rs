//! FSK correlation demodulator.
//!
//! Ported from `gr::rtty::fsk_demod` (`examples/original_source/src/dsp/rtty/fsk_demod_impl.cpp`
//! in the retrieval pack this crate was built against): a matched-filter tone
//! detector that turns complex baseband samples into a signed, decimated
//! mark/space symbol stream.

use std::f32::consts::TAU;
use std::sync::{Arc, Mutex};

use num_complex::Complex32;

use crate::error::{Result, RttyError};

/// Unit-modulus matched-filter template for one tone, one full cycle long.
fn build_template(div: usize, freq: f32, sample_rate: f32) -> Vec<Complex32> {
    let mut template = Vec::with_capacity(div);
    for k in 0..div {
        let n = (div - k) as f32;
        let angle = TAU * freq * n / sample_rate;
        template.push(Complex32::new(angle.cos(), angle.sin()));
    }
    template
}

/// `div = max(1, round(sample_rate / |freq|))`, with `freq == 0` short-circuited
/// to 1 rather than relying on the division to produce 0 and clamping it —
/// this mirrors `fsk_demod_impl::set_mark_freq` exactly.
fn tone_div(freq: f32, sample_rate: f32) -> usize {
    if freq == 0.0 {
        1
    } else {
        let div = (sample_rate / freq.abs()).round() as i64;
        if div <= 0 {
            1
        } else {
            div as usize
        }
    }
}

struct Config {
    sample_rate: f32,
    mark_freq: f32,
    space_freq: f32,
    decimation: usize,
    mark_div: usize,
    space_div: usize,
    corr_mark: Arc<Vec<Complex32>>,
    corr_space: Arc<Vec<Complex32>>,
}

impl Config {
    fn new() -> Self {
        let mut cfg = Self {
            sample_rate: 8000.0,
            mark_freq: 2295.0,
            space_freq: 2125.0,
            decimation: 1,
            mark_div: 1,
            space_div: 1,
            corr_mark: Arc::new(vec![Complex32::new(1.0, 0.0)]),
            corr_space: Arc::new(vec![Complex32::new(1.0, 0.0)]),
        };
        cfg.recompute_mark();
        cfg.recompute_space();
        cfg
    }

    fn recompute_mark(&mut self) {
        self.mark_div = tone_div(self.mark_freq, self.sample_rate);
        self.corr_mark = Arc::new(build_template(self.mark_div, self.mark_freq, self.sample_rate));
    }

    fn recompute_space(&mut self) {
        self.space_div = tone_div(self.space_freq, self.sample_rate);
        self.corr_space = Arc::new(build_template(self.space_div, self.space_freq, self.sample_rate));
    }

    fn history(&self) -> usize {
        self.mark_div.max(self.space_div)
    }
}

/// Matched-filter FSK demodulator: complex baseband in, signed symbol samples out.
///
/// Configuration (sample rate, tone frequencies, decimation) lives behind a
/// single mutex, as in the original GNU Radio block; `work` only takes the
/// lock long enough to snapshot the current templates, so the sample path
/// itself never blocks on a setter running concurrently.
pub struct FskDemod {
    config: Mutex<Config>,
}

impl FskDemod {
    pub fn new(sample_rate: f32, mark_freq: f32, space_freq: f32, decimation: usize) -> Result<Self> {
        let demod = Self {
            config: Mutex::new(Config::new()),
        };
        demod.set_sample_rate(sample_rate)?;
        demod.set_mark_freq(mark_freq);
        demod.set_space_freq(space_freq);
        demod.set_decimation(decimation)?;
        Ok(demod)
    }

    pub fn set_sample_rate(&self, sample_rate: f32) -> Result<()> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(RttyError::InvalidSampleRate(sample_rate));
        }
        let mut cfg = self.config.lock().unwrap();
        cfg.sample_rate = sample_rate;
        cfg.recompute_mark();
        cfg.recompute_space();
        log::debug!(
            "fsk_demod: sample_rate={} -> mark_div={} space_div={}",
            sample_rate, cfg.mark_div, cfg.space_div
        );
        Ok(())
    }

    pub fn sample_rate(&self) -> f32 {
        self.config.lock().unwrap().sample_rate
    }

    pub fn set_mark_freq(&self, mark_freq: f32) {
        let mut cfg = self.config.lock().unwrap();
        cfg.mark_freq = mark_freq;
        cfg.recompute_mark();
        log::debug!("fsk_demod: mark_freq={} -> mark_div={}", mark_freq, cfg.mark_div);
    }

    pub fn mark_freq(&self) -> f32 {
        self.config.lock().unwrap().mark_freq
    }

    pub fn set_space_freq(&self, space_freq: f32) {
        let mut cfg = self.config.lock().unwrap();
        cfg.space_freq = space_freq;
        cfg.recompute_space();
        log::debug!("fsk_demod: space_freq={} -> space_div={}", space_freq, cfg.space_div);
    }

    pub fn space_freq(&self) -> f32 {
        self.config.lock().unwrap().space_freq
    }

    pub fn set_decimation(&self, decimation: usize) -> Result<()> {
        if decimation < 1 {
            return Err(RttyError::InvalidDecimation);
        }
        self.config.lock().unwrap().decimation = decimation;
        Ok(())
    }

    pub fn decimation(&self) -> usize {
        self.config.lock().unwrap().decimation
    }

    /// Prior input samples the scheduler must keep available before each
    /// invocation: `max(mark_div, space_div)`.
    pub fn required_history(&self) -> usize {
        self.config.lock().unwrap().history()
    }

    /// New input samples required to produce `n_out` outputs, not counting
    /// the carried-over history.
    pub fn forecast(&self, n_out: usize) -> usize {
        n_out * self.config.lock().unwrap().decimation
    }

    /// Demodulate up to `n_out` output samples.
    ///
    /// `input` must hold `required_history() - 1` samples of prior context
    /// followed by the new samples to consume, i.e. its front `history() - 1`
    /// elements are the tail of what a previous call left behind. Produces as
    /// many outputs as `input` supports (possibly fewer than `n_out` or
    /// `output.len()` if input runs out). Returns `(produced, consumed)`
    /// where `consumed` is the number of *new* samples used, i.e.
    /// `produced * decimation`.
    pub fn work(&self, n_out: usize, input: &[Complex32], output: &mut [f32]) -> (usize, usize) {
        let (decimation, mark_div, space_div, corr_mark, corr_space) = {
            let cfg = self.config.lock().unwrap();
            (
                cfg.decimation,
                cfg.mark_div,
                cfg.space_div,
                Arc::clone(&cfg.corr_mark),
                Arc::clone(&cfg.corr_space),
            )
        };

        let history = mark_div.max(space_div);
        let n_out = n_out.min(output.len());
        let available_new = input.len().saturating_sub(history.saturating_sub(1));
        let max_outputs = available_new / decimation;
        let n_out = n_out.min(max_outputs);

        let mark_offset = space_div.saturating_sub(mark_div);
        let space_offset = mark_div.saturating_sub(space_div);

        let mut n_in = 0usize;
        for out_sample in output.iter_mut().take(n_out) {
            let mut state: i32 = 0;
            for n_dec in 0..decimation {
                let mark_power = dot(&input[n_in + n_dec + mark_offset..], &corr_mark);
                let space_power = dot(&input[n_in + n_dec + space_offset..], &corr_space);

                let diff = mark_power.norm() * space_div as f32 - space_power.norm() * mark_div as f32;
                if diff > 0.0 {
                    state += 1;
                } else {
                    state -= 1;
                }
            }
            *out_sample = state as f32;
            n_in += decimation;
        }

        (n_out, n_in)
    }
}

fn dot(input: &[Complex32], template: &[Complex32]) -> Complex32 {
    input
        .iter()
        .zip(template.iter())
        .map(|(a, b)| a * b)
        .fold(Complex32::new(0.0, 0.0), |acc, v| acc + v)
}
