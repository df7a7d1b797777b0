//! RTTY receive-chain DSP core: FSK correlation demodulator, asynchronous
//! start/stop framer and a Baudot-decoding character sink.
//!
//! Three streaming blocks chained by a caller-driven scheduler: each declares
//! how many input samples it needs via `forecast` and consumes exactly what
//! it used in `work`. [`Pipeline`] wires the three together for callers who
//! don't want to drive that protocol themselves.

pub mod async_framer;
pub mod baudot;
pub mod error;
pub mod fsk_demod;
pub mod pipeline;
pub mod resample;

pub use async_framer::{AsyncFramer, Parity};
pub use baudot::CharSink;
pub use error::{Result, RttyError};
pub use fsk_demod::FskDemod;
pub use pipeline::Pipeline;
pub use resample::{resample_audio, stereo_to_mono};
