use thiserror::Error;

#[derive(Debug, Error)]
pub enum RttyError {
    #[error("decimation must be >= 1")]
    InvalidDecimation,

    #[error("word length must be in 1..=8, got {0}")]
    InvalidWordLen(u8),

    #[error("bit rate must be positive, finite, and yield sample_rate/bit_rate > 1, got {0}")]
    InvalidBitRate(f32),

    #[error("sample rate must be positive and finite, got {0}")]
    InvalidSampleRate(f32),
}

pub type Result<T> = std::result::Result<T, RttyError>;
