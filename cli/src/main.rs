use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use base64::Engine;
use clap::{Parser, Subcommand, ValueEnum};
use num_complex::Complex32;
use rtty_core::{AsyncFramer, CharSink, FskDemod, Parity as CoreParity, Pipeline};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::PathBuf;
use tower_http::cors::CorsLayer;

#[derive(Parser)]
#[command(name = "rtty")]
#[command(about = "RTTY (radio teletype) receiver: FSK demod, async framing, Baudot decode")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input WAV file carrying a baseband FSK audio signal
    #[arg(value_name = "INPUT.WAV")]
    input: Option<PathBuf>,

    #[command(flatten)]
    params: DecodeParams,

    /// Start web server instead of decoding a file
    #[arg(long)]
    server: bool,

    /// Port for web server (default: 8000)
    #[arg(long, default_value = "8000")]
    port: u16,
}

#[derive(clap::Args, Clone)]
struct DecodeParams {
    /// Mark tone frequency in Hz
    #[arg(long, default_value = "2295.0")]
    mark_freq: f32,

    /// Space tone frequency in Hz
    #[arg(long, default_value = "2125.0")]
    space_freq: f32,

    /// FSK demodulator decimation factor
    #[arg(long, default_value = "1")]
    decimation: usize,

    /// Baud rate (symbols/sec)
    #[arg(long, default_value = "45.45")]
    bit_rate: f32,

    /// Data bits per character (1..=8); 5 for Baudot
    #[arg(long, default_value = "5")]
    word_len: u8,

    /// Parity mode
    #[arg(long, value_enum, default_value = "none")]
    parity: CliParity,

    /// Decode character bytes as Baudot (letters/figures shift) rather than raw ASCII
    #[arg(long, default_value = "true")]
    baudot: bool,

    /// Maximum number of decoded lines the character sink retains before dropping the oldest
    #[arg(long, default_value = "64")]
    fifo_capacity: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum CliParity {
    None,
    Odd,
    Even,
    Mark,
    Space,
    Dontcare,
}

impl From<CliParity> for CoreParity {
    fn from(value: CliParity) -> Self {
        match value {
            CliParity::None => CoreParity::None,
            CliParity::Odd => CoreParity::Odd,
            CliParity::Even => CoreParity::Even,
            CliParity::Mark => CoreParity::Mark,
            CliParity::Space => CoreParity::Space,
            CliParity::Dontcare => CoreParity::DontCare,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a WAV file to text
    Decode {
        #[arg(value_name = "INPUT.WAV")]
        input: PathBuf,

        /// Write decoded text to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        params: DecodeParams,
    },

    /// Start web server for decode operations
    Server {
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.server {
        return start_web_server(cli.port);
    }

    if let Some(command) = cli.command {
        match command {
            Commands::Decode { input, output, params } => {
                decode_command(&input, output.as_deref(), &params)?;
            }
            Commands::Server { port } => return start_web_server(port),
        }
        return Ok(());
    }

    if let Some(input) = cli.input {
        decode_command(&input, None, &cli.params)?;
    } else {
        eprintln!("Error: no input WAV file specified. Use 'rtty --help' for usage");
        std::process::exit(1);
    }

    Ok(())
}

fn read_wav_as_real_samples(input_path: &PathBuf) -> Result<(Vec<f32>, u32), Box<dyn std::error::Error>> {
    let file = File::open(input_path)?;
    let mut reader = hound::WavReader::new(file)?;
    let spec = reader.spec();
    println!(
        "Read WAV: {} Hz, {} channels, {} bits",
        spec.sample_rate, spec.channels, spec.bits_per_sample
    );

    let mut samples: Vec<f32> = match spec.bits_per_sample {
        16 => {
            let int_samples: Result<Vec<i16>, _> = reader.samples::<i16>().collect();
            int_samples?.into_iter().map(|s| s as f32 / 32768.0).collect()
        }
        32 => {
            let float_samples: Result<Vec<f32>, _> = reader.samples::<f32>().collect();
            float_samples?
        }
        _ => return Err(format!("Unsupported bit depth: {}", spec.bits_per_sample).into()),
    };

    if spec.channels == 2 {
        samples = rtty_core::stereo_to_mono(&samples);
    }

    Ok((samples, spec.sample_rate))
}

/// Lift real audio samples into the complex baseband domain the demodulator
/// expects. A real soundcard-captured tone pair has no quadrature component
/// available, so the imaginary part is set to zero; the demodulator's
/// matched filters still discriminate tones correctly off the real part's
/// correlation magnitude (`spec.md` §4.1 normalizes by magnitude, not phase).
fn lift_to_complex(samples: &[f32]) -> Vec<Complex32> {
    samples.iter().map(|&re| Complex32::new(re, 0.0)).collect()
}

fn run_pipeline(samples: &[f32], sample_rate: f32, params: &DecodeParams) -> Result<String, Box<dyn std::error::Error>> {
    let demod = FskDemod::new(sample_rate, params.mark_freq, params.space_freq, params.decimation)?;
    let framer = AsyncFramer::new(sample_rate, params.bit_rate, params.word_len, params.parity.into())?;
    let sink = CharSink::new(params.fifo_capacity, params.baudot);

    let pipeline = Pipeline::new(demod, framer, sink);
    let complex_samples = lift_to_complex(samples);
    pipeline.push_samples(&complex_samples);

    let mut text = String::new();
    while let Some(line) = pipeline.pop_line() {
        text.push_str(&line);
    }
    Ok(text)
}

fn decode_command(
    input_path: &PathBuf,
    output_path: Option<&std::path::Path>,
    params: &DecodeParams,
) -> Result<(), Box<dyn std::error::Error>> {
    let (samples, sample_rate) = read_wav_as_real_samples(input_path)?;
    println!("Decoding {} samples at {} Hz", samples.len(), sample_rate);

    let text = run_pipeline(&samples, sample_rate as f32, params)?;

    match output_path {
        Some(path) => {
            std::fs::write(path, &text)?;
            println!("Wrote {} characters to {}", text.len(), path.display());
        }
        None => println!("{}", text),
    }

    Ok(())
}

#[derive(Serialize, Deserialize)]
struct DecodeRequest {
    wav_base64: String,
    #[serde(default)]
    mark_freq: Option<f32>,
    #[serde(default)]
    space_freq: Option<f32>,
    #[serde(default)]
    bit_rate: Option<f32>,
}

#[derive(Serialize, Deserialize)]
struct DecodeResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[tokio::main]
async fn start_web_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    println!("Starting rtty server on http://localhost:{}", port);
    println!("Endpoints:");
    println!("  POST /decode - Decode a base64-encoded WAV into text");
    println!("  GET / - Server status");

    let app = Router::new()
        .route("/", get(handler_status))
        .route("/decode", post(handler_decode))
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn handler_status() -> &'static str {
    "rtty receiver - Ready"
}

async fn handler_decode(
    Json(req): Json<DecodeRequest>,
) -> Result<Json<DecodeResponse>, (StatusCode, Json<DecodeResponse>)> {
    let wav_data = base64::engine::general_purpose::STANDARD
        .decode(&req.wav_base64)
        .map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(DecodeResponse {
                    success: false,
                    message: format!("Invalid base64 WAV data: {}", e),
                    text: None,
                }),
            )
        })?;

    let cursor = std::io::Cursor::new(&wav_data);
    let mut reader = hound::WavReader::new(cursor).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(DecodeResponse {
                success: false,
                message: format!("Failed to read WAV: {}", e),
                text: None,
            }),
        )
    })?;

    let spec = reader.spec();
    let samples: Vec<f32> = match spec.bits_per_sample {
        16 => match reader.samples::<i16>().collect::<Result<Vec<_>, _>>() {
            Ok(int_samples) => int_samples.iter().map(|s| *s as f32 / 32768.0).collect(),
            Err(e) => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(DecodeResponse {
                        success: false,
                        message: format!("Failed to read i16 samples: {}", e),
                        text: None,
                    }),
                ))
            }
        },
        32 => match reader.samples::<f32>().collect::<Result<Vec<_>, _>>() {
            Ok(samples) => samples,
            Err(e) => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(DecodeResponse {
                        success: false,
                        message: format!("Failed to read f32 samples: {}", e),
                        text: None,
                    }),
                ))
            }
        },
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(DecodeResponse {
                    success: false,
                    message: format!("Unsupported bit depth: {}", spec.bits_per_sample),
                    text: None,
                }),
            ))
        }
    };

    let mut params = DecodeParams {
        mark_freq: 2295.0,
        space_freq: 2125.0,
        decimation: 1,
        bit_rate: 45.45,
        word_len: 5,
        parity: CliParity::None,
        baudot: true,
        fifo_capacity: 64,
    };
    if let Some(f) = req.mark_freq {
        params.mark_freq = f;
    }
    if let Some(f) = req.space_freq {
        params.space_freq = f;
    }
    if let Some(f) = req.bit_rate {
        params.bit_rate = f;
    }

    match run_pipeline(&samples, spec.sample_rate as f32, &params) {
        Ok(text) => Ok(Json(DecodeResponse {
            success: true,
            message: format!("Decoded {} characters", text.len()),
            text: Some(text),
        })),
        Err(e) => Err((
            StatusCode::BAD_REQUEST,
            Json(DecodeResponse {
                success: false,
                message: format!("Decoding failed: {}", e),
                text: None,
            }),
        )),
    }
}
