use std::fs;
use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tapline_audio::{AudioFilter, MeterSinks, PeakMeter, PeakReport};
use tapline_domain::{
    AudioFormat, AudioFrame, ChannelSink, Chroma, FilterConfig, FourCc, Picture, SampleFormat,
    VideoFormat,
};
use tapline_video::{InvertFilter, SummaryFilter, VideoFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run Tapline media filters over raw files")]
struct Cli {
    /// YAML or JSON filter configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the available filters
    List,
    /// Print per-channel peaks of a raw interleaved PCM file as JSON lines
    Peaks {
        input: PathBuf,
        /// Sample format tag (f32l, f64l, s16l, s32l)
        #[arg(short, long, default_value = "s16l")]
        format: String,
        #[arg(short, long, default_value_t = 2)]
        channels: u16,
        #[arg(short, long, default_value_t = 48_000)]
        rate: u32,
        /// Samples per channel in each analyzed frame
        #[arg(long, default_value_t = 1024)]
        frame_samples: usize,
    },
    /// Write a scaled summary of one raw planar picture
    Thumbnail {
        input: PathBuf,
        /// Destination for the raw summary planes
        output: PathBuf,
        #[arg(long, default_value = "I420")]
        chroma: String,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        /// Invert colors before summarizing
        #[arg(long)]
        invert: bool,
        #[arg(long)]
        out_chroma: Option<String>,
        #[arg(long)]
        out_width: Option<u32>,
        #[arg(long)]
        out_height: Option<u32>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => FilterConfig::load(path)
            .with_context(|| format!("load filter config {:?}", path))?,
        None => FilterConfig::default(),
    };

    match cli.command {
        Command::List => list(),
        Command::Peaks {
            input,
            format,
            channels,
            rate,
            frame_samples,
        } => peaks(&config, input, &format, channels, rate, frame_samples),
        Command::Thumbnail {
            input,
            output,
            chroma,
            width,
            height,
            invert,
            out_chroma,
            out_width,
            out_height,
        } => {
            let mut config = config;
            config.invert.active |= invert;
            if out_chroma.is_some() {
                config.summary.chroma = out_chroma;
            }
            if let Some(width) = out_width {
                config.summary.width = width;
            }
            if let Some(height) = out_height {
                config.summary.height = height;
            }
            thumbnail(&config, input, output, &chroma, width, height)
        }
    }
}

fn list() -> Result<()> {
    let descriptors = [
        tapline_audio::meter::DESCRIPTOR,
        tapline_video::invert::DESCRIPTOR,
        tapline_video::summary::DESCRIPTOR,
    ];
    println!("{}", serde_json::to_string_pretty(&descriptors)?);
    Ok(())
}

fn peaks(
    config: &FilterConfig,
    input: PathBuf,
    format: &str,
    channels: u16,
    rate: u32,
    frame_samples: usize,
) -> Result<()> {
    let codec: FourCc = format.parse()?;
    let sample_format = SampleFormat::from_fourcc(codec)
        .ok_or_else(|| anyhow!("unsupported sample format {}", codec))?;
    if channels == 0 || frame_samples == 0 || rate == 0 {
        bail!("channels, rate and frame size must be positive");
    }
    let data = fs::read(&input).with_context(|| format!("read pcm file {:?}", input))?;
    info!(bytes = data.len(), %codec, channels, "metering pcm file");

    let (tx, rx) = mpsc::channel::<PeakReport>();
    let sinks = MeterSinks {
        greeting: Some(Box::new(|text: String| info!(greeting = %text, "meter opened"))),
        peaks: Some(Box::new(ChannelSink::new(tx))),
    };
    let mut meter = PeakMeter::open(
        AudioFormat {
            codec,
            channels,
            sample_rate: rate,
        },
        &config.meter,
        sinks,
    );

    let stride = usize::from(channels) * sample_format.width();
    let mut position = 0usize;
    for chunk in data.chunks(frame_samples * stride) {
        let sample_count = chunk.len() / stride;
        let pts = Duration::seconds_f64(position as f64 / f64::from(rate));
        meter.process(AudioFrame::new(pts, sample_count, chunk));
        position += sample_count;
        for report in rx.try_iter() {
            println!("{}", serde_json::to_string(&report)?);
        }
    }
    Ok(())
}

fn thumbnail(
    config: &FilterConfig,
    input: PathBuf,
    output: PathBuf,
    chroma: &str,
    width: u32,
    height: u32,
) -> Result<()> {
    let chroma = Chroma::from_name(chroma).ok_or_else(|| anyhow!("unknown chroma {}", chroma))?;
    let format = VideoFormat {
        chroma,
        width,
        height,
    };
    let data = fs::read(&input).with_context(|| format!("read picture {:?}", input))?;
    let picture = Picture::from_bytes(format, Duration::ZERO, &data)?;

    let mut invert = InvertFilter::open(
        &config.invert,
        Some(Box::new(|text: String| info!(greeting = %text, "invert opened"))),
    );
    let (tx, rx) = mpsc::channel::<Picture>();
    let mut summary =
        SummaryFilter::open(format, &config.summary, Some(Box::new(ChannelSink::new(tx))));

    let picture = invert.filter(picture)?;
    summary.filter(picture)?;
    let scaled = rx
        .try_recv()
        .map_err(|_| anyhow!("no summary produced for {} to {:?}", format.chroma, config.summary.chroma))?;

    fs::write(&output, scaled.to_bytes()).with_context(|| format!("write {:?}", output))?;
    info!(
        chroma = %scaled.chroma,
        width = scaled.width,
        height = scaled.height,
        "wrote summary"
    );
    Ok(())
}
