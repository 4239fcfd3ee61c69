//! Per-channel min/max peak extraction over interleaved PCM buffers.
//!
//! Accumulators start at zero rather than at the extremes of the sample type,
//! so a channel's `min` never rises above `0.0` and its `max` never drops
//! below it. An all-positive buffer therefore reports `min == 0.0`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tapline_domain::{FourCc, SampleFormat};

/// Largest channel count a buffer may declare.
pub const MAX_CHANNELS: usize = 9;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PeakError {
    #[error("unsupported sample format {0}")]
    UnsupportedFormat(FourCc),
    #[error("{channels} channels exceed the maximum of {max}")]
    ChannelCountExceeded { channels: usize, max: usize },
    #[error("buffer must declare at least one channel")]
    NoChannels,
    #[error("buffer holds {actual} bytes, expected {expected}")]
    BufferSizeMismatch { expected: usize, actual: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeakLevel {
    pub max: f32,
    pub min: f32,
}

impl PeakLevel {
    pub fn silence() -> Self {
        Self { max: 0.0, min: 0.0 }
    }
}

/// Normalized peaks for up to [`MAX_CHANNELS`] channels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeakResult {
    channels: usize,
    min: [f32; MAX_CHANNELS],
    max: [f32; MAX_CHANNELS],
}

impl PeakResult {
    fn silence(channels: usize) -> Self {
        Self {
            channels,
            min: [0.0; MAX_CHANNELS],
            max: [0.0; MAX_CHANNELS],
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn min(&self) -> &[f32] {
        &self.min[..self.channels]
    }

    pub fn max(&self) -> &[f32] {
        &self.max[..self.channels]
    }

    pub fn level(&self, channel: usize) -> Option<PeakLevel> {
        (channel < self.channels).then(|| PeakLevel {
            max: self.max[channel],
            min: self.min[channel],
        })
    }

    pub fn levels(&self) -> impl Iterator<Item = PeakLevel> + '_ {
        self.min()
            .iter()
            .zip(self.max())
            .map(|(&min, &max)| PeakLevel { max, min })
    }
}

/// Decoding and normalization for one native sample type.
trait PeakSample: Copy + PartialOrd {
    const WIDTH: usize;
    const SILENCE: Self;

    /// `bytes` is exactly `WIDTH` long.
    fn decode(bytes: &[u8]) -> Self;
    fn normalize(self) -> f32;
}

impl PeakSample for f32 {
    const WIDTH: usize = 4;
    const SILENCE: Self = 0.0;

    fn decode(bytes: &[u8]) -> Self {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(bytes);
        f32::from_ne_bytes(raw)
    }

    fn normalize(self) -> f32 {
        self
    }
}

impl PeakSample for f64 {
    const WIDTH: usize = 8;
    const SILENCE: Self = 0.0;

    fn decode(bytes: &[u8]) -> Self {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        f64::from_ne_bytes(raw)
    }

    // accumulated in full precision, narrowed once
    fn normalize(self) -> f32 {
        self as f32
    }
}

impl PeakSample for i16 {
    const WIDTH: usize = 2;
    const SILENCE: Self = 0;

    fn decode(bytes: &[u8]) -> Self {
        let mut raw = [0u8; 2];
        raw.copy_from_slice(bytes);
        i16::from_ne_bytes(raw)
    }

    fn normalize(self) -> f32 {
        self as f32 / 32_768.0
    }
}

impl PeakSample for i32 {
    const WIDTH: usize = 4;
    const SILENCE: Self = 0;

    fn decode(bytes: &[u8]) -> Self {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(bytes);
        i32::from_ne_bytes(raw)
    }

    fn normalize(self) -> f32 {
        self as f32 / 2_147_483_648.0
    }
}

fn scan<S: PeakSample>(data: &[u8], channels: usize) -> PeakResult {
    let mut min = [S::SILENCE; MAX_CHANNELS];
    let mut max = [S::SILENCE; MAX_CHANNELS];

    for frame in data.chunks_exact(S::WIDTH * channels) {
        for (channel, raw) in frame.chunks_exact(S::WIDTH).enumerate() {
            let value = S::decode(raw);
            if value < min[channel] {
                min[channel] = value;
            }
            if value > max[channel] {
                max[channel] = value;
            }
        }
    }

    let mut result = PeakResult::silence(channels);
    for channel in 0..channels {
        result.min[channel] = min[channel].normalize();
        result.max[channel] = max[channel].normalize();
    }
    result
}

type ScanFn = fn(&[u8], usize) -> PeakResult;

fn scanner(format: SampleFormat) -> ScanFn {
    match format {
        SampleFormat::Float32 => scan::<f32>,
        SampleFormat::Float64 => scan::<f64>,
        SampleFormat::SignedInt16 => scan::<i16>,
        SampleFormat::SignedInt32 => scan::<i32>,
    }
}

/// Peak extractor bound to one sample format.
#[derive(Clone, Copy)]
pub struct PeakExtractor {
    format: SampleFormat,
    scan: ScanFn,
}

impl PeakExtractor {
    pub fn new(format: SampleFormat) -> Self {
        Self {
            format,
            scan: scanner(format),
        }
    }

    pub fn for_fourcc(tag: FourCc) -> Result<Self, PeakError> {
        SampleFormat::from_fourcc(tag)
            .map(Self::new)
            .ok_or(PeakError::UnsupportedFormat(tag))
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }

    /// Scans `sample_count` interleaved samples per channel out of `data`.
    pub fn extract(
        &self,
        data: &[u8],
        sample_count: usize,
        channels: usize,
    ) -> Result<PeakResult, PeakError> {
        if channels > MAX_CHANNELS {
            return Err(PeakError::ChannelCountExceeded {
                channels,
                max: MAX_CHANNELS,
            });
        }
        if channels == 0 {
            return Err(PeakError::NoChannels);
        }
        let expected = sample_count
            .checked_mul(channels)
            .and_then(|samples| samples.checked_mul(self.format.width()))
            .unwrap_or(usize::MAX);
        if data.len() != expected {
            return Err(PeakError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok((self.scan)(data, channels))
    }
}

impl std::fmt::Debug for PeakExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeakExtractor")
            .field("format", &self.format)
            .finish()
    }
}

/// Resolves `tag` and extracts peaks in one call.
pub fn extract_peaks(
    data: &[u8],
    tag: FourCc,
    sample_count: usize,
    channels: usize,
) -> Result<PeakResult, PeakError> {
    PeakExtractor::for_fourcc(tag)?.extract(data, sample_count, channels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bytes_f32(samples: &[f32]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_ne_bytes()).collect()
    }

    fn bytes_f64(samples: &[f64]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_ne_bytes()).collect()
    }

    fn bytes_i16(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_ne_bytes()).collect()
    }

    fn bytes_i32(samples: &[i32]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_ne_bytes()).collect()
    }

    fn extract(format: SampleFormat, data: &[u8], samples: usize, channels: usize) -> PeakResult {
        PeakExtractor::new(format)
            .extract(data, samples, channels)
            .unwrap()
    }

    #[test]
    fn positive_only_buffer_keeps_zero_floor() {
        let data = bytes_f32(&[0.2, 0.4, 0.6]);
        let peaks = extract(SampleFormat::Float32, &data, 3, 1);
        assert_eq!(peaks.min(), &[0.0]);
        assert_relative_eq!(peaks.max()[0], 0.6);

        let data = bytes_i16(&[-100, -2000]);
        let peaks = extract(SampleFormat::SignedInt16, &data, 2, 1);
        assert_eq!(peaks.max(), &[0.0]);
        assert!(peaks.min()[0] < 0.0);
    }

    #[test]
    fn empty_buffer_is_silence_for_every_format() {
        for format in SampleFormat::ALL {
            let peaks = extract(format, &[], 0, 2);
            assert_eq!(peaks.channels(), 2);
            assert_eq!(peaks.min(), &[0.0, 0.0]);
            assert_eq!(peaks.max(), &[0.0, 0.0]);
        }
    }

    #[test]
    fn sixteen_bit_normalization() {
        let peaks = extract(SampleFormat::SignedInt16, &bytes_i16(&[32767]), 1, 1);
        assert_relative_eq!(peaks.max()[0], 32767.0 / 32768.0);

        let peaks = extract(SampleFormat::SignedInt16, &bytes_i16(&[-32768]), 1, 1);
        assert_eq!(peaks.min()[0], -1.0);
    }

    #[test]
    fn thirty_two_bit_normalization() {
        let peaks = extract(SampleFormat::SignedInt32, &bytes_i32(&[i32::MAX]), 1, 1);
        assert_relative_eq!(peaks.max()[0], 0.999_999_999_53, epsilon = 1e-6);

        let peaks = extract(SampleFormat::SignedInt32, &bytes_i32(&[i32::MIN]), 1, 1);
        assert_eq!(peaks.min()[0], -1.0);
    }

    #[test]
    fn float_formats_pass_through() {
        let peaks = extract(SampleFormat::Float32, &bytes_f32(&[0.5, -0.3]), 2, 1);
        assert_eq!(peaks.min()[0], -0.3);
        assert_eq!(peaks.max()[0], 0.5);

        let peaks = extract(SampleFormat::Float64, &bytes_f64(&[0.5, -0.3]), 2, 1);
        assert_eq!(peaks.min()[0], -0.3_f64 as f32);
        assert_eq!(peaks.max()[0], 0.5);
    }

    #[test]
    fn channels_are_deinterleaved() {
        let data = bytes_f32(&[1.0, -1.0, -1.0, 1.0]);
        let peaks = extract(SampleFormat::Float32, &data, 2, 2);
        assert_eq!(peaks.level(0), Some(PeakLevel { max: 1.0, min: -1.0 }));
        assert_eq!(peaks.level(1), Some(PeakLevel { max: 1.0, min: -1.0 }));
        assert_eq!(peaks.level(2), None);

        let data = bytes_i16(&[16384, 0, 0, -8192]);
        let peaks = extract(SampleFormat::SignedInt16, &data, 2, 2);
        assert_eq!(peaks.max(), &[0.5, 0.0]);
        assert_eq!(peaks.min(), &[0.0, -0.25]);
    }

    #[test]
    fn unknown_tag_is_unsupported() {
        let tag: FourCc = "u8  ".parse().unwrap();
        let result = extract_peaks(&[0, 0], tag, 2, 1);
        assert_eq!(result, Err(PeakError::UnsupportedFormat(tag)));
    }

    #[test]
    fn rejects_too_many_channels() {
        let extractor = PeakExtractor::new(SampleFormat::Float32);
        let result = extractor.extract(&[], 1, MAX_CHANNELS + 1);
        assert_eq!(
            result,
            Err(PeakError::ChannelCountExceeded {
                channels: MAX_CHANNELS + 1,
                max: MAX_CHANNELS
            })
        );
        assert_eq!(extractor.extract(&[], 0, 0), Err(PeakError::NoChannels));
    }

    #[test]
    fn rejects_inconsistent_buffer_length() {
        let data = bytes_f64(&[0.1, 0.2, 0.3]);
        let result = extract_peaks(&data, SampleFormat::Float64.fourcc(), 2, 2);
        assert_eq!(
            result,
            Err(PeakError::BufferSizeMismatch {
                expected: 32,
                actual: 24
            })
        );
        let result = extract_peaks(&data, SampleFormat::Float64.fourcc(), usize::MAX, 2);
        assert!(matches!(result, Err(PeakError::BufferSizeMismatch { .. })));
    }

    #[test]
    fn levels_iterate_per_channel() {
        let data = bytes_i32(&[1 << 30, -(1 << 30), 0]);
        let peaks = extract(SampleFormat::SignedInt32, &data, 1, 3);
        let levels: Vec<_> = peaks.levels().collect();
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0], PeakLevel { max: 0.5, min: 0.0 });
        assert_eq!(levels[1], PeakLevel { max: 0.0, min: -0.5 });
        assert_eq!(levels[2], PeakLevel::silence());
    }
}
