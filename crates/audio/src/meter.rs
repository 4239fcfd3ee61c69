use serde::{Deserialize, Serialize};
use time::Duration;
use tracing::{debug, instrument, warn};

use tapline_domain::{
    AudioFormat, AudioFrame, BoxSink, MeterOptions, PluginCategory, PluginDescriptor, Sink,
};

use crate::peaks::{PeakExtractor, PeakLevel};
use crate::AudioFilter;

pub const DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    shortname: "Hello",
    description: "Peak meter audio filter",
    category: PluginCategory::AudioFilter,
    capability: "audio filter",
    shortcuts: &["peak_meter", "hello"],
};

/// Peaks of one processed frame. `channels` is zero when no peak data was
/// produced for the frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeakReport {
    pub pts: Duration,
    pub channels: usize,
    pub levels: Vec<PeakLevel>,
}

impl PeakReport {
    pub fn unavailable(pts: Duration) -> Self {
        Self {
            pts,
            channels: 0,
            levels: Vec::new(),
        }
    }
}

#[derive(Default)]
pub struct MeterSinks {
    pub greeting: Option<BoxSink<String>>,
    pub peaks: Option<BoxSink<PeakReport>>,
}

/// Pass-through audio filter reporting per-channel peaks for every frame.
pub struct PeakMeter {
    format: AudioFormat,
    extractor: Option<PeakExtractor>,
    sinks: MeterSinks,
}

impl PeakMeter {
    #[instrument(skip(options, sinks))]
    pub fn open(format: AudioFormat, options: &MeterOptions, sinks: MeterSinks) -> Self {
        let extractor = match PeakExtractor::for_fourcc(format.codec) {
            Ok(extractor) => Some(extractor),
            Err(err) => {
                warn!(%err, "unsupported input format");
                None
            }
        };

        if let Some(greeting) = &sinks.greeting {
            greeting.deliver(options.greeting.clone());
        }

        Self {
            format,
            extractor,
            sinks,
        }
    }

    /// Output format; identical to the input.
    pub fn output_format(&self) -> AudioFormat {
        self.format
    }

    pub fn analyze(&self, frame: &AudioFrame<'_>) -> PeakReport {
        let Some(extractor) = &self.extractor else {
            return PeakReport::unavailable(frame.pts);
        };
        let channels = usize::from(self.format.channels);
        match extractor.extract(frame.data, frame.sample_count, channels) {
            Ok(peaks) => PeakReport {
                pts: frame.pts,
                channels: peaks.channels(),
                levels: peaks.levels().collect(),
            },
            Err(err) => {
                warn!(%err, pts = ?frame.pts, "skipping peak analysis for frame");
                PeakReport::unavailable(frame.pts)
            }
        }
    }
}

impl AudioFilter for PeakMeter {
    fn process<'a>(&mut self, frame: AudioFrame<'a>) -> AudioFrame<'a> {
        if let Some(sink) = &self.sinks.peaks {
            let report = self.analyze(&frame);
            debug!(channels = report.channels, pts = ?report.pts, "peaks computed");
            sink.deliver(report);
        }
        frame
    }
}
