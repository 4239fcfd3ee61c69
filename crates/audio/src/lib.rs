pub mod meter;
pub mod peaks;

pub use meter::{MeterSinks, PeakMeter, PeakReport};
pub use peaks::{extract_peaks, PeakError, PeakExtractor, PeakLevel, PeakResult, MAX_CHANNELS};

use tapline_domain::AudioFrame;

/// Filter stage fed with decoded audio frames by the host pipeline.
pub trait AudioFilter: Send {
    /// Processes one frame and hands back the frame to forward downstream.
    fn process<'a>(&mut self, frame: AudioFrame<'a>) -> AudioFrame<'a>;
}
