use tracing::{debug, info, warn};

use tapline_domain::{
    BoxSink, Chroma, Picture, PluginCategory, PluginDescriptor, Sink, SummaryOptions,
    VideoFormat, PICTURE_PLANE_MAX,
};

use crate::scale::Scaler;
use crate::{VideoError, VideoFilter};

pub const DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    shortname: "Video Summary",
    description: "Video summary filter",
    category: PluginCategory::VideoFilter,
    capability: "video filter",
    shortcuts: &["summary", "vsummary"],
};

/// Pass-through video filter that hands a scaled copy of every picture to a
/// sink.
pub struct SummaryFilter {
    scaler: Option<Scaler>,
    sink: Option<BoxSink<Picture>>,
}

/// Output format for the summaries of `input` under `options`.
pub fn summary_format(input: VideoFormat, options: &SummaryOptions) -> VideoFormat {
    let chroma = match options.chroma.as_deref() {
        Some(name) => Chroma::from_name(name).unwrap_or_else(|| {
            debug!(name, "unknown summary chroma, keeping input chroma");
            input.chroma
        }),
        None => input.chroma,
    };
    let (width, height) = if options.width == 0 || options.height == 0 {
        ((input.width / 4).max(1), (input.height / 4).max(1))
    } else {
        (options.width, options.height)
    };
    VideoFormat {
        chroma,
        width,
        height,
    }
}

impl SummaryFilter {
    pub fn open(
        input: VideoFormat,
        options: &SummaryOptions,
        sink: Option<BoxSink<Picture>>,
    ) -> Self {
        let output = summary_format(input, options);
        let scaler = match Scaler::new(input, output) {
            Ok(scaler) => Some(scaler),
            Err(err) => {
                warn!(%err, "can't convert scaled output picture");
                None
            }
        };
        info!(?input, ?output, "opened video summary filter");
        Self { scaler, sink }
    }

    /// Format of the summaries, if any can be produced.
    pub fn output_format(&self) -> Option<VideoFormat> {
        self.scaler.as_ref().map(Scaler::output_format)
    }
}

impl VideoFilter for SummaryFilter {
    fn filter(&mut self, picture: Picture) -> Result<Picture, VideoError> {
        if let (Some(scaler), Some(sink)) = (&self.scaler, &self.sink) {
            match scaler.scale(&picture) {
                Ok(mut summary) => {
                    summary.planes.truncate(PICTURE_PLANE_MAX);
                    sink.deliver(summary);
                }
                Err(err) => warn!(%err, pts = ?picture.pts, "skipping summary for picture"),
            }
        }
        Ok(picture)
    }
}
