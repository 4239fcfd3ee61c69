use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use tapline_domain::{
    BoxSink, InvertOptions, Picture, Plane, PluginCategory, PluginDescriptor, Sink,
};

use crate::{VideoError, VideoFilter};

pub const DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    shortname: "Color inversion",
    description: "Color inversion video filter",
    category: PluginCategory::VideoFilter,
    capability: "video filter",
    shortcuts: &["invert"],
};

const GREETING_ACTIVE: &str = "Good dag";
const GREETING_INACTIVE: &str = "Good natt";

/// Handle for switching an [`InvertFilter`] on or off while it runs.
#[derive(Clone, Debug)]
pub struct InvertToggle {
    active: Arc<AtomicBool>,
}

impl InvertToggle {
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Relaxed);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Flips the flag and returns the new state.
    pub fn flip(&self) -> bool {
        !self.active.fetch_xor(true, Ordering::Relaxed)
    }
}

pub struct InvertFilter {
    active: Arc<AtomicBool>,
}

impl InvertFilter {
    pub fn open(options: &InvertOptions, greeting: Option<BoxSink<String>>) -> Self {
        info!(active = options.active, "opening invert filter");
        if let Some(sink) = greeting {
            let text = if options.active {
                GREETING_ACTIVE
            } else {
                GREETING_INACTIVE
            };
            sink.deliver(text.to_string());
        }
        Self {
            active: Arc::new(AtomicBool::new(options.active)),
        }
    }

    pub fn toggle(&self) -> InvertToggle {
        InvertToggle {
            active: self.active.clone(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }
}

fn invert_plane(plane: &mut Plane, skip_alpha: bool) {
    for line in 0..plane.visible_lines {
        let bytes = plane.line_mut(line);
        if skip_alpha {
            for pixel in bytes.chunks_exact_mut(4) {
                for component in &mut pixel[..3] {
                    *component = u8::MAX - *component;
                }
            }
        } else {
            for byte in bytes.iter_mut() {
                *byte = u8::MAX - *byte;
            }
        }
    }
}

impl VideoFilter for InvertFilter {
    fn filter(&mut self, mut picture: Picture) -> Result<Picture, VideoError> {
        if !self.is_active() {
            return Ok(picture);
        }
        picture.validate()?;
        let skip_alpha = picture.chroma.has_alpha();
        for plane in picture.planes.iter_mut() {
            invert_plane(plane, skip_alpha);
        }
        debug!(pts = ?picture.pts, "inverted picture");
        Ok(picture)
    }
}
