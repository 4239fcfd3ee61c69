pub mod config;
pub mod error;
pub mod format;
pub mod frame;
pub mod plugin;
pub mod sink;

pub use crate::config::{FilterConfig, InvertOptions, MeterOptions, SummaryOptions};
pub use crate::error::DomainError;
pub use crate::format::{Chroma, FourCc, SampleFormat};
pub use crate::frame::{AudioFormat, AudioFrame, Picture, Plane, VideoFormat, PICTURE_PLANE_MAX};
pub use crate::plugin::{PluginCategory, PluginDescriptor};
pub use crate::sink::{BoxSink, ChannelSink, Sink};
