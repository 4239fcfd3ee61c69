pub mod error;
pub mod invert;
pub mod scale;
pub mod summary;

pub use error::VideoError;
pub use invert::{InvertFilter, InvertToggle};
pub use scale::Scaler;
pub use summary::SummaryFilter;

use tapline_domain::Picture;

/// Filter stage fed with decoded pictures by the host pipeline.
pub trait VideoFilter: Send {
    fn filter(&mut self, picture: Picture) -> Result<Picture, VideoError>;
}
