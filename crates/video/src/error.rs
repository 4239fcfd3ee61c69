use thiserror::Error;

use tapline_domain::{Chroma, DomainError};

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("cannot convert {from} pictures to {to}")]
    UnsupportedConversion { from: Chroma, to: Chroma },
    #[error("picture does not match the negotiated format: {0}")]
    PlaneMismatch(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl VideoError {
    pub fn mismatch<T: Into<String>>(message: T) -> Self {
        Self::PlaneMismatch(message.into())
    }
}
