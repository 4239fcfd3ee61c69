use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Four byte codec tag as handed over by the host pipeline.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FourCc([u8; 4]);

impl FourCc {
    pub const fn new(tag: [u8; 4]) -> Self {
        Self(tag)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    pub fn matches(&self, other: &[u8; 4]) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl FromStr for FourCc {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; 4] = s.as_bytes().try_into().map_err(|_| {
            DomainError::validation(format!("fourcc must be exactly 4 bytes, got {:?}", s))
        })?;
        if !bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            return Err(DomainError::validation(format!(
                "fourcc must be printable ascii, got {:?}",
                s
            )));
        }
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for FourCc {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FourCc> for String {
    fn from(value: FourCc) -> Self {
        value.to_string()
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{}", byte as char)?;
        }
        Ok(())
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc({})", self)
    }
}

/// Interleaved PCM encodings the peak extractor understands. Samples are in
/// native byte order.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    Float32,
    Float64,
    SignedInt16,
    SignedInt32,
}

const SAMPLE_FORMAT_TAGS: [(&[u8; 4], SampleFormat); 8] = [
    (b"f32l", SampleFormat::Float32),
    (b"fl32", SampleFormat::Float32),
    (b"f64l", SampleFormat::Float64),
    (b"fl64", SampleFormat::Float64),
    (b"s16l", SampleFormat::SignedInt16),
    (b"s16n", SampleFormat::SignedInt16),
    (b"s32l", SampleFormat::SignedInt32),
    (b"s32n", SampleFormat::SignedInt32),
];

impl SampleFormat {
    pub const ALL: [SampleFormat; 4] = [
        SampleFormat::Float32,
        SampleFormat::Float64,
        SampleFormat::SignedInt16,
        SampleFormat::SignedInt32,
    ];

    /// Bytes occupied by one sample of one channel.
    pub fn width(self) -> usize {
        match self {
            SampleFormat::Float32 => 4,
            SampleFormat::Float64 => 8,
            SampleFormat::SignedInt16 => 2,
            SampleFormat::SignedInt32 => 4,
        }
    }

    pub fn fourcc(self) -> FourCc {
        let tag = match self {
            SampleFormat::Float32 => b"f32l",
            SampleFormat::Float64 => b"f64l",
            SampleFormat::SignedInt16 => b"s16l",
            SampleFormat::SignedInt32 => b"s32l",
        };
        FourCc::new(*tag)
    }

    pub fn from_fourcc(tag: FourCc) -> Option<Self> {
        SAMPLE_FORMAT_TAGS
            .iter()
            .find(|(known, _)| tag.matches(known))
            .map(|(_, format)| *format)
    }
}

/// Pixel layouts a [`crate::Picture`] can carry.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Chroma {
    Gray8,
    Yuv420p,
    Yuv422p,
    Yuv444p,
    Rgb24,
    Rgba,
}

const CHROMA_TAGS: [(&[u8; 4], Chroma); 7] = [
    (b"GREY", Chroma::Gray8),
    (b"GRAY", Chroma::Gray8),
    (b"I420", Chroma::Yuv420p),
    (b"I422", Chroma::Yuv422p),
    (b"I444", Chroma::Yuv444p),
    (b"RV24", Chroma::Rgb24),
    (b"RGBA", Chroma::Rgba),
];

impl Chroma {
    pub fn fourcc(self) -> FourCc {
        let tag = match self {
            Chroma::Gray8 => b"GREY",
            Chroma::Yuv420p => b"I420",
            Chroma::Yuv422p => b"I422",
            Chroma::Yuv444p => b"I444",
            Chroma::Rgb24 => b"RV24",
            Chroma::Rgba => b"RGBA",
        };
        FourCc::new(*tag)
    }

    pub fn from_fourcc(tag: FourCc) -> Option<Self> {
        CHROMA_TAGS
            .iter()
            .find(|(known, _)| tag.matches(known))
            .map(|(_, chroma)| *chroma)
    }

    /// Looks up a chroma by its tag string, e.g. `"I420"`.
    pub fn from_name(name: &str) -> Option<Self> {
        name.parse::<FourCc>().ok().and_then(Self::from_fourcc)
    }

    pub fn plane_count(self) -> usize {
        match self {
            Chroma::Gray8 | Chroma::Rgb24 | Chroma::Rgba => 1,
            Chroma::Yuv420p | Chroma::Yuv422p | Chroma::Yuv444p => 3,
        }
    }

    /// Bytes per pixel within a single plane.
    pub fn pixel_size(self) -> usize {
        match self {
            Chroma::Rgb24 => 3,
            Chroma::Rgba => 4,
            _ => 1,
        }
    }

    pub fn has_alpha(self) -> bool {
        matches!(self, Chroma::Rgba)
    }

    /// Pixel dimensions of `plane` for a picture of `width` x `height`.
    pub fn plane_dimensions(self, plane: usize, width: u32, height: u32) -> (u32, u32) {
        if plane == 0 {
            return (width, height);
        }
        match self {
            Chroma::Yuv420p => (width.div_ceil(2), height.div_ceil(2)),
            Chroma::Yuv422p => (width.div_ceil(2), height),
            _ => (width, height),
        }
    }
}

impl fmt::Display for Chroma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fourcc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fourcc_parses_and_displays() {
        let tag: FourCc = "s16l".parse().unwrap();
        assert_eq!(tag.to_string(), "s16l");
        assert!("s16".parse::<FourCc>().is_err());
        assert!("toolong".parse::<FourCc>().is_err());
    }

    #[test]
    fn sample_format_lookup() {
        assert_eq!(
            SampleFormat::from_fourcc("FL32".parse().unwrap()),
            Some(SampleFormat::Float32)
        );
        assert_eq!(
            SampleFormat::from_fourcc("s32n".parse().unwrap()),
            Some(SampleFormat::SignedInt32)
        );
        assert_eq!(SampleFormat::from_fourcc("u8  ".parse().unwrap()), None);
        for format in SampleFormat::ALL {
            assert_eq!(SampleFormat::from_fourcc(format.fourcc()), Some(format));
        }
    }

    #[test]
    fn chroma_plane_dimensions() {
        assert_eq!(Chroma::Yuv420p.plane_dimensions(1, 5, 3), (3, 2));
        assert_eq!(Chroma::Yuv422p.plane_dimensions(2, 8, 4), (4, 4));
        assert_eq!(Chroma::Rgba.plane_dimensions(0, 8, 4), (8, 4));
        assert_eq!(Chroma::from_name("I420"), Some(Chroma::Yuv420p));
        assert_eq!(Chroma::from_name("nope"), None);
    }

    #[test]
    fn fourcc_serde_as_string() {
        let json = serde_json::to_string(&SampleFormat::Float64.fourcc()).unwrap();
        assert_eq!(json, "\"f64l\"");
        let tag: FourCc = serde_json::from_str("\"s16l\"").unwrap();
        assert_eq!(SampleFormat::from_fourcc(tag), Some(SampleFormat::SignedInt16));
    }
}
