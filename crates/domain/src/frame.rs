use serde::{Deserialize, Serialize};
use time::Duration;

use crate::format::{Chroma, FourCc};
use crate::DomainError;

pub const PICTURE_PLANE_MAX: usize = 5;

/// Negotiated input format of an audio filter.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AudioFormat {
    pub codec: FourCc,
    pub channels: u16,
    pub sample_rate: u32,
}

/// One block of interleaved samples borrowed from the host.
#[derive(Clone, Copy, Debug)]
pub struct AudioFrame<'a> {
    pub pts: Duration,
    /// Samples per channel.
    pub sample_count: usize,
    pub data: &'a [u8],
}

impl<'a> AudioFrame<'a> {
    pub fn new(pts: Duration, sample_count: usize, data: &'a [u8]) -> Self {
        Self {
            pts,
            sample_count,
            data,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VideoFormat {
    pub chroma: Chroma,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plane {
    pub pixels: Vec<u8>,
    /// Bytes between the start of two lines.
    pub pitch: usize,
    /// Bytes of each line that hold picture data.
    pub visible_pitch: usize,
    pub visible_lines: usize,
}

impl Plane {
    pub fn new(visible_pitch: usize, visible_lines: usize) -> Self {
        Self {
            pixels: vec![0; visible_pitch * visible_lines],
            pitch: visible_pitch,
            visible_pitch,
            visible_lines,
        }
    }

    pub fn line(&self, index: usize) -> &[u8] {
        let start = index * self.pitch;
        &self.pixels[start..start + self.visible_pitch]
    }

    pub fn line_mut(&mut self, index: usize) -> &mut [u8] {
        let start = index * self.pitch;
        &mut self.pixels[start..start + self.visible_pitch]
    }

    /// Copies the visible area into a tightly packed buffer.
    pub fn visible_bytes(&self) -> Vec<u8> {
        if self.pitch == self.visible_pitch {
            return self.pixels[..self.visible_pitch * self.visible_lines].to_vec();
        }
        let mut out = Vec::with_capacity(self.visible_pitch * self.visible_lines);
        for line in 0..self.visible_lines {
            out.extend_from_slice(self.line(line));
        }
        out
    }

    fn check(&self) -> Result<(), DomainError> {
        if self.visible_pitch > self.pitch {
            return Err(DomainError::validation(format!(
                "visible pitch {} exceeds pitch {}",
                self.visible_pitch, self.pitch
            )));
        }
        let needed = match self.visible_lines {
            0 => 0,
            lines => (lines - 1) * self.pitch + self.visible_pitch,
        };
        if self.pixels.len() < needed {
            return Err(DomainError::validation(format!(
                "plane holds {} bytes, needs {}",
                self.pixels.len(),
                needed
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Picture {
    pub pts: Duration,
    pub chroma: Chroma,
    pub width: u32,
    pub height: u32,
    pub planes: Vec<Plane>,
}

impl Picture {
    /// Allocates a black-initialized (all zero) picture with tightly packed planes.
    pub fn new(format: VideoFormat) -> Self {
        let planes = (0..format.chroma.plane_count())
            .map(|plane| {
                let (width, lines) =
                    format.chroma.plane_dimensions(plane, format.width, format.height);
                Plane::new(width as usize * format.chroma.pixel_size(), lines as usize)
            })
            .collect();
        Self {
            pts: Duration::ZERO,
            chroma: format.chroma,
            width: format.width,
            height: format.height,
            planes,
        }
    }

    /// Wraps tightly packed plane data, checking sizes against the chroma.
    pub fn from_planes(
        format: VideoFormat,
        pts: Duration,
        data: Vec<Vec<u8>>,
    ) -> Result<Self, DomainError> {
        if data.len() != format.chroma.plane_count() {
            return Err(DomainError::validation(format!(
                "{} expects {} planes, got {}",
                format.chroma,
                format.chroma.plane_count(),
                data.len()
            )));
        }
        let planes = data
            .into_iter()
            .enumerate()
            .map(|(index, pixels)| {
                let (width, lines) =
                    format.chroma.plane_dimensions(index, format.width, format.height);
                let visible_pitch = width as usize * format.chroma.pixel_size();
                let plane = Plane {
                    pixels,
                    pitch: visible_pitch,
                    visible_pitch,
                    visible_lines: lines as usize,
                };
                plane.check().map(|_| plane)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            pts,
            chroma: format.chroma,
            width: format.width,
            height: format.height,
            planes,
        })
    }

    /// Splits one raw frame with planes stored back to back.
    pub fn from_bytes(format: VideoFormat, pts: Duration, data: &[u8]) -> Result<Self, DomainError> {
        let mut offset = 0;
        let mut planes = Vec::with_capacity(format.chroma.plane_count());
        for plane in 0..format.chroma.plane_count() {
            let (width, lines) = format.chroma.plane_dimensions(plane, format.width, format.height);
            let len = width as usize * format.chroma.pixel_size() * lines as usize;
            let bytes = data.get(offset..offset + len).ok_or_else(|| {
                DomainError::validation(format!(
                    "{} bytes is too short for a {}x{} {} picture",
                    data.len(),
                    format.width,
                    format.height,
                    format.chroma
                ))
            })?;
            planes.push(bytes.to_vec());
            offset += len;
        }
        Self::from_planes(format, pts, planes)
    }

    /// Visible area of every plane, back to back.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.planes.iter().flat_map(|plane| plane.visible_bytes()).collect()
    }

    pub fn format(&self) -> VideoFormat {
        VideoFormat {
            chroma: self.chroma,
            width: self.width,
            height: self.height,
        }
    }

    /// Checks that every plane can hold its declared visible area.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.planes.len() != self.chroma.plane_count() {
            return Err(DomainError::validation(format!(
                "{} expects {} planes, got {}",
                self.chroma,
                self.chroma.plane_count(),
                self.planes.len()
            )));
        }
        self.planes.iter().try_for_each(Plane::check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picture_new_allocates_subsampled_planes() {
        let picture = Picture::new(VideoFormat {
            chroma: Chroma::Yuv420p,
            width: 16,
            height: 8,
        });
        assert_eq!(picture.planes.len(), 3);
        assert_eq!(picture.planes[0].pixels.len(), 128);
        assert_eq!(picture.planes[1].visible_pitch, 8);
        assert_eq!(picture.planes[2].visible_lines, 4);
        assert!(picture.validate().is_ok());
    }

    #[test]
    fn from_planes_rejects_short_data() {
        let format = VideoFormat {
            chroma: Chroma::Gray8,
            width: 4,
            height: 4,
        };
        assert!(Picture::from_planes(format, Duration::ZERO, vec![vec![0; 15]]).is_err());
        assert!(Picture::from_planes(format, Duration::ZERO, vec![vec![0; 16]]).is_ok());
        assert!(Picture::from_planes(format, Duration::ZERO, vec![]).is_err());
    }

    #[test]
    fn raw_frames_split_into_planes() {
        let format = VideoFormat {
            chroma: Chroma::Yuv420p,
            width: 4,
            height: 2,
        };
        let data: Vec<u8> = (0..12).collect();
        let picture = Picture::from_bytes(format, Duration::ZERO, &data).unwrap();
        assert_eq!(picture.planes[0].pixels, (0..8).collect::<Vec<u8>>());
        assert_eq!(picture.planes[1].pixels, vec![8, 9]);
        assert_eq!(picture.planes[2].pixels, vec![10, 11]);
        assert_eq!(picture.to_bytes(), data);
        assert!(Picture::from_bytes(format, Duration::ZERO, &data[..11]).is_err());
    }

    #[test]
    fn visible_bytes_skips_padding() {
        let plane = Plane {
            pixels: vec![1, 2, 0, 3, 4, 0],
            pitch: 3,
            visible_pitch: 2,
            visible_lines: 2,
        };
        assert_eq!(plane.visible_bytes(), vec![1, 2, 3, 4]);
        assert_eq!(plane.line(1), &[3, 4]);
    }
}
