//! Plane-wise picture scaling with optional chroma reduction.

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma, Pixel, Rgb, Rgba};

use tapline_domain::{Chroma, Picture, VideoFormat};

use crate::VideoError;

/// Converts pictures of one format into another size and chroma.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scaler {
    from: VideoFormat,
    to: VideoFormat,
}

impl Scaler {
    pub fn new(from: VideoFormat, to: VideoFormat) -> Result<Self, VideoError> {
        if !Self::supports(from.chroma, to.chroma) {
            return Err(VideoError::UnsupportedConversion {
                from: from.chroma,
                to: to.chroma,
            });
        }
        if to.width == 0 || to.height == 0 {
            return Err(VideoError::mismatch(format!(
                "cannot scale to {}x{}",
                to.width, to.height
            )));
        }
        Ok(Self { from, to })
    }

    pub fn supports(from: Chroma, to: Chroma) -> bool {
        from == to || to == Chroma::Gray8
    }

    pub fn output_format(&self) -> VideoFormat {
        self.to
    }

    pub fn scale(&self, picture: &Picture) -> Result<Picture, VideoError> {
        if picture.chroma != self.from.chroma {
            return Err(VideoError::mismatch(format!(
                "expected {} picture, got {}",
                self.from.chroma, picture.chroma
            )));
        }
        if picture.width == 0 || picture.height == 0 {
            return Err(VideoError::mismatch("picture has no visible area"));
        }
        picture.validate()?;

        let planes = if self.from.chroma == self.to.chroma {
            picture
                .planes
                .iter()
                .enumerate()
                .map(|(index, plane)| {
                    let chroma = picture.chroma;
                    let (width, height) =
                        chroma.plane_dimensions(index, picture.width, picture.height);
                    let (out_width, out_height) =
                        chroma.plane_dimensions(index, self.to.width, self.to.height);
                    resize_plane(
                        plane.visible_bytes(),
                        chroma.pixel_size(),
                        (width, height),
                        (out_width, out_height),
                    )
                })
                .collect::<Result<Vec<_>, _>>()?
        } else {
            let luma = luma_plane(picture);
            vec![resize_plane(
                luma,
                1,
                (picture.width, picture.height),
                (self.to.width, self.to.height),
            )?]
        };

        Ok(Picture::from_planes(self.to, picture.pts, planes)?)
    }
}

fn luma_plane(picture: &Picture) -> Vec<u8> {
    let plane = &picture.planes[0];
    match picture.chroma {
        Chroma::Rgb24 | Chroma::Rgba => {
            let step = picture.chroma.pixel_size();
            plane
                .visible_bytes()
                .chunks_exact(step)
                .map(|px| bt601_luma(px[0], px[1], px[2]))
                .collect()
        }
        _ => plane.visible_bytes(),
    }
}

fn bt601_luma(r: u8, g: u8, b: u8) -> u8 {
    let y = 77 * u32::from(r) + 150 * u32::from(g) + 29 * u32::from(b) + 128;
    (y >> 8) as u8
}

fn resize_plane(
    bytes: Vec<u8>,
    pixel_size: usize,
    (width, height): (u32, u32),
    (out_width, out_height): (u32, u32),
) -> Result<Vec<u8>, VideoError> {
    match pixel_size {
        1 => resize_as::<Luma<u8>>(bytes, width, height, out_width, out_height),
        3 => resize_as::<Rgb<u8>>(bytes, width, height, out_width, out_height),
        4 => resize_as::<Rgba<u8>>(bytes, width, height, out_width, out_height),
        other => Err(VideoError::mismatch(format!(
            "no scaler for {} byte pixels",
            other
        ))),
    }
}

fn resize_as<P>(
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    out_width: u32,
    out_height: u32,
) -> Result<Vec<u8>, VideoError>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let image = ImageBuffer::<P, Vec<u8>>::from_raw(width, height, bytes)
        .ok_or_else(|| VideoError::mismatch(format!("plane is not {}x{}", width, height)))?;
    Ok(imageops::resize(&image, out_width, out_height, FilterType::Triangle).into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn format(chroma: Chroma, width: u32, height: u32) -> VideoFormat {
        VideoFormat {
            chroma,
            width,
            height,
        }
    }

    fn assert_uniform(pixels: &[u8], value: u8, len: usize) {
        assert_eq!(pixels.len(), len);
        assert!(
            pixels.iter().all(|p| p.abs_diff(value) <= 1),
            "expected {} everywhere, got {:?}",
            value,
            pixels
        );
    }

    #[test]
    fn uniform_planes_stay_uniform() {
        let from = format(Chroma::Yuv420p, 8, 8);
        let picture = Picture::from_planes(
            from,
            Duration::milliseconds(20),
            vec![vec![200; 64], vec![60; 16], vec![90; 16]],
        )
        .unwrap();
        let scaler = Scaler::new(from, format(Chroma::Yuv420p, 4, 2)).unwrap();
        let scaled = scaler.scale(&picture).unwrap();
        assert_eq!(scaled.pts, Duration::milliseconds(20));
        assert_uniform(&scaled.planes[0].pixels, 200, 8);
        assert_uniform(&scaled.planes[1].pixels, 60, 2);
        assert_uniform(&scaled.planes[2].pixels, 90, 2);
    }

    #[test]
    fn yuv_to_gray_keeps_luma() {
        let from = format(Chroma::Yuv444p, 4, 4);
        let picture = Picture::from_planes(
            from,
            Duration::ZERO,
            vec![vec![17; 16], vec![128; 16], vec![128; 16]],
        )
        .unwrap();
        let scaler = Scaler::new(from, format(Chroma::Gray8, 2, 2)).unwrap();
        let scaled = scaler.scale(&picture).unwrap();
        assert_eq!(scaled.chroma, Chroma::Gray8);
        assert_eq!(scaled.planes.len(), 1);
        assert_uniform(&scaled.planes[0].pixels, 17, 4);
    }

    #[test]
    fn rgb_to_gray_uses_luma_weights() {
        assert_eq!(bt601_luma(255, 255, 255), 255);
        assert_eq!(bt601_luma(0, 0, 0), 0);
        let from = format(Chroma::Rgba, 2, 2);
        let picture =
            Picture::from_planes(from, Duration::ZERO, vec![[255, 0, 0, 255].repeat(4)]).unwrap();
        let scaler = Scaler::new(from, format(Chroma::Gray8, 1, 1)).unwrap();
        let scaled = scaler.scale(&picture).unwrap();
        assert_uniform(&scaled.planes[0].pixels, bt601_luma(255, 0, 0), 1);
    }

    #[test]
    fn rejects_unsupported_conversion() {
        let result = Scaler::new(format(Chroma::Gray8, 4, 4), format(Chroma::Yuv420p, 2, 2));
        assert!(matches!(
            result,
            Err(VideoError::UnsupportedConversion {
                from: Chroma::Gray8,
                to: Chroma::Yuv420p
            })
        ));
    }

    #[test]
    fn rejects_picture_of_other_chroma() {
        let scaler =
            Scaler::new(format(Chroma::Gray8, 2, 2), format(Chroma::Gray8, 1, 1)).unwrap();
        let picture = Picture::new(format(Chroma::Rgb24, 2, 2));
        assert!(scaler.scale(&picture).is_err());
    }
}
