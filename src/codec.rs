// Copyright (C) 2023 Dheatly23
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Bridge between encoded image files and [`PixelBuffer`].

use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;

use anyhow::{bail, Context, Error};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::io::Reader as ImageReader;
use image::{ColorType, DynamicImage, ImageEncoder};
use ndarray::prelude::*;
use ndarray::Zip;

use crate::buffer::PixelBuffer;

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg { quality: u8 },
    Png,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "jpg",
            Self::Png => "png",
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Jpeg {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Decodes an image of any format `image` recognizes into 8-bit pixels.
///
/// Luma, luma+alpha, RGB and RGBA keep their channel count. Anything
/// else (16-bit, float) is narrowed to RGB or RGBA.
pub fn decode(bytes: &[u8]) -> Result<PixelBuffer, Error> {
    let im = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?;
    Ok(from_dynamic(im)?)
}

pub fn load(path: &Path) -> Result<PixelBuffer, Error> {
    let im = ImageReader::new(BufReader::new(
        File::open(path).with_context(|| format!("opening {}", path.display()))?,
    ))
    .with_guessed_format()?
    .decode()
    .with_context(|| format!("decoding {}", path.display()))?;
    Ok(from_dynamic(im)?)
}

fn from_dynamic(im: DynamicImage) -> Result<PixelBuffer, crate::buffer::BufferError> {
    let (width, height) = (im.width() as usize, im.height() as usize);
    let (channels, bytes) = match im {
        DynamicImage::ImageLuma8(b) => (1, b.into_raw()),
        DynamicImage::ImageLumaA8(b) => (2, b.into_raw()),
        DynamicImage::ImageRgb8(b) => (3, b.into_raw()),
        DynamicImage::ImageRgba8(b) => (4, b.into_raw()),
        im if im.color().has_alpha() => (4, im.into_rgba8().into_raw()),
        im => (3, im.into_rgb8().into_raw()),
    };
    PixelBuffer::from_raw(width, height, channels, bytes)
}

/// Encodes a buffer. JPEG has no alpha, so it is dropped there.
pub fn encode(buffer: &PixelBuffer, format: OutputFormat) -> Result<Vec<u8>, Error> {
    let (width, height) = (buffer.width() as u32, buffer.height() as u32);
    let mut out = Vec::new();

    match format {
        OutputFormat::Jpeg { quality } => {
            let opaque;
            let (bytes, color) = match buffer.channels() {
                1 => (buffer.as_bytes(), ColorType::L8),
                3 => (buffer.as_bytes(), ColorType::Rgb8),
                c @ (2 | 4) => {
                    opaque = buffer
                        .view()
                        .slice(s![.., .., ..c - 1])
                        .as_standard_layout()
                        .into_owned();
                    let color = if c == 2 {
                        ColorType::L8
                    } else {
                        ColorType::Rgb8
                    };
                    (opaque.as_slice().expect("Should be standard-layout"), color)
                }
                c => bail!("cannot encode {c} channels"),
            };
            JpegEncoder::new_with_quality(&mut out, quality).encode(bytes, width, height, color)?;
        }
        OutputFormat::Png => {
            let color = match buffer.channels() {
                1 => ColorType::L8,
                2 => ColorType::La8,
                3 => ColorType::Rgb8,
                4 => ColorType::Rgba8,
                c => bail!("cannot encode {c} channels"),
            };
            PngEncoder::new(&mut out).write_image(buffer.as_bytes(), width, height, color)?;
        }
    }

    Ok(out)
}

pub fn save(buffer: &PixelBuffer, path: &Path, format: OutputFormat) -> Result<(), Error> {
    let bytes = encode(buffer, format)?;
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}

/// Collapses a colour page that is grey anyway into a single channel.
///
/// Every pixel must have its colour channels within `tolerance` of each
/// other (and be fully opaque, if it has alpha). Otherwise the buffer is
/// returned as is.
pub fn reduce_to_gray(buffer: PixelBuffer, tolerance: u8) -> PixelBuffer {
    let channels = buffer.channels();
    if channels < 3 {
        return buffer;
    }

    let reduced = Zip::from(buffer.view().lanes(Axis(2))).par_map_collect(|px| {
        let rgb = [px[0], px[1], px[2]];
        let lo = rgb.iter().copied().min().unwrap_or(0);
        let hi = rgb.iter().copied().max().unwrap_or(0);
        let opaque = channels < 4 || px[3] == u8::MAX;
        let mean = ((rgb[0] as u16 + rgb[1] as u16 + rgb[2] as u16) / 3) as u8;
        (opaque && hi - lo <= tolerance, mean)
    });

    if !reduced.iter().all(|&(gray, _)| gray) {
        return buffer;
    }
    PixelBuffer::from_array(reduced.mapv(|(_, v)| v).insert_axis(Axis(2)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb(width: usize, height: usize, f: impl Fn(usize, usize) -> [u8; 3]) -> PixelBuffer {
        PixelBuffer::from_array(Array3::from_shape_fn((height, width, 3), |(y, x, c)| {
            f(x, y)[c]
        }))
    }

    #[test]
    fn png_round_trip_keeps_pixels() {
        let buf = rgb(13, 7, |x, y| [x as u8 * 10, y as u8 * 20, 77]);
        let bytes = encode(&buf, OutputFormat::Png).unwrap();
        assert_eq!(decode(&bytes).unwrap(), buf);
    }

    #[test]
    fn png_keeps_alpha() {
        let buf = PixelBuffer::from_raw(2, 1, 4, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let bytes = encode(&buf, OutputFormat::Png).unwrap();
        assert_eq!(decode(&bytes).unwrap(), buf);
    }

    #[test]
    fn jpeg_drops_alpha() {
        let buf = PixelBuffer::from_raw(16, 16, 4, vec![200; 16 * 16 * 4]).unwrap();
        let bytes = encode(&buf, OutputFormat::default()).unwrap();
        let back = decode(&bytes).unwrap();
        assert_eq!((back.width(), back.height(), back.channels()), (16, 16, 3));
    }

    #[test]
    fn jpeg_keeps_gray() {
        let buf = PixelBuffer::new(24, 8, 1);
        let bytes = encode(&buf, OutputFormat::Jpeg { quality: 50 }).unwrap();
        assert_eq!(decode(&bytes).unwrap().channels(), 1);
    }

    #[test]
    fn save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        let buf = rgb(5, 4, |x, y| [x as u8, y as u8, (x + y) as u8]);
        save(&buf, &path, OutputFormat::Png).unwrap();
        assert_eq!(load(&path).unwrap(), buf);
        assert!(load(&dir.path().join("missing.png")).is_err());
    }

    #[test]
    fn garbage_does_not_decode() {
        assert!(decode(b"definitely not an image").is_err());
    }

    #[test]
    fn gray_page_collapses() {
        let buf = rgb(4, 3, |x, y| {
            let v = (x * 40 + y) as u8;
            [v, v + 2, v + 1]
        });
        let gray = reduce_to_gray(buf, 2);
        assert_eq!(gray.channels(), 1);
        assert_eq!(gray.view()[[2, 3, 0]], 122 + 1);
    }

    #[test]
    fn colour_page_stays() {
        let buf = rgb(4, 3, |x, _| if x == 3 { [10, 40, 10] } else { [9, 9, 9] });
        let out = reduce_to_gray(buf.clone(), 8);
        assert_eq!(out, buf);
    }

    #[test]
    fn translucent_page_stays() {
        let buf = PixelBuffer::from_raw(1, 1, 4, vec![5, 5, 5, 128]).unwrap();
        assert_eq!(reduce_to_gray(buf.clone(), 0).channels(), 4);
        let buf = PixelBuffer::from_raw(1, 1, 4, vec![5, 5, 5, 255]).unwrap();
        assert_eq!(reduce_to_gray(buf, 0).channels(), 1);
    }
}
