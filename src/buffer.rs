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

use std::fmt;

use ndarray::prelude::*;
use thiserror::Error;

use crate::tiles::{Point, Rect};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("{len} bytes cannot hold {width}x{height}x{channels} pixels")]
    LengthMismatch {
        len: usize,
        width: usize,
        height: usize,
        channels: usize,
    },
    #[error("unsupported channel count {0}")]
    Channels(usize),
}

/// Crop rectangle not inside the buffer. Carries the untouched buffer back.
#[derive(Debug, Error)]
#[error("crop rectangle {rect} exceeds {width}x{height} image", width = .buffer.width(), height = .buffer.height())]
pub struct CropError {
    pub rect: Rect,
    pub buffer: PixelBuffer,
}

impl CropError {
    pub fn into_buffer(self) -> PixelBuffer {
        self.buffer
    }
}

/// Owned 8-bit image, shaped `(height, width, channels)` in standard layout.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Array3<u8>,
}

impl PixelBuffer {
    /// Zero-filled buffer.
    pub fn new(width: usize, height: usize, channels: usize) -> Self {
        Self {
            data: Array3::zeros((height, width, channels)),
        }
    }

    /// Wraps interleaved row-major bytes.
    pub fn from_raw(
        width: usize,
        height: usize,
        channels: usize,
        bytes: Vec<u8>,
    ) -> Result<Self, BufferError> {
        if !(1..=4).contains(&channels) {
            return Err(BufferError::Channels(channels));
        }
        let len = bytes.len();
        let data = Array3::from_shape_vec((height, width, channels), bytes).map_err(|_| {
            BufferError::LengthMismatch {
                len,
                width,
                height,
                channels,
            }
        })?;
        Ok(Self { data })
    }

    /// Takes any array, copying into standard layout if needed.
    pub fn from_array(data: Array3<u8>) -> Self {
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Self { data }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.data.dim().2
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width(), self.height())
    }

    pub fn view(&self) -> ArrayView3<'_, u8> {
        self.data.view()
    }

    pub fn view_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        self.data.view_mut()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_slice().expect("Should be standard-layout")
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data.into_raw_vec()
    }

    /// Copies `src_rect` of `src` into this buffer at `dest`.
    pub fn blit(&mut self, src: &PixelBuffer, src_rect: Rect, dest: Point) {
        copy_rect(src.view(), self.view_mut(), src_rect, dest);
    }

    /// Cuts out `rect` into a fresh buffer.
    ///
    /// A rectangle outside the image is a caller bug; the buffer comes back
    /// unchanged inside the error.
    pub fn crop(self, rect: Rect) -> Result<PixelBuffer, CropError> {
        if !rect.fits_in(self.width(), self.height()) {
            return Err(CropError { rect, buffer: self });
        }
        if rect == self.bounds() {
            return Ok(self);
        }

        let mut out = PixelBuffer::new(rect.width, rect.height, self.channels());
        out.blit(&self, rect, Point::default());
        Ok(out)
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("channels", &self.channels())
            .finish_non_exhaustive()
    }
}

/// Copies the `src_rect` block of `src` to the same-sized block at
/// `dest_origin` in `dest`, one row at a time.
///
/// Views may have any strides. Panics if channel counts differ or either
/// block leaves its array.
pub fn copy_rect(
    src: ArrayView3<'_, u8>,
    mut dest: ArrayViewMut3<'_, u8>,
    src_rect: Rect,
    dest_origin: Point,
) {
    let (sh, sw, sc) = src.dim();
    let (dh, dw, dc) = dest.dim();
    if sc != dc {
        panic!("Channel count mismatch ({sc} != {dc})");
    }
    let dest_rect = src_rect.at(dest_origin);
    if !src_rect.fits_in(sw, sh) {
        panic!("Source block {src_rect} outside of {sw}x{sh} image");
    }
    if !dest_rect.fits_in(dw, dh) {
        panic!("Destination block {dest_rect} outside of {dw}x{dh} image");
    }
    if src_rect.is_empty() {
        return;
    }

    let src = src.slice(s![
        src_rect.y..src_rect.y + src_rect.height,
        src_rect.x..src_rect.x + src_rect.width,
        ..
    ]);
    let mut dest = dest.slice_mut(s![
        dest_rect.y..dest_rect.y + dest_rect.height,
        dest_rect.x..dest_rect.x + dest_rect.width,
        ..
    ]);
    for (mut d, s) in dest.outer_iter_mut().zip(src.outer_iter()) {
        d.assign(&s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each pixel holds its own coordinates.
    fn gradient(width: usize, height: usize, channels: usize) -> PixelBuffer {
        PixelBuffer::from_array(Array3::from_shape_fn((height, width, channels), |(y, x, c)| {
            (y * 16 + x + c * 100) as u8
        }))
    }

    #[test]
    fn from_raw_checks_length() {
        assert!(PixelBuffer::from_raw(2, 2, 3, vec![0; 12]).is_ok());
        assert_eq!(
            PixelBuffer::from_raw(2, 2, 3, vec![0; 11]),
            Err(BufferError::LengthMismatch {
                len: 11,
                width: 2,
                height: 2,
                channels: 3
            })
        );
        assert_eq!(
            PixelBuffer::from_raw(1, 1, 5, vec![0; 5]),
            Err(BufferError::Channels(5))
        );
    }

    #[test]
    fn raw_bytes_are_row_major_interleaved() {
        let bytes: Vec<u8> = (0..24).collect();
        let buf = PixelBuffer::from_raw(4, 2, 3, bytes.clone()).unwrap();
        assert_eq!(buf.view()[[1, 2, 1]], (4 * 3 + 2 * 3 + 1) as u8);
        assert_eq!(buf.as_bytes(), &bytes[..]);
        assert_eq!(buf.into_raw(), bytes);
    }

    #[test]
    fn blit_copies_block() {
        let src = gradient(8, 8, 3);
        let mut dest = PixelBuffer::new(6, 5, 3);
        dest.blit(&src, Rect::new(2, 3, 4, 2), Point::new(1, 2));

        for y in 0..5 {
            for x in 0..6 {
                for c in 0..3 {
                    let inside = (1..5).contains(&x) && (2..4).contains(&y);
                    let want = if inside {
                        src.view()[[y - 2 + 3, x - 1 + 2, c]]
                    } else {
                        0
                    };
                    assert_eq!(dest.view()[[y, x, c]], want, "({x}, {y}, {c})");
                }
            }
        }
    }

    #[test]
    fn copy_rect_accepts_strided_views() {
        let src = gradient(8, 8, 1);
        let mut dest = PixelBuffer::new(8, 8, 1);
        // transposed source view
        let t = src.view().permuted_axes([1, 0, 2]);
        copy_rect(t, dest.view_mut(), Rect::new(0, 0, 8, 8), Point::default());
        assert_eq!(dest.view()[[2, 5, 0]], src.view()[[5, 2, 0]]);
    }

    #[test]
    #[should_panic(expected = "Channel count mismatch")]
    fn blit_rejects_channel_mismatch() {
        let src = gradient(4, 4, 3);
        let mut dest = PixelBuffer::new(4, 4, 1);
        dest.blit(&src, Rect::new(0, 0, 1, 1), Point::default());
    }

    #[test]
    #[should_panic(expected = "Source block")]
    fn blit_rejects_source_overflow() {
        let src = gradient(4, 4, 1);
        let mut dest = PixelBuffer::new(8, 8, 1);
        dest.blit(&src, Rect::new(2, 2, 3, 1), Point::default());
    }

    #[test]
    #[should_panic(expected = "Destination block")]
    fn blit_rejects_dest_overflow() {
        let src = gradient(8, 8, 1);
        let mut dest = PixelBuffer::new(4, 4, 1);
        dest.blit(&src, Rect::new(0, 0, 2, 2), Point::new(3, 0));
    }

    #[test]
    fn crop_cuts_fresh_buffer() {
        let buf = gradient(10, 6, 2);
        let expected = buf.view().slice(s![1..5, 3..9, ..]).to_owned();
        let out = buf.crop(Rect::new(3, 1, 6, 4)).unwrap();
        assert_eq!((out.width(), out.height(), out.channels()), (6, 4, 2));
        assert_eq!(out.view(), expected.view());
    }

    #[test]
    fn crop_full_bounds_is_identity() {
        let buf = gradient(5, 5, 1);
        let out = buf.clone().crop(buf.bounds()).unwrap();
        assert_eq!(out, buf);
    }

    #[test]
    fn crop_out_of_bounds_returns_input() {
        let buf = gradient(10, 6, 3);
        let err = buf.clone().crop(Rect::new(5, 0, 6, 6)).unwrap_err();
        assert_eq!(err.rect, Rect::new(5, 0, 6, 6));
        assert_eq!(err.to_string(), "crop rectangle 6x6+5+0 exceeds 10x6 image");
        assert_eq!(err.into_buffer(), buf);
    }
}
