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

use thiserror::Error;

use crate::pattern::Pattern;

/// Multiplier for the reference column.
pub const REF_COL_FACTOR: usize = 43;
/// Multiplier for the reference row.
pub const REF_ROW_FACTOR: usize = 47;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("tile size must be non-zero (got {width}x{height})")]
    ZeroTile { width: usize, height: usize },
    #[error("image {width}x{height} does not fit a single {tile_width}x{tile_height} tile")]
    TooSmall {
        width: usize,
        height: usize,
        tile_width: usize,
        tile_height: usize,
    },
}

/// Reference line of one axis with `size` whole tiles.
///
/// The result is always in `0..size`. Panics if `size` is zero.
pub fn derive_ref(size: usize, pattern: Pattern, factor: usize) -> usize {
    assert!(size > 0, "Reference line of an empty axis");

    let mut v = size - (factor * pattern.get()) % size;
    if v % size == 0 {
        v = (size as isize - 4).rem_euclid(size as isize) as usize;
    }
    if v == 0 {
        v = size - 1;
    }
    v
}

/// Tiling of one image under one pattern.
///
/// Remainder pixels of each axis are gathered into a strip inserted right
/// before the reference line (`ref_col`, `ref_row`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridDescriptor {
    pub cols: usize,
    pub rows: usize,
    pub rem_width: usize,
    pub rem_height: usize,
    pub ref_col: usize,
    pub ref_row: usize,
    pub tile_width: usize,
    pub tile_height: usize,
    pub pattern: Pattern,
}

impl GridDescriptor {
    pub fn new(
        width: usize,
        height: usize,
        tile_width: usize,
        tile_height: usize,
        pattern: Pattern,
    ) -> Result<Self, GridError> {
        if tile_width == 0 || tile_height == 0 {
            return Err(GridError::ZeroTile {
                width: tile_width,
                height: tile_height,
            });
        }

        let cols = width / tile_width;
        let rows = height / tile_height;
        if cols == 0 || rows == 0 {
            return Err(GridError::TooSmall {
                width,
                height,
                tile_width,
                tile_height,
            });
        }

        Ok(Self {
            cols,
            rows,
            rem_width: width % tile_width,
            rem_height: height % tile_height,
            ref_col: derive_ref(cols, pattern, REF_COL_FACTOR),
            ref_row: derive_ref(rows, pattern, REF_ROW_FACTOR),
            tile_width,
            tile_height,
            pattern,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.cols * self.tile_width + self.rem_width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.rows * self.tile_height + self.rem_height
    }

    /// Whether the unmoved corner block exists.
    #[inline]
    pub fn has_corner(&self) -> bool {
        self.rem_width > 0 && self.rem_height > 0
    }
}
