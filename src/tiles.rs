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
use std::str::FromStr;

use thiserror::Error;

use crate::grid::GridDescriptor;
use crate::permute::{
    axis_shift, col_from_row, interior_col, interior_row, row_from_col, shifted_pixel_pos,
    COL_STRIP_SHIFT, ROW_STRIP_SHIFT,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Pixel rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Same size, moved to `origin`.
    #[inline]
    pub fn at(&self, origin: Point) -> Self {
        Self::new(origin.x, origin.y, self.width, self.height)
    }

    /// Whether the rectangle lies fully inside a `width` x `height` area.
    pub fn fits_in(&self, width: usize, height: usize) -> bool {
        self.x
            .checked_add(self.width)
            .map_or(false, |r| r <= width)
            && self.y.checked_add(self.height).map_or(false, |b| b <= height)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("expected `X,Y,WIDTH,HEIGHT`, got {0:?}")]
pub struct ParseRectError(String);

impl FromStr for Rect {
    type Err = ParseRectError;

    /// Parses `X,Y,WIDTH,HEIGHT`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|v| v.trim().parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ParseRectError(s.to_owned()))?;
        match parts[..] {
            [x, y, width, height] => Ok(Self::new(x, y, width, height)),
            _ => Err(ParseRectError(s.to_owned())),
        }
    }
}

/// A block moved as a unit: copied from `source` to the same-sized
/// rectangle at `dest`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    pub source: Rect,
    pub dest: Point,
}

impl Tile {
    #[inline]
    pub fn dest_rect(&self) -> Rect {
        self.source.at(self.dest)
    }

    /// The tile moving the other way, undoing this one.
    #[inline]
    pub fn inverted(&self) -> Self {
        Self {
            source: self.dest_rect(),
            dest: self.source.origin(),
        }
    }
}

/// All tiles needed to descramble an image tiled as `grid`.
///
/// Destinations (and sources) of the returned tiles cover the image
/// exactly once. Order carries no meaning.
pub fn build_tiles(grid: &GridDescriptor) -> Vec<Tile> {
    let mut tiles = Vec::with_capacity((grid.cols + 1) * (grid.rows + 1));

    if grid.has_corner() {
        tiles.push(corner_tile(grid));
    }
    if grid.rem_height > 0 {
        tiles.extend(remainder_row_strip(grid));
    }
    if grid.rem_width > 0 {
        tiles.extend(remainder_col_strip(grid));
    }
    tiles.extend(interior(grid));

    tiles
}

// Sits where the remainder row meets the remainder column; never moves.
fn corner_tile(g: &GridDescriptor) -> Tile {
    let source = Rect::new(
        g.ref_col * g.tile_width,
        g.ref_row * g.tile_height,
        g.rem_width,
        g.rem_height,
    );
    Tile {
        source,
        dest: source.origin(),
    }
}

fn remainder_row_strip(g: &GridDescriptor) -> impl Iterator<Item = Tile> + '_ {
    (0..g.cols).map(move |t| {
        let p = axis_shift(t, g.cols, ROW_STRIP_SHIFT, g.pattern);
        let k = row_from_col(p, g.ref_col, g.ref_row, g.rows, g.pattern);
        Tile {
            source: Rect::new(
                shifted_pixel_pos(p, g.ref_col, g.rem_width, g.tile_width),
                k * g.tile_height,
                g.tile_width,
                g.rem_height,
            ),
            dest: Point::new(
                shifted_pixel_pos(t, g.ref_col, g.rem_width, g.tile_width),
                g.ref_row * g.tile_height,
            ),
        }
    })
}

fn remainder_col_strip(g: &GridDescriptor) -> impl Iterator<Item = Tile> + '_ {
    (0..g.rows).map(move |q| {
        let k = axis_shift(q, g.rows, COL_STRIP_SHIFT, g.pattern);
        let p = col_from_row(k, g.ref_col, g.ref_row, g.cols, g.pattern);
        Tile {
            source: Rect::new(
                p * g.tile_width,
                shifted_pixel_pos(k, g.ref_row, g.rem_height, g.tile_height),
                g.rem_width,
                g.tile_height,
            ),
            dest: Point::new(
                g.ref_col * g.tile_width,
                shifted_pixel_pos(q, g.ref_row, g.rem_height, g.tile_height),
            ),
        }
    })
}

fn interior(g: &GridDescriptor) -> impl Iterator<Item = Tile> + '_ {
    (0..g.cols).flat_map(move |t| {
        (0..g.rows).map(move |q| {
            let p = interior_col(t, q, g.cols, g.pattern);
            let k = interior_row(q, p, g.rows, g.pattern);

            // Source offsets follow where the strips sit in the scrambled
            // image, not the reference lines of the output.
            let x_off = if p >= col_from_row(k, g.ref_col, g.ref_row, g.cols, g.pattern) {
                g.rem_width
            } else {
                0
            };
            let y_off = if k >= row_from_col(p, g.ref_col, g.ref_row, g.rows, g.pattern) {
                g.rem_height
            } else {
                0
            };

            Tile {
                source: Rect::new(
                    p * g.tile_width + x_off,
                    k * g.tile_height + y_off,
                    g.tile_width,
                    g.tile_height,
                ),
                dest: Point::new(
                    shifted_pixel_pos(t, g.ref_col, g.rem_width, g.tile_width),
                    shifted_pixel_pos(q, g.ref_row, g.rem_height, g.tile_height),
                ),
            }
        })
    })
}
