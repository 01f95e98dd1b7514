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

use tracing::debug;

use crate::buffer::{CropError, PixelBuffer};
use crate::grid::{GridDescriptor, GridError};
use crate::pattern::Pattern;
use crate::tiles::{build_tiles, Rect, Tile};

pub const DEFAULT_TILE_WIDTH: usize = 64;
pub const DEFAULT_TILE_HEIGHT: usize = 64;

/// Tiling parameters. Build with [`ConfigBuilder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    tile_width: usize,
    tile_height: usize,
}

impl Config {
    #[inline]
    pub fn tile_width(&self) -> usize {
        self.tile_width
    }

    #[inline]
    pub fn tile_height(&self) -> usize {
        self.tile_height
    }

    /// Grid of a `width` x `height` image under `pattern`.
    pub fn grid(
        &self,
        width: usize,
        height: usize,
        pattern: Pattern,
    ) -> Result<GridDescriptor, GridError> {
        GridDescriptor::new(width, height, self.tile_width, self.tile_height, pattern)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tile_width: DEFAULT_TILE_WIDTH,
            tile_height: DEFAULT_TILE_HEIGHT,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tile_width(mut self, width: usize) -> Self {
        self.config.tile_width = width;
        self
    }

    pub fn tile_height(mut self, height: usize) -> Self {
        self.config.tile_height = height;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

/// Reassembles a scrambled page.
///
/// Output has the same shape as the input. Fails only if the image does
/// not fit one whole tile on each axis.
pub fn descramble(
    scrambled: &PixelBuffer,
    pattern: Pattern,
    config: &Config,
) -> Result<PixelBuffer, GridError> {
    let grid = config.grid(scrambled.width(), scrambled.height(), pattern)?;
    debug!(
        cols = grid.cols,
        rows = grid.rows,
        ref_col = grid.ref_col,
        ref_row = grid.ref_row,
        %pattern,
        "descrambling {}x{}",
        scrambled.width(),
        scrambled.height()
    );

    Ok(apply_tiles(scrambled, build_tiles(&grid)))
}

/// Scrambles a page the way the publisher does. Inverse of [`descramble`].
pub fn scramble(
    plain: &PixelBuffer,
    pattern: Pattern,
    config: &Config,
) -> Result<PixelBuffer, GridError> {
    let grid = config.grid(plain.width(), plain.height(), pattern)?;
    Ok(apply_tiles(
        plain,
        build_tiles(&grid).iter().map(Tile::inverted),
    ))
}

/// Cuts the published content area out of a page.
///
/// See [`PixelBuffer::crop`].
pub fn crop(buffer: PixelBuffer, rect: Rect) -> Result<PixelBuffer, CropError> {
    buffer.crop(rect)
}

fn apply_tiles(input: &PixelBuffer, tiles: impl IntoIterator<Item = Tile>) -> PixelBuffer {
    let mut out = PixelBuffer::new(input.width(), input.height(), input.channels());
    for tile in tiles {
        out.blit(input, tile.source, tile.dest);
    }
    out
}

#[cfg(test)]
mod tests {
    use ndarray::prelude::*;

    use super::*;

    fn pat(id: u8) -> Pattern {
        Pattern::new(id).unwrap()
    }

    fn numbered(width: usize, height: usize, channels: usize) -> PixelBuffer {
        PixelBuffer::from_array(Array3::from_shape_fn((height, width, channels), |(y, x, c)| {
            ((y * 7 + x * 3 + c) % 251) as u8
        }))
    }

    #[test]
    fn builder_defaults_to_64() {
        let config = ConfigBuilder::new().build();
        assert_eq!((config.tile_width(), config.tile_height()), (64, 64));
        assert_eq!(config, Config::default());

        let config = ConfigBuilder::new().tile_width(32).tile_height(16).build();
        assert_eq!((config.tile_width(), config.tile_height()), (32, 16));
    }

    #[test]
    fn moves_whole_tiles_of_exact_grid() {
        let input = numbered(128, 128, 3);
        let out = descramble(&input, pat(1), &Config::default()).unwrap();

        // top-left output tile comes from the top-right input tile
        assert_eq!(
            out.view().slice(s![..64, ..64, ..]),
            input.view().slice(s![..64, 64.., ..])
        );
        assert_eq!(
            out.view().slice(s![64.., 64.., ..]),
            input.view().slice(s![64.., 64.., ..])
        );
    }

    #[test]
    fn leaves_corner_block_in_place() {
        let config = ConfigBuilder::new().tile_width(16).tile_height(16).build();
        let input = numbered(75, 53, 1);
        for id in 1..=4 {
            let g = config.grid(75, 53, pat(id)).unwrap();
            let (x, y) = (g.ref_col * 16, g.ref_row * 16);
            let out = descramble(&input, pat(id), &config).unwrap();
            assert_eq!(
                out.view().slice(s![y..y + g.rem_height, x..x + g.rem_width, ..]),
                input.view().slice(s![y..y + g.rem_height, x..x + g.rem_width, ..])
            );
        }
    }

    #[test]
    fn scramble_inverts_descramble() {
        let config = ConfigBuilder::new().tile_width(8).tile_height(6).build();
        let input = numbered(61, 47, 3);
        for id in 1..=4 {
            let mixed = scramble(&input, pat(id), &config).unwrap();
            assert_ne!(mixed, input);
            assert_eq!(descramble(&mixed, pat(id), &config).unwrap(), input);
        }
    }

    #[test]
    fn too_small_image_is_an_error() {
        let input = numbered(40, 100, 1);
        assert!(matches!(
            descramble(&input, pat(2), &Config::default()),
            Err(GridError::TooSmall { .. })
        ));
    }

    #[test]
    fn crop_after_descramble() {
        let input = numbered(130, 70, 3);
        let out = descramble(&input, pat(4), &Config::default()).unwrap();
        let cropped = crop(out.clone(), Rect::new(1, 2, 128, 64)).unwrap();
        assert_eq!(
            cropped.view(),
            out.view().slice(s![2..66, 1..129, ..])
        );
        let err = crop(out.clone(), Rect::new(0, 0, 131, 1)).unwrap_err();
        assert_eq!(err.into_buffer(), out);
    }
}
