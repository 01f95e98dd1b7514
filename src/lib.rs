//! Library to restore tile-scrambled comic pages.
//!
//! Pages are published with their tiles shuffled. The shuffle is fully
//! determined by the image size, the tile size and a pattern id derived
//! from the page path, so it can be undone exactly with [`descramble`]:
//!
//! * The page is cut into a grid of whole tiles.
//! * Leftover pixels form one remainder row and one remainder column,
//!   inserted at the reference lines picked by the pattern.
//! * Every tile (and remainder strip) is moved, never resized, and the
//!   result covers the page exactly once.
//!
//! Around that core sit the collaborators of the downloader: [`fetch`],
//! [`metadata`], [`codec`] and the per-page worker pool in [`batch`].

// Copyright (C) 2023 Dheatly23
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Lesser General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//

pub mod batch;
mod buffer;
pub mod codec;
mod descramble;
pub mod fetch;
mod grid;
pub mod metadata;
mod pattern;
pub mod permute;
mod tiles;

pub use crate::buffer::{copy_rect, BufferError, CropError, PixelBuffer};
#[doc(inline)]
pub use crate::descramble::{
    crop, descramble, scramble, Config, ConfigBuilder, DEFAULT_TILE_HEIGHT, DEFAULT_TILE_WIDTH,
};
pub use crate::grid::{derive_ref, GridDescriptor, GridError, REF_COL_FACTOR, REF_ROW_FACTOR};
pub use crate::pattern::Pattern;
pub use crate::tiles::{build_tiles, ParseRectError, Point, Rect, Tile};
