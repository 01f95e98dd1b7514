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

//! Index transforms of the scramble format.
//!
//! Every constant here is part of the format. Changing any of them
//! produces garbage pages.

use crate::pattern::Pattern;

/// Shift of the remainder-row strip (one tile per column).
pub const ROW_STRIP_SHIFT: usize = 61;
/// Shift of the remainder-column strip (one tile per row).
pub const COL_STRIP_SHIFT: usize = 73;

/// Plain per-axis rotation: `(x + factor * pattern) mod size`.
#[inline]
pub fn axis_shift(x: usize, size: usize, factor: usize, pattern: Pattern) -> usize {
    (x + factor * pattern.get()) % size
}

// Reduce into one half of a split axis. An empty half (single tile axis)
// collapses onto its base.
#[inline]
fn split_mod(value: usize, modulus: usize, base: usize) -> usize {
    if modulus == 0 {
        base
    } else {
        value % modulus + base
    }
}

/// Source row of the tile in column `p`, split around `ref_row`.
///
/// Which half is used depends on the side of `ref_col` that `p` is on,
/// flipped by the pattern parity.
pub fn row_from_col(
    p: usize,
    ref_col: usize,
    ref_row: usize,
    rows: usize,
    pattern: Pattern,
) -> usize {
    let value = p + 53 * pattern.get() + 59 * ref_row;
    if (p < ref_col) == pattern.is_odd() {
        split_mod(value, ref_row, 0)
    } else {
        split_mod(value, rows - ref_row, ref_row)
    }
}

/// Source column of the tile in row `k`.
///
/// The split test compares `k` against the *row* reference, while the
/// output is split around `ref_col`.
pub fn col_from_row(
    k: usize,
    ref_col: usize,
    ref_row: usize,
    cols: usize,
    pattern: Pattern,
) -> usize {
    let value = k + 67 * pattern.get() + ref_col + 71;
    if (k < ref_row) == pattern.is_odd() {
        split_mod(value, cols - ref_col, ref_col)
    } else {
        split_mod(value, ref_col, 0)
    }
}

/// Pixel offset of grid line `index`, skipping over the remainder strip
/// that sits in front of `ref_index`.
#[inline]
pub fn shifted_pixel_pos(index: usize, ref_index: usize, remainder: usize, tile_size: usize) -> usize {
    index * tile_size + if index >= ref_index { remainder } else { 0 }
}

/// Source column of interior tile `(t, q)`.
#[inline]
pub fn interior_col(t: usize, q: usize, cols: usize, pattern: Pattern) -> usize {
    (t + 29 * pattern.get() + 31 * q) % cols
}

/// Source row of interior tile in row `q` whose source column is `p`.
#[inline]
pub fn interior_row(q: usize, p: usize, rows: usize, pattern: Pattern) -> usize {
    (q + 37 * pattern.get() + 41 * p) % rows
}
