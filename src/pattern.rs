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

/// Number of distinct scramble patterns.
pub const PATTERN_COUNT: u32 = 4;

/// Scramble pattern of a page, always in `1..=4`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pattern(u8);

impl Pattern {
    /// Wraps a raw pattern id. Returns [`None`] outside of `1..=4`.
    pub fn new(id: u8) -> Option<Self> {
        if (1..=PATTERN_COUNT as u8).contains(&id) {
            Some(Self(id))
        } else {
            None
        }
    }

    /// Derives the pattern from a page key.
    ///
    /// The key is the page path (without extension) followed by `/0`.
    /// Pattern is the sum of its character codes, modulo 4, plus one.
    /// Different keys collide freely, the scrambler relies on exactly this.
    pub fn from_key(key: &str) -> Self {
        // 2^32 is a multiple of 4, so wrapping keeps the residue intact.
        let sum = key
            .chars()
            .fold(0u32, |acc, c| acc.wrapping_add(u32::from(c)));
        Self((sum % PATTERN_COUNT) as u8 + 1)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0 as usize
    }

    /// Odd patterns flip which side of a reference line is the "low" half.
    #[inline]
    pub fn is_odd(self) -> bool {
        self.0 % 2 == 1
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
