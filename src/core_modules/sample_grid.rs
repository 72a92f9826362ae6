// THEORY:
// A `SampleGrid` is one video frame reduced to `side x side` colors, stored
// row-major. It is a "dumb" data container in the same spirit as a chunk of
// pixels: it knows how to summarize itself (channel sums, mean color) but knows
// nothing about the previous frame. Comparing two grids is the scorer's job.

use crate::core_modules::pixel::{Color, MeanColor};

#[derive(Debug, Clone, PartialEq)]
pub struct SampleGrid {
    side: u32,
    cells: Vec<Color>,
}

impl SampleGrid {
    /// Builds a grid from row-major cells. Returns `None` when `cells` does not
    /// hold exactly `side * side` colors.
    pub fn from_cells(side: u32, cells: Vec<Color>) -> Option<Self> {
        if cells.len() != (side as usize) * (side as usize) {
            return None;
        }
        Some(Self { side, cells })
    }

    /// A grid where every cell holds the same color.
    pub fn uniform(side: u32, color: Color) -> Self {
        let count = (side as usize) * (side as usize);
        Self {
            side,
            cells: vec![color; count],
        }
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Color] {
        &self.cells
    }

    /// Running R, G, B sums. u64 so large grids never overflow.
    pub fn channel_sums(&self) -> [u64; 3] {
        let mut sums = [0u64; 3];
        for cell in &self.cells {
            sums[0] += cell[0] as u64;
            sums[1] += cell[1] as u64;
            sums[2] += cell[2] as u64;
        }
        sums
    }

    /// Arithmetic mean of every cell, before any post-processing.
    pub fn mean_color(&self) -> MeanColor {
        MeanColor::from_sums(self.channel_sums(), self.cells.len())
    }
}
