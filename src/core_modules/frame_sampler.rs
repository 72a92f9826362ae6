// THEORY:
// The `FrameSampler` is the bridge between a live video and the grid-based
// analysis. It owns the one offscreen raster every element is drawn into and
// turns whatever lands there into a `SampleGrid` plus a post-processed mean
// color.
//
// Key architectural principles:
// 1.  **One raster, strictly draw-then-read**: the raster is cleared, drawn and
//     read back inside a single call. Nothing from a previous element or frame
//     can bleed into the next sample.
// 2.  **Degrade, never fail**: a video without a decoded frame yields no
//     sample at all (the tick is skipped). A video whose frame cannot be read
//     (cross-origin, protection) yields a synthetic, time-driven color so the
//     glow keeps moving and the grid keeps its shape.
// 3.  **Sample the source, not the display**: the player's saturate/contrast
//     filter is lifted for the draw and put back right after.
// 4.  **Row-major read-back**: cells are read in the same order for every
//     frame so the scorer can compare them index by index.

use crate::config::DetectorConfig;
use crate::core_modules::pixel::{self, Color, MeanColor};
use crate::core_modules::sample_grid::SampleGrid;
use crate::video::VideoElement;
use image::{Rgba, RgbaImage};
use tracing::{debug, trace};

/// Where a sample's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleSource {
    /// Read back from the drawn frame.
    Frame,
    /// Synthesized because the frame could not be read.
    Fallback,
}

/// One sampling result: the grid and its glow-ready mean color.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSample {
    pub grid: SampleGrid,
    pub avg_color: Color,
    pub source: SampleSource,
}

pub struct FrameSampler {
    raster: RgbaImage,
}

impl FrameSampler {
    pub fn new(grid_size: u32) -> Self {
        Self {
            raster: RgbaImage::new(grid_size, grid_size),
        }
    }

    pub fn grid_size(&self) -> u32 {
        self.raster.width()
    }

    /// Samples the element's current frame. `now_ms` is wall-clock time and is
    /// only used to drive the fallback color.
    ///
    /// Returns `None` when the element has no decoded frame yet.
    pub fn sample<V: VideoElement>(
        &mut self,
        video: &mut V,
        config: &DetectorConfig,
        now_ms: u64,
    ) -> Option<FrameSample> {
        if video.intrinsic_width() == 0 {
            trace!(video = %video.id(), "no decoded frame, skipping sample");
            return None;
        }

        if self.raster.width() != config.grid_size {
            self.raster = RgbaImage::new(config.grid_size, config.grid_size);
        }

        // Clear first; a failed or partial draw must not see the last frame.
        for p in self.raster.pixels_mut() {
            *p = Rgba([0, 0, 0, 0]);
        }

        // The grid must see the frame as decoded, not as filtered for display.
        let filter = video.suspend_filter();
        let drawn = video.draw_frame(&mut self.raster);
        if filter.is_some() {
            video.apply_filter(filter.as_ref());
        }

        match drawn {
            Ok(()) => Some(self.read_back(config)),
            Err(err) => {
                debug!(video = %video.id(), error = %err, "frame access failed, using fallback color");
                Some(fallback_sample(config, now_ms))
            }
        }
    }

    fn read_back(&self, config: &DetectorConfig) -> FrameSample {
        let side = self.raster.width();
        let cells: Vec<Color> = self
            .raster
            .as_raw()
            .chunks_exact(4)
            .map(pixel::from_rgba)
            .collect();
        let grid = SampleGrid::from_cells(side, cells)
            .unwrap_or_else(|| SampleGrid::uniform(side, pixel::rgb(0, 0, 0)));
        let avg_color = grid
            .mean_color()
            .finish(config.glow_saturation, config.color_boost);
        FrameSample {
            grid,
            avg_color,
            source: SampleSource::Frame,
        }
    }
}

/// A deterministic stand-in for an unreadable frame: each channel follows its
/// own slow sine wave of wall-clock seconds, out of phase with the others.
pub fn fallback_sample(config: &DetectorConfig, now_ms: u64) -> FrameSample {
    let t = now_ms as f64 / 1000.0;
    let wave = |speed: f64| (128.0 + 127.0 * (t * speed).sin()).round().min(255.0);
    let avg_color = MeanColor::new(wave(0.5), wave(0.3), wave(0.7))
        .finish(config.glow_saturation, config.color_boost);
    FrameSample {
        grid: SampleGrid::uniform(config.grid_size, avg_color),
        avg_color,
        source: SampleSource::Fallback,
    }
}
