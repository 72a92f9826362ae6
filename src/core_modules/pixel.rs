// THEORY:
// The `pixel` module holds the single-color math the detector relies on. A grid
// cell is a plain `image::Rgb<u8>`; this module adds what the sampler and the
// scorer need on top of it: a Rec. 601 luminance, the Euclidean RGB distance
// between two cells, and the mean-color post-processing (saturation blend toward
// luminance, then a color boost) that turns a frame's average into a glow color.
//
// Key principles:
// 1) Cells stay bytes. Anything fractional lives in `MeanColor` until the very
//    last step, where it is rounded and clamped back to 0..=255 exactly once.
// 2) Distances are symmetric and never negative; they feed the scorer directly.

use image::Rgb;

pub type Channel = u8;
pub type Color = Rgb<Channel>;
pub type Luminance = f64;
pub type ColorDistance = f64;

const CHANNELS_RGBA: usize = 4;

pub fn rgb(red: Channel, green: Channel, blue: Channel) -> Color {
    Rgb([red, green, blue])
}

/// Reads the RGB part of one RGBA pixel. Alpha is ignored.
pub fn from_rgba(bytes: &[u8]) -> Color {
    debug_assert_eq!(bytes.len(), CHANNELS_RGBA);
    Rgb([bytes[0], bytes[1], bytes[2]])
}

/// Perceived brightness, Rec. 601 weights.
pub fn luminance(red: f64, green: f64, blue: f64) -> Luminance {
    0.299 * red + 0.587 * green + 0.114 * blue
}

/// Euclidean distance between two colors in RGB space, 0.0..=441.67.
pub fn color_distance(a: &Color, b: &Color) -> ColorDistance {
    let dr = a[0] as f64 - b[0] as f64;
    let dg = a[1] as f64 - b[1] as f64;
    let db = a[2] as f64 - b[2] as f64;
    (dr * dr + dg * dg + db * db).sqrt()
}

/// An unrounded average color, kept fractional until post-processing ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanColor {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl MeanColor {
    pub fn new(red: f64, green: f64, blue: f64) -> Self {
        Self { red, green, blue }
    }

    /// Averages running channel sums over `count` pixels.
    pub fn from_sums(sums: [u64; 3], count: usize) -> Self {
        if count == 0 {
            return Self::new(0.0, 0.0, 0.0);
        }
        let n = count as f64;
        Self::new(sums[0] as f64 / n, sums[1] as f64 / n, sums[2] as f64 / n)
    }

    pub fn luminance(&self) -> Luminance {
        luminance(self.red, self.green, self.blue)
    }

    /// Blends each channel toward (factor < 1) or away from (factor > 1) the
    /// color's luminance. A factor of exactly 1.0 is a no-op.
    pub fn saturate(self, factor: f64) -> Self {
        if factor == 1.0 {
            return self;
        }
        let l = self.luminance();
        Self::new(
            l + (self.red - l) * factor,
            l + (self.green - l) * factor,
            l + (self.blue - l) * factor,
        )
    }

    /// Multiplies every channel, rounds, and clamps into a byte color.
    pub fn boost(self, factor: f64) -> Color {
        let channel = |v: f64| (v * factor).round().clamp(0.0, 255.0) as Channel;
        rgb(channel(self.red), channel(self.green), channel(self.blue))
    }

    /// Saturation then boost, the order the glow expects.
    pub fn finish(self, saturation: f64, boost: f64) -> Color {
        self.saturate(saturation).boost(boost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_black_to_white() {
        let d = color_distance(&rgb(0, 0, 0), &rgb(255, 255, 255));
        assert!((d - (3.0_f64 * 255.0 * 255.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let a = rgb(10, 200, 30);
        let b = rgb(90, 20, 130);
        assert_eq!(color_distance(&a, &a), 0.0);
        assert_eq!(color_distance(&a, &b), color_distance(&b, &a));
    }

    #[test]
    fn mean_from_sums() {
        let mean = MeanColor::from_sums([40, 80, 120], 4);
        assert_eq!(mean, MeanColor::new(10.0, 20.0, 30.0));
        assert_eq!(MeanColor::from_sums([1, 2, 3], 0), MeanColor::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn zero_saturation_is_grey() {
        let grey = MeanColor::new(200.0, 100.0, 50.0).saturate(0.0);
        let l = luminance(200.0, 100.0, 50.0);
        assert!((grey.red - l).abs() < 1e-9);
        assert!((grey.green - l).abs() < 1e-9);
        assert!((grey.blue - l).abs() < 1e-9);
    }

    #[test]
    fn boost_rounds_and_clamps() {
        assert_eq!(MeanColor::new(100.0, 250.0, 0.4).boost(1.2), rgb(120, 255, 0));
        // Oversaturation can push channels negative before the clamp.
        assert_eq!(MeanColor::new(250.0, 10.0, 10.0).finish(5.0, 1.0)[1], 0);
    }
}
