// THEORY:
// The scorer decides whether two consecutive grids belong to different scenes.
// It compares the grids cell by cell and folds the per-cell RGB distances into
// three normalized signals:
//
// - motion ratio:      the share of cells that moved more than the threshold
// - average motion:    mean distance relative to the threshold, capped at 1
// - max color change:  the largest single-cell distance over 255, capped at 1
//
// The combined score weights them 0.6 / 0.3 / 0.1. The weights are fixed
// constants; the decision is simply `combined >= confidence`.
//
// The scorer is pure. Missing or mismatched grids are never an error, they
// just mean "no change".

use crate::config::DetectorConfig;
use crate::core_modules::pixel::color_distance;
use crate::core_modules::sample_grid::SampleGrid;
use tracing::debug;

pub const MOTION_RATIO_WEIGHT: f64 = 0.6;
pub const AVG_MOTION_WEIGHT: f64 = 0.3;
pub const MAX_COLOR_WEIGHT: f64 = 0.1;

/// The signals behind one comparison, kept for graphing and debugging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneScore {
    /// Fraction of cells whose distance exceeded the motion threshold.
    pub motion_ratio: f64,
    /// Mean per-cell distance, raw (0-441.67).
    pub mean_distance: f64,
    /// `mean_distance / motion_threshold`, capped at 1.
    pub avg_motion: f64,
    /// Largest per-cell distance over 255, capped at 1.
    pub max_color_change: f64,
    pub combined: f64,
}

impl SceneScore {
    pub fn is_scene_change(&self, config: &DetectorConfig) -> bool {
        self.combined >= config.scene_change_confidence
    }
}

/// Scores `current` against `previous`. `None` when either grid is missing,
/// empty, or the two differ in length.
pub fn score(
    current: Option<&SampleGrid>,
    previous: Option<&SampleGrid>,
    config: &DetectorConfig,
) -> Option<SceneScore> {
    let (current, previous) = (current?, previous?);
    if current.len() != previous.len() || current.is_empty() {
        return None;
    }

    let mut changed_cells = 0usize;
    let mut total_distance = 0.0;
    let mut max_distance: f64 = 0.0;

    for (a, b) in current.cells().iter().zip(previous.cells()) {
        let distance = color_distance(a, b);
        total_distance += distance;
        if distance > config.motion_threshold {
            changed_cells += 1;
        }
        max_distance = max_distance.max(distance);
    }

    let n = current.len() as f64;
    let motion_ratio = changed_cells as f64 / n;
    let mean_distance = total_distance / n;
    let avg_motion = (mean_distance / config.motion_threshold).min(1.0);
    let max_color_change = (max_distance / 255.0).min(1.0);

    let combined = motion_ratio * MOTION_RATIO_WEIGHT
        + avg_motion * AVG_MOTION_WEIGHT
        + max_color_change * MAX_COLOR_WEIGHT;

    debug!(
        combined,
        motion_ratio,
        mean_distance,
        max_color_change,
        "scene score"
    );

    Some(SceneScore {
        motion_ratio,
        mean_distance,
        avg_motion,
        max_color_change,
        combined,
    })
}

/// The yes/no scene-change decision. Fails safe to `false`.
pub fn is_scene_change(
    current: Option<&SampleGrid>,
    previous: Option<&SampleGrid>,
    config: &DetectorConfig,
) -> bool {
    score(current, previous, config).is_some_and(|s| s.is_scene_change(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::{Color, rgb};
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    fn grid(side: u32, cells: Vec<Color>) -> SampleGrid {
        SampleGrid::from_cells(side, cells).unwrap()
    }

    fn config(threshold: f64, confidence: f64) -> DetectorConfig {
        DetectorConfig {
            motion_threshold: threshold,
            scene_change_confidence: confidence,
            ..DetectorConfig::default()
        }
    }

    #[test]
    fn single_white_cell_on_black() {
        let previous = grid(2, vec![rgb(0, 0, 0); 4]);
        let current = grid(
            2,
            vec![rgb(255, 255, 255), rgb(0, 0, 0), rgb(0, 0, 0), rgb(0, 0, 0)],
        );
        let cfg = config(60.0, 0.45);
        let s = score(Some(&current), Some(&previous), &cfg).unwrap();

        let white = (3.0_f64 * 255.0 * 255.0).sqrt();
        assert!((s.motion_ratio - 0.25).abs() < EPS);
        assert!((s.mean_distance - white / 4.0).abs() < EPS);
        // 110.4 / 60 and 441.7 / 255 both cap at 1.
        assert!((s.avg_motion - 1.0).abs() < EPS);
        assert!((s.max_color_change - 1.0).abs() < EPS);
        assert!((s.combined - 0.55).abs() < EPS);
        assert!(is_scene_change(Some(&current), Some(&previous), &cfg));
    }

    #[test]
    fn uncapped_signals_use_the_formula() {
        // One cell moves by 30 on red only: below the threshold.
        let previous = grid(2, vec![rgb(0, 0, 0); 4]);
        let current = grid(2, vec![rgb(30, 0, 0), rgb(0, 0, 0), rgb(0, 0, 0), rgb(0, 0, 0)]);
        let s = score(Some(&current), Some(&previous), &config(60.0, 0.45)).unwrap();
        let expected = 0.0 * 0.6 + (7.5 / 60.0) * 0.3 + (30.0 / 255.0) * 0.1;
        assert_eq!(s.motion_ratio, 0.0);
        assert!((s.combined - expected).abs() < EPS);
        assert!(!s.is_scene_change(&config(60.0, 0.45)));
    }

    #[test]
    fn boundary_counts_as_change() {
        let s = SceneScore {
            motion_ratio: 0.5,
            mean_distance: 0.0,
            avg_motion: 0.0,
            max_color_change: 0.0,
            combined: 0.45,
        };
        assert!(s.is_scene_change(&config(60.0, 0.45)));
        assert!(!s.is_scene_change(&config(60.0, 0.46)));
    }

    #[test]
    fn missing_or_mismatched_grids_are_no_change() {
        let cfg = DetectorConfig::default();
        let a = grid(2, vec![rgb(0, 0, 0); 4]);
        let b = grid(3, vec![rgb(255, 255, 255); 9]);
        assert!(score(Some(&a), None, &cfg).is_none());
        assert!(score(None, Some(&a), &cfg).is_none());
        assert!(score(Some(&a), Some(&b), &cfg).is_none());
        assert!(!is_scene_change(Some(&a), Some(&b), &cfg));
        assert!(!is_scene_change(None, None, &cfg));
    }

    fn arb_color() -> impl Strategy<Value = Color> {
        (any::<u8>(), any::<u8>(), any::<u8>()).prop_map(|(r, g, b)| rgb(r, g, b))
    }

    fn arb_grid() -> impl Strategy<Value = SampleGrid> {
        (1u32..=6).prop_flat_map(|side| {
            prop::collection::vec(arb_color(), (side * side) as usize)
                .prop_map(move |cells| SampleGrid::from_cells(side, cells).unwrap())
        })
    }

    proptest! {
        #[test]
        fn identical_grids_never_change(
            g in arb_grid(),
            threshold in 20.0f64..=100.0,
            confidence in 0.1f64..=0.9,
        ) {
            let cfg = config(threshold, confidence);
            let s = score(Some(&g), Some(&g), &cfg).unwrap();
            prop_assert_eq!(s.combined, 0.0);
            prop_assert!(!is_scene_change(Some(&g), Some(&g), &cfg));
        }

        #[test]
        fn every_cell_over_threshold_gives_full_ratio(
            side in 1u32..=6,
            threshold in 20.0f64..=100.0,
        ) {
            // Black to white is 441.67 per cell, above any allowed threshold.
            let count = (side * side) as usize;
            let previous = grid(side, vec![rgb(0, 0, 0); count]);
            let current = grid(side, vec![rgb(255, 255, 255); count]);
            let s = score(Some(&current), Some(&previous), &config(threshold, 0.45)).unwrap();
            prop_assert_eq!(s.motion_ratio, 1.0);
        }

        #[test]
        fn more_changed_cells_never_lower_the_score(
            base in prop::collection::vec(arb_color(), 16),
            order in Just((0..16usize).collect::<Vec<_>>()).prop_shuffle(),
            threshold in 20.0f64..=100.0,
        ) {
            // Flip cells to their farthest corner one at a time; each flip
            // moves that cell's distance from 0 to above the threshold.
            let cfg = config(threshold, 0.45);
            let previous = grid(4, base.clone());
            let mut cells = base.clone();
            let mut last = score(Some(&previous), Some(&previous), &cfg).unwrap().combined;
            for idx in order {
                let c = cells[idx];
                let far = |v: u8| if v < 128 { 255 } else { 0 };
                cells[idx] = rgb(far(c[0]), far(c[1]), far(c[2]));
                let current = grid(4, cells.clone());
                let next = score(Some(&current), Some(&previous), &cfg).unwrap().combined;
                prop_assert!(next + EPS >= last);
                last = next;
            }
        }
    }
}
