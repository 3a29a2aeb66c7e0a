//! Correlation kernels producing dense score maps.
//!
//! Every kernel evaluates the correlation coefficient
//!
//! ```text
//! Σ (T - mean(T)) * (Iwin - mean(Iwin)) / sqrt(Σ (T - mean(T))² * Σ (Iwin - mean(Iwin))²)
//! ```
//!
//! for each top-left placement of the template inside the image. A window
//! without intensity variation scores 0. A template without intensity
//! variation has no defined coefficient anywhere; it scores 1 on windows that
//! are uniform at the template's own intensity and 0 everywhere else.

use crate::image::ImageView;
use crate::template::TemplatePlan;
use crate::util::{HudMatchError, HudMatchResult};

pub mod scalar;
pub mod sum_table;

#[cfg(feature = "rayon")]
pub mod rayon;

pub use sum_table::{SearchImage, SumTable};

/// Location and value of a score-map entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    /// X coordinate (column) of the template's top-left corner.
    pub x: usize,
    /// Y coordinate (row) of the template's top-left corner.
    pub y: usize,
    /// Correlation score in `[-1, 1]`.
    pub score: f32,
}

/// Dense grid of scores, one per valid top-left placement.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreMap {
    width: usize,
    height: usize,
    scores: Vec<f32>,
}

impl ScoreMap {
    pub(crate) fn from_vec(scores: Vec<f32>, width: usize, height: usize) -> Self {
        debug_assert_eq!(scores.len(), width * height);
        Self {
            width,
            height,
            scores,
        }
    }

    /// Number of horizontal placements (`W - w + 1`).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of vertical placements (`H - h + 1`).
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the score for the placement at `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.scores.get(y * self.width + x).copied()
    }

    /// Returns all scores in row-major order.
    pub fn as_slice(&self) -> &[f32] {
        &self.scores
    }

    /// Returns the maximum score and its placement.
    ///
    /// Ties resolve to the first placement in row-major order (smallest `y`,
    /// then smallest `x`).
    pub fn best(&self) -> Peak {
        let mut best = Peak {
            x: 0,
            y: 0,
            score: f32::NEG_INFINITY,
        };
        for (idx, &score) in self.scores.iter().enumerate() {
            if score > best.score {
                best = Peak {
                    x: idx % self.width,
                    y: idx / self.width,
                    score,
                };
            }
        }
        best
    }
}

/// Kernel trait for scoring template placements.
pub trait Kernel {
    /// Computes the score at a single placement (top-left coordinates).
    ///
    /// Returns `None` when the template does not fit at `(x, y)`.
    fn score_at(image: &SearchImage<'_>, plan: &TemplatePlan, x: usize, y: usize)
        -> Option<f32>;

    /// Scores every valid placement.
    fn score_map(image: &SearchImage<'_>, plan: &TemplatePlan) -> HudMatchResult<ScoreMap>;
}

/// Returns the placement-grid size, or `TemplateTooLarge` when the template
/// has no valid placement.
pub(crate) fn placement_grid(
    image: ImageView<'_, u8>,
    plan: &TemplatePlan,
) -> HudMatchResult<(usize, usize)> {
    let (img_width, img_height) = (image.width(), image.height());
    let (tpl_width, tpl_height) = (plan.width(), plan.height());
    if img_width < tpl_width || img_height < tpl_height {
        return Err(HudMatchError::TemplateTooLarge {
            tpl_width,
            tpl_height,
            img_width,
            img_height,
        });
    }
    Ok((img_width - tpl_width + 1, img_height - tpl_height + 1))
}

/// Correlation coefficient from the centred dot product and both sums of
/// squared deviations; 0 for flat input.
pub(crate) fn coefficient(dot: f64, var_t: f64, var_i: f64) -> f32 {
    if var_t <= crate::template::FLAT_EPS || var_i <= crate::template::FLAT_EPS {
        return 0.0;
    }
    clamp_unit(dot / (var_t * var_i).sqrt())
}

/// Score of a flat template against a window with the given mean and sum of
/// squared deviations: 1 only for a uniform window of the same intensity.
pub(crate) fn flat_template_score(tpl_mean: f64, win_mean: f64, var_i: f64) -> f32 {
    // Uniform 8-bit windows have integral means.
    if var_i <= crate::template::FLAT_EPS && (tpl_mean - win_mean).abs() < 0.5 {
        1.0
    } else {
        0.0
    }
}

fn clamp_unit(score: f64) -> f32 {
    if score.is_finite() {
        score.clamp(-1.0, 1.0) as f32
    } else {
        0.0
    }
}
