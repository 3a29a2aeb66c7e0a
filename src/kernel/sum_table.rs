//! Running-sum tables and the sum-table correlation kernel.
//!
//! Window sums of `I` and `I²` come from two summed-area tables, so window
//! means and variances cost O(1) per placement and are exact integers. Only
//! the template dot product remains O(w·h), and it is skipped entirely for
//! flat windows and for flat templates, which are decided from the sums.

use std::sync::OnceLock;

use crate::image::ImageView;
use crate::kernel::{coefficient, flat_template_score, placement_grid, Kernel, ScoreMap};
use crate::template::TemplatePlan;
use crate::util::HudMatchResult;

/// Summed-area tables of pixel values and squared pixel values.
///
/// Entry `(x, y)` holds the sum over `[0, x) x [0, y)`, so the tables are one
/// larger than the image in each dimension.
#[derive(Clone, Debug)]
pub struct SumTable {
    stride: usize,
    sum: Vec<u64>,
    sum_sq: Vec<u64>,
}

/// Sums over one window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowSums {
    /// `Σ I`.
    pub sum: u64,
    /// `Σ I²`.
    pub sum_sq: u64,
}

impl SumTable {
    /// Builds both tables in a single pass.
    pub fn new(image: ImageView<'_, u8>) -> Self {
        let width = image.width();
        let height = image.height();
        let stride = width + 1;
        let mut sum = vec![0u64; stride * (height + 1)];
        let mut sum_sq = vec![0u64; stride * (height + 1)];

        for y in 0..height {
            let row = image.row(y).unwrap_or(&[]);
            let mut row_sum = 0u64;
            let mut row_sum_sq = 0u64;
            for (x, &value) in row.iter().enumerate() {
                let v = u64::from(value);
                row_sum += v;
                row_sum_sq += v * v;
                let above = y * stride + x + 1;
                let here = above + stride;
                sum[here] = sum[above] + row_sum;
                sum_sq[here] = sum_sq[above] + row_sum_sq;
            }
        }

        Self {
            stride,
            sum,
            sum_sq,
        }
    }

    /// Returns the sums over `[x, x + width) x [y, y + height)`.
    ///
    /// The window must lie inside the image the table was built from.
    pub fn window(&self, x: usize, y: usize, width: usize, height: usize) -> WindowSums {
        let s = self.stride;
        let a = y * s + x;
        let b = a + width;
        let c = (y + height) * s + x;
        let d = c + width;
        WindowSums {
            sum: self.sum[d] + self.sum[a] - self.sum[b] - self.sum[c],
            sum_sq: self.sum_sq[d] + self.sum_sq[a] - self.sum_sq[b] - self.sum_sq[c],
        }
    }
}

/// Image prepared for repeated scoring against many templates.
///
/// The sum tables are built lazily on first use and shared by every template
/// matched against this image.
pub struct SearchImage<'a> {
    view: ImageView<'a, u8>,
    sums: OnceLock<SumTable>,
}

impl<'a> SearchImage<'a> {
    /// Wraps an image view.
    pub fn new(view: ImageView<'a, u8>) -> Self {
        Self {
            view,
            sums: OnceLock::new(),
        }
    }

    /// Returns the underlying pixels.
    pub fn view(&self) -> ImageView<'a, u8> {
        self.view
    }

    /// Returns the sum tables, building them on first call.
    pub fn sums(&self) -> &SumTable {
        self.sums.get_or_init(|| SumTable::new(self.view))
    }
}

/// Correlation kernel backed by summed-area tables.
pub struct SumTableKernel;

/// Scores one placement. The caller guarantees the template fits at `(x, y)`.
fn score_placement(image: &SearchImage<'_>, plan: &TemplatePlan, x: usize, y: usize) -> f32 {
    let (tpl_width, tpl_height) = (plan.width(), plan.height());
    let n = plan.len() as u128;
    let win = image.sums().window(x, y, tpl_width, tpl_height);

    let sum = u128::from(win.sum);
    let var_num = n * u128::from(win.sum_sq) - sum * sum;
    if plan.is_flat() {
        let n = n as f64;
        return flat_template_score(plan.mean(), sum as f64 / n, var_num as f64 / n);
    }
    if var_num == 0 {
        return 0.0;
    }
    let var_i = var_num as f64 / n as f64;

    let view = image.view();
    let t_prime = plan.zero_mean();
    let mut dot = 0.0f64;
    for ty in 0..tpl_height {
        let Some(img_row) = view.row(y + ty) else {
            return 0.0;
        };
        let base = ty * tpl_width;
        let t_row = &t_prime[base..base + tpl_width];
        for (t, &value) in t_row.iter().zip(&img_row[x..x + tpl_width]) {
            dot += t * value as f64;
        }
    }

    coefficient(dot, plan.var_t(), var_i)
}

/// Fills one row of the score map; shared by the sequential and row-parallel
/// scans so both produce identical values.
pub(crate) fn score_row(image: &SearchImage<'_>, plan: &TemplatePlan, y: usize, out: &mut [f32]) {
    for (x, score) in out.iter_mut().enumerate() {
        *score = score_placement(image, plan, x, y);
    }
}

impl Kernel for SumTableKernel {
    fn score_at(
        image: &SearchImage<'_>,
        plan: &TemplatePlan,
        x: usize,
        y: usize,
    ) -> Option<f32> {
        let (cols, rows) = placement_grid(image.view(), plan).ok()?;
        if x >= cols || y >= rows {
            return None;
        }
        Some(score_placement(image, plan, x, y))
    }

    fn score_map(image: &SearchImage<'_>, plan: &TemplatePlan) -> HudMatchResult<ScoreMap> {
        let (cols, rows) = placement_grid(image.view(), plan)?;
        let mut scores = vec![0.0f32; cols * rows];
        for (y, row) in scores.chunks_mut(cols).enumerate() {
            score_row(image, plan, y, row);
        }
        Ok(ScoreMap::from_vec(scores, cols, rows))
    }
}
