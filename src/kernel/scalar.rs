//! Scalar reference kernel evaluating the coefficient formula literally.
//!
//! For each placement the window `I[y..y + h, x..x + w]` is cut out, its mean
//! recomputed, and both centred sums accumulated. This is O(W·H·w·h) and
//! serves as the numeric reference for the faster kernels.

use crate::kernel::{coefficient, flat_template_score, placement_grid, Kernel, ScoreMap, SearchImage};
use crate::template::TemplatePlan;
use crate::util::HudMatchResult;

/// Direct per-window correlation kernel.
pub struct DirectKernel;

fn score_window(image: &SearchImage<'_>, plan: &TemplatePlan, x: usize, y: usize) -> f32 {
    let (tpl_width, tpl_height) = (plan.width(), plan.height());
    let Ok(window) = image.view().window(x, y, tpl_width, tpl_height) else {
        return 0.0;
    };
    let t_prime = plan.zero_mean();
    let n = plan.len() as f64;

    let mut sum_i = 0.0f64;
    for ty in 0..tpl_height {
        sum_i += window
            .row(ty)
            .unwrap_or(&[])
            .iter()
            .map(|&v| v as f64)
            .sum::<f64>();
    }
    let mean_i = sum_i / n;

    let mut dot = 0.0f64;
    let mut var_i = 0.0f64;
    for ty in 0..tpl_height {
        let base = ty * tpl_width;
        let row = window.row(ty).unwrap_or(&[]);
        for (t, &value) in t_prime[base..base + tpl_width].iter().zip(row) {
            let d = value as f64 - mean_i;
            dot += t * d;
            var_i += d * d;
        }
    }

    if plan.is_flat() {
        return flat_template_score(plan.mean(), mean_i, var_i);
    }
    coefficient(dot, plan.var_t(), var_i)
}

impl Kernel for DirectKernel {
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
        Some(score_window(image, plan, x, y))
    }

    fn score_map(image: &SearchImage<'_>, plan: &TemplatePlan) -> HudMatchResult<ScoreMap> {
        let (cols, rows) = placement_grid(image.view(), plan)?;
        let mut scores = Vec::with_capacity(cols * rows);
        for y in 0..rows {
            for x in 0..cols {
                scores.push(score_window(image, plan, x, y));
            }
        }
        Ok(ScoreMap::from_vec(scores, cols, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::DirectKernel;
    use crate::image::OwnedImage;
    use crate::kernel::sum_table::SumTableKernel;
    use crate::kernel::{Kernel, SearchImage};
    use crate::template::TemplatePlan;

    fn pattern(width: usize, height: usize, a: usize, b: usize) -> OwnedImage {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(((x * a + y * b + x * y) & 0xFF) as u8);
            }
        }
        OwnedImage::new(data, width, height).unwrap()
    }

    #[test]
    fn direct_and_sum_table_kernels_agree() {
        let image = pattern(9, 7, 17, 9);
        let tpl = pattern(3, 2, 5, 11);
        let plan = TemplatePlan::from_view(tpl.view()).unwrap();
        let search = SearchImage::new(image.view());

        let direct = <DirectKernel as Kernel>::score_map(&search, &plan).unwrap();
        let fast = <SumTableKernel as Kernel>::score_map(&search, &plan).unwrap();
        assert_eq!((direct.width(), direct.height()), (7, 6));
        for (a, b) in direct.as_slice().iter().zip(fast.as_slice()) {
            assert!((a - b).abs() < 1e-6, "direct {a} vs sum-table {b}");
        }
    }

    #[test]
    fn flat_window_scores_zero() {
        let image = OwnedImage::filled(6, 6, 40).unwrap();
        let tpl = pattern(3, 3, 7, 3);
        let plan = TemplatePlan::from_view(tpl.view()).unwrap();
        let search = SearchImage::new(image.view());
        assert_eq!(
            <DirectKernel as Kernel>::score_at(&search, &plan, 1, 2),
            Some(0.0)
        );
        assert_eq!(<DirectKernel as Kernel>::score_at(&search, &plan, 4, 0), None);
    }

    #[test]
    fn self_window_scores_one() {
        let image = pattern(10, 8, 13, 7);
        let tpl = image.view().window(4, 3, 4, 4).unwrap().to_owned_image();
        let plan = TemplatePlan::from_view(tpl.view()).unwrap();
        let search = SearchImage::new(image.view());
        let score = <DirectKernel as Kernel>::score_at(&search, &plan, 4, 3).unwrap();
        assert!((score - 1.0).abs() < 1e-6);
    }
}
