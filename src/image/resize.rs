//! Grayscale resampling used by canonicalization and template variants.

use crate::image::{ImageView, OwnedImage};
use crate::util::{HudMatchError, HudMatchResult};

/// Resampling filter for `resize_u8`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interpolation {
    /// Picks the source pixel whose cell contains the destination sample.
    Nearest,
    /// Bilinear interpolation with pixel-center alignment.
    #[default]
    Bilinear,
}

/// Resizes a grayscale image to `width x height`.
///
/// Destination pixel centers map to source coordinates through
/// `src = (dst + 0.5) * (src_len / dst_len) - 0.5`. Bilinear samples clamp to
/// the border and round to the nearest integer. When the requested size equals
/// the source size the pixels are copied unchanged.
pub fn resize_u8(
    src: ImageView<'_, u8>,
    width: usize,
    height: usize,
    interpolation: Interpolation,
) -> HudMatchResult<OwnedImage> {
    if width == 0 || height == 0 {
        return Err(HudMatchError::InvalidDimensions { width, height });
    }
    if width == src.width() && height == src.height() {
        return Ok(src.to_owned_image());
    }

    let len = width
        .checked_mul(height)
        .ok_or(HudMatchError::InvalidDimensions { width, height })?;
    let mut out = vec![0u8; len];
    match interpolation {
        Interpolation::Nearest => resize_nearest(src, width, height, &mut out)?,
        Interpolation::Bilinear => resize_bilinear(src, width, height, &mut out)?,
    }
    OwnedImage::new(out, width, height)
}

fn resize_nearest(
    src: ImageView<'_, u8>,
    width: usize,
    height: usize,
    out: &mut [u8],
) -> HudMatchResult<()> {
    let src_w = src.width();
    let src_h = src.height();
    let cols: Vec<usize> = (0..width)
        .map(|x| (x * src_w / width).min(src_w - 1))
        .collect();

    for y in 0..height {
        let sy = (y * src_h / height).min(src_h - 1);
        let row = src.row(sy).ok_or(HudMatchError::InvalidDimensions {
            width: src_w,
            height: src_h,
        })?;
        let dst = &mut out[y * width..(y + 1) * width];
        for (value, &sx) in dst.iter_mut().zip(cols.iter()) {
            *value = row[sx];
        }
    }
    Ok(())
}

/// Source sample position for one destination coordinate.
#[derive(Clone, Copy)]
struct Tap {
    i0: usize,
    i1: usize,
    frac: f32,
}

fn taps(src_len: usize, dst_len: usize) -> Vec<Tap> {
    let scale = src_len as f32 / dst_len as f32;
    let max = (src_len - 1) as f32;
    (0..dst_len)
        .map(|d| {
            let pos = ((d as f32 + 0.5) * scale - 0.5).clamp(0.0, max);
            let i0 = pos.floor() as usize;
            Tap {
                i0,
                i1: (i0 + 1).min(src_len - 1),
                frac: pos - i0 as f32,
            }
        })
        .collect()
}

fn resize_bilinear(
    src: ImageView<'_, u8>,
    width: usize,
    height: usize,
    out: &mut [u8],
) -> HudMatchResult<()> {
    let cols = taps(src.width(), width);
    let rows = taps(src.height(), height);
    let missing_row = || HudMatchError::InvalidDimensions {
        width: src.width(),
        height: src.height(),
    };

    for (y, ty) in rows.iter().enumerate() {
        let row0 = src.row(ty.i0).ok_or_else(missing_row)?;
        let row1 = src.row(ty.i1).ok_or_else(missing_row)?;
        let fy = ty.frac;
        let dst = &mut out[y * width..(y + 1) * width];
        for (value, tx) in dst.iter_mut().zip(cols.iter()) {
            let fx = tx.frac;
            let a = row0[tx.i0] as f32;
            let b = row0[tx.i1] as f32;
            let c = row1[tx.i0] as f32;
            let d = row1[tx.i1] as f32;

            let top = a + (b - a) * fx;
            let bottom = c + (d - c) * fx;
            let v = top + (bottom - top) * fy;
            *value = v.round().clamp(0.0, 255.0) as u8;
        }
    }
    Ok(())
}

/// Returns the size of a template scaled by `factor`, rounded down.
pub fn scaled_size(width: usize, height: usize, factor: f32) -> (usize, usize) {
    let w = (width as f64 * factor as f64).floor() as usize;
    let h = (height as f64 * factor as f64).floor() as usize;
    (w, h)
}
