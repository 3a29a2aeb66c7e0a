//! Grayscale pixel matrices.
//!
//! `ImageView` is a borrowed 2D view into a 1D buffer with an explicit stride.
//! The stride counts elements between the starts of consecutive rows, so a
//! stride larger than the width represents padded rows. `OwnedImage` is the
//! contiguous owned form produced by canonicalization and template scaling;
//! once built it is never mutated.

use crate::util::{HudMatchError, HudMatchResult};

pub mod canon;
#[cfg(feature = "image-io")]
pub mod io;
pub mod resize;

/// Borrowed 2D image view with an explicit stride.
#[derive(Copy, Clone, Debug)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> HudMatchResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(data: &'a [T], width: usize, height: usize, stride: usize) -> HudMatchResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(HudMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y.checked_mul(self.stride)?.checked_add(x)?;
        self.data.get(idx)
    }

    /// Returns a contiguous slice for row `y` with length `width`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width)?;
        self.data.get(start..end)
    }

    /// Returns a zero-copy window `[y, y + height) x [x, x + width)` into the
    /// same backing buffer.
    pub fn window(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> HudMatchResult<ImageView<'a, T>> {
        let too_large = HudMatchError::TemplateTooLarge {
            tpl_width: width,
            tpl_height: height,
            img_width: self.width,
            img_height: self.height,
        };
        let end_x = x.checked_add(width).ok_or_else(|| too_large.clone())?;
        let end_y = y.checked_add(height).ok_or_else(|| too_large.clone())?;
        if width == 0 || height == 0 {
            return Err(HudMatchError::InvalidDimensions { width, height });
        }
        if end_x > self.width || end_y > self.height {
            return Err(too_large);
        }

        let start = y * self.stride + x;
        let data = self.data.get(start..).ok_or(HudMatchError::BufferTooSmall {
            needed: start.saturating_add(1),
            got: self.data.len(),
        })?;
        ImageView::new(data, width, height, self.stride)
    }
}

impl ImageView<'_, u8> {
    /// Copies the view into a contiguous owned image.
    pub fn to_owned_image(&self) -> OwnedImage {
        let mut data = Vec::with_capacity(self.width * self.height);
        for y in 0..self.height {
            let start = y * self.stride;
            data.extend_from_slice(&self.data[start..start + self.width]);
        }
        OwnedImage {
            data,
            width: self.width,
            height: self.height,
        }
    }
}

/// Owned contiguous grayscale image buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl OwnedImage {
    /// Creates an image from a row-major buffer of exactly `width * height`
    /// pixels.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> HudMatchResult<Self> {
        let needed = required_len(width, height, width)?;
        if data.len() < needed {
            return Err(HudMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(HudMatchError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Creates an image filled with a single intensity.
    pub fn filled(width: usize, height: usize, value: u8) -> HudMatchResult<Self> {
        let needed = required_len(width, height, width)?;
        Self::new(vec![value; needed], width, height)
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the row-major pixel buffer.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the image and returns its pixel buffer.
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> ImageView<'_, u8> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }

    /// Copies `patch` into this image with its top-left corner at `(x, y)`.
    ///
    /// Used to compose synthetic screenshots; fails when the patch does not
    /// fit.
    pub fn paste(&mut self, patch: ImageView<'_, u8>, x: usize, y: usize) -> HudMatchResult<()> {
        let fits = x
            .checked_add(patch.width())
            .zip(y.checked_add(patch.height()))
            .is_some_and(|(end_x, end_y)| end_x <= self.width && end_y <= self.height);
        if !fits {
            return Err(HudMatchError::TemplateTooLarge {
                tpl_width: patch.width(),
                tpl_height: patch.height(),
                img_width: self.width,
                img_height: self.height,
            });
        }
        for py in 0..patch.height() {
            let src = patch.row(py).ok_or(HudMatchError::InvalidDimensions {
                width: patch.width(),
                height: patch.height(),
            })?;
            let start = (y + py) * self.width + x;
            self.data[start..start + src.len()].copy_from_slice(src);
        }
        Ok(())
    }
}

fn required_len(width: usize, height: usize, stride: usize) -> HudMatchResult<usize> {
    if width == 0 || height == 0 {
        return Err(HudMatchError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(HudMatchError::InvalidStride { width, stride });
    }
    (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or(HudMatchError::InvalidDimensions { width, height })
}
