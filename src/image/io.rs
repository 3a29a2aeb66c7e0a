//! Convenience helpers for decoding and encoding images via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::OwnedImage;
use crate::util::{HudMatchError, HudMatchResult};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, GrayImage, ImageEncoder, ImageReader};
use std::path::Path;

/// Creates an owned image from a grayscale image buffer.
pub fn owned_from_gray_image(img: &GrayImage) -> HudMatchResult<OwnedImage> {
    OwnedImage::new(img.as_raw().clone(), img.width() as usize, img.height() as usize)
}

/// Converts an owned image back into an `image` grayscale buffer.
pub fn to_gray_image(img: &OwnedImage) -> HudMatchResult<GrayImage> {
    GrayImage::from_raw(img.width() as u32, img.height() as u32, img.data().to_vec()).ok_or(
        HudMatchError::InvalidDimensions {
            width: img.width(),
            height: img.height(),
        },
    )
}

/// Decodes an encoded image (any supported format) to grayscale.
pub fn decode_gray(id: &str, bytes: &[u8]) -> HudMatchResult<OwnedImage> {
    let img = image::load_from_memory(bytes).map_err(|err| HudMatchError::load(id, err))?;
    owned_from_gray_image(&img.to_luma8()).map_err(|err| HudMatchError::load(id, err))
}

/// Loads an image from disk and converts it to grayscale.
///
/// The format is sniffed from the file contents, so the extension may be
/// missing or wrong. Undecodable or empty files are reported as `Load` errors
/// naming the path.
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> HudMatchResult<OwnedImage> {
    let path = path.as_ref();
    let id = path.display().to_string();
    let img = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|err| HudMatchError::load(id.as_str(), err))?
        .decode()
        .map_err(|err| HudMatchError::load(id.as_str(), err))?;
    owned_from_gray_image(&img.to_luma8()).map_err(|err| HudMatchError::load(id, err))
}

/// Encodes an image as PNG bytes.
pub fn encode_png(img: &OwnedImage) -> HudMatchResult<Vec<u8>> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(
            img.data(),
            img.width() as u32,
            img.height() as u32,
            ExtendedColorType::L8,
        )
        .map_err(|err| HudMatchError::load("png encoder", err))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::{decode_gray, encode_png, load_gray_image};
    use crate::image::OwnedImage;
    use crate::util::HudMatchError;

    #[test]
    fn png_bytes_decode_to_same_pixels() {
        let img = OwnedImage::new((0u8..20).collect(), 5, 4).unwrap();
        let bytes = encode_png(&img).unwrap();
        let decoded = decode_gray("mem", &bytes).unwrap();
        assert_eq!(decoded, img);
    }

    #[test]
    fn garbage_bytes_are_a_load_error() {
        let err = decode_gray("junk.png", b"not an image").unwrap_err();
        assert!(matches!(err, HudMatchError::Load { ref id, .. } if id == "junk.png"));
    }

    #[test]
    fn format_is_detected_without_extension() {
        let img = OwnedImage::new((0u8..48).map(|v| v * 5).collect(), 8, 6).unwrap();
        let dir = std::env::temp_dir();
        let bare = dir.join(format!("hudmatch-shot-{}", std::process::id()));
        let misnamed = dir.join(format!("hudmatch-shot-{}.jpg", std::process::id()));
        let bytes = encode_png(&img).unwrap();
        std::fs::write(&bare, &bytes).unwrap();
        std::fs::write(&misnamed, &bytes).unwrap();

        let from_bare = load_gray_image(&bare);
        let from_misnamed = load_gray_image(&misnamed);
        std::fs::remove_file(&bare).unwrap();
        std::fs::remove_file(&misnamed).unwrap();
        assert_eq!(from_bare.unwrap(), img);
        assert_eq!(from_misnamed.unwrap(), img);
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = load_gray_image("/nonexistent/hudmatch/shot.png").unwrap_err();
        assert!(matches!(err, HudMatchError::Load { .. }));
    }
}
