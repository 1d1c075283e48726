use base64::{engine::general_purpose, Engine as _};
use image::{imageops::FilterType, DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

use crate::GenerationError;

/// Decode `bytes`, drop any alpha channel and stretch to exactly
/// `width` x `height`. Returns PNG bytes.
pub fn prepare_base_image(bytes: &[u8], width: u32, height: u32) -> Result<Vec<u8>, GenerationError> {
    let img = image::load_from_memory(bytes)?;
    debug!(
        "Resizing base image from {}x{} to {}x{}",
        img.width(),
        img.height(),
        width,
        height
    );

    let rgb = img.to_rgb8();
    let resized = image::imageops::resize(&rgb, width, height, FilterType::CatmullRom);

    encode_png(&DynamicImage::ImageRgb8(resized))
}

pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, GenerationError> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

pub fn to_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// Accepts raw base64 or a `data:image/...;base64,` URI
pub fn from_base64(data: &str) -> Result<Vec<u8>, GenerationError> {
    let payload = match data.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };

    general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| GenerationError::Decode(format!("invalid base64 image: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageBuffer, Rgba};

    fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgba([200u8, 10, 10, 128]));
        encode_png(&DynamicImage::ImageRgba8(img)).unwrap()
    }

    #[test]
    fn test_prepare_resizes_and_drops_alpha() {
        let prepared = prepare_base_image(&sample_png(64, 32), 512, 512).unwrap();
        let decoded = image::load_from_memory(&prepared).unwrap();

        assert_eq!(decoded.dimensions(), (512, 512));
        assert!(matches!(decoded, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn test_prepare_rejects_garbage() {
        let err = prepare_base_image(b"not an image", 512, 512).unwrap_err();
        assert!(matches!(err, GenerationError::Image(_)));
    }

    #[test]
    fn test_base64_accepts_data_uri() {
        let bytes = vec![1u8, 2, 3, 250];
        let plain = to_base64(&bytes);
        let uri = format!("data:image/png;base64,{}", plain);

        assert_eq!(from_base64(&plain).unwrap(), bytes);
        assert_eq!(from_base64(&uri).unwrap(), bytes);
        assert!(matches!(from_base64("@@@"), Err(GenerationError::Decode(_))));
    }
}
