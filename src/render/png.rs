//! Raster decoding and PNG encoding.
//!
//! The engine only ever sees RGBA buffers; this module converts to and from
//! encoded bytes.

use std::io::Cursor;

use image::{ImageBuffer, ImageFormat, RgbaImage};

use crate::error::{MarbleError, Result};

/// Decode any supported raster format into an RGBA buffer.
pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage> {
    let img = image::load_from_memory(bytes).map_err(|e| MarbleError::Image {
        message: format!("Failed to decode image: {}", e),
    })?;
    Ok(img.to_rgba8())
}

/// Encode an RGBA buffer as PNG bytes.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| MarbleError::Image {
            message: format!("Failed to encode PNG: {}", e),
        })?;
    Ok(bytes)
}

/// Resize to `width × height` by nearest-neighbour sampling.
///
/// For integer factors every source pixel becomes an exact block.
pub fn scale_nearest(img: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if img.width() == width && img.height() == height {
        return img.clone();
    }

    let (src_w, src_h) = (img.width() as u64, img.height() as u64);
    let mut scaled: RgbaImage = ImageBuffer::new(width, height);
    if src_w == 0 || src_h == 0 {
        return scaled;
    }

    for y in 0..height {
        let sy = (y as u64 * src_h / height as u64) as u32;
        for x in 0..width {
            let sx = (x as u64 * src_w / width as u64) as u32;
            scaled.put_pixel(x, y, *img.get_pixel(sx, sy));
        }
    }

    scaled
}
