use crate::api::ApiResult;
use crate::model::enums::MimeType;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType};
use std::io::Cursor;

/// Long-side budgets of the preset rendition set, in pixels.
pub const SIZES: [u32; 5] = [100, 200, 400, 800, 1200];

/// The largest preset also gets a JPEG rendition for clients without WebP.
pub const MAX_SIZE: u32 = 1200;

/// Applied wherever the target codec is lossy.
pub const ENCODE_QUALITY: u8 = 85;

const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

/// Output dimensions for a long-side-fits resize, or `None` when the image
/// already fits within `size` and passes through unchanged. The short side
/// rounds down.
pub fn long_side_fits(width: u32, height: u32, size: u32) -> Option<(u32, u32)> {
    let long = width.max(height);
    if size >= long {
        return None;
    }
    let ratio = f64::from(size) / f64::from(long);
    Some(if width >= height {
        (size, (f64::from(height) * ratio).floor() as u32)
    } else {
        ((f64::from(width) * ratio).floor() as u32, size)
    })
}

pub fn resize(image: &DynamicImage, size: u32) -> Option<DynamicImage> {
    long_side_fits(image.width(), image.height(), size)
        .map(|(width, height)| image.resize_exact(width, height, RESIZE_FILTER))
}

/// Encodes `image` as the given content type, quality constant applied on
/// save. The result carries no metadata blocks, which is what makes the
/// re-encode in the upload pipeline a strip.
pub fn encode(image: &DynamicImage, mime_type: MimeType) -> ApiResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    match mime_type {
        MimeType::Jpeg => {
            // JPEG has no alpha channel
            let encoder = JpegEncoder::new_with_quality(&mut buffer, ENCODE_QUALITY);
            image.to_rgb8().write_with_encoder(encoder)?;
        }
        MimeType::Webp => {
            let rgba = image.to_rgba8();
            WebPEncoder::new_lossless(&mut buffer).encode(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                ExtendedColorType::Rgba8,
            )?;
        }
        _ => image.write_to(&mut buffer, mime_type.to_image_format())?,
    }
    Ok(buffer.into_inner())
}

/// WebP rendition at the given long-side budget.
pub fn webp_rendition(image: &DynamicImage, size: u32) -> ApiResult<Vec<u8>> {
    let resized = resize(image, size);
    encode(resized.as_ref().unwrap_or(image), MimeType::Webp)
}

/// JPEG rendition at the given long-side budget.
pub fn jpeg_rendition(image: &DynamicImage, size: u32) -> ApiResult<Vec<u8>> {
    let resized = resize(image, size);
    encode(resized.as_ref().unwrap_or(image), MimeType::Jpeg)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn long_side_fits_landscape() {
        assert_eq!(long_side_fits(3000, 1000, 1500), Some((1500, 500)));
        assert_eq!(long_side_fits(1920, 1080, 400), Some((400, 225)));
    }

    #[test]
    fn long_side_fits_portrait() {
        assert_eq!(long_side_fits(1000, 3000, 1500), Some((500, 1500)));
        assert_eq!(long_side_fits(1080, 1920, 400), Some((225, 400)));
    }

    #[test]
    fn small_images_pass_through() {
        assert_eq!(long_side_fits(800, 600, 1500), None);
        assert_eq!(long_side_fits(1500, 500, 1500), None);
    }

    #[test]
    fn short_side_rounds_down() {
        assert_eq!(long_side_fits(3, 2, 2), Some((2, 1)));
        assert_eq!(long_side_fits(1000, 999, 100), Some((100, 99)));
    }

    #[test]
    fn resize_applies_computed_dimensions() {
        let image = DynamicImage::new_rgb8(3000, 1000);
        let resized = resize(&image, 1500).unwrap();
        assert_eq!((resized.width(), resized.height()), (1500, 500));
        assert!(resize(&image, 3000).is_none());
    }

    #[test]
    fn encode_round_trips_through_decoder() {
        let image = DynamicImage::new_rgb8(4, 3);
        for mime_type in [MimeType::Bmp, MimeType::Gif, MimeType::Jpeg, MimeType::Png, MimeType::Webp] {
            let encoded = encode(&image, mime_type).unwrap();
            let format = image::guess_format(&encoded).unwrap();
            assert_eq!(MimeType::from_image_format(format), Some(mime_type));
        }
    }
}
