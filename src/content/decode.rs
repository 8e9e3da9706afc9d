use crate::api::{ApiError, ApiResult};
use crate::filesystem::ScratchFile;
use crate::model::enums::{MimeType, ParseExtensionError};
use image::{DynamicImage, ImageFormat, ImageReader, Limits};
use std::io::Cursor;

/// Sniffs `bytes` as a raster image and decodes it. Anything that fails to
/// decode, or decodes to a format outside the supported set, is a client
/// error.
pub fn probe(bytes: &[u8]) -> ApiResult<(MimeType, DynamicImage)> {
    let format = image::guess_format(bytes).map_err(ApiError::InvalidImage)?;
    let mime_type = MimeType::from_image_format(format)
        .ok_or_else(|| ApiError::UnsupportedExtension(format_extension_error(format)))?;
    let image = decode(bytes, format).map_err(ApiError::InvalidImage)?;
    Ok((mime_type, image))
}

/// Rewrites the scratch file with a pixel-level re-encode of the decoded
/// image, dropping EXIF/ICC/XMP blocks along the way. Returns the stripped
/// bytes for upload.
pub fn strip_metadata(image: &DynamicImage, mime_type: MimeType, scratch: &ScratchFile) -> ApiResult<Vec<u8>> {
    let stripped = super::thumbnail::encode(image, mime_type)?;
    scratch.overwrite(&stripped)?;
    Ok(stripped)
}

fn decode(bytes: &[u8], format: ImageFormat) -> image::ImageResult<DynamicImage> {
    let mut reader = ImageReader::new(Cursor::new(bytes));
    reader.set_format(format);
    reader.limits(image_reader_limits());
    reader.decode()
}

fn image_reader_limits() -> Limits {
    const GB: u64 = 1024_u64.pow(3);

    let mut limits = Limits::no_limits();
    limits.max_alloc = Some(4 * GB);
    limits
}

fn format_extension_error(format: ImageFormat) -> ParseExtensionError {
    ParseExtensionError(format.extensions_str().first().copied().unwrap_or("unknown").to_owned())
}

#[cfg(test)]
mod test {
    use super::*;

    // Smallest well-formed 1x1 png
    const ONE_PIXEL_PNG: &[u8] = &[
        0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52, 0x00, 0x00,
        0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f, 0x15, 0xc4, 0x89, 0x00, 0x00, 0x00,
        0x0a, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d,
        0xb4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
    ];

    #[test]
    fn probe_sniffs_png() {
        let (mime_type, image) = probe(ONE_PIXEL_PNG).unwrap();
        assert_eq!(mime_type, MimeType::Png);
        assert_eq!((image.width(), image.height()), (1, 1));
    }

    #[test]
    fn probe_rejects_garbage() {
        assert!(matches!(probe(b"not an image at all"), Err(ApiError::InvalidImage(_))));
    }
}
