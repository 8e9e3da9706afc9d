pub mod decode;
pub mod thumbnail;
pub mod upload;

use crate::api::{ApiError, ApiResult};
use crate::content::upload::FileContents;
use crate::filesystem::ScratchFile;
use crate::model::enums::MimeType;
use crate::string::SmallString;
use image::DynamicImage;
use std::path::Path;

/// A validated, metadata-stripped upload, ready for rendition generation.
/// Produced off the async runtime since every step is CPU-bound.
pub struct ProcessedUpload {
    /// Client filename, with a `-web` stem infix when the original was
    /// downsized for web delivery.
    pub filename: SmallString,
    pub mime_type: MimeType,
    pub width: u32,
    pub height: u32,
    pub image: DynamicImage,
    /// Encoded bytes of the (possibly resized) original.
    pub original: Vec<u8>,
}

/// Runs the upload pipeline front half: probe the bytes as a raster image,
/// park them in a scratch file, strip metadata, check that the client
/// filename's extension agrees with the sniffed type, and apply the
/// requested web resize.
pub fn process_upload(file: FileContents, web_resize: Option<u32>) -> ApiResult<ProcessedUpload> {
    let (mime_type, image) = decode::probe(&file.data)?;
    let scratch = ScratchFile::create(&file.filename, &file.data)?;

    verify_extension(&file.filename, mime_type)?;
    let stripped = decode::strip_metadata(&image, mime_type, &scratch)?;

    let mut image = image;
    let mut filename = file.filename;
    let original = match web_resize.filter(|&size| size > 0).and_then(|size| thumbnail::resize(&image, size)) {
        Some(resized) => {
            filename = web_filename(&filename, mime_type);
            let encoded = thumbnail::encode(&resized, mime_type)?;
            image = resized;
            encoded
        }
        None => stripped,
    };

    Ok(ProcessedUpload {
        filename,
        mime_type,
        width: image.width(),
        height: image.height(),
        image,
        original,
    })
    // scratch drops here, deleting the on-disk copy
}

/// The extension implied by the client filename must agree with the sniffed
/// MIME type. A bare filename without an extension is also rejected.
fn verify_extension(filename: &str, detected: MimeType) -> ApiResult<()> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| ApiError::ContentTypeMismatch(detected, SmallString::new(filename)))?;
    if MimeType::from_extension(extension)? != detected {
        return Err(ApiError::ContentTypeMismatch(detected, SmallString::new(filename)));
    }
    Ok(())
}

/// `fox.png` -> `fox-web.png`
fn web_filename(filename: &str, mime_type: MimeType) -> SmallString {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(filename);
    SmallString::new(format!("{stem}-web.{}", mime_type.extension()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn web_filenames() {
        assert_eq!(*web_filename("fox.png", MimeType::Png), *"fox-web.png");
        assert_eq!(*web_filename("two.dots.jpg", MimeType::Jpeg), *"two.dots-web.jpg");
    }

    #[test]
    fn extension_must_agree_with_sniffed_type() {
        assert!(verify_extension("fox.png", MimeType::Png).is_ok());
        assert!(verify_extension("fox.jpeg", MimeType::Jpeg).is_ok());
        assert!(matches!(
            verify_extension("fox.jpg", MimeType::Png),
            Err(ApiError::ContentTypeMismatch(MimeType::Png, _))
        ));
        assert!(verify_extension("no_extension", MimeType::Png).is_err());
    }
}
