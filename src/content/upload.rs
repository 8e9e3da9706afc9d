use crate::api::{ApiError, ApiResult};
use crate::string::SmallString;
use axum::extract::multipart::Multipart;

pub const MAX_UPLOAD_SIZE: usize = 4 * 1024_usize.pow(3);

/// Contents of an uploaded file plus the filename the client gave it.
pub struct FileContents {
    pub data: Vec<u8>,
    pub filename: SmallString,
}

/// Decoded `upload_image` form. All parts are optional at this layer; the
/// handler reports the missing ones in a single validation response.
#[derive(Default)]
pub struct UploadForm {
    pub file: Option<FileContents>,
    pub post_id: Option<SmallString>,
    pub web_resize: Option<u32>,
}

pub async fn extract(mut form_data: Multipart) -> ApiResult<UploadForm> {
    let mut form = UploadForm::default();
    while let Some(field) = form_data.next_field().await? {
        // The part name borrows from the field, so it has to be detached
        // before the field is consumed
        let name = field.name().map(SmallString::new).unwrap_or_default();
        match &*name {
            "file" => {
                let filename = SmallString::new(field.file_name().unwrap_or("upload"));
                let data = field.bytes().await?.to_vec();
                form.file = Some(FileContents { data, filename });
            }
            "post_id" => form.post_id = Some(SmallString::new(field.text().await?)),
            "web_resize" => form.web_resize = Some(field.text().await?.parse().map_err(ApiError::from)?),
            _ => continue,
        }
    }
    Ok(form)
}
