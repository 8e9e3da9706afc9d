use crate::api::extract::Json;
use crate::api::{self, ApiResult};
use crate::app::AppState;
use crate::auth::Client;
use crate::content::upload::MAX_UPLOAD_SIZE;
use crate::model::post_id::PostId;
use crate::storage::PostKeys;
use crate::string::SmallString;
use crate::{cache, content, update};
use axum::extract::multipart::Multipart;
use axum::extract::{DefaultBodyLimit, Extension, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Router, routing};
use diesel::Connection;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/upload_image", routing::post(upload_image))
        .route_layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
}

/// One entry of the 422 validation detail array.
#[derive(Serialize)]
struct MissingField {
    loc: [&'static str; 2],
    msg: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
}

impl MissingField {
    fn new(name: &'static str) -> Self {
        Self {
            loc: ["body", name],
            msg: "field required",
            kind: "value_error.missing",
        }
    }
}

#[derive(Serialize)]
struct ValidationResponse {
    detail: Vec<MissingField>,
}

#[derive(Serialize)]
struct UploadResponse {
    post_id: PostId,
    url: String,
    /// Legacy v1 wire field; never set by this service.
    emoji: Option<SmallString>,
    thumbnails: BTreeMap<String, String>,
}

/// Attaches an image to a post: validates and strips the upload, records
/// the new content on the post row, then pushes the original and the
/// rendition set to the object store and patches the cached projection.
async fn upload_image(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
    multipart: Multipart,
) -> ApiResult<Response> {
    let user_id = api::verify_logged_in(client)?;
    let form = content::upload::extract(multipart).await?;

    let mut detail = Vec::new();
    if form.file.is_none() {
        detail.push(MissingField::new("file"));
    }
    if form.post_id.is_none() {
        detail.push(MissingField::new("post_id"));
    }
    let (Some(file), Some(post_id)) = (form.file, form.post_id) else {
        let body = axum::Json(ValidationResponse { detail });
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, body).into_response());
    };
    let post_id = PostId::decode(&post_id)?;

    // Decode, strip, and resize off the event loop; a decoder panic
    // surfaces as a join error rather than taking down the worker
    let web_resize = form.web_resize;
    let processed = tokio::task::spawn_blocking(move || content::process_upload(file, web_resize)).await??;

    let mut conn = state.get_connection()?;
    let (previous_filename, updated_on) = conn.transaction(|conn| {
        update::post::content(
            conn,
            user_id,
            post_id,
            &processed.filename,
            processed.mime_type,
            processed.width as i32,
            processed.height as i32,
        )
    })?;
    drop(conn);

    // Blob writes happen after commit; the row already points at the new
    // filename, so a failed upload is retryable by re-uploading
    let keys = PostKeys::new(post_id);
    let original_key = keys.original(&processed.filename);
    state
        .object_store
        .put(&original_key, processed.original, processed.mime_type.as_str())
        .await?;

    let image = Arc::new(processed.image);
    let mut thumbnails = BTreeMap::new();
    for size in content::thumbnail::SIZES {
        let rendition_image = Arc::clone(&image);
        let encoded = tokio::task::spawn_blocking(move || content::thumbnail::webp_rendition(&rendition_image, size))
            .await??;
        let key = keys.thumbnail_webp(size);
        state.object_store.put(&key, encoded, "image/webp").await?;
        thumbnails.insert(size.to_string(), key);
    }
    let rendition_image = Arc::clone(&image);
    let encoded = tokio::task::spawn_blocking(move || {
        content::thumbnail::jpeg_rendition(&rendition_image, content::thumbnail::MAX_SIZE)
    })
    .await??;
    let jpeg_key = keys.thumbnail_jpeg(content::thumbnail::MAX_SIZE);
    state.object_store.put(&jpeg_key, encoded, "image/jpeg").await?;
    thumbnails.insert("jpeg".to_owned(), jpeg_key);

    // Replaced originals are deleted only after the new one is live
    if let Some(previous) = previous_filename.filter(|previous| **previous != *processed.filename)
        && let Err(err) = state.object_store.delete(&keys.original(&previous)).await
    {
        warn!("Failed to delete replaced original for {post_id}: {err}");
    }

    if let Err(err) = cache::post::patch_content(
        &state.cache,
        post_id,
        &processed.filename,
        processed.mime_type,
        processed.width,
        processed.height,
        updated_on,
    )
    .await
    {
        warn!("Failed to patch post cache entry for {post_id}: {err}");
    }

    Ok(Json(UploadResponse {
        post_id,
        url: original_key,
        emoji: None,
        thumbnails,
    })
    .into_response())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn validation_detail_shape() {
        let response = ValidationResponse {
            detail: vec![MissingField::new("file"), MissingField::new("post_id")],
        };
        let serialized = serde_json::to_value(&response).unwrap();
        assert_eq!(
            serialized,
            serde_json::json!({
                "detail": [
                    {"loc": ["body", "file"], "msg": "field required", "type": "value_error.missing"},
                    {"loc": ["body", "post_id"], "msg": "field required", "type": "value_error.missing"},
                ]
            })
        );
    }
}
