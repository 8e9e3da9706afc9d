use crate::api::extract::Json;
use crate::api::{self, ApiError, ApiResult};
use crate::app::AppState;
use crate::auth::Client;
use crate::content::thumbnail;
use crate::model::enums::{MimeType, ResourceType};
use crate::model::post_id::PostId;
use crate::schema::post;
use crate::storage::PostKeys;
use crate::{cache, remote, update};
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::{Router, routing};
use diesel::prelude::*;
use image::imageops::FilterType;
use serde::Deserialize;
use tracing::warn;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/set_icon", routing::post(set_icon))
        .route("/set_banner", routing::post(set_banner))
}

/// Icons are square crops scaled to this edge length.
const ICON_SIZE: u32 = 400;

/// Banners are 3:1 crops fitted within this box only when they exceed it.
const BANNER_WIDTH: u32 = 1800;
const BANNER_HEIGHT: u32 = 600;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
struct Coordinates {
    top: u32,
    left: u32,
    width: u32,
    height: u32,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CropBody {
    post_id: PostId,
    coordinates: Coordinates,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CropKind {
    Icon,
    Banner,
}

async fn set_icon(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
    Json(body): Json<CropBody>,
) -> ApiResult<StatusCode> {
    set_crop(state, client, body, CropKind::Icon).await
}

async fn set_banner(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
    Json(body): Json<CropBody>,
) -> ApiResult<StatusCode> {
    set_crop(state, client, body, CropKind::Banner).await
}

/// Shared icon/banner flow: crop a region out of a post's original, store
/// WebP and JPEG renditions under the caller's handle, and repoint the
/// caller's user row at the source post.
async fn set_crop(state: AppState, client: Client, body: CropBody, kind: CropKind) -> ApiResult<StatusCode> {
    let user_id = api::verify_logged_in(client)?;
    match kind {
        CropKind::Icon => verify_icon_geometry(body.coordinates)?,
        CropKind::Banner => verify_banner_geometry(body.coordinates)?,
    }

    // The handle comes from the user service while the filename comes from
    // SQL; neither depends on the other, so they are fetched concurrently
    let http = state.http.clone();
    let user_fetch = tokio::spawn(async move { remote::user::fetch_user(&http, user_id).await });

    let mut conn = state.get_connection()?;
    let filename: Option<Option<String>> = post::table
        .select(post::filename)
        .filter(post::post_id.eq(body.post_id))
        .first(&mut conn)
        .optional()?;
    drop(conn);
    let filename = filename
        .flatten()
        .ok_or(ApiError::NotFound(ResourceType::Post))?;
    let user = user_fetch.await??;

    let keys = PostKeys::new(body.post_id);
    let blob = remote::cdn::fetch_blob(&state.http, &keys.original(&filename)).await?;

    let coordinates = body.coordinates;
    let (webp, jpeg) = tokio::task::spawn_blocking(move || crop_renditions(&blob, coordinates, kind)).await??;

    let handle = user.handle.to_lowercase();
    let (webp_key, jpeg_key) = match kind {
        CropKind::Icon => (keys.icon(&handle, "webp"), keys.icon(&handle, "jpg")),
        CropKind::Banner => (keys.banner(&handle, "webp"), keys.banner(&handle, "jpg")),
    };
    state.object_store.put(&webp_key, webp, MimeType::Webp.as_str()).await?;
    state.object_store.put(&jpeg_key, jpeg, MimeType::Jpeg.as_str()).await?;

    let mut conn = state.get_connection()?;
    let previous = conn.transaction(|conn| match kind {
        CropKind::Icon => update::user::set_icon(conn, user_id, body.post_id),
        CropKind::Banner => update::user::set_banner(conn, user_id, body.post_id),
    })?;
    drop(conn);

    // The renditions under the old source post are now unreachable
    if let Some(previous) = previous.filter(|&previous| previous != body.post_id) {
        let old_keys = PostKeys::new(previous);
        let (old_webp, old_jpeg) = match kind {
            CropKind::Icon => (old_keys.icon(&handle, "webp"), old_keys.icon(&handle, "jpg")),
            CropKind::Banner => (old_keys.banner(&handle, "webp"), old_keys.banner(&handle, "jpg")),
        };
        for key in [old_webp, old_jpeg] {
            if let Err(err) = state.object_store.delete(&key).await {
                warn!("Failed to delete stale rendition '{key}': {err}");
            }
        }
    }

    let patched = match kind {
        CropKind::Icon => cache::post::patch_user_icon(&state.cache, user_id, body.post_id).await,
        CropKind::Banner => cache::post::patch_user_banner(&state.cache, user_id, body.post_id).await,
    };
    if let Err(err) = patched {
        warn!("Failed to patch user cache entry for {user_id}: {err}");
    }
    Ok(StatusCode::NO_CONTENT)
}

fn verify_icon_geometry(coordinates: Coordinates) -> ApiResult<()> {
    if coordinates.width != coordinates.height {
        return Err(ApiError::NonSquareCrop(coordinates.width, coordinates.height));
    }
    Ok(())
}

fn verify_banner_geometry(coordinates: Coordinates) -> ApiResult<()> {
    let expected_height = (f64::from(coordinates.width) / 3.0).round() as u32;
    if expected_height != coordinates.height {
        return Err(ApiError::BadBannerAspect(coordinates.width, coordinates.height));
    }
    Ok(())
}

/// Crops the region out of the decoded original and produces the WebP/JPEG
/// rendition pair. Runs off the event loop.
fn crop_renditions(blob: &[u8], coordinates: Coordinates, kind: CropKind) -> ApiResult<(Vec<u8>, Vec<u8>)> {
    let image = image::load_from_memory(blob)?;
    let fits_horizontally = coordinates
        .left
        .checked_add(coordinates.width)
        .is_some_and(|right| right <= image.width());
    let fits_vertically = coordinates
        .top
        .checked_add(coordinates.height)
        .is_some_and(|bottom| bottom <= image.height());
    if !fits_horizontally || !fits_vertically {
        return Err(ApiError::CropOutOfBounds);
    }
    let cropped = image.crop_imm(coordinates.left, coordinates.top, coordinates.width, coordinates.height);
    let resized = match kind {
        CropKind::Icon if cropped.width() != ICON_SIZE => {
            cropped.resize_exact(ICON_SIZE, ICON_SIZE, FilterType::CatmullRom)
        }
        CropKind::Banner if cropped.width() > BANNER_WIDTH || cropped.height() > BANNER_HEIGHT => {
            cropped.resize(BANNER_WIDTH, BANNER_HEIGHT, FilterType::CatmullRom)
        }
        _ => cropped,
    };
    Ok((
        thumbnail::encode(&resized, MimeType::Webp)?,
        thumbnail::encode(&resized, MimeType::Jpeg)?,
    ))
}

#[cfg(test)]
mod test {
    use super::*;
    use image::DynamicImage;

    fn crop(width: u32, height: u32) -> Coordinates {
        Coordinates { top: 0, left: 0, width, height }
    }

    #[test]
    fn icon_crops_must_be_square() {
        assert!(verify_icon_geometry(crop(400, 400)).is_ok());
        assert!(verify_icon_geometry(crop(123, 123)).is_ok());
        assert!(matches!(
            verify_icon_geometry(crop(400, 399)),
            Err(ApiError::NonSquareCrop(400, 399))
        ));
    }

    #[test]
    fn banner_crops_must_be_three_to_one() {
        assert!(verify_banner_geometry(crop(3000, 1000)).is_ok());
        assert!(verify_banner_geometry(crop(300, 100)).is_ok());
        // Rounded thirds are accepted
        assert!(verify_banner_geometry(crop(301, 100)).is_ok());
        assert!(verify_banner_geometry(crop(302, 101)).is_ok());
        assert!(matches!(
            verify_banner_geometry(crop(3000, 999)),
            Err(ApiError::BadBannerAspect(3000, 999))
        ));
    }

    #[test]
    fn icon_crop_is_scaled_to_icon_size() {
        let source = DynamicImage::new_rgb8(1000, 800);
        let png = thumbnail::encode(&source, MimeType::Png).unwrap();

        let (webp, jpeg) = crop_renditions(&png, crop(500, 500), CropKind::Icon).unwrap();
        let icon = image::load_from_memory(&webp).unwrap();
        assert_eq!((icon.width(), icon.height()), (ICON_SIZE, ICON_SIZE));
        let icon = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((icon.width(), icon.height()), (ICON_SIZE, ICON_SIZE));
    }

    #[test]
    fn small_banner_crops_pass_through() {
        let source = DynamicImage::new_rgb8(1000, 800);
        let png = thumbnail::encode(&source, MimeType::Png).unwrap();

        let (webp, _) = crop_renditions(&png, crop(900, 300), CropKind::Banner).unwrap();
        let banner = image::load_from_memory(&webp).unwrap();
        assert_eq!((banner.width(), banner.height()), (900, 300));
    }

    #[test]
    fn out_of_bounds_crops_are_rejected() {
        let source = DynamicImage::new_rgb8(100, 100);
        let png = thumbnail::encode(&source, MimeType::Png).unwrap();
        assert!(matches!(
            crop_renditions(&png, crop(200, 200), CropKind::Icon),
            Err(ApiError::CropOutOfBounds)
        ));
    }
}
