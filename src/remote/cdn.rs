use crate::api::{ApiError, ApiResult};
use crate::config;

/// Pulls a previously uploaded blob back through the CDN. Used by icon and
/// banner crops, which rework the original rather than a rendition.
pub async fn fetch_blob(client: &reqwest::Client, key: &str) -> ApiResult<Vec<u8>> {
    let url = format!("{}/{key}", config::get().services.cdn_url);
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(ApiError::UpstreamStatus("cdn", response.status().as_u16()));
    }
    Ok(response.bytes().await?.to_vec())
}
