use crate::api::{ApiError, ApiResult};
use crate::config;
use crate::string::SmallString;
use serde::Deserialize;

/// The slice of a user record this service needs: the handle names icon and
/// banner object keys.
#[derive(Debug, Deserialize)]
pub struct RemoteUser {
    pub handle: SmallString,
}

pub async fn fetch_user(client: &reqwest::Client, user_id: i64) -> ApiResult<RemoteUser> {
    let url = format!("{}/v1/user/{user_id}", config::get().services.user_url);
    let response = client.get(url).send().await?;
    match response.status() {
        status if status.is_success() => response.json().await.map_err(ApiError::from),
        status => Err(ApiError::UpstreamStatus("user service", status.as_u16())),
    }
}
