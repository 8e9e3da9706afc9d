use crate::api::{ApiError, ApiResult};
use crate::config;
use crate::model::post_id::PostId;
use crate::string::SmallString;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;

/// Tag groups of a post as the tag service reports them, e.g.
/// `{"species": ["wolf"], "subject": ["landscape"]}`.
#[derive(Debug, Default, Deserialize)]
pub struct TagGroups(pub HashMap<SmallString, Vec<SmallString>>);

impl TagGroups {
    pub fn flatten(&self) -> impl Iterator<Item = &SmallString> {
        self.0.values().flatten()
    }
}

/// Fetches the tag groups attached to `post_id`. A 404 means the post has
/// no tags yet, which is the normal case for fresh posts and must not fail
/// the caller.
pub async fn post_tags(client: &reqwest::Client, post_id: PostId) -> ApiResult<TagGroups> {
    let url = format!("{}/v1/post/{post_id}", config::get().services.tag_url);
    let response = client.get(url).send().await?;
    match response.status() {
        StatusCode::NOT_FOUND => Ok(TagGroups::default()),
        status if status.is_success() => response.json().await.map_err(ApiError::from),
        status => Err(ApiError::UpstreamStatus("tag service", status.as_u16())),
    }
}
