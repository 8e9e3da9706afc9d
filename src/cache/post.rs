use crate::api::ApiResult;
use crate::cache::CacheClient;
use crate::model::enums::{MimeType, Rating};
use crate::model::post_id::PostId;
use crate::time::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Score snapshot written through after every vote.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedScore {
    pub up: i64,
    pub down: i64,
    pub total: i64,
}

/// The post projection cache is keyed by the external id form. Values are
/// full denormalized projections owned by the post-read service; this
/// service only patches individual fields or evicts.
fn post_key(post_id: PostId) -> String {
    post_id.encode()
}

fn score_key(post_id: PostId) -> String {
    format!("score.{post_id}")
}

fn vote_key(user_id: i64, post_id: PostId) -> String {
    format!("{user_id}|{post_id}")
}

fn user_key(user_id: i64) -> String {
    format!("user.{user_id}")
}

/// Patches the cached projection after new content lands on a post.
/// Best-effort: a miss means the next reader hydrates from SQL anyway.
pub async fn patch_content(
    cache: &CacheClient,
    post_id: PostId,
    filename: &str,
    mime_type: MimeType,
    width: u32,
    height: u32,
    updated_on: DateTime,
) -> ApiResult<()> {
    patch(cache, post_id, |fields| {
        fields.insert("updated".to_owned(), json!(updated_on));
        fields.insert(
            "media_type".to_owned(),
            json!({"file_type": mime_type.extension(), "mime": mime_type.as_str()}),
        );
        fields.insert("size".to_owned(), json!({"width": width, "height": height}));
        fields.insert("filename".to_owned(), json!(filename));
    })
    .await
}

/// Patches the cached projection after a metadata edit. Cleared fields are
/// written as nulls so readers don't see stale values.
pub async fn patch_metadata(
    cache: &CacheClient,
    post_id: PostId,
    title: Option<Option<&str>>,
    description: Option<Option<&str>>,
    rating: Option<Rating>,
    updated_on: DateTime,
) -> ApiResult<()> {
    patch(cache, post_id, |fields| {
        fields.insert("updated".to_owned(), json!(updated_on));
        if let Some(title) = title {
            fields.insert("title".to_owned(), json!(title));
        }
        if let Some(description) = description {
            fields.insert("description".to_owned(), json!(description));
        }
        if let Some(rating) = rating {
            fields.insert("rating".to_owned(), json!(rating));
        }
    })
    .await
}

/// Privacy transitions can bump `created_on`, which a field patch cannot
/// represent faithfully, so the entry is dropped instead.
pub async fn evict(cache: &CacheClient, post_id: PostId) -> ApiResult<()> {
    cache.evict(&post_key(post_id)).await
}

pub async fn put_score(cache: &CacheClient, post_id: PostId, score: &CachedScore) -> ApiResult<()> {
    cache.put_json(&score_key(post_id), score).await
}

pub async fn put_vote(cache: &CacheClient, user_id: i64, post_id: PostId, vote: i64) -> ApiResult<()> {
    cache.put_json(&vote_key(user_id, post_id), &vote).await
}

pub async fn patch_user_icon(cache: &CacheClient, user_id: i64, post_id: PostId) -> ApiResult<()> {
    patch_user(cache, user_id, "icon", post_id).await
}

pub async fn patch_user_banner(cache: &CacheClient, user_id: i64, post_id: PostId) -> ApiResult<()> {
    patch_user(cache, user_id, "banner", post_id).await
}

async fn patch(cache: &CacheClient, post_id: PostId, edit: impl FnOnce(&mut serde_json::Map<String, Value>)) -> ApiResult<()> {
    let key = post_key(post_id);
    if let Some(Value::Object(mut fields)) = cache.get_json::<Value>(&key).await? {
        edit(&mut fields);
        cache.put_json(&key, &Value::Object(fields)).await?;
    }
    Ok(())
}

async fn patch_user(cache: &CacheClient, user_id: i64, field: &str, post_id: PostId) -> ApiResult<()> {
    let key = user_key(user_id);
    if let Some(Value::Object(mut fields)) = cache.get_json::<Value>(&key).await? {
        fields.insert(field.to_owned(), json!(post_id));
        cache.put_json(&key, &Value::Object(fields)).await?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cache_key_formats() {
        let post_id = PostId::decode("AAAAAAAB").unwrap();
        assert_eq!(post_key(post_id), "AAAAAAAB");
        assert_eq!(score_key(post_id), "score.AAAAAAAB");
        assert_eq!(vote_key(7, post_id), "7|AAAAAAAB");
        assert_eq!(user_key(7), "user.7");
    }
}
