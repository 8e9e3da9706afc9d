use crate::api::extract::Json;
use crate::api::{self, ApiError, ApiResult};
use crate::app::AppState;
use crate::auth::Client;
use crate::cache::count::CounterKey;
use crate::cache::post::CachedScore;
use crate::model::enums::{Privacy, Rating};
use crate::model::post_id::PostId;
use crate::remote::tag::TagGroups;
use crate::update::post::{CreateFields, MetadataPatch, PrivacyChange};
use crate::{cache, remote, update};
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::{Router, routing};
use diesel::Connection;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/create_post", routing::post(create_post))
        .route("/update_post", routing::post(update_post))
        .route("/update_privacy", routing::post(update_privacy))
        .route("/vote", routing::post(vote))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateBody {
    reply_to: Option<PostId>,
    title: Option<String>,
    description: Option<String>,
    rating: Option<Rating>,
    privacy: Option<Privacy>,
}

impl CreateBody {
    fn is_empty(&self) -> bool {
        self.reply_to.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.rating.is_none()
            && self.privacy.is_none()
    }
}

#[derive(Serialize)]
struct CreateResponse {
    post_id: PostId,
}

/// An empty body produces (or returns) the caller's unpublished slot; any
/// field makes a populated draft instead.
async fn create_post(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
    Json(body): Json<CreateBody>,
) -> ApiResult<Json<CreateResponse>> {
    let user_id = api::verify_logged_in(client)?;
    let mut conn = state.get_connection()?;

    if body.is_empty() {
        let post_id = conn.transaction(|conn| update::post::create(conn, user_id))?;
        return Ok(Json(CreateResponse { post_id }));
    }

    MetadataPatch {
        title: body.title.as_deref().map(Some),
        description: body.description.as_deref().map(Some),
        rating: None,
    }
    .validate()?;

    let (post_id, change) = conn.transaction(|conn| {
        update::post::create_with_fields(conn, user_id, CreateFields {
            reply_to: body.reply_to,
            title: body.title.as_deref(),
            description: body.description.as_deref(),
            rating: body.rating,
            privacy: body.privacy,
        })
    })?;

    // A post this young cannot carry tags yet, so no tag fetch is needed
    if let Some(change) = change {
        schedule_counters(&state, user_id, change, &TagGroups::default());
    }
    Ok(Json(CreateResponse { post_id }))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdateBody {
    post_id: PostId,
    #[serde(default, deserialize_with = "api::deserialize_some")]
    title: Option<Option<String>>,
    #[serde(default, deserialize_with = "api::deserialize_some")]
    description: Option<Option<String>>,
    rating: Option<Rating>,
    privacy: Option<Privacy>,
}

/// Applies the provided metadata fields; unset fields pass through. An
/// empty string clears the column. A provided privacy runs the transition
/// in the same transaction as the metadata update.
async fn update_post(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
    Json(body): Json<UpdateBody>,
) -> ApiResult<StatusCode> {
    let user_id = api::verify_logged_in(client)?;

    let title = clear_if_empty(&body.title);
    let description = clear_if_empty(&body.description);
    let patch = MetadataPatch {
        title,
        description,
        rating: body.rating,
    };
    if patch.is_empty() && body.privacy.is_none() {
        return Err(ApiError::EmptyUpdate);
    }
    patch.validate()?;

    let tags = fetch_tags_if(&state, body.post_id, body.privacy.is_some()).await?;

    let mut conn = state.get_connection()?;
    let (metadata_time, change) = conn.transaction(|conn| {
        let metadata_time = (!patch.is_empty())
            .then(|| update::post::metadata(conn, user_id, body.post_id, &patch))
            .transpose()?;
        let change = body
            .privacy
            .map(|privacy| update::post::privacy(conn, user_id, body.post_id, privacy))
            .transpose()?;
        Ok::<_, ApiError>((metadata_time, change))
    })?;
    drop(conn);

    if let Some(change) = change {
        // The transition may have bumped created_on, so the cached
        // projection cannot be patched faithfully
        if let Err(err) = cache::post::evict(&state.cache, body.post_id).await {
            warn!("Failed to evict post cache entry for {}: {err}", body.post_id);
        }
        schedule_counters(&state, user_id, change, &tags);
    } else if let Some(updated_on) = metadata_time
        && let Err(err) =
            cache::post::patch_metadata(&state.cache, body.post_id, title, description, body.rating, updated_on).await
    {
        warn!("Failed to patch post cache entry for {}: {err}", body.post_id);
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PrivacyBody {
    post_id: PostId,
    privacy: Privacy,
}

async fn update_privacy(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
    Json(body): Json<PrivacyBody>,
) -> ApiResult<StatusCode> {
    let user_id = api::verify_logged_in(client)?;

    let tags = fetch_tags_if(&state, body.post_id, true).await?;

    let mut conn = state.get_connection()?;
    let change = conn.transaction(|conn| update::post::privacy(conn, user_id, body.post_id, body.privacy))?;
    drop(conn);

    if let Err(err) = cache::post::evict(&state.cache, body.post_id).await {
        warn!("Failed to evict post cache entry for {}: {err}", body.post_id);
    }
    schedule_counters(&state, user_id, change, &tags);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct VoteBody {
    post_id: PostId,
    vote: Option<i64>,
}

#[derive(Serialize)]
struct ScoreResponse {
    up: i64,
    down: i64,
    total: i64,
    user_vote: i64,
}

async fn vote(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
    Json(body): Json<VoteBody>,
) -> ApiResult<Json<ScoreResponse>> {
    let user_id = api::verify_logged_in(client)?;
    let ballot = decode_vote(body.vote)?;

    let mut conn = state.get_connection()?;
    let totals = conn.transaction(|conn| update::vote::vote(conn, user_id, body.post_id, ballot))?;
    drop(conn);

    let snapshot = CachedScore {
        up: totals.up,
        down: totals.down,
        total: totals.total,
    };
    if let Err(err) = cache::post::put_score(&state.cache, body.post_id, &snapshot).await {
        warn!("Failed to cache score for {}: {err}", body.post_id);
    }
    let user_vote = match ballot {
        Some(true) => 1,
        Some(false) => -1,
        None => 0,
    };
    if let Err(err) = cache::post::put_vote(&state.cache, user_id, body.post_id, user_vote).await {
        warn!("Failed to cache vote for {}: {err}", body.post_id);
    }

    Ok(Json(ScoreResponse {
        up: totals.up,
        down: totals.down,
        total: totals.total,
        user_vote,
    }))
}

/// The wire form of a ballot: 1 = up, -1 = down, 0 or null retracts.
fn decode_vote(vote: Option<i64>) -> ApiResult<Option<bool>> {
    match vote {
        Some(1) => Ok(Some(true)),
        Some(-1) => Ok(Some(false)),
        Some(0) | None => Ok(None),
        Some(_) => Err(ApiError::InvalidVote),
    }
}

/// Maps a provided-but-empty string to a clear, leaving unset fields alone.
fn clear_if_empty(field: &Option<Option<String>>) -> Option<Option<&str>> {
    field
        .as_ref()
        .map(|value| value.as_deref().filter(|text| !text.is_empty()))
}

/// Tag groups feed the per-tag counters, so they are only fetched when a
/// privacy transition could move them. The fetch starts before any SQL runs
/// and completes before the transaction opens; a hard tag service failure
/// therefore aborts the operation with no writes, while a 404 just means an
/// untagged post.
async fn fetch_tags_if(state: &AppState, post_id: PostId, privacy_changing: bool) -> ApiResult<TagGroups> {
    if !privacy_changing {
        return Ok(TagGroups::default());
    }
    let http = state.http.clone();
    let fetch = tokio::spawn(async move { remote::tag::post_tags(&http, post_id).await });
    fetch.await?
}

/// Queues the counter movements caused by a privacy transition. Deltas are
/// applied by the background workers after commit; failures only delay
/// convergence.
fn schedule_counters(state: &AppState, user_id: i64, change: PrivacyChange, tags: &TagGroups) {
    let Some(delta) = change.public_delta() else {
        return;
    };
    state.counters.push(CounterKey::Global, delta);
    state.counters.push(CounterKey::User(user_id), delta);
    state.counters.push(CounterKey::Rating(change.rating), delta);
    for tag in tags.flatten() {
        state.counters.push(CounterKey::Tag(tag.clone()), delta);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn vote_wire_values() {
        assert_eq!(decode_vote(Some(1)).unwrap(), Some(true));
        assert_eq!(decode_vote(Some(-1)).unwrap(), Some(false));
        assert_eq!(decode_vote(Some(0)).unwrap(), None);
        assert_eq!(decode_vote(None).unwrap(), None);
        assert!(matches!(decode_vote(Some(2)), Err(ApiError::InvalidVote)));
        assert!(matches!(decode_vote(Some(-100)), Err(ApiError::InvalidVote)));
    }

    #[test]
    fn empty_strings_clear_fields() {
        assert_eq!(clear_if_empty(&None), None);
        assert_eq!(clear_if_empty(&Some(None)), Some(None));
        assert_eq!(clear_if_empty(&Some(Some(String::new()))), Some(None));
        assert_eq!(clear_if_empty(&Some(Some("fox".to_owned()))), Some(Some("fox")));
    }

    #[test]
    fn update_body_distinguishes_unset_from_clear() {
        let body: UpdateBody = serde_json::from_str(r#"{"post_id": "AAAAAAAB", "title": ""}"#).unwrap();
        assert_eq!(body.title, Some(Some(String::new())));
        assert_eq!(body.description, None);

        let body: UpdateBody = serde_json::from_str(r#"{"post_id": "AAAAAAAB", "description": null}"#).unwrap();
        assert_eq!(body.description, Some(None));
        assert_eq!(body.title, None);
    }

    #[test]
    fn counter_keys_for_a_first_publish() {
        let change = PrivacyChange {
            old: Privacy::Unpublished,
            new: Privacy::Public,
            rating: Rating::General,
        };
        assert_eq!(change.public_delta(), Some(1));

        let change = PrivacyChange {
            old: Privacy::Unlisted,
            new: Privacy::Private,
            rating: Rating::General,
        };
        assert_eq!(change.public_delta(), None);
    }
}
