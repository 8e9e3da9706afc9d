pub mod error;
mod extract;
mod middleware;
mod post;
mod upload;
mod user;

pub use error::{ApiError, ApiResult};

use crate::app::AppState;
use crate::auth::Client;
use axum::Router;
use axum::middleware::from_fn;
use serde::{Deserialize, Deserializer};
use tower_http::trace::TraceLayer;

/// Returns all routes of the application.
pub fn routes(state: AppState) -> Router {
    let v1 = post::routes().merge(upload::routes()).merge(user::routes());
    Router::new()
        .nest("/v1", v1)
        .layer(from_fn(middleware::auth))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Returns the caller's user id, or an error for anonymous requests.
pub fn verify_logged_in(client: Client) -> ApiResult<i64> {
    client.id.ok_or(ApiError::NotLoggedIn)
}

// Any value that is present is considered Some value, including null. Lets
// request bodies distinguish an omitted field from an explicit clear.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
