use crate::api::ApiResult;
use crate::auth::{self, Client};
use axum::extract::Request;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

/// Decodes the bearer token into a [`Client`] and attaches it to the
/// request. Requests without an authorization header proceed as anonymous
/// and fail later at the logged-in check.
pub async fn auth(mut request: Request, next: Next) -> ApiResult<Response> {
    let client = match request.headers().get(AUTHORIZATION) {
        Some(auth_value) => auth::authenticate(auth_value.to_str()?)?,
        None => Client::new(None),
    };
    request.extensions_mut().insert(client);
    Ok(next.run(request).await)
}
