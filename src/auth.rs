use crate::config;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::prelude::*;
use hmac::{KeyInit, Mac, SimpleHmac};
use thiserror::Error;

type Hmac = SimpleHmac<blake3::Hasher>;

/// The authenticated caller of a request, as decoded from the bearer token
/// the platform's credential verifier issued. `id` is `None` for anonymous
/// requests; every route in this service requires a logged-in client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Client {
    pub id: Option<i64>,
}

impl Client {
    pub fn new(id: Option<i64>) -> Self {
        Self { id }
    }
}

#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error("Invalid authentication type")]
    InvalidAuthType,
    #[error("Malformed bearer token")]
    MalformedToken,
    #[error("Token failed verification")]
    InvalidToken,
    #[error(transparent)]
    InvalidEncoding(#[from] base64::DecodeError),
    #[error(transparent)]
    NotAnInteger(#[from] std::num::ParseIntError),
}

/// Verifies an `Authorization` header of the form `Bearer {user_id}.{mac}`,
/// where the mac is a keyed blake3 over the decimal user id, issued by the
/// platform's auth service with the shared `auth_secret`.
pub fn authenticate(header_value: &str) -> Result<Client, AuthenticationError> {
    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or(AuthenticationError::InvalidAuthType)?;
    let (user_id, tag) = token.split_once('.').ok_or(AuthenticationError::MalformedToken)?;

    let expected = URL_SAFE_NO_PAD.decode(tag)?;
    keyed_mac(user_id)
        .verify_slice(&expected)
        .map_err(|_| AuthenticationError::InvalidToken)?;

    Ok(Client::new(Some(user_id.parse()?)))
}

/// Mints a token for `user_id`. The auth service does this in production;
/// it lives here for local development and tests.
pub fn token_for(user_id: i64) -> String {
    let user_id = user_id.to_string();
    let tag = keyed_mac(&user_id).finalize();
    format!("{user_id}.{}", URL_SAFE_NO_PAD.encode(tag.into_bytes()))
}

fn keyed_mac(user_id: &str) -> Hmac {
    let mut mac =
        Hmac::new_from_slice(config::get().auth_secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(user_id.as_bytes());
    mac
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn token_round_trip() {
        let header = format!("Bearer {}", token_for(7));
        let client = authenticate(&header).unwrap();
        assert_eq!(client.id, Some(7));
    }

    #[test]
    fn rejects_tampered_tokens() {
        let token = token_for(7);
        let (_, tag) = token.split_once('.').unwrap();

        let reused = format!("Bearer 9.{tag}");
        assert!(matches!(authenticate(&reused), Err(AuthenticationError::InvalidToken)));

        assert!(matches!(authenticate("Bearer 7"), Err(AuthenticationError::MalformedToken)));
        assert!(matches!(authenticate("Basic abcdef"), Err(AuthenticationError::InvalidAuthType)));
    }
}
