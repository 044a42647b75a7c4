//! `Authorization: Bearer` extraction

use super::error::ApiError;
use crate::error::ChatsumError;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

/// Raw bearer credential from the request
///
/// Only the header shape is checked here; the token itself is resolved by
/// the service on every call.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| ChatsumError::Unauthenticated("missing Authorization header".into()))?
            .to_str()
            .map_err(|_| ChatsumError::Unauthenticated("malformed Authorization header".into()))?;

        parse_bearer(header)
            .map(|token| BearerToken(token.to_string()))
            .ok_or_else(|| {
                ChatsumError::Unauthenticated("expected a Bearer credential".into()).into()
            })
    }
}
