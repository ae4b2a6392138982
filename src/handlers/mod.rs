pub mod order_book;
pub mod orders;

use crate::error::ExchangeError;
use crate::order_book::OwnerId;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Header carrying the caller's owner id. Authentication happens in front of
/// this service; the id is trusted as given.
pub const OWNER_HEADER: &str = "x-owner-id";

/// Owner identity of the request, passed explicitly into every exchange call.
pub struct Owner(pub OwnerId);

impl<S: Send + Sync> FromRequestParts<S> for Owner {
    type Rejection = ExchangeError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok())
            .map(Owner)
            .ok_or(ExchangeError::Unauthorized)
    }
}
