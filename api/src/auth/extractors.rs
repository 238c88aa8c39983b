use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::{CookieJar, TypedHeader};
use headers::{Authorization, authorization::Bearer};
use services::AppError;

use crate::auth::claims::{AuthUser, BearerUser};
use crate::auth::verify_token;
use crate::response::ApiError;

pub const TOKEN_COOKIE: &str = "token";

/// Token from the `Authorization: Bearer` header.
///
/// # Errors
/// - `MissingCredentials` when there is no `Authorization` header.
/// - `Auth("Invalid token format")` when the header is not a bearer credential.
async fn bearer_token<S>(parts: &mut Parts, state: &S) -> Result<String, AppError>
where
    S: Send + Sync,
{
    match TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state).await {
        Ok(TypedHeader(Authorization(bearer))) => Ok(bearer.token().to_owned()),
        Err(rejection) if rejection.is_missing() => Err(AppError::MissingCredentials),
        Err(_) => Err(AppError::Auth("Invalid token format".into())),
    }
}

/// Extracts `AuthUser` from the `token` cookie, falling back to the bearer header.
///
/// The cookie wins when both are present.
///
/// # Example
/// ```ignore
/// async fn protected_route(AuthUser(claims): AuthUser) -> impl IntoResponse {
///     claims.email
/// }
/// ```
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = match jar.get(TOKEN_COOKIE).map(|c| c.value().to_owned()) {
            Some(token) if !token.is_empty() => token,
            _ => bearer_token(parts, state).await?,
        };

        Ok(AuthUser(verify_token(&token)?))
    }
}

impl<S> FromRequestParts<S> for BearerUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts, state).await?;
        Ok(BearerUser(verify_token(&token)?))
    }
}
