pub mod claims;
pub mod extractors;
pub mod guards;
pub mod middleware;

pub use claims::{AuthUser, BearerUser, Claims};

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use services::AppError;
use util::config;

pub const DEMO_NAME: &str = "Demo Teacher";

/// Generates a JWT and its expiry timestamp for the given identity.
pub fn generate_jwt(email: &str, name: Option<&str>) -> Result<(String, String), AppError> {
    let expiry = Utc::now() + Duration::minutes(config::jwt_duration_minutes() as i64);

    let claims = Claims {
        email: email.to_owned(),
        name: name.map(str::to_owned),
        exp: expiry.timestamp() as usize,
        demo: false,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config::jwt_secret().as_bytes()),
    )
    .map_err(|e| AppError::Auth(format!("Token encoding failed: {e}")))?;

    Ok((token, expiry.to_rfc3339()))
}

/// Checks a raw token and returns its claims.
///
/// With demo mode on, the configured demo token is accepted without a signature and
/// yields the configured demo identity.
pub fn verify_token(token: &str) -> Result<Claims, AppError> {
    if config::demo_mode() && token == config::demo_token() {
        return Ok(Claims {
            email: config::demo_email(),
            name: Some(DEMO_NAME.into()),
            exp: 0,
            demo: true,
        });
    }

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config::jwt_secret().as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Auth("Invalid or expired token".into()))
}
