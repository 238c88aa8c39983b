use serde::{Deserialize, Serialize};
use services::session_service::Caller;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub exp: usize,
    /// Set when the request carried the configured demo token. Never part of a signed token.
    #[serde(skip)]
    pub demo: bool,
}

impl Claims {
    pub fn caller(&self) -> Caller {
        Caller {
            email: self.email.clone(),
            name: self.name.clone(),
            demo: self.demo,
        }
    }
}

/// Caller authenticated by the `token` cookie or an `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

/// Caller authenticated by an `Authorization: Bearer` header only.
#[derive(Debug, Clone)]
pub struct BearerUser(pub Claims);
