use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::Role;

/// JWT payload used as the identity marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,       // user ID
    pub email: String,  // user email at issue time
    pub role: Role,     // role at issue time
    pub iat: usize,     // issued at (unix timestamp)
    pub exp: usize,     // expires at (unix timestamp)
    pub iss: String,    // issuer
    pub aud: String,    // audience
    pub jti: Uuid,      // token ID
}

/// Identity attached to a request once its token has been verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i32,
    pub email: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<Claims> for Identity {
    fn from(c: Claims) -> Self {
        Self {
            user_id: c.sub,
            email: c.email,
            role: c.role,
        }
    }
}
