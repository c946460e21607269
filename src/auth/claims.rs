use serde::{Deserialize, Serialize};

use super::permissions::Role;

/// Custom claims carried next to the subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    pub name: String,
    pub role: Role,
}

/// JWT payload issued on register and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user email
    #[serde(flatten)]
    pub user: UserClaims,
    pub iat: i64, // issued at (unix timestamp)
    pub exp: i64, // expires at (unix timestamp)
}
