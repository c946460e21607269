use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::UserRecord;
use crate::{
    errors::AppError,
    validation::{ensure, is_blank, is_valid_password, parse_birth_date, Validate},
};

/// Public view of a user; never includes the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub birth_date: String,
}

impl From<UserRecord> for UserProfile {
    fn from(u: UserRecord) -> Self {
        Self {
            name: u.name,
            email: u.email,
            birth_date: u.birth_date,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdateRequest {
    pub name: String,
    pub birth_date: String,
}

impl Validate for UserUpdateRequest {
    fn validate(&self) -> Result<(), AppError> {
        ensure(&[
            !is_blank(&self.name),
            parse_birth_date(&self.birth_date).is_some(),
        ])
    }
}

#[derive(Debug, Deserialize)]
pub struct PasswordUpdateRequest {
    pub password: String,
}

impl Validate for PasswordUpdateRequest {
    fn validate(&self) -> Result<(), AppError> {
        ensure(&[is_valid_password(&self.password)])
    }
}

/// Parses the `{id}` path segment of the user routes.
pub fn parse_user_uuid(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidUuid)
}
