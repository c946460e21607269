use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    errors::AppError,
    validation::{ensure, is_blank, is_valid_email, is_valid_password, parse_birth_date, Validate},
};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub birth_date: String, // dd/mm/yyyy
    pub password: String,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), AppError> {
        ensure(&[
            !is_blank(&self.name),
            is_valid_email(&self.email),
            parse_birth_date(&self.birth_date).is_some(),
            is_valid_password(&self.password),
        ])
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), AppError> {
        ensure(&[is_valid_email(&self.email), !is_blank(&self.password)])
    }
}

/// Returned by register and login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub jwt: String,
    pub uuid: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pedro() -> RegisterRequest {
        serde_json::from_str(
            r#"{"name":"Pedro","email":"pedro@gmail.com","birthDate":"09/02/2002","password":"345868"}"#,
        )
        .unwrap()
    }

    #[test]
    fn register_body_uses_camel_case() {
        let req = pedro();
        assert_eq!(req.birth_date, "09/02/2002");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn register_rejects_blank_name_and_short_password() {
        let mut req = pedro();
        req.name = "".into();
        assert!(matches!(req.validate(), Err(AppError::Validation)));

        let mut req = pedro();
        req.password = "123".into();
        assert!(matches!(req.validate(), Err(AppError::Validation)));
    }

    #[test]
    fn auth_response_shape() {
        let json = serde_json::to_value(AuthResponse {
            jwt: "t".into(),
            uuid: Uuid::nil(),
        })
        .unwrap();
        assert_eq!(json["jwt"], "t");
        assert_eq!(json["uuid"], "00000000-0000-0000-0000-000000000000");
    }
}
