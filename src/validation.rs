use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use time::{macros::format_description, Date};
use tracing::warn;

use crate::errors::AppError;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref BIRTH_DATE_RE: Regex = Regex::new(r"^\d{2}/\d{2}/\d{4}$").unwrap();
}

pub const PASSWORD_MIN: usize = 6;
pub const PASSWORD_MAX: usize = 20;

/// Shape checks on a deserialized request body.
pub trait Validate {
    fn validate(&self) -> Result<(), AppError>;
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_password(password: &str) -> bool {
    (PASSWORD_MIN..=PASSWORD_MAX).contains(&password.chars().count())
}

/// Parses a `dd/mm/yyyy` date; `None` for bad shape or impossible dates.
pub fn parse_birth_date(value: &str) -> Option<Date> {
    if !BIRTH_DATE_RE.is_match(value) {
        return None;
    }
    Date::parse(value, format_description!("[day]/[month]/[year]")).ok()
}

/// Fails with `AppError::Validation` unless every check holds.
pub fn ensure(checks: &[bool]) -> Result<(), AppError> {
    if checks.iter().all(|ok| *ok) {
        Ok(())
    } else {
        Err(AppError::Validation)
    }
}

/// `Json<T>` that also runs [`Validate`]; any failure is `Invalid data format`.
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            warn!(error = %e, "unreadable request body");
            AppError::Validation
        })?;
        value.validate().map_err(|e| {
            warn!("request body failed validation");
            e
        })?;
        Ok(Self(value))
    }
}
