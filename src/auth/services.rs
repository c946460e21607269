use time::{Date, OffsetDateTime};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    claims::UserClaims,
    dto::{AuthResponse, LoginRequest, RegisterRequest},
    jwt::JwtKeys,
    password::{hash_password, verify_password},
    permissions::Role,
};
use crate::{
    errors::AppError,
    state::AppState,
    users::{
        repo::DuplicateEmail,
        repo_types::{NewUser, UserRecord},
    },
    validation::parse_birth_date,
};

pub const MINIMUM_AGE: i32 = 18;

/// Whole calendar years between `birth` and `today`.
pub fn age_in_years(birth: Date, today: Date) -> i32 {
    let mut years = today.year() - birth.year();
    if (u8::from(today.month()), today.day()) < (u8::from(birth.month()), birth.day()) {
        years -= 1;
    }
    years
}

pub fn is_of_age(birth: Date, today: Date) -> bool {
    age_in_years(birth, today) >= MINIMUM_AGE
}

fn issue_for(keys: &JwtKeys, user: &UserRecord, now: OffsetDateTime) -> anyhow::Result<String> {
    let claims = UserClaims {
        name: user.name.clone(),
        role: user.role,
    };
    keys.issue(&user.email, claims, now)
}

#[instrument(skip(state, req), fields(email = %req.email))]
pub async fn register(
    state: &AppState,
    req: RegisterRequest,
    now: OffsetDateTime,
) -> Result<AuthResponse, AppError> {
    if state.directory.exists_by_email(&req.email).await? {
        warn!("email already registered");
        return Err(AppError::DuplicateEmail);
    }

    let birth = parse_birth_date(&req.birth_date).ok_or(AppError::Validation)?;
    if !is_of_age(birth, now.date()) {
        warn!(birth_date = %req.birth_date, "registrant is under age");
        return Err(AppError::AgeRestriction);
    }

    let password = hash_password(&req.password)?;
    let user = state
        .directory
        .insert(NewUser {
            uuid: Uuid::new_v4(),
            name: req.name,
            email: req.email,
            birth_date: req.birth_date,
            password,
            role: Role::User,
        })
        .await
        .map_err(|e| {
            if e.is::<DuplicateEmail>() {
                warn!("email registered concurrently");
                AppError::DuplicateEmail
            } else {
                AppError::Internal(e)
            }
        })?;

    let jwt = issue_for(&state.keys, &user, now)?;
    info!(uuid = %user.uuid, "user registered");
    Ok(AuthResponse {
        jwt,
        uuid: user.uuid,
    })
}

#[instrument(skip(state, req), fields(email = %req.email))]
pub async fn login(
    state: &AppState,
    req: LoginRequest,
    now: OffsetDateTime,
) -> Result<AuthResponse, AppError> {
    let Some(user) = state.directory.find_by_email(&req.email).await? else {
        warn!("login unknown email");
        return Err(AppError::UserNotFound);
    };

    if !verify_password(&req.password, &user.password)? {
        warn!(uuid = %user.uuid, "login invalid password");
        return Err(AppError::BadCredentials);
    }

    let jwt = issue_for(&state.keys, &user, now)?;
    info!(uuid = %user.uuid, "user logged in");
    Ok(AuthResponse {
        jwt,
        uuid: user.uuid,
    })
}
