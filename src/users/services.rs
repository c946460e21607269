use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{PasswordUpdateRequest, UserProfile, UserUpdateRequest},
    repo_types::UserRecord,
};
use crate::{auth::password::hash_password, errors::AppError, state::AppState};

async fn require_user(state: &AppState, uuid: Uuid) -> Result<UserRecord, AppError> {
    state.directory.find_by_uuid(uuid).await?.ok_or_else(|| {
        warn!(%uuid, "user not found");
        AppError::UserNotFound
    })
}

pub async fn list_users(state: &AppState) -> Result<Vec<UserProfile>, AppError> {
    let users = state.directory.list().await?;
    Ok(users.into_iter().map(UserProfile::from).collect())
}

pub async fn get_user(state: &AppState, uuid: Uuid) -> Result<UserProfile, AppError> {
    Ok(require_user(state, uuid).await?.into())
}

#[instrument(skip(state, req))]
pub async fn update_user(
    state: &AppState,
    uuid: Uuid,
    req: UserUpdateRequest,
) -> Result<(), AppError> {
    let mut user = require_user(state, uuid).await?;
    user.name = req.name;
    user.birth_date = req.birth_date;
    state.directory.save(&user).await?;
    info!("user updated");
    Ok(())
}

#[instrument(skip(state, req))]
pub async fn update_password(
    state: &AppState,
    uuid: Uuid,
    req: PasswordUpdateRequest,
) -> Result<(), AppError> {
    let mut user = require_user(state, uuid).await?;
    user.password = hash_password(&req.password)?;
    state.directory.save(&user).await?;
    info!("password updated");
    Ok(())
}

#[instrument(skip(state))]
pub async fn delete_user(state: &AppState, uuid: Uuid) -> Result<(), AppError> {
    let user = require_user(state, uuid).await?;
    state.directory.delete_by_id(user.id).await?;
    info!("user deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::{password::verify_password, permissions::Role},
        config::JwtConfig,
        users::repo_types::NewUser,
    };

    async fn seeded() -> (AppState, Uuid) {
        let state = AppState::in_memory(JwtConfig {
            secret: "ZGV2LXNlY3JldC1rZXktZm9yLXRlc3RzLW9ubHktMzJi".into(),
            expiration_minutes: 30,
        })
        .unwrap();
        let user = state
            .directory
            .insert(NewUser {
                uuid: Uuid::new_v4(),
                name: "Felipe Enzo".into(),
                email: "felipe@gmail.com".into(),
                birth_date: "17/08/2001".into(),
                password: hash_password("123456").unwrap(),
                role: Role::User,
            })
            .await
            .unwrap();
        (state, user.uuid)
    }

    #[tokio::test]
    async fn get_and_list_return_profiles() {
        let (state, uuid) = seeded().await;
        let profile = get_user(&state, uuid).await.unwrap();
        assert_eq!(profile.email, "felipe@gmail.com");
        assert_eq!(list_users(&state).await.unwrap(), vec![profile]);
    }

    #[tokio::test]
    async fn unknown_uuid_is_not_found_everywhere() {
        let (state, _) = seeded().await;
        let ghost = Uuid::new_v4();
        assert!(matches!(get_user(&state, ghost).await, Err(AppError::UserNotFound)));
        assert!(matches!(
            delete_user(&state, ghost).await,
            Err(AppError::UserNotFound)
        ));
        let upd = UserUpdateRequest {
            name: "X".into(),
            birth_date: "01/01/2000".into(),
        };
        assert!(matches!(
            update_user(&state, ghost, upd).await,
            Err(AppError::UserNotFound)
        ));
        let pwd = PasswordUpdateRequest {
            password: "abcdef".into(),
        };
        assert!(matches!(
            update_password(&state, ghost, pwd).await,
            Err(AppError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn update_overwrites_name_and_birth_date() {
        let (state, uuid) = seeded().await;
        update_user(
            &state,
            uuid,
            UserUpdateRequest {
                name: "Felipe E.".into(),
                birth_date: "18/08/2001".into(),
            },
        )
        .await
        .unwrap();
        let profile = get_user(&state, uuid).await.unwrap();
        assert_eq!(profile.name, "Felipe E.");
        assert_eq!(profile.birth_date, "18/08/2001");
    }

    #[tokio::test]
    async fn password_update_stores_a_new_hash() {
        let (state, uuid) = seeded().await;
        update_password(
            &state,
            uuid,
            PasswordUpdateRequest {
                password: "newpass1".into(),
            },
        )
        .await
        .unwrap();
        let stored = state.directory.find_by_uuid(uuid).await.unwrap().unwrap();
        assert_ne!(stored.password, "newpass1");
        assert!(verify_password("newpass1", &stored.password).unwrap());
        assert!(!verify_password("123456", &stored.password).unwrap());
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let (state, uuid) = seeded().await;
        delete_user(&state, uuid).await.unwrap();
        assert!(matches!(get_user(&state, uuid).await, Err(AppError::UserNotFound)));
    }
}
