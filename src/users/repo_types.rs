use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::permissions::Role;

/// User row in the database.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: i64,                // storage identity, never leaves the service
    pub uuid: Uuid,             // client-facing identifier, immutable
    pub name: String,
    pub email: String,          // unique, login subject
    pub birth_date: String,     // dd/mm/yyyy
    pub password: String,       // argon2 hash
    pub role: Role,
}

/// Values for a row that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub uuid: Uuid,
    pub name: String,
    pub email: String,
    pub birth_date: String,
    pub password: String,
    pub role: Role,
}
