use crate::domain;
use crate::domain::user::{CreateUser, User};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::{DateTime, Utc};
use sqlx::{query, query_as};

pub struct DbReadUsers {}
pub struct DbWriteUsers {}

#[derive(sqlx::FromRow)]
struct AppUserRow {
    id: i32,
    email: String,
    username: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AppUserRow> for User {
    fn from(value: AppUserRow) -> Self {
        User {
            id: value.id,
            email: value.email,
            username: value.username,
            password_hash: value.password_hash,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

const USER_COLUMNS: &str = "id, email, username, password_hash, created_at, updated_at";

impl domain::user::driven_ports::UserReader for DbReadUsers {
    async fn by_id(
        &self,
        id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<User>, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let user = query_as::<_, AppUserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM app_user WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(cxn_handle.borrow_connection())
        .await
        .context("Fetching a user by id")?;

        Ok(user.map(User::from))
    }

    async fn by_email(
        &self,
        email: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<User>, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let user = query_as::<_, AppUserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM app_user WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(cxn_handle.borrow_connection())
        .await
        .context("Fetching a user by email")?;

        Ok(user.map(User::from))
    }

    async fn by_username(
        &self,
        username: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<User>, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let user = query_as::<_, AppUserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM app_user WHERE lower(username) = lower($1)"
        ))
        .bind(username)
        .fetch_optional(cxn_handle.borrow_connection())
        .await
        .context("Fetching a user by username")?;

        Ok(user.map(User::from))
    }
}

impl domain::user::driven_ports::UserWriter for DbWriteUsers {
    async fn create(
        &self,
        user: &CreateUser,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<User, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let now = Utc::now();
        let created = query_as::<_, AppUserRow>(&format!(
            "INSERT INTO app_user (email, username, password_hash, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(now)
        .fetch_one(cxn_handle.borrow_connection())
        .await
        .context("Inserting new user")?;

        Ok(User::from(created))
    }

    async fn delete(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        query("DELETE FROM app_user WHERE id = $1")
            .bind(user_id)
            .execute(cxn_handle.borrow_connection())
            .await
            .context("Deleting a user")?;

        Ok(())
    }
}
