use crate::domain;
use crate::domain::group::{Group, NewGroup};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::{DateTime, Utc};
use sqlx::{query, query_as};

pub struct DbReadGroups {}
pub struct DbWriteGroups {}

#[derive(sqlx::FromRow)]
struct GroupRow {
    id: i32,
    user_id: i32,
    title: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<GroupRow> for Group {
    fn from(value: GroupRow) -> Self {
        Group {
            id: value.id,
            user_id: value.user_id,
            title: value.title,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

const GROUP_COLUMNS: &str = "id, user_id, title, created_at, updated_at";

impl domain::group::driven_ports::GroupReader for DbReadGroups {
    async fn all_for_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<Group>, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let groups = query_as::<_, GroupRow>(&format!(
            "SELECT {GROUP_COLUMNS} FROM task_group WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(cxn_handle.borrow_connection())
        .await
        .context("Fetching a user's groups")?;

        Ok(groups.into_iter().map(Group::from).collect())
    }

    async fn for_user_by_id(
        &self,
        user_id: i32,
        group_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Group>, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let group = query_as::<_, GroupRow>(&format!(
            "SELECT {GROUP_COLUMNS} FROM task_group WHERE user_id = $1 AND id = $2"
        ))
        .bind(user_id)
        .bind(group_id)
        .fetch_optional(cxn_handle.borrow_connection())
        .await
        .context("Fetching a group by id")?;

        Ok(group.map(Group::from))
    }
}

impl domain::group::driven_ports::GroupWriter for DbWriteGroups {
    async fn create(
        &self,
        user_id: i32,
        new_group: &NewGroup,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Group, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let now = Utc::now();
        let created = query_as::<_, GroupRow>(&format!(
            "INSERT INTO task_group (user_id, title, created_at, updated_at) \
             VALUES ($1, $2, $3, $3) RETURNING {GROUP_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&new_group.title)
        .bind(now)
        .fetch_one(cxn_handle.borrow_connection())
        .await
        .context("Inserting new group")?;

        Ok(Group::from(created))
    }

    async fn save(
        &self,
        group: &Group,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        query("UPDATE task_group SET title = $1, updated_at = $2 WHERE id = $3")
            .bind(&group.title)
            .bind(group.updated_at)
            .bind(group.id)
            .execute(cxn_handle.borrow_connection())
            .await
            .context("Saving an updated group")?;

        Ok(())
    }

    async fn delete(
        &self,
        group_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        query("DELETE FROM task_group WHERE id = $1")
            .bind(group_id)
            .execute(cxn_handle.borrow_connection())
            .await
            .context("Deleting a group")?;

        Ok(())
    }

    async fn delete_for_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        query("DELETE FROM task_group WHERE user_id = $1")
            .bind(user_id)
            .execute(cxn_handle.borrow_connection())
            .await
            .context("Deleting a user's groups")?;

        Ok(())
    }
}
