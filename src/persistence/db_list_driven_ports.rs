use crate::domain;
use crate::domain::task_list::{NewTaskList, TaskList};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::{DateTime, Utc};
use sqlx::{query, query_as};

pub struct DbReadLists {}
pub struct DbWriteLists {}

#[derive(sqlx::FromRow)]
struct TaskListRow {
    id: i32,
    user_id: i32,
    group_id: Option<i32>,
    title: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TaskListRow> for TaskList {
    fn from(value: TaskListRow) -> Self {
        TaskList {
            id: value.id,
            user_id: value.user_id,
            group_id: value.group_id,
            title: value.title,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

const LIST_COLUMNS: &str = "id, user_id, group_id, title, created_at, updated_at";

impl domain::task_list::driven_ports::ListReader for DbReadLists {
    async fn all_for_user(
        &self,
        user_id: i32,
        group_filter: Option<i32>,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<TaskList>, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let lists = match group_filter {
            Some(group_id) => {
                query_as::<_, TaskListRow>(&format!(
                    "SELECT {LIST_COLUMNS} FROM task_list \
                     WHERE user_id = $1 AND group_id = $2 ORDER BY id"
                ))
                .bind(user_id)
                .bind(group_id)
                .fetch_all(cxn_handle.borrow_connection())
                .await
            }
            None => {
                query_as::<_, TaskListRow>(&format!(
                    "SELECT {LIST_COLUMNS} FROM task_list WHERE user_id = $1 ORDER BY id"
                ))
                .bind(user_id)
                .fetch_all(cxn_handle.borrow_connection())
                .await
            }
        }
        .context("Fetching a user's lists")?;

        Ok(lists.into_iter().map(TaskList::from).collect())
    }

    async fn for_user_by_id(
        &self,
        user_id: i32,
        list_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<TaskList>, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let list = query_as::<_, TaskListRow>(&format!(
            "SELECT {LIST_COLUMNS} FROM task_list WHERE user_id = $1 AND id = $2"
        ))
        .bind(user_id)
        .bind(list_id)
        .fetch_optional(cxn_handle.borrow_connection())
        .await
        .context("Fetching a list by id")?;

        Ok(list.map(TaskList::from))
    }
}

impl domain::task_list::driven_ports::ListWriter for DbWriteLists {
    async fn create(
        &self,
        user_id: i32,
        new_list: &NewTaskList,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<TaskList, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let now = Utc::now();
        let created = query_as::<_, TaskListRow>(&format!(
            "INSERT INTO task_list (user_id, group_id, title, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $4) RETURNING {LIST_COLUMNS}"
        ))
        .bind(user_id)
        .bind(new_list.group_id)
        .bind(&new_list.title)
        .bind(now)
        .fetch_one(cxn_handle.borrow_connection())
        .await
        .context("Inserting new list")?;

        Ok(TaskList::from(created))
    }

    async fn save(
        &self,
        list: &TaskList,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        query("UPDATE task_list SET group_id = $1, title = $2, updated_at = $3 WHERE id = $4")
            .bind(list.group_id)
            .bind(&list.title)
            .bind(list.updated_at)
            .bind(list.id)
            .execute(cxn_handle.borrow_connection())
            .await
            .context("Saving an updated list")?;

        Ok(())
    }

    async fn delete(
        &self,
        list_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        query("DELETE FROM task_list WHERE id = $1")
            .bind(list_id)
            .execute(cxn_handle.borrow_connection())
            .await
            .context("Deleting a list")?;

        Ok(())
    }

    async fn detach_group(
        &self,
        group_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        query("UPDATE task_list SET group_id = NULL WHERE group_id = $1")
            .bind(group_id)
            .execute(cxn_handle.borrow_connection())
            .await
            .context("Detaching a group's lists")?;

        Ok(())
    }

    async fn delete_for_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        query("DELETE FROM task_list WHERE user_id = $1")
            .bind(user_id)
            .execute(cxn_handle.borrow_connection())
            .await
            .context("Deleting a user's lists")?;

        Ok(())
    }
}
