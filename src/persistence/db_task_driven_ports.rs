use crate::domain;
use crate::domain::task::{NewTask, Task};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{query, query_as};

pub struct DbReadTasks {}
pub struct DbWriteTasks {}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: i32,
    user_id: i32,
    list_id: Option<i32>,
    title: String,
    note: String,
    completed: bool,
    due_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(value: TaskRow) -> Self {
        Task {
            id: value.id,
            user_id: value.user_id,
            list_id: value.list_id,
            title: value.title,
            note: value.note,
            completed: value.completed,
            due_date: value.due_date,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

const TASK_COLUMNS: &str =
    "id, user_id, list_id, title, note, completed, due_date, created_at, updated_at";

impl domain::task::driven_ports::TaskReader for DbReadTasks {
    async fn all_for_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<Task>, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let tasks = query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM task WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(cxn_handle.borrow_connection())
        .await
        .context("Fetching a user's tasks")?;

        Ok(tasks.into_iter().map(Task::from).collect())
    }

    async fn for_user_by_id(
        &self,
        user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Task>, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let task = query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM task WHERE user_id = $1 AND id = $2"
        ))
        .bind(user_id)
        .bind(task_id)
        .fetch_optional(cxn_handle.borrow_connection())
        .await
        .context("Fetching a task by id")?;

        Ok(task.map(Task::from))
    }
}

impl domain::task::driven_ports::TaskWriter for DbWriteTasks {
    async fn create(
        &self,
        user_id: i32,
        new_task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Task, Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let now = Utc::now();
        let created = query_as::<_, TaskRow>(&format!(
            "INSERT INTO task (user_id, list_id, title, note, completed, due_date, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7) RETURNING {TASK_COLUMNS}"
        ))
        .bind(user_id)
        .bind(new_task.list_id)
        .bind(&new_task.title)
        .bind(&new_task.note)
        .bind(new_task.completed)
        .bind(new_task.due_date)
        .bind(now)
        .fetch_one(cxn_handle.borrow_connection())
        .await
        .context("Inserting new task")?;

        Ok(Task::from(created))
    }

    async fn save(&self, task: &Task, ext_cxn: &mut impl ExternalConnectivity) -> Result<(), Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        query(
            "UPDATE task SET list_id = $1, title = $2, note = $3, completed = $4, \
             due_date = $5, updated_at = $6 WHERE id = $7",
        )
        .bind(task.list_id)
        .bind(&task.title)
        .bind(&task.note)
        .bind(task.completed)
        .bind(task.due_date)
        .bind(task.updated_at)
        .bind(task.id)
        .execute(cxn_handle.borrow_connection())
        .await
        .context("Saving an updated task")?;

        Ok(())
    }

    async fn delete(
        &self,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        query("DELETE FROM task WHERE id = $1")
            .bind(task_id)
            .execute(cxn_handle.borrow_connection())
            .await
            .context("Deleting a task")?;

        Ok(())
    }

    async fn delete_in_list(
        &self,
        list_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        query("DELETE FROM task WHERE list_id = $1")
            .bind(list_id)
            .execute(cxn_handle.borrow_connection())
            .await
            .context("Deleting a list's tasks")?;

        Ok(())
    }

    async fn delete_for_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn_handle = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        query("DELETE FROM task WHERE user_id = $1")
            .bind(user_id)
            .execute(cxn_handle.borrow_connection())
            .await
            .context("Deleting a user's tasks")?;

        Ok(())
    }
}
