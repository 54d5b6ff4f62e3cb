use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::{delete, get, patch, post};
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;

use crate::api::AuthenticatedUser;
use crate::dto::task::{TaskResponse, TasksResponse};
use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{DomainErrorResponse, Json, ValidationErrorResponse};
use crate::{AppState, SharedData, domain, dto, persistence};
use validator::Validate;

#[derive(OpenApi)]
#[openapi(paths(get_tasks, get_task, create_task, update_task, delete_task))]
pub struct TasksApi;

pub const TASKS_API_GROUP: &str = "Tasks";

/// Builds a router for all the task routes
pub fn task_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/",
            get(
                |State(app_data): AppState, user: AuthenticatedUser| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    get_tasks(user.user_id, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/",
            post(
                |State(app_data): AppState,
                 user: AuthenticatedUser,
                 Json(new_task): Json<dto::task::NewTask>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    create_task(user.user_id, new_task, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/:task_id",
            get(
                |State(app_data): AppState,
                 user: AuthenticatedUser,
                 Path(task_id): Path<i32>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    get_task(user.user_id, task_id, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/:task_id",
            patch(
                |State(app_data): AppState,
                 user: AuthenticatedUser,
                 Path(task_id): Path<i32>,
                 Json(update): Json<dto::task::UpdateTask>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    update_task(user.user_id, task_id, update, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/:task_id",
            delete(
                |State(app_data): AppState,
                 user: AuthenticatedUser,
                 Path(task_id): Path<i32>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    delete_task(user.user_id, task_id, &mut ext_cxn, &task_service).await
                },
            ),
        )
}

/// Lists all of the authenticated user's tasks with their list references resolved
#[utoipa::path(
    get,
    path = "/tasks",
    tag = TASKS_API_GROUP,
    responses(
        (status = 200, description = "The user's tasks", body = TasksResponse),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 500, response = dto::err_resps::BasicError500),
    )
)]
async fn get_tasks(
    user_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::task::driving_ports::TaskPort,
) -> Result<Json<TasksResponse>, ErrorResponse> {
    info!("Fetching tasks for user {user_id}");
    let task_read = persistence::db_task_driven_ports::DbReadTasks {};
    let list_read = persistence::db_list_driven_ports::DbReadLists {};

    let details = task_service
        .tasks_for_user(user_id, &mut *ext_cxn, &task_read, &list_read)
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(Json(TasksResponse {
        tasks: details.into_iter().map(TaskResponse::from_detail).collect(),
    }))
}

/// Fetches a single task owned by the authenticated user
#[utoipa::path(
    get,
    path = "/tasks/{task_id}",
    tag = TASKS_API_GROUP,
    params(("task_id" = i32, Path, description = "ID of the task to fetch")),
    responses(
        (status = 200, description = "The requested task", body = TaskResponse),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    )
)]
async fn get_task(
    user_id: i32,
    task_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::task::driving_ports::TaskPort,
) -> Result<Json<TaskResponse>, ErrorResponse> {
    info!("Fetching task {task_id} for user {user_id}");
    let task_read = persistence::db_task_driven_ports::DbReadTasks {};
    let list_read = persistence::db_list_driven_ports::DbReadLists {};

    let detail = task_service
        .task_for_user(user_id, task_id, &mut *ext_cxn, &task_read, &list_read)
        .await
        .map_err(DomainErrorResponse::from)?
        .ok_or(DomainErrorResponse::NotFound)?;

    Ok(Json(TaskResponse::from_detail(detail)))
}

/// Creates a task for the authenticated user
#[utoipa::path(
    post,
    path = "/tasks",
    tag = TASKS_API_GROUP,
    request_body = dto::task::NewTask,
    responses(
        (status = 201, description = "Task successfully created", body = TaskResponse),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 422, response = dto::err_resps::BasicError422),
        (status = 500, response = dto::err_resps::BasicError500),
    )
)]
async fn create_task(
    user_id: i32,
    new_task: dto::task::NewTask,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::task::driving_ports::TaskPort,
) -> Result<(StatusCode, Json<TaskResponse>), ErrorResponse> {
    info!("Creating task for user {user_id}");
    new_task.validate().map_err(ValidationErrorResponse::from)?;

    let list_read = persistence::db_list_driven_ports::DbReadLists {};
    let task_write = persistence::db_task_driven_ports::DbWriteTasks {};

    let detail = task_service
        .create_task(
            user_id,
            &new_task.into_domain(),
            &mut *ext_cxn,
            &list_read,
            &task_write,
        )
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok((StatusCode::CREATED, Json(TaskResponse::from_detail(detail))))
}

/// Partially updates a task owned by the authenticated user
#[utoipa::path(
    patch,
    path = "/tasks/{task_id}",
    tag = TASKS_API_GROUP,
    params(("task_id" = i32, Path, description = "ID of the task to update")),
    request_body = dto::task::UpdateTask,
    responses(
        (status = 200, description = "The updated task", body = TaskResponse),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 422, response = dto::err_resps::BasicError422),
        (status = 500, response = dto::err_resps::BasicError500),
    )
)]
async fn update_task(
    user_id: i32,
    task_id: i32,
    update: dto::task::UpdateTask,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::task::driving_ports::TaskPort,
) -> Result<Json<TaskResponse>, ErrorResponse> {
    info!("Updating task {task_id} for user {user_id}");
    update.validate().map_err(ValidationErrorResponse::from)?;

    let task_read = persistence::db_task_driven_ports::DbReadTasks {};
    let list_read = persistence::db_list_driven_ports::DbReadLists {};
    let task_write = persistence::db_task_driven_ports::DbWriteTasks {};

    let detail = task_service
        .update_task(
            user_id,
            task_id,
            &update.into_domain(),
            &mut *ext_cxn,
            &task_read,
            &list_read,
            &task_write,
        )
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(Json(TaskResponse::from_detail(detail)))
}

/// Deletes a task owned by the authenticated user
#[utoipa::path(
    delete,
    path = "/tasks/{task_id}",
    tag = TASKS_API_GROUP,
    params(("task_id" = i32, Path, description = "ID of the task to delete")),
    responses(
        (status = 204, description = "Task removed"),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    )
)]
async fn delete_task(
    user_id: i32,
    task_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl domain::task::driving_ports::TaskPort,
) -> Result<StatusCode, ErrorResponse> {
    info!("Deleting task {task_id} for user {user_id}");
    let task_read = persistence::db_task_driven_ports::DbReadTasks {};
    let task_write = persistence::db_task_driven_ports::DbWriteTasks {};

    task_service
        .delete_task(user_id, task_id, &mut *ext_cxn, &task_read, &task_write)
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(StatusCode::NO_CONTENT)
}
