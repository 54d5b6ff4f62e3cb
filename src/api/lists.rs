use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::{delete, get, patch, post};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;
use validator::Validate;

use crate::api::AuthenticatedUser;
use crate::dto::task_list::{ListResponse, ListsResponse};
use crate::external_connections::{ExternalConnectivity, TransactableExternalConnectivity};
use crate::routing_utils::{DomainErrorResponse, Json, ValidationErrorResponse};
use crate::{AppState, SharedData, domain, dto, persistence};

#[derive(OpenApi)]
#[openapi(paths(get_lists, get_list, create_list, update_list, delete_list))]
pub struct ListsApi;

pub const LISTS_API_GROUP: &str = "Lists";

#[derive(Deserialize)]
struct ListsQuery {
    group_id: Option<i32>,
}

/// Builds a router for all the task list routes
pub fn list_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/",
            get(
                |State(app_data): AppState,
                 user: AuthenticatedUser,
                 Query(query): Query<ListsQuery>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let list_service = domain::task_list::ListService {};

                    get_lists(user.user_id, query.group_id, &mut ext_cxn, &list_service).await
                },
            ),
        )
        .route(
            "/",
            post(
                |State(app_data): AppState,
                 user: AuthenticatedUser,
                 Json(new_list): Json<dto::task_list::NewTaskList>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let list_service = domain::task_list::ListService {};

                    create_list(user.user_id, new_list, &mut ext_cxn, &list_service).await
                },
            ),
        )
        .route(
            "/:list_id",
            get(
                |State(app_data): AppState,
                 user: AuthenticatedUser,
                 Path(list_id): Path<i32>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let list_service = domain::task_list::ListService {};

                    get_list(user.user_id, list_id, &mut ext_cxn, &list_service).await
                },
            ),
        )
        .route(
            "/:list_id",
            patch(
                |State(app_data): AppState,
                 user: AuthenticatedUser,
                 Path(list_id): Path<i32>,
                 Json(update): Json<dto::task_list::UpdateTaskList>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let list_service = domain::task_list::ListService {};

                    update_list(user.user_id, list_id, update, &mut ext_cxn, &list_service).await
                },
            ),
        )
        .route(
            "/:list_id",
            delete(
                |State(app_data): AppState,
                 user: AuthenticatedUser,
                 Path(list_id): Path<i32>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let list_service = domain::task_list::ListService {};

                    delete_list(user.user_id, list_id, &mut ext_cxn, &list_service).await
                },
            ),
        )
}

/// Lists the authenticated user's task lists, optionally filtered to one group
#[utoipa::path(
    get,
    path = "/lists",
    tag = LISTS_API_GROUP,
    params(("group_id" = Option<i32>, Query, description = "Only return lists in this group")),
    responses(
        (status = 200, description = "The user's lists", body = ListsResponse),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 500, response = dto::err_resps::BasicError500),
    )
)]
async fn get_lists(
    user_id: i32,
    group_filter: Option<i32>,
    ext_cxn: &mut impl ExternalConnectivity,
    list_service: &impl domain::task_list::driving_ports::ListPort,
) -> Result<Json<ListsResponse>, ErrorResponse> {
    info!("Fetching lists for user {user_id}");
    let list_read = persistence::db_list_driven_ports::DbReadLists {};
    let task_read = persistence::db_task_driven_ports::DbReadTasks {};
    let group_read = persistence::db_group_driven_ports::DbReadGroups {};

    let details = list_service
        .lists_for_user(
            user_id,
            group_filter,
            &mut *ext_cxn,
            &list_read,
            &task_read,
            &group_read,
        )
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(Json(ListsResponse {
        lists: details.into_iter().map(ListResponse::from_detail).collect(),
    }))
}

/// Fetches one of the authenticated user's lists with its tasks and group
#[utoipa::path(
    get,
    path = "/lists/{list_id}",
    tag = LISTS_API_GROUP,
    params(("list_id" = i32, Path, description = "ID of the list to fetch")),
    responses(
        (status = 200, description = "The requested list", body = ListResponse),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    )
)]
async fn get_list(
    user_id: i32,
    list_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    list_service: &impl domain::task_list::driving_ports::ListPort,
) -> Result<Json<ListResponse>, ErrorResponse> {
    info!("Fetching list {list_id} for user {user_id}");
    let list_read = persistence::db_list_driven_ports::DbReadLists {};
    let task_read = persistence::db_task_driven_ports::DbReadTasks {};
    let group_read = persistence::db_group_driven_ports::DbReadGroups {};

    let detail = list_service
        .list_for_user(
            user_id,
            list_id,
            &mut *ext_cxn,
            &list_read,
            &task_read,
            &group_read,
        )
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(Json(ListResponse::from_detail(detail)))
}

/// Creates a task list for the authenticated user. An unresolvable group_id is
/// dropped rather than rejected.
#[utoipa::path(
    post,
    path = "/lists",
    tag = LISTS_API_GROUP,
    request_body = dto::task_list::NewTaskList,
    responses(
        (status = 201, description = "List successfully created", body = ListResponse),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 500, response = dto::err_resps::BasicError500),
    )
)]
async fn create_list(
    user_id: i32,
    new_list: dto::task_list::NewTaskList,
    ext_cxn: &mut impl ExternalConnectivity,
    list_service: &impl domain::task_list::driving_ports::ListPort,
) -> Result<(StatusCode, Json<ListResponse>), ErrorResponse> {
    info!("Creating list for user {user_id}");
    new_list.validate().map_err(ValidationErrorResponse::from)?;

    let group_read = persistence::db_group_driven_ports::DbReadGroups {};
    let list_write = persistence::db_list_driven_ports::DbWriteLists {};

    let detail = list_service
        .create_list(
            user_id,
            &new_list.into_domain(),
            &mut *ext_cxn,
            &group_read,
            &list_write,
        )
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok((StatusCode::CREATED, Json(ListResponse::from_detail(detail))))
}

/// Partially updates one of the authenticated user's lists
#[utoipa::path(
    patch,
    path = "/lists/{list_id}",
    tag = LISTS_API_GROUP,
    params(("list_id" = i32, Path, description = "ID of the list to update")),
    request_body = dto::task_list::UpdateTaskList,
    responses(
        (status = 200, description = "The updated list", body = ListResponse),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    )
)]
async fn update_list(
    user_id: i32,
    list_id: i32,
    update: dto::task_list::UpdateTaskList,
    ext_cxn: &mut impl ExternalConnectivity,
    list_service: &impl domain::task_list::driving_ports::ListPort,
) -> Result<Json<ListResponse>, ErrorResponse> {
    info!("Updating list {list_id} for user {user_id}");
    update.validate().map_err(ValidationErrorResponse::from)?;

    let list_read = persistence::db_list_driven_ports::DbReadLists {};
    let task_read = persistence::db_task_driven_ports::DbReadTasks {};
    let group_read = persistence::db_group_driven_ports::DbReadGroups {};
    let list_write = persistence::db_list_driven_ports::DbWriteLists {};

    let detail = list_service
        .update_list(
            user_id,
            list_id,
            &update.into_domain(),
            &mut *ext_cxn,
            &list_read,
            &task_read,
            &group_read,
            &list_write,
        )
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(Json(ListResponse::from_detail(detail)))
}

/// Deletes one of the authenticated user's lists along with every task inside it
#[utoipa::path(
    delete,
    path = "/lists/{list_id}",
    tag = LISTS_API_GROUP,
    params(("list_id" = i32, Path, description = "ID of the list to delete")),
    responses(
        (status = 204, description = "List and its tasks removed"),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    )
)]
async fn delete_list(
    user_id: i32,
    list_id: i32,
    ext_cxn: &mut impl TransactableExternalConnectivity,
    list_service: &impl domain::task_list::driving_ports::ListPort,
) -> Result<StatusCode, ErrorResponse> {
    info!("Deleting list {list_id} for user {user_id}");
    let list_read = persistence::db_list_driven_ports::DbReadLists {};
    let list_write = persistence::db_list_driven_ports::DbWriteLists {};
    let task_write = persistence::db_task_driven_ports::DbWriteTasks {};

    list_service
        .delete_list(
            user_id,
            list_id,
            &mut *ext_cxn,
            &list_read,
            &list_write,
            &task_write,
        )
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(StatusCode::NO_CONTENT)
}
