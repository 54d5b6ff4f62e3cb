use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::{delete, get, patch, post};
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;
use validator::Validate;

use crate::api::AuthenticatedUser;
use crate::dto::group::{GroupResponse, GroupsResponse};
use crate::external_connections::{ExternalConnectivity, TransactableExternalConnectivity};
use crate::routing_utils::{DomainErrorResponse, Json, ValidationErrorResponse};
use crate::{AppState, SharedData, domain, dto, persistence};

#[derive(OpenApi)]
#[openapi(paths(get_groups, get_group, create_group, update_group, delete_group))]
pub struct GroupsApi;

pub const GROUPS_API_GROUP: &str = "Groups";

/// Builds a router for all the group routes
pub fn group_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/",
            get(
                |State(app_data): AppState, user: AuthenticatedUser| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let group_service = domain::group::GroupService {};

                    get_groups(user.user_id, &mut ext_cxn, &group_service).await
                },
            ),
        )
        .route(
            "/",
            post(
                |State(app_data): AppState,
                 user: AuthenticatedUser,
                 Json(new_group): Json<dto::group::NewGroup>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let group_service = domain::group::GroupService {};

                    create_group(user.user_id, new_group, &mut ext_cxn, &group_service).await
                },
            ),
        )
        .route(
            "/:group_id",
            get(
                |State(app_data): AppState,
                 user: AuthenticatedUser,
                 Path(group_id): Path<i32>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let group_service = domain::group::GroupService {};

                    get_group(user.user_id, group_id, &mut ext_cxn, &group_service).await
                },
            ),
        )
        .route(
            "/:group_id",
            patch(
                |State(app_data): AppState,
                 user: AuthenticatedUser,
                 Path(group_id): Path<i32>,
                 Json(update): Json<dto::group::UpdateGroup>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let group_service = domain::group::GroupService {};

                    update_group(user.user_id, group_id, update, &mut ext_cxn, &group_service)
                        .await
                },
            ),
        )
        .route(
            "/:group_id",
            delete(
                |State(app_data): AppState,
                 user: AuthenticatedUser,
                 Path(group_id): Path<i32>| async move {
                    let mut ext_cxn = app_data.ext_cxn.clone();
                    let group_service = domain::group::GroupService {};

                    delete_group(user.user_id, group_id, &mut ext_cxn, &group_service).await
                },
            ),
        )
}

/// Lists the authenticated user's groups with their member lists
#[utoipa::path(
    get,
    path = "/groups",
    tag = GROUPS_API_GROUP,
    responses(
        (status = 200, description = "The user's groups", body = GroupsResponse),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 500, response = dto::err_resps::BasicError500),
    )
)]
async fn get_groups(
    user_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    group_service: &impl domain::group::driving_ports::GroupPort,
) -> Result<Json<GroupsResponse>, ErrorResponse> {
    info!("Fetching groups for user {user_id}");
    let group_read = persistence::db_group_driven_ports::DbReadGroups {};
    let list_read = persistence::db_list_driven_ports::DbReadLists {};

    let details = group_service
        .groups_for_user(user_id, &mut *ext_cxn, &group_read, &list_read)
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(Json(GroupsResponse {
        groups: details
            .into_iter()
            .map(GroupResponse::from_detail)
            .collect(),
    }))
}

/// Fetches one of the authenticated user's groups
#[utoipa::path(
    get,
    path = "/groups/{group_id}",
    tag = GROUPS_API_GROUP,
    params(("group_id" = i32, Path, description = "ID of the group to fetch")),
    responses(
        (status = 200, description = "The requested group", body = GroupResponse),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    )
)]
async fn get_group(
    user_id: i32,
    group_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    group_service: &impl domain::group::driving_ports::GroupPort,
) -> Result<Json<GroupResponse>, ErrorResponse> {
    info!("Fetching group {group_id} for user {user_id}");
    let group_read = persistence::db_group_driven_ports::DbReadGroups {};
    let list_read = persistence::db_list_driven_ports::DbReadLists {};

    let detail = group_service
        .group_for_user(user_id, group_id, &mut *ext_cxn, &group_read, &list_read)
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(Json(GroupResponse::from_detail(detail)))
}

/// Creates a group for the authenticated user
#[utoipa::path(
    post,
    path = "/groups",
    tag = GROUPS_API_GROUP,
    request_body = dto::group::NewGroup,
    responses(
        (status = 201, description = "Group successfully created", body = GroupResponse),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 500, response = dto::err_resps::BasicError500),
    )
)]
async fn create_group(
    user_id: i32,
    new_group: dto::group::NewGroup,
    ext_cxn: &mut impl ExternalConnectivity,
    group_service: &impl domain::group::driving_ports::GroupPort,
) -> Result<(StatusCode, Json<GroupResponse>), ErrorResponse> {
    info!("Creating group for user {user_id}");
    new_group.validate().map_err(ValidationErrorResponse::from)?;

    let group_write = persistence::db_group_driven_ports::DbWriteGroups {};

    let detail = group_service
        .create_group(user_id, &new_group.into_domain(), &mut *ext_cxn, &group_write)
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok((
        StatusCode::CREATED,
        Json(GroupResponse::from_detail(detail)),
    ))
}

/// Partially updates one of the authenticated user's groups
#[utoipa::path(
    patch,
    path = "/groups/{group_id}",
    tag = GROUPS_API_GROUP,
    params(("group_id" = i32, Path, description = "ID of the group to update")),
    request_body = dto::group::UpdateGroup,
    responses(
        (status = 200, description = "The updated group", body = GroupResponse),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    )
)]
async fn update_group(
    user_id: i32,
    group_id: i32,
    update: dto::group::UpdateGroup,
    ext_cxn: &mut impl ExternalConnectivity,
    group_service: &impl domain::group::driving_ports::GroupPort,
) -> Result<Json<GroupResponse>, ErrorResponse> {
    info!("Updating group {group_id} for user {user_id}");
    update.validate().map_err(ValidationErrorResponse::from)?;

    let group_read = persistence::db_group_driven_ports::DbReadGroups {};
    let list_read = persistence::db_list_driven_ports::DbReadLists {};
    let group_write = persistence::db_group_driven_ports::DbWriteGroups {};

    let detail = group_service
        .update_group(
            user_id,
            group_id,
            &update.into_domain(),
            &mut *ext_cxn,
            &group_read,
            &list_read,
            &group_write,
        )
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(Json(GroupResponse::from_detail(detail)))
}

/// Deletes one of the authenticated user's groups, detaching its lists
#[utoipa::path(
    delete,
    path = "/groups/{group_id}",
    tag = GROUPS_API_GROUP,
    params(("group_id" = i32, Path, description = "ID of the group to delete")),
    responses(
        (status = 204, description = "Group removed, member lists detached"),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    )
)]
async fn delete_group(
    user_id: i32,
    group_id: i32,
    ext_cxn: &mut impl TransactableExternalConnectivity,
    group_service: &impl domain::group::driving_ports::GroupPort,
) -> Result<StatusCode, ErrorResponse> {
    info!("Deleting group {group_id} for user {user_id}");
    let group_read = persistence::db_group_driven_ports::DbReadGroups {};
    let group_write = persistence::db_group_driven_ports::DbWriteGroups {};
    let list_write = persistence::db_list_driven_ports::DbWriteLists {};

    group_service
        .delete_group(
            user_id,
            group_id,
            &mut *ext_cxn,
            &group_read,
            &group_write,
            &list_write,
        )
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_util::deserialize_body;
    use crate::domain::group::test_util::{MockGroupService, group_from_create};
    use crate::external_connections;
    use axum::response::IntoResponse;
    use serde_json::json;
    use speculoos::prelude::*;
    use std::sync::Mutex;

    fn sample_detail() -> domain::group::GroupDetail {
        domain::group::GroupDetail {
            group: group_from_create(
                1,
                2,
                &domain::group::NewGroup {
                    title: "Household".to_owned(),
                },
            ),
            task_lists: Vec::new(),
        }
    }

    mod get_groups {
        use super::*;

        #[tokio::test]
        async fn happy_path() {
            let mut group_service_raw = MockGroupService::new();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();
            group_service_raw
                .groups_for_user_result
                .set_returned_result(Ok(vec![sample_detail()]));
            let group_service = Mutex::new(group_service_raw);

            let fetch_result = get_groups(1, &mut ext_cxn, &group_service).await;

            let response = fetch_result.into_response();
            assert_eq!(StatusCode::OK, response.status());
            let body: GroupsResponse = deserialize_body(response.into_body()).await;
            assert_eq!(1, body.groups.len());
            assert_eq!("Household", body.groups[0].title);
        }
    }

    mod create_group {
        use super::*;

        #[tokio::test]
        async fn happy_path() {
            let mut group_service_raw = MockGroupService::new();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();
            group_service_raw
                .create_group_result
                .set_returned_result(Ok(sample_detail()));
            let group_service = Mutex::new(group_service_raw);

            let new_group: dto::group::NewGroup =
                serde_json::from_value(json!({ "title": "Household" }))
                    .expect("deserialization should succeed");

            let create_result = create_group(1, new_group, &mut ext_cxn, &group_service).await;

            assert_eq!(StatusCode::CREATED, create_result.into_response().status());
            let locked_service = group_service.lock().expect("group service mutex poisoned");
            assert!(matches!(
                locked_service.create_group_result.calls(),
                [(1, domain::group::NewGroup { title })] if title == "Household"
            ));
        }
    }

    mod update_group {
        use super::*;

        #[tokio::test]
        async fn missing_group_gets_404() {
            let mut group_service_raw = MockGroupService::new();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();
            group_service_raw
                .update_group_result
                .set_returned_result(Err(domain::Error::DoesNotExist));
            let group_service = Mutex::new(group_service_raw);

            let update: dto::group::UpdateGroup =
                serde_json::from_value(json!({ "title": "Renamed" }))
                    .expect("deserialization should succeed");

            let update_result = update_group(1, 44, update, &mut ext_cxn, &group_service).await;

            assert_eq!(
                StatusCode::NOT_FOUND,
                update_result.into_response().status()
            );
        }
    }

    mod delete_group {
        use super::*;

        #[tokio::test]
        async fn happy_path() {
            let mut group_service_raw = MockGroupService::new();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();
            group_service_raw.delete_group_result.set_returned_result(Ok(()));
            let group_service = Mutex::new(group_service_raw);

            let delete_result = delete_group(1, 2, &mut ext_cxn, &group_service).await;

            assert_that!(delete_result).is_ok_containing(StatusCode::NO_CONTENT);
            let locked_service = group_service.lock().expect("group service mutex poisoned");
            assert_eq!([(1, 2)], locked_service.delete_group_result.calls());
        }
    }
}
