use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::delete;
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;

use crate::api::AuthenticatedUser;
use crate::external_connections::TransactableExternalConnectivity;
use crate::routing_utils::DomainErrorResponse;
use crate::{AppState, SharedData, domain, dto, persistence};

#[derive(OpenApi)]
#[openapi(paths(delete_own_account))]
pub struct UsersApi;

pub const USERS_API_GROUP: &str = "Users";

/// Builds a router for account self-management
pub fn user_routes() -> Router<Arc<SharedData>> {
    Router::new().route(
        "/me",
        delete(
            |State(app_data): AppState, user: AuthenticatedUser| async move {
                let mut ext_cxn = app_data.ext_cxn.clone();
                let user_service = domain::user::UserService {};

                delete_own_account(user.user_id, &mut ext_cxn, &user_service).await
            },
        ),
    )
}

/// Deletes the authenticated account along with all of its tasks, lists, and groups
#[utoipa::path(
    delete,
    path = "/users/me",
    tag = USERS_API_GROUP,
    responses(
        (status = 204, description = "Account and everything it owned removed"),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 500, response = dto::err_resps::BasicError500),
    )
)]
async fn delete_own_account(
    user_id: i32,
    ext_cxn: &mut impl TransactableExternalConnectivity,
    user_service: &impl domain::user::driving_ports::UserPort,
) -> Result<StatusCode, ErrorResponse> {
    info!("Deleting account {user_id} and everything it owns");

    let user_read = persistence::db_user_driven_ports::DbReadUsers {};
    let user_write = persistence::db_user_driven_ports::DbWriteUsers {};
    let task_write = persistence::db_task_driven_ports::DbWriteTasks {};
    let list_write = persistence::db_list_driven_ports::DbWriteLists {};
    let group_write = persistence::db_group_driven_ports::DbWriteGroups {};

    user_service
        .delete_account(
            user_id,
            &mut *ext_cxn,
            &user_read,
            &user_write,
            &task_write,
            &list_write,
            &group_write,
        )
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::test_util::MockUserService;
    use crate::external_connections;
    use axum::response::IntoResponse;
    use speculoos::prelude::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn happy_path() {
        let mut user_service_raw = MockUserService::new();
        let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();
        user_service_raw.delete_account_result.set_returned_result(Ok(()));
        let user_service = Mutex::new(user_service_raw);

        let delete_result = delete_own_account(5, &mut ext_cxn, &user_service).await;

        assert_that!(delete_result).is_ok_containing(StatusCode::NO_CONTENT);
        let locked_service = user_service.lock().expect("user service mutex poisoned");
        assert_eq!([5], locked_service.delete_account_result.calls());
    }

    #[tokio::test]
    async fn vanished_account_gets_404() {
        let mut user_service_raw = MockUserService::new();
        let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();
        user_service_raw
            .delete_account_result
            .set_returned_result(Err(domain::Error::DoesNotExist));
        let user_service = Mutex::new(user_service_raw);

        let delete_result = delete_own_account(5, &mut ext_cxn, &user_service).await;

        assert_eq!(
            StatusCode::NOT_FOUND,
            delete_result.into_response().status()
        );
    }
}
