pub mod group;
pub mod task;
pub mod task_list;
pub mod user;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use utoipa::OpenApi;
use validator::ValidationError;

/// Error response documentation for OpenAPI, one type per status code the API
/// actually produces. The wire format is [crate::routing_utils::BasicErrorResponse].
pub mod err_resps {
    use serde::Serialize;
    use utoipa::{ToResponse, ToSchema};

    #[derive(Serialize, ToSchema, ToResponse)]
    #[response(
        description = "Submitted data was invalid (400)",
        example = json!({
            "error_code": "invalid_input",
            "error_description": "Submitted data was invalid.",
            "extra_info": { "title": [ { "code": "length", "message": null, "params": { "min": 3, "max": 255 } } ] }
        })
    )]
    pub struct BasicError400 {
        pub error_code: String,
        pub error_description: String,
        pub extra_info: Option<serde_json::Value>,
    }

    #[derive(Serialize, ToSchema, ToResponse)]
    #[response(
        description = "A valid bearer token is required (401)",
        example = json!({
            "error_code": "unauthenticated",
            "error_description": "A valid bearer token is required to access this resource.",
            "extra_info": null
        })
    )]
    pub struct BasicError401 {
        pub error_code: String,
        pub error_description: String,
        pub extra_info: Option<serde_json::Value>,
    }

    #[derive(Serialize, ToSchema, ToResponse)]
    #[response(
        description = "Entity could not be found (404)",
        example = json!({
            "error_code": "not_found",
            "error_description": "The requested entity could not be found.",
            "extra_info": null
        })
    )]
    pub struct BasicError404 {
        pub error_code: String,
        pub error_description: String,
        pub extra_info: Option<serde_json::Value>,
    }

    #[derive(Serialize, ToSchema, ToResponse)]
    #[response(
        description = "A unique field collided with an existing record (409)",
        example = json!({
            "error_code": "conflict",
            "error_description": "email is already taken.",
            "extra_info": null
        })
    )]
    pub struct BasicError409 {
        pub error_code: String,
        pub error_description: String,
        pub extra_info: Option<serde_json::Value>,
    }

    #[derive(Serialize, ToSchema, ToResponse)]
    #[response(
        description = "The request referenced an entity that doesn't exist (422)",
        example = json!({
            "error_code": "invalid_reference",
            "error_description": "The referenced list does not exist.",
            "extra_info": null
        })
    )]
    pub struct BasicError422 {
        pub error_code: String,
        pub error_description: String,
        pub extra_info: Option<serde_json::Value>,
    }

    #[derive(Serialize, ToSchema, ToResponse)]
    #[response(
        description = "Something unexpected went wrong inside the server (500)",
        example = json!({
            "error_code": "internal_error",
            "error_description": "Could not access data to complete your request",
            "extra_info": null
        })
    )]
    pub struct BasicError500 {
        pub error_code: String,
        pub error_description: String,
        pub extra_info: Option<serde_json::Value>,
    }
}

/// Bundles up the OpenAPI definitions of the shared DTO schemas for the swagger UI
#[derive(OpenApi)]
#[openapi(components(
    schemas(
        user::RegisterUser,
        user::UserResponse,
        user::LoginRequest,
        user::TokenResponse,
        task::NewTask,
        task::UpdateTask,
        task::TaskResponse,
        task::TasksResponse,
        task_list::NewTaskList,
        task_list::UpdateTaskList,
        task_list::ListSummary,
        task_list::ListResponse,
        task_list::ListsResponse,
        group::NewGroup,
        group::UpdateGroup,
        group::GroupSummary,
        group::GroupResponse,
        group::GroupsResponse,
    ),
    responses(
        err_resps::BasicError400,
        err_resps::BasicError401,
        err_resps::BasicError404,
        err_resps::BasicError409,
        err_resps::BasicError422,
        err_resps::BasicError500,
    )
))]
pub struct OpenApiSchemas;

/// Wire format for task due dates
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Deserializer distinguishing an absent PATCH field (`None`) from an explicit null
/// (`Some(None)`). Used together with `#[serde(default)]` on double-option fields.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Validator for date fields which arrive as strings
pub(crate) fn validate_date(value: &str) -> Result<(), ValidationError> {
    if NaiveDate::parse_from_str(value, DATE_FORMAT).is_ok() {
        return Ok(());
    }

    let mut date_error = ValidationError::new("date_format");
    date_error.message = Some("dates must be formatted as YYYY-MM-DD".into());
    Err(date_error)
}

/// Parses an already-validated date string, dropping anything unparseable
pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}
