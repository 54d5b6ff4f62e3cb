use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_macros::FromRequest;

use serde::Serialize;
use tracing::error;
use utoipa::openapi::{RefOr, Schema};
use utoipa::{ToResponse, ToSchema, openapi};

use validator::ValidationErrors;

use crate::domain;

/// Contains diagnostic information about an API failure
#[derive(Serialize, Debug, ToResponse)]
#[response(examples(
    ("Not Found" = (
        summary = "Entity could not be found (404)",
        value = json!({
            "error_code": "not_found",
            "error_description": "The requested entity could not be found.",
            "extra_info": null
        })
    )),

    ("Conflict" = (
        summary = "A unique field collided with an existing record (409)",
        value = json!({
            "error_code": "conflict",
            "error_description": "email is already taken.",
            "extra_info": null
        })
    )),

    ("Invalid Reference" = (
        summary = "The request referenced an entity that doesn't exist (422)",
        value = json!({
            "error_code": "invalid_reference",
            "error_description": "The referenced list does not exist.",
            "extra_info": null
        })
    )),

    ("Internal Failure" = (
        summary = "Something unexpected went wrong inside the server (500)",
        value = json!({
            "error_code": "internal_error",
            "error_description": "Could not access data to complete your request",
            "extra_info": null
        })
    )),

    ("Invalid Input" = (
        summary = "Invalid request body was passed (400)",
        value = json!({
            "error_code": "invalid_input",
            "error_description": "Submitted data was invalid.",
            "extra_info": {
                "title": [
                    {
                        "code": "length",
                        "message": null,
                        "params": {
                            "value": "hi",
                            "min": 3,
                            "max": 255
                        }
                    }
                ]
            }
        })
    )),

    ("Unauthenticated" = (
        summary = "Missing or unusable bearer token (401)",
        value = json!({
            "error_code": "unauthenticated",
            "error_description": "A valid bearer token is required to access this resource.",
            "extra_info": null
        })
    )),

    ("Malformed JSON" = (
        summary = "Invalid JSON passed to server (400)",
        value = json!({
            "error_code": "invalid_json",
            "error_description": "The passed request body contained malformed or unreadable JSON.",
            "extra_info": "Failed to parse the request body as JSON: EOF while parsing an object at line 4 column 0"
        })
    ))
))]
pub struct BasicErrorResponse {
    error_code: String,
    error_description: String,
    extra_info: Option<ExtraInfo>,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(untagged)]
pub enum ExtraInfo {
    ValidationIssues(ValidationErrorSchema),
    Message(String),
}

/// Stand-in OpenAPI schema for [ValidationErrors] which just provides an empty object
#[derive(Serialize, Debug)]
#[serde(transparent)]
pub struct ValidationErrorSchema(ValidationErrors);

impl<'schem> ToSchema<'schem> for ValidationErrorSchema {
    fn schema() -> (&'schem str, RefOr<Schema>) {
        (
            "ValidationErrorSchema",
            openapi::ObjectBuilder::new().into(),
        )
    }
}

/// Response type that translates every [domain::Error] into a [BasicErrorResponse]
/// with the matching status code
pub enum DomainErrorResponse {
    Invalid(ValidationErrors),
    NotFound,
    Conflict(&'static str),
    InvalidReference(&'static str),
    Internal,
}

impl IntoResponse for DomainErrorResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Invalid(errors) => ValidationErrorResponse::from(errors).into_response(),

            Self::NotFound => (
                StatusCode::NOT_FOUND,
                Json(BasicErrorResponse {
                    error_code: "not_found".into(),
                    error_description: "The requested entity could not be found.".into(),
                    extra_info: None,
                }),
            )
                .into_response(),

            Self::Conflict(field) => (
                StatusCode::CONFLICT,
                Json(BasicErrorResponse {
                    error_code: "conflict".into(),
                    error_description: format!("{field} is already taken."),
                    extra_info: None,
                }),
            )
                .into_response(),

            Self::InvalidReference(entity) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(BasicErrorResponse {
                    error_code: "invalid_reference".into(),
                    error_description: format!("The referenced {entity} does not exist."),
                    extra_info: None,
                }),
            )
                .into_response(),

            Self::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(BasicErrorResponse {
                    error_code: "internal_error".into(),
                    error_description: "Could not access data to complete your request".into(),
                    extra_info: None,
                }),
            )
                .into_response(),
        }
    }
}

impl From<domain::Error> for DomainErrorResponse {
    fn from(value: domain::Error) -> Self {
        match value {
            domain::Error::Invalid(errors) => Self::Invalid(errors),
            domain::Error::DoesNotExist => Self::NotFound,
            domain::Error::Conflict { field } => Self::Conflict(field),
            domain::Error::InvalidReference { entity } => Self::InvalidReference(entity),
            domain::Error::RetrieveFailure { ref action, ref cause } => {
                error!("Failed to {action}: {cause}");
                Self::Internal
            }
        }
    }
}

/// Response type for failures outside the domain error taxonomy, such as a broken
/// password hasher or token signer
pub struct GenericErrorResponse(pub anyhow::Error);

impl IntoResponse for GenericErrorResponse {
    fn into_response(self) -> Response {
        error!("Unexpected request handling failure: {}", self.0);
        DomainErrorResponse::Internal.into_response()
    }
}

/// Response type that wraps validation errors and turns them into [BasicErrorResponse]s
pub struct ValidationErrorResponse(ValidationErrors);

impl IntoResponse for ValidationErrorResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(BasicErrorResponse {
                error_code: "invalid_input".into(),
                error_description: "Submitted data was invalid.".to_owned(),
                extra_info: Some(ExtraInfo::ValidationIssues(ValidationErrorSchema(self.0))),
            }),
        )
            .into_response()
    }
}

impl From<ValidationErrors> for ValidationErrorResponse {
    fn from(value: ValidationErrors) -> Self {
        Self(value)
    }
}

/// Response type for requests lacking a usable bearer token
pub struct UnauthenticatedResponse;

impl IntoResponse for UnauthenticatedResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(BasicErrorResponse {
                error_code: "unauthenticated".into(),
                error_description: "A valid bearer token is required to access this resource."
                    .into(),
                extra_info: None,
            }),
        )
            .into_response()
    }
}

/// Wrapper for [axum::Json] which customizes the error response to use our
/// data structure for API errors
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(JsonErrorResponse))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Response type representing JSON parse errors
pub struct JsonErrorResponse {
    parse_problem: String,
}

impl From<JsonRejection> for JsonErrorResponse {
    fn from(value: JsonRejection) -> Self {
        JsonErrorResponse {
            parse_problem: value.body_text(),
        }
    }
}

impl IntoResponse for JsonErrorResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            axum::Json(BasicErrorResponse {
                error_code: "invalid_json".into(),
                error_description:
                    "The passed request body contained malformed or unreadable JSON.".into(),
                extra_info: Some(ExtraInfo::Message(self.parse_problem)),
            }),
        )
            .into_response()
    }
}
