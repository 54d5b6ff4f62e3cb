use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain;
use crate::dto::task_list::ListSummary;
use crate::dto::{double_option, parse_date, validate_date};

/// DTO for creating a new task via the API
#[derive(Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct NewTask {
    #[validate(length(min = 3, max = 255))]
    #[schema(example = "Buy groceries")]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub note: String,
    #[serde(default)]
    pub completed: bool,
    #[validate(custom = "validate_date")]
    #[schema(example = "2025-01-06")]
    pub due_date: Option<String>,
    #[schema(example = 3)]
    pub list_id: Option<i32>,
}

impl NewTask {
    /// Converts into the domain representation. Call after validation; the due date
    /// has already been checked against the wire format by then.
    pub fn into_domain(self) -> domain::task::NewTask {
        domain::task::NewTask {
            title: self.title,
            note: self.note,
            completed: self.completed,
            due_date: self.due_date.as_deref().and_then(parse_date),
            list_id: self.list_id,
        }
    }
}

/// DTO for partially updating a task. Omitted fields stay untouched; an explicit
/// null on due_date or list_id clears the field.
#[derive(Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct UpdateTask {
    #[validate(length(min = 3, max = 255))]
    pub title: Option<String>,
    #[validate(length(max = 1000))]
    pub note: Option<String>,
    pub completed: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(custom = "validate_date")]
    pub due_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub list_id: Option<Option<i32>>,
}

impl UpdateTask {
    pub fn into_domain(self) -> domain::task::UpdateTask {
        domain::task::UpdateTask {
            title: self.title,
            note: self.note,
            completed: self.completed,
            due_date: self
                .due_date
                .map(|maybe_date| maybe_date.as_deref().and_then(parse_date)),
            list_id: self.list_id,
        }
    }
}

/// DTO for a task. The `list` field only appears on top-level task payloads;
/// tasks embedded inside a list omit it to break the render cycle.
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct TaskResponse {
    #[schema(example = 7)]
    pub id: i32,
    #[schema(example = "Buy groceries")]
    pub title: String,
    pub note: String,
    pub completed: bool,
    #[schema(example = "2025-01-06")]
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(test, serde(default))]
    pub list: Option<Option<ListSummary>>,
}

impl TaskResponse {
    /// Renders a top-level task with its list reference present (object or null)
    pub fn from_detail(detail: domain::task::TaskDetail) -> TaskResponse {
        let list_summary = detail.list.map(ListSummary::from);
        TaskResponse {
            list: Some(list_summary),
            ..Self::embedded(detail.task)
        }
    }

    /// Renders a task nested inside its list, omitting the list reference
    pub fn embedded(task: domain::task::Task) -> TaskResponse {
        TaskResponse {
            id: task.id,
            title: task.title,
            note: task.note,
            completed: task.completed,
            due_date: task.due_date,
            created_at: task.created_at,
            updated_at: task.updated_at,
            list: None,
        }
    }
}

/// Envelope for task collection endpoints
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct TasksResponse {
    pub tasks: Vec<TaskResponse>,
}
