use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain;
use crate::dto::double_option;
use crate::dto::group::GroupSummary;
use crate::dto::task::TaskResponse;

/// DTO for creating a new task list via the API
#[derive(Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct NewTaskList {
    #[validate(length(min = 3, max = 50))]
    #[schema(example = "Weekend chores")]
    pub title: String,
    #[schema(example = 2)]
    pub group_id: Option<i32>,
}

impl NewTaskList {
    pub fn into_domain(self) -> domain::task_list::NewTaskList {
        domain::task_list::NewTaskList {
            title: self.title,
            group_id: self.group_id,
        }
    }
}

/// DTO for partially updating a task list. An explicit null group_id detaches
/// the list from its group.
#[derive(Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct UpdateTaskList {
    #[validate(length(min = 3, max = 50))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub group_id: Option<Option<i32>>,
}

impl UpdateTaskList {
    pub fn into_domain(self) -> domain::task_list::UpdateTaskList {
        domain::task_list::UpdateTaskList {
            title: self.title,
            group_id: self.group_id,
        }
    }
}

/// Abbreviated list representation nested inside task payloads
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct ListSummary {
    #[schema(example = 3)]
    pub id: i32,
    #[schema(example = "Weekend chores")]
    pub title: String,
}

impl From<domain::task_list::TaskList> for ListSummary {
    fn from(value: domain::task_list::TaskList) -> Self {
        ListSummary {
            id: value.id,
            title: value.title,
        }
    }
}

/// DTO for a task list. Top-level list payloads embed their tasks and group
/// reference; lists nested inside a group omit both to break the render cycle.
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct ListResponse {
    #[schema(example = 3)]
    pub id: i32,
    #[schema(example = "Weekend chores")]
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(test, serde(default))]
    pub tasks: Option<Vec<TaskResponse>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(test, serde(default))]
    pub group: Option<Option<GroupSummary>>,
}

impl ListResponse {
    /// Renders a top-level list with its tasks and group reference present
    pub fn from_detail(detail: domain::task_list::ListDetail) -> ListResponse {
        let tasks = detail
            .tasks
            .into_iter()
            .map(TaskResponse::embedded)
            .collect();
        let group_summary = detail.group.map(GroupSummary::from);

        ListResponse {
            tasks: Some(tasks),
            group: Some(group_summary),
            ..Self::embedded(detail.list)
        }
    }

    /// Renders a list nested inside its group, omitting tasks and the group reference
    pub fn embedded(list: domain::task_list::TaskList) -> ListResponse {
        ListResponse {
            id: list.id,
            title: list.title,
            created_at: list.created_at,
            updated_at: list.updated_at,
            tasks: None,
            group: None,
        }
    }
}

/// Envelope for list collection endpoints
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct ListsResponse {
    pub lists: Vec<ListResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::test_util::task_from_create;
    use crate::domain::task_list::test_util::list_from_create;
    use serde_json::{Value, json};

    fn sample_detail() -> domain::task_list::ListDetail {
        let list = list_from_create(
            1,
            3,
            &domain::task_list::NewTaskList {
                title: "Weekend chores".to_owned(),
                group_id: None,
            },
        );
        let task = task_from_create(
            1,
            7,
            &domain::task::NewTask {
                title: "Mow the lawn".to_owned(),
                note: String::new(),
                completed: false,
                due_date: None,
                list_id: Some(3),
            },
        );

        domain::task_list::ListDetail {
            list,
            tasks: vec![task],
            group: None,
        }
    }

    #[test]
    fn top_level_list_nests_its_tasks_without_list_references() {
        let serialized = serde_json::to_value(ListResponse::from_detail(sample_detail()))
            .expect("serialization should succeed");

        assert_eq!(json!(null), serialized["group"]);
        assert_eq!(json!("Mow the lawn"), serialized["tasks"][0]["title"]);
        let Value::Object(ref task_fields) = serialized["tasks"][0] else {
            panic!("nested task should be an object");
        };
        assert!(!task_fields.contains_key("list"));
    }

    #[test]
    fn embedded_list_omits_tasks_and_group() {
        let detail = sample_detail();
        let serialized = serde_json::to_value(ListResponse::embedded(detail.list))
            .expect("serialization should succeed");

        let Value::Object(fields) = serialized else {
            panic!("list should serialize to an object");
        };
        assert!(!fields.contains_key("tasks"));
        assert!(!fields.contains_key("group"));
    }

    #[test]
    fn update_distinguishes_absent_from_null_group() {
        let detached: UpdateTaskList = serde_json::from_value(json!({ "group_id": null }))
            .expect("deserialization should succeed");
        assert_eq!(Some(None), detached.group_id);

        let untouched: UpdateTaskList = serde_json::from_value(json!({ "title": "Renamed" }))
            .expect("deserialization should succeed");
        assert!(untouched.group_id.is_none());
    }
}
