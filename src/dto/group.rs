use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain;
use crate::dto::task_list::ListResponse;

/// DTO for creating a new group via the API
#[derive(Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct NewGroup {
    #[validate(length(min = 3, max = 50))]
    #[schema(example = "Household")]
    pub title: String,
}

impl NewGroup {
    pub fn into_domain(self) -> domain::group::NewGroup {
        domain::group::NewGroup { title: self.title }
    }
}

/// DTO for partially updating a group
#[derive(Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct UpdateGroup {
    #[validate(length(min = 3, max = 50))]
    pub title: Option<String>,
}

impl UpdateGroup {
    pub fn into_domain(self) -> domain::group::UpdateGroup {
        domain::group::UpdateGroup { title: self.title }
    }
}

/// Abbreviated group representation nested inside list payloads
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct GroupSummary {
    #[schema(example = 2)]
    pub id: i32,
    #[schema(example = "Household")]
    pub title: String,
}

impl From<domain::group::Group> for GroupSummary {
    fn from(value: domain::group::Group) -> Self {
        GroupSummary {
            id: value.id,
            title: value.title,
        }
    }
}

/// DTO for a group with its member lists. The nested lists omit their own task
/// and group payloads to break the render cycle.
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct GroupResponse {
    #[schema(example = 2)]
    pub id: i32,
    #[schema(example = "Household")]
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub task_lists: Vec<ListResponse>,
}

impl GroupResponse {
    pub fn from_detail(detail: domain::group::GroupDetail) -> GroupResponse {
        GroupResponse {
            id: detail.group.id,
            title: detail.group.title,
            created_at: detail.group.created_at,
            updated_at: detail.group.updated_at,
            task_lists: detail
                .task_lists
                .into_iter()
                .map(ListResponse::embedded)
                .collect(),
        }
    }
}

/// Envelope for group collection endpoints
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct GroupsResponse {
    pub groups: Vec<GroupResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::group::test_util::group_from_create;
    use crate::domain::task_list::test_util::list_from_create;
    use serde_json::Value;

    #[test]
    fn nested_lists_stay_shallow() {
        let group = group_from_create(
            1,
            2,
            &domain::group::NewGroup {
                title: "Household".to_owned(),
            },
        );
        let list = list_from_create(
            1,
            3,
            &domain::task_list::NewTaskList {
                title: "Weekend chores".to_owned(),
                group_id: Some(2),
            },
        );

        let serialized = serde_json::to_value(GroupResponse::from_detail(
            domain::group::GroupDetail {
                group,
                task_lists: vec![list],
            },
        ))
        .expect("serialization should succeed");

        let Value::Object(ref list_fields) = serialized["task_lists"][0] else {
            panic!("nested list should be an object");
        };
        assert!(!list_fields.contains_key("tasks"));
        assert!(!list_fields.contains_key("group"));
    }
}
