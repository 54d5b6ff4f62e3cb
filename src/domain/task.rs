use crate::domain::task_list::TaskList;
use crate::domain::{Error, task_list};
use crate::external_connections::ExternalConnectivity;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;

/// A single to-do item, optionally attached to one of its owner's task lists.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Task {
    pub id: i32,
    pub user_id: i32,
    pub list_id: Option<i32>,
    pub title: String,
    pub note: String,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg_attr(test, derive(Clone, Debug))]
pub struct NewTask {
    pub title: String,
    pub note: String,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
    pub list_id: Option<i32>,
}

/// Partial update. `None` leaves a field untouched; for the nullable fields the inner
/// option distinguishes "clear it" (`Some(None)`) from a new value.
#[cfg_attr(test, derive(Clone, Debug))]
pub struct UpdateTask {
    pub title: Option<String>,
    pub note: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<Option<NaiveDate>>,
    pub list_id: Option<Option<i32>>,
}

impl Task {
    /// Applies the supplied fields of a partial update and re-stamps the update timestamp.
    pub fn apply_update(&mut self, update: &UpdateTask) {
        if let Some(ref title) = update.title {
            self.title = title.clone();
        }
        if let Some(ref note) = update.note {
            self.note = note.clone();
        }
        if let Some(completed) = update.completed {
            self.completed = completed;
        }
        if let Some(due_date) = update.due_date {
            self.due_date = due_date;
        }
        if let Some(list_id) = update.list_id {
            self.list_id = list_id;
        }
        self.updated_at = Utc::now();
    }
}

/// A task together with the list it belongs to, resolved for serialization.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TaskDetail {
    pub task: Task,
    pub list: Option<TaskList>,
}

pub mod driven_ports {
    use super::*;

    pub trait TaskReader {
        /// All of one user's tasks, in stable insertion order
        async fn all_for_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<Task>, anyhow::Error>;

        async fn for_user_by_id(
            &self,
            user_id: i32,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<Task>, anyhow::Error>;
    }

    pub trait TaskWriter {
        /// Persists a new task stamped with the owner and the current time
        async fn create(
            &self,
            user_id: i32,
            new_task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Task, anyhow::Error>;

        /// Persists the mutable fields of an already-loaded task
        async fn save(
            &self,
            task: &Task,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;

        async fn delete(
            &self,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;

        /// Removes every task referencing the given list (list-delete cascade)
        async fn delete_in_list(
            &self,
            list_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;

        /// Removes every task a user owns (account-delete cascade)
        async fn delete_for_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;

    pub trait TaskPort {
        async fn tasks_for_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
            list_read: &impl task_list::driven_ports::ListReader,
        ) -> Result<Vec<TaskDetail>, Error>;

        async fn task_for_user(
            &self,
            user_id: i32,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
            list_read: &impl task_list::driven_ports::ListReader,
        ) -> Result<Option<TaskDetail>, Error>;

        /// Creates a task. A supplied list_id must resolve to a list owned by the same
        /// user, otherwise the whole operation fails with [Error::InvalidReference].
        async fn create_task(
            &self,
            user_id: i32,
            new_task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
            list_read: &impl task_list::driven_ports::ListReader,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<TaskDetail, Error>;

        /// Partially updates a task, enforcing the same strict list_id policy as create
        async fn update_task(
            &self,
            user_id: i32,
            task_id: i32,
            update: &UpdateTask,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
            list_read: &impl task_list::driven_ports::ListReader,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<TaskDetail, Error>;

        async fn delete_task(
            &self,
            user_id: i32,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<(), Error>;
    }
}

pub struct TaskService {}

/// Resolves the owner's list with the given id, failing with [Error::InvalidReference]
/// when it doesn't exist or belongs to somebody else. Both cases look identical on
/// purpose so the API never reveals other users' data.
async fn resolve_list_strict(
    user_id: i32,
    list_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    list_read: &impl task_list::driven_ports::ListReader,
) -> Result<TaskList, Error> {
    let list = list_read
        .for_user_by_id(user_id, list_id, &mut *ext_cxn)
        .await
        .map_err(Error::failed_to("resolve a task's list"))?;

    list.ok_or(Error::InvalidReference { entity: "list" })
}

impl driving_ports::TaskPort for TaskService {
    async fn tasks_for_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl driven_ports::TaskReader,
        list_read: &impl task_list::driven_ports::ListReader,
    ) -> Result<Vec<TaskDetail>, Error> {
        let tasks = task_read
            .all_for_user(user_id, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("fetch a user's tasks"))?;
        let lists = list_read
            .all_for_user(user_id, None, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("fetch a user's lists"))?;

        let lists_by_id: HashMap<i32, TaskList> =
            lists.into_iter().map(|list| (list.id, list)).collect();

        Ok(tasks
            .into_iter()
            .map(|task| {
                let list = task.list_id.and_then(|id| lists_by_id.get(&id).cloned());
                TaskDetail { task, list }
            })
            .collect())
    }

    async fn task_for_user(
        &self,
        user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl driven_ports::TaskReader,
        list_read: &impl task_list::driven_ports::ListReader,
    ) -> Result<Option<TaskDetail>, Error> {
        let Some(task) = task_read
            .for_user_by_id(user_id, task_id, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("fetch a task by ID"))?
        else {
            return Ok(None);
        };

        let list = match task.list_id {
            Some(list_id) => list_read
                .for_user_by_id(user_id, list_id, &mut *ext_cxn)
                .await
                .map_err(Error::failed_to("fetch a task's list"))?,
            None => None,
        };

        Ok(Some(TaskDetail { task, list }))
    }

    async fn create_task(
        &self,
        user_id: i32,
        new_task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
        list_read: &impl task_list::driven_ports::ListReader,
        task_write: &impl driven_ports::TaskWriter,
    ) -> Result<TaskDetail, Error> {
        let list = match new_task.list_id {
            Some(list_id) => {
                Some(resolve_list_strict(user_id, list_id, &mut *ext_cxn, list_read).await?)
            }
            None => None,
        };

        let task = task_write
            .create(user_id, new_task, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("create a task"))?;

        Ok(TaskDetail { task, list })
    }

    async fn update_task(
        &self,
        user_id: i32,
        task_id: i32,
        update: &UpdateTask,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl driven_ports::TaskReader,
        list_read: &impl task_list::driven_ports::ListReader,
        task_write: &impl driven_ports::TaskWriter,
    ) -> Result<TaskDetail, Error> {
        let Some(mut task) = task_read
            .for_user_by_id(user_id, task_id, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("fetch a task for updating"))?
        else {
            return Err(Error::DoesNotExist);
        };

        // The list the task will point at after the update, validated strictly
        // when the update introduces a new reference.
        let target_list_id = match update.list_id {
            Some(new_reference) => new_reference,
            None => task.list_id,
        };
        let list = match target_list_id {
            Some(list_id) if update.list_id.is_some() => {
                Some(resolve_list_strict(user_id, list_id, &mut *ext_cxn, list_read).await?)
            }
            Some(list_id) => list_read
                .for_user_by_id(user_id, list_id, &mut *ext_cxn)
                .await
                .map_err(Error::failed_to("fetch a task's list"))?,
            None => None,
        };

        task.apply_update(update);
        task_write
            .save(&task, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("save an updated task"))?;

        Ok(TaskDetail { task, list })
    }

    async fn delete_task(
        &self,
        user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl driven_ports::TaskReader,
        task_write: &impl driven_ports::TaskWriter,
    ) -> Result<(), Error> {
        let Some(task) = task_read
            .for_user_by_id(user_id, task_id, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("fetch a task for deletion"))?
        else {
            return Err(Error::DoesNotExist);
        };

        task_write
            .delete(task.id, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("delete a task"))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::driving_ports::TaskPort;
    use super::test_util::*;
    use super::*;
    use crate::domain::task_list::NewTaskList;
    use crate::domain::task_list::test_util::{InMemoryListPersistence, NewListWithOwner};
    use crate::external_connections;
    use speculoos::prelude::*;
    use std::sync::RwLock;

    fn plain_task(title: &str) -> NewTask {
        NewTask {
            title: title.to_owned(),
            note: String::new(),
            completed: false,
            due_date: None,
            list_id: None,
        }
    }

    mod tasks_for_user {
        use super::*;

        #[tokio::test]
        async fn only_returns_the_owners_tasks() {
            let task_data = RwLock::new(InMemoryTaskPersistence::new_with_tasks(&[
                NewTaskWithOwner {
                    owner: 1,
                    task: plain_task("Mine"),
                },
                NewTaskWithOwner {
                    owner: 2,
                    task: plain_task("Somebody else's"),
                },
            ]));
            let list_data = InMemoryListPersistence::new_locked();
            let mut db_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let fetched = TaskService {}
                .tasks_for_user(1, &mut db_cxn, &task_data, &list_data)
                .await;

            assert_that!(fetched).is_ok().matches(|details| {
                matches!(details.as_slice(), [TaskDetail {
                    task: Task { id: 1, user_id: 1, title, .. },
                    list: None,
                }] if title == "Mine")
            });
        }

        #[tokio::test]
        async fn resolves_each_tasks_list() {
            let list_data = RwLock::new(InMemoryListPersistence::new_with_lists(&[
                NewListWithOwner {
                    owner: 1,
                    list: NewTaskList {
                        title: "Sprint 1".to_owned(),
                        group_id: None,
                    },
                },
            ]));
            let task_data = RwLock::new(InMemoryTaskPersistence::new_with_tasks(&[
                NewTaskWithOwner {
                    owner: 1,
                    task: NewTask {
                        list_id: Some(1),
                        ..plain_task("Write report")
                    },
                },
                NewTaskWithOwner {
                    owner: 1,
                    task: plain_task("Unlisted"),
                },
            ]));
            let mut db_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let fetched = TaskService {}
                .tasks_for_user(1, &mut db_cxn, &task_data, &list_data)
                .await
                .expect("task fetch should succeed");

            assert_eq!(2, fetched.len());
            assert_that!(fetched[0].list)
                .is_some()
                .matches(|list| list.title == "Sprint 1");
            assert_that!(fetched[1].list).is_none();
        }
    }

    mod task_for_user {
        use super::*;

        #[tokio::test]
        async fn does_not_leak_other_users_tasks() {
            let task_data = RwLock::new(InMemoryTaskPersistence::new_with_tasks(&[
                NewTaskWithOwner {
                    owner: 2,
                    task: plain_task("Somebody else's"),
                },
            ]));
            let list_data = InMemoryListPersistence::new_locked();
            let mut db_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let fetched = TaskService {}
                .task_for_user(1, 1, &mut db_cxn, &task_data, &list_data)
                .await;

            assert_that!(fetched).is_ok().is_none();
        }

        #[tokio::test]
        async fn happy_path() {
            let task_data = RwLock::new(InMemoryTaskPersistence::new_with_tasks(&[
                NewTaskWithOwner {
                    owner: 1,
                    task: plain_task("Buy milk"),
                },
            ]));
            let list_data = InMemoryListPersistence::new_locked();
            let mut db_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let fetched = TaskService {}
                .task_for_user(1, 1, &mut db_cxn, &task_data, &list_data)
                .await;

            assert_that!(fetched)
                .is_ok()
                .is_some()
                .matches(|detail| detail.task.title == "Buy milk");
        }
    }

    mod create_task {
        use super::*;

        #[tokio::test]
        async fn happy_path_with_list() {
            let list_data = RwLock::new(InMemoryListPersistence::new_with_lists(&[
                NewListWithOwner {
                    owner: 1,
                    list: NewTaskList {
                        title: "Sprint 1".to_owned(),
                        group_id: None,
                    },
                },
            ]));
            let task_data = InMemoryTaskPersistence::new_locked();
            let mut db_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let created = TaskService {}
                .create_task(
                    1,
                    &NewTask {
                        list_id: Some(1),
                        ..plain_task("Write report")
                    },
                    &mut db_cxn,
                    &list_data,
                    &task_data,
                )
                .await
                .expect("create should succeed");

            assert_eq!(1, created.task.user_id);
            assert_eq!(Some(1), created.task.list_id);
            assert_that!(created.list)
                .is_some()
                .matches(|list| list.title == "Sprint 1");
        }

        #[tokio::test]
        async fn rejects_foreign_list_reference() {
            let list_data = RwLock::new(InMemoryListPersistence::new_with_lists(&[
                NewListWithOwner {
                    owner: 2,
                    list: NewTaskList {
                        title: "Not yours".to_owned(),
                        group_id: None,
                    },
                },
            ]));
            let task_data = InMemoryTaskPersistence::new_locked();
            let mut db_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let create_result = TaskService {}
                .create_task(
                    1,
                    &NewTask {
                        list_id: Some(1),
                        ..plain_task("Sneaky task")
                    },
                    &mut db_cxn,
                    &list_data,
                    &task_data,
                )
                .await;

            assert_that!(create_result)
                .is_err()
                .matches(|err| matches!(err, Error::InvalidReference { entity: "list" }));

            let tasks = task_data.read().expect("task rwlock poisoned");
            assert!(tasks.tasks.is_empty());
        }

        #[tokio::test]
        async fn rejects_nonexistent_list_reference() {
            let list_data = InMemoryListPersistence::new_locked();
            let task_data = InMemoryTaskPersistence::new_locked();
            let mut db_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let create_result = TaskService {}
                .create_task(
                    1,
                    &NewTask {
                        list_id: Some(9999),
                        ..plain_task("Dangling task")
                    },
                    &mut db_cxn,
                    &list_data,
                    &task_data,
                )
                .await;

            assert_that!(create_result)
                .is_err()
                .matches(|err| matches!(err, Error::InvalidReference { entity: "list" }));
        }
    }

    mod update_task {
        use super::*;
        use chrono::NaiveDate;

        fn no_op_update() -> UpdateTask {
            UpdateTask {
                title: None,
                note: None,
                completed: None,
                due_date: None,
                list_id: None,
            }
        }

        #[tokio::test]
        async fn only_touches_supplied_fields() {
            let due = NaiveDate::from_ymd_opt(2025, 1, 6).expect("valid date");
            let task_data = RwLock::new(InMemoryTaskPersistence::new_with_tasks(&[
                NewTaskWithOwner {
                    owner: 1,
                    task: NewTask {
                        title: "Old title".to_owned(),
                        note: "Keep me".to_owned(),
                        completed: true,
                        due_date: Some(due),
                        list_id: None,
                    },
                },
            ]));
            let list_data = InMemoryListPersistence::new_locked();
            let mut db_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let updated = TaskService {}
                .update_task(
                    1,
                    1,
                    &UpdateTask {
                        title: Some("New title".to_owned()),
                        ..no_op_update()
                    },
                    &mut db_cxn,
                    &task_data,
                    &list_data,
                    &task_data,
                )
                .await
                .expect("update should succeed");

            assert_eq!("New title", updated.task.title);
            assert_eq!("Keep me", updated.task.note);
            assert!(updated.task.completed);
            assert_eq!(Some(due), updated.task.due_date);
        }

        #[tokio::test]
        async fn can_clear_nullable_fields() {
            let task_data = RwLock::new(InMemoryTaskPersistence::new_with_tasks(&[
                NewTaskWithOwner {
                    owner: 1,
                    task: NewTask {
                        due_date: NaiveDate::from_ymd_opt(2025, 1, 6),
                        ..super::plain_task("Scheduled")
                    },
                },
            ]));
            let list_data = InMemoryListPersistence::new_locked();
            let mut db_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let updated = TaskService {}
                .update_task(
                    1,
                    1,
                    &UpdateTask {
                        due_date: Some(None),
                        ..no_op_update()
                    },
                    &mut db_cxn,
                    &task_data,
                    &list_data,
                    &task_data,
                )
                .await
                .expect("update should succeed");

            assert_that!(updated.task.due_date).is_none();
        }

        #[tokio::test]
        async fn rejects_foreign_list_reference() {
            let task_data = RwLock::new(InMemoryTaskPersistence::new_with_tasks(&[
                NewTaskWithOwner {
                    owner: 1,
                    task: super::plain_task("Innocent"),
                },
            ]));
            let list_data = RwLock::new(InMemoryListPersistence::new_with_lists(&[
                NewListWithOwner {
                    owner: 2,
                    list: NewTaskList {
                        title: "Not yours".to_owned(),
                        group_id: None,
                    },
                },
            ]));
            let mut db_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let update_result = TaskService {}
                .update_task(
                    1,
                    1,
                    &UpdateTask {
                        list_id: Some(Some(1)),
                        ..no_op_update()
                    },
                    &mut db_cxn,
                    &task_data,
                    &list_data,
                    &task_data,
                )
                .await;

            assert_that!(update_result)
                .is_err()
                .matches(|err| matches!(err, Error::InvalidReference { entity: "list" }));

            let tasks = task_data.read().expect("task rwlock poisoned");
            assert_that!(tasks.tasks[0].list_id).is_none();
        }

        #[tokio::test]
        async fn missing_task_is_not_found() {
            let task_data = InMemoryTaskPersistence::new_locked();
            let list_data = InMemoryListPersistence::new_locked();
            let mut db_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let update_result = TaskService {}
                .update_task(
                    1,
                    5,
                    &no_op_update(),
                    &mut db_cxn,
                    &task_data,
                    &list_data,
                    &task_data,
                )
                .await;

            assert_that!(update_result)
                .is_err()
                .matches(|err| matches!(err, Error::DoesNotExist));
        }
    }

    mod delete_task {
        use super::*;

        #[tokio::test]
        async fn happy_path() {
            let task_data = RwLock::new(InMemoryTaskPersistence::new_with_tasks(&[
                NewTaskWithOwner {
                    owner: 1,
                    task: plain_task("Short-lived"),
                },
            ]));
            let mut db_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let delete_result = TaskService {}
                .delete_task(1, 1, &mut db_cxn, &task_data, &task_data)
                .await;

            assert_that!(delete_result).is_ok();
            let tasks = task_data.read().expect("task rwlock poisoned");
            assert!(tasks.tasks.is_empty());
        }

        #[tokio::test]
        async fn cannot_delete_other_users_tasks() {
            let task_data = RwLock::new(InMemoryTaskPersistence::new_with_tasks(&[
                NewTaskWithOwner {
                    owner: 2,
                    task: plain_task("Protected"),
                },
            ]));
            let mut db_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let delete_result = TaskService {}
                .delete_task(1, 1, &mut db_cxn, &task_data, &task_data)
                .await;

            assert_that!(delete_result)
                .is_err()
                .matches(|err| matches!(err, Error::DoesNotExist));
            let tasks = task_data.read().expect("task rwlock poisoned");
            assert_eq!(1, tasks.tasks.len());
        }
    }
}
