use crate::domain::group::Group;
use crate::domain::task::Task;
use crate::domain::{Error, group, task};
use crate::external_connections::{
    ExternalConnectivity, TransactableExternalConnectivity, TransactionHandle,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

/// A named collection of tasks, optionally filed under one of its owner's groups.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TaskList {
    pub id: i32,
    pub user_id: i32,
    pub group_id: Option<i32>,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg_attr(test, derive(Clone, Debug))]
pub struct NewTaskList {
    pub title: String,
    pub group_id: Option<i32>,
}

/// Partial update for a task list. Same double-option convention as tasks:
/// `Some(None)` on group_id detaches the list from its group.
#[cfg_attr(test, derive(Clone, Debug))]
pub struct UpdateTaskList {
    pub title: Option<String>,
    pub group_id: Option<Option<i32>>,
}

impl TaskList {
    pub fn apply_update(&mut self, update: &UpdateTaskList, resolved_group_id: Option<i32>) {
        if let Some(ref title) = update.title {
            self.title = title.clone();
        }
        if update.group_id.is_some() {
            self.group_id = resolved_group_id;
        }
        self.updated_at = Utc::now();
    }
}

/// A list with its tasks and group resolved for serialization.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ListDetail {
    pub list: TaskList,
    pub tasks: Vec<Task>,
    pub group: Option<Group>,
}

pub mod driven_ports {
    use super::*;

    pub trait ListReader {
        /// One user's lists in stable insertion order, optionally restricted to a group
        async fn all_for_user(
            &self,
            user_id: i32,
            group_filter: Option<i32>,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<TaskList>, anyhow::Error>;

        async fn for_user_by_id(
            &self,
            user_id: i32,
            list_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<TaskList>, anyhow::Error>;
    }

    pub trait ListWriter {
        async fn create(
            &self,
            user_id: i32,
            new_list: &NewTaskList,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<TaskList, anyhow::Error>;

        async fn save(
            &self,
            list: &TaskList,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;

        async fn delete(
            &self,
            list_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;

        /// Clears group_id on every list pointing at the given group (group-delete nullify)
        async fn detach_group(
            &self,
            group_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;

        /// Removes every list a user owns (account-delete cascade)
        async fn delete_for_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;

    pub trait ListPort {
        async fn lists_for_user(
            &self,
            user_id: i32,
            group_filter: Option<i32>,
            ext_cxn: &mut impl ExternalConnectivity,
            list_read: &impl driven_ports::ListReader,
            task_read: &impl task::driven_ports::TaskReader,
            group_read: &impl group::driven_ports::GroupReader,
        ) -> Result<Vec<ListDetail>, Error>;

        async fn list_for_user(
            &self,
            user_id: i32,
            list_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            list_read: &impl driven_ports::ListReader,
            task_read: &impl task::driven_ports::TaskReader,
            group_read: &impl group::driven_ports::GroupReader,
        ) -> Result<ListDetail, Error>;

        /// Creates a list. A group_id that doesn't resolve to one of the user's groups
        /// is silently dropped rather than rejected.
        async fn create_list(
            &self,
            user_id: i32,
            new_list: &NewTaskList,
            ext_cxn: &mut impl ExternalConnectivity,
            group_read: &impl group::driven_ports::GroupReader,
            list_write: &impl driven_ports::ListWriter,
        ) -> Result<ListDetail, Error>;

        async fn update_list(
            &self,
            user_id: i32,
            list_id: i32,
            update: &UpdateTaskList,
            ext_cxn: &mut impl ExternalConnectivity,
            list_read: &impl driven_ports::ListReader,
            task_read: &impl task::driven_ports::TaskReader,
            group_read: &impl group::driven_ports::GroupReader,
            list_write: &impl driven_ports::ListWriter,
        ) -> Result<ListDetail, Error>;

        /// Deletes a list and every task inside it in a single transaction
        async fn delete_list(
            &self,
            user_id: i32,
            list_id: i32,
            ext_cxn: &mut impl TransactableExternalConnectivity,
            list_read: &impl driven_ports::ListReader,
            list_write: &impl driven_ports::ListWriter,
            task_write: &impl task::driven_ports::TaskWriter,
        ) -> Result<(), Error>;
    }
}

pub struct ListService {}

/// Looks up the owner's group with the given id, quietly returning None when the
/// reference doesn't resolve. Unlike task list references, group references are
/// advisory and never fail an operation.
async fn resolve_group_lenient(
    user_id: i32,
    group_id: Option<i32>,
    ext_cxn: &mut impl ExternalConnectivity,
    group_read: &impl group::driven_ports::GroupReader,
) -> Result<Option<Group>, Error> {
    let Some(group_id) = group_id else {
        return Ok(None);
    };

    let group = group_read
        .for_user_by_id(user_id, group_id, &mut *ext_cxn)
        .await
        .map_err(Error::failed_to("resolve a list's group"))?;
    if group.is_none() {
        debug!(group_id, "Dropping unresolvable group reference");
    }

    Ok(group)
}

impl ListService {
    async fn assemble_detail(
        user_id: i32,
        list: TaskList,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl task::driven_ports::TaskReader,
        group_read: &impl group::driven_ports::GroupReader,
    ) -> Result<ListDetail, Error> {
        let tasks = task_read
            .all_for_user(user_id, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("fetch a list's tasks"))?
            .into_iter()
            .filter(|task| task.list_id == Some(list.id))
            .collect();
        let group = resolve_group_lenient(user_id, list.group_id, &mut *ext_cxn, group_read).await?;

        Ok(ListDetail { list, tasks, group })
    }
}

impl driving_ports::ListPort for ListService {
    async fn lists_for_user(
        &self,
        user_id: i32,
        group_filter: Option<i32>,
        ext_cxn: &mut impl ExternalConnectivity,
        list_read: &impl driven_ports::ListReader,
        task_read: &impl task::driven_ports::TaskReader,
        group_read: &impl group::driven_ports::GroupReader,
    ) -> Result<Vec<ListDetail>, Error> {
        let lists = list_read
            .all_for_user(user_id, group_filter, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("fetch a user's lists"))?;
        let tasks = task_read
            .all_for_user(user_id, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("fetch a user's tasks"))?;
        let groups = group_read
            .all_for_user(user_id, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("fetch a user's groups"))?;

        let groups_by_id: HashMap<i32, Group> =
            groups.into_iter().map(|group| (group.id, group)).collect();
        let mut tasks_by_list: HashMap<i32, Vec<Task>> = HashMap::new();
        for task in tasks {
            if let Some(list_id) = task.list_id {
                tasks_by_list.entry(list_id).or_default().push(task);
            }
        }

        Ok(lists
            .into_iter()
            .map(|list| {
                let tasks = tasks_by_list.remove(&list.id).unwrap_or_default();
                let group = list.group_id.and_then(|id| groups_by_id.get(&id).cloned());
                ListDetail { list, tasks, group }
            })
            .collect())
    }

    async fn list_for_user(
        &self,
        user_id: i32,
        list_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        list_read: &impl driven_ports::ListReader,
        task_read: &impl task::driven_ports::TaskReader,
        group_read: &impl group::driven_ports::GroupReader,
    ) -> Result<ListDetail, Error> {
        let Some(list) = list_read
            .for_user_by_id(user_id, list_id, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("fetch a list by ID"))?
        else {
            return Err(Error::DoesNotExist);
        };

        Self::assemble_detail(user_id, list, &mut *ext_cxn, task_read, group_read).await
    }

    async fn create_list(
        &self,
        user_id: i32,
        new_list: &NewTaskList,
        ext_cxn: &mut impl ExternalConnectivity,
        group_read: &impl group::driven_ports::GroupReader,
        list_write: &impl driven_ports::ListWriter,
    ) -> Result<ListDetail, Error> {
        let group =
            resolve_group_lenient(user_id, new_list.group_id, &mut *ext_cxn, group_read).await?;
        let accepted_list = NewTaskList {
            title: new_list.title.clone(),
            group_id: group.as_ref().map(|group| group.id),
        };

        let list = list_write
            .create(user_id, &accepted_list, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("create a list"))?;

        Ok(ListDetail {
            list,
            tasks: Vec::new(),
            group,
        })
    }

    async fn update_list(
        &self,
        user_id: i32,
        list_id: i32,
        update: &UpdateTaskList,
        ext_cxn: &mut impl ExternalConnectivity,
        list_read: &impl driven_ports::ListReader,
        task_read: &impl task::driven_ports::TaskReader,
        group_read: &impl group::driven_ports::GroupReader,
        list_write: &impl driven_ports::ListWriter,
    ) -> Result<ListDetail, Error> {
        let Some(mut list) = list_read
            .for_user_by_id(user_id, list_id, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("fetch a list for updating"))?
        else {
            return Err(Error::DoesNotExist);
        };

        let target_group_id = match update.group_id {
            Some(new_reference) => new_reference,
            None => list.group_id,
        };
        let group =
            resolve_group_lenient(user_id, target_group_id, &mut *ext_cxn, group_read).await?;

        list.apply_update(update, group.as_ref().map(|group| group.id));
        list_write
            .save(&list, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("save an updated list"))?;

        let tasks = task_read
            .all_for_user(user_id, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("fetch a list's tasks"))?
            .into_iter()
            .filter(|task| task.list_id == Some(list.id))
            .collect();

        Ok(ListDetail { list, tasks, group })
    }

    async fn delete_list(
        &self,
        user_id: i32,
        list_id: i32,
        ext_cxn: &mut impl TransactableExternalConnectivity,
        list_read: &impl driven_ports::ListReader,
        list_write: &impl driven_ports::ListWriter,
        task_write: &impl task::driven_ports::TaskWriter,
    ) -> Result<(), Error> {
        let Some(list) = list_read
            .for_user_by_id(user_id, list_id, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("fetch a list for deletion"))?
        else {
            return Err(Error::DoesNotExist);
        };

        let mut txn = ext_cxn
            .start_transaction()
            .await
            .map_err(Error::failed_to("start a list delete transaction"))?;

        task_write
            .delete_in_list(list.id, &mut txn)
            .await
            .map_err(Error::failed_to("delete a list's tasks"))?;
        list_write
            .delete(list.id, &mut txn)
            .await
            .map_err(Error::failed_to("delete a list"))?;

        txn.commit()
            .await
            .map_err(Error::failed_to("commit a list delete"))?;

        Ok(())
    }
}
