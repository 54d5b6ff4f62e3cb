use crate::domain::task_list::TaskList;
use crate::domain::{Error, task_list};
use crate::external_connections::{
    ExternalConnectivity, TransactableExternalConnectivity, TransactionHandle,
};
use chrono::{DateTime, Utc};

/// A named bucket of task lists. Groups only organize lists; deleting one leaves
/// its lists in place.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Group {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg_attr(test, derive(Clone, Debug))]
pub struct NewGroup {
    pub title: String,
}

#[cfg_attr(test, derive(Clone, Debug))]
pub struct UpdateGroup {
    pub title: Option<String>,
}

impl Group {
    pub fn apply_update(&mut self, update: &UpdateGroup) {
        if let Some(ref title) = update.title {
            self.title = title.clone();
        }
        self.updated_at = Utc::now();
    }
}

/// A group with its member lists resolved for serialization.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct GroupDetail {
    pub group: Group,
    pub task_lists: Vec<TaskList>,
}

pub mod driven_ports {
    use super::*;

    pub trait GroupReader {
        /// One user's groups in stable insertion order
        async fn all_for_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<Group>, anyhow::Error>;

        async fn for_user_by_id(
            &self,
            user_id: i32,
            group_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<Group>, anyhow::Error>;
    }

    pub trait GroupWriter {
        async fn create(
            &self,
            user_id: i32,
            new_group: &NewGroup,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Group, anyhow::Error>;

        async fn save(
            &self,
            group: &Group,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;

        async fn delete(
            &self,
            group_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;

        /// Removes every group a user owns (account-delete cascade)
        async fn delete_for_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;

    pub trait GroupPort {
        async fn groups_for_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            group_read: &impl driven_ports::GroupReader,
            list_read: &impl task_list::driven_ports::ListReader,
        ) -> Result<Vec<GroupDetail>, Error>;

        async fn group_for_user(
            &self,
            user_id: i32,
            group_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            group_read: &impl driven_ports::GroupReader,
            list_read: &impl task_list::driven_ports::ListReader,
        ) -> Result<GroupDetail, Error>;

        async fn create_group(
            &self,
            user_id: i32,
            new_group: &NewGroup,
            ext_cxn: &mut impl ExternalConnectivity,
            group_write: &impl driven_ports::GroupWriter,
        ) -> Result<GroupDetail, Error>;

        async fn update_group(
            &self,
            user_id: i32,
            group_id: i32,
            update: &UpdateGroup,
            ext_cxn: &mut impl ExternalConnectivity,
            group_read: &impl driven_ports::GroupReader,
            list_read: &impl task_list::driven_ports::ListReader,
            group_write: &impl driven_ports::GroupWriter,
        ) -> Result<GroupDetail, Error>;

        /// Deletes a group after detaching its lists, in a single transaction.
        /// The lists themselves survive.
        async fn delete_group(
            &self,
            user_id: i32,
            group_id: i32,
            ext_cxn: &mut impl TransactableExternalConnectivity,
            group_read: &impl driven_ports::GroupReader,
            group_write: &impl driven_ports::GroupWriter,
            list_write: &impl task_list::driven_ports::ListWriter,
        ) -> Result<(), Error>;
    }
}

pub struct GroupService {}

async fn lists_in_group(
    user_id: i32,
    group_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    list_read: &impl task_list::driven_ports::ListReader,
) -> Result<Vec<TaskList>, Error> {
    list_read
        .all_for_user(user_id, Some(group_id), &mut *ext_cxn)
        .await
        .map_err(Error::failed_to("fetch a group's lists"))
}

impl driving_ports::GroupPort for GroupService {
    async fn groups_for_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        group_read: &impl driven_ports::GroupReader,
        list_read: &impl task_list::driven_ports::ListReader,
    ) -> Result<Vec<GroupDetail>, Error> {
        let groups = group_read
            .all_for_user(user_id, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("fetch a user's groups"))?;

        let mut details = Vec::with_capacity(groups.len());
        for group in groups {
            let task_lists = lists_in_group(user_id, group.id, &mut *ext_cxn, list_read).await?;
            details.push(GroupDetail { group, task_lists });
        }

        Ok(details)
    }

    async fn group_for_user(
        &self,
        user_id: i32,
        group_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        group_read: &impl driven_ports::GroupReader,
        list_read: &impl task_list::driven_ports::ListReader,
    ) -> Result<GroupDetail, Error> {
        let Some(group) = group_read
            .for_user_by_id(user_id, group_id, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("fetch a group by ID"))?
        else {
            return Err(Error::DoesNotExist);
        };

        let task_lists = lists_in_group(user_id, group.id, &mut *ext_cxn, list_read).await?;
        Ok(GroupDetail { group, task_lists })
    }

    async fn create_group(
        &self,
        user_id: i32,
        new_group: &NewGroup,
        ext_cxn: &mut impl ExternalConnectivity,
        group_write: &impl driven_ports::GroupWriter,
    ) -> Result<GroupDetail, Error> {
        let group = group_write
            .create(user_id, new_group, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("create a group"))?;

        Ok(GroupDetail {
            group,
            task_lists: Vec::new(),
        })
    }

    async fn update_group(
        &self,
        user_id: i32,
        group_id: i32,
        update: &UpdateGroup,
        ext_cxn: &mut impl ExternalConnectivity,
        group_read: &impl driven_ports::GroupReader,
        list_read: &impl task_list::driven_ports::ListReader,
        group_write: &impl driven_ports::GroupWriter,
    ) -> Result<GroupDetail, Error> {
        let Some(mut group) = group_read
            .for_user_by_id(user_id, group_id, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("fetch a group for updating"))?
        else {
            return Err(Error::DoesNotExist);
        };

        group.apply_update(update);
        group_write
            .save(&group, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("save an updated group"))?;

        let task_lists = lists_in_group(user_id, group.id, &mut *ext_cxn, list_read).await?;
        Ok(GroupDetail { group, task_lists })
    }

    async fn delete_group(
        &self,
        user_id: i32,
        group_id: i32,
        ext_cxn: &mut impl TransactableExternalConnectivity,
        group_read: &impl driven_ports::GroupReader,
        group_write: &impl driven_ports::GroupWriter,
        list_write: &impl task_list::driven_ports::ListWriter,
    ) -> Result<(), Error> {
        let Some(group) = group_read
            .for_user_by_id(user_id, group_id, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("fetch a group for deletion"))?
        else {
            return Err(Error::DoesNotExist);
        };

        let mut txn = ext_cxn
            .start_transaction()
            .await
            .map_err(Error::failed_to("start a group delete transaction"))?;

        list_write
            .detach_group(group.id, &mut txn)
            .await
            .map_err(Error::failed_to("detach a group's lists"))?;
        group_write
            .delete(group.id, &mut txn)
            .await
            .map_err(Error::failed_to("delete a group"))?;

        txn.commit()
            .await
            .map_err(Error::failed_to("commit a group delete"))?;

        Ok(())
    }
}
