use crate::domain::Error;
use crate::external_connections::{
    ExternalConnectivity, TransactableExternalConnectivity, TransactionHandle,
};
use chrono::{DateTime, Utc};

/// A registered account. The password hash never leaves the domain/persistence layers;
/// DTOs deliberately have no field for it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to register a new account. The password arrives pre-hashed; hashing
/// happens at the API edge so the domain stays free of crypto concerns.
#[cfg_attr(test, derive(Clone, Debug))]
pub struct CreateUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
}

pub mod driven_ports {
    use super::*;

    pub trait UserReader {
        async fn by_id(
            &self,
            id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<User>, anyhow::Error>;

        /// Case-insensitive email lookup
        async fn by_email(
            &self,
            email: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<User>, anyhow::Error>;

        /// Case-insensitive username lookup
        async fn by_username(
            &self,
            username: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<User>, anyhow::Error>;
    }

    pub trait UserWriter {
        async fn create(
            &self,
            user: &CreateUser,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<User, anyhow::Error>;

        /// Removes the user row itself. Owned rows are removed through the other
        /// aggregates' writers inside the same transaction.
        async fn delete(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use crate::domain::{group, task, task_list};

    pub trait UserPort {
        /// Registers a new account, enforcing case-insensitive uniqueness of
        /// email and username.
        async fn register(
            &self,
            new_user: &CreateUser,
            ext_cxn: &mut impl ExternalConnectivity,
            u_read: &impl driven_ports::UserReader,
            u_write: &impl driven_ports::UserWriter,
        ) -> Result<User, Error>;

        /// Looks up an account by email for credential verification. The caller
        /// is responsible for checking the password hash.
        async fn find_by_login(
            &self,
            email: &str,
            ext_cxn: &mut impl ExternalConnectivity,
            u_read: &impl driven_ports::UserReader,
        ) -> Result<Option<User>, Error>;

        /// Deletes an account and everything it owns (tasks, lists, groups) in one
        /// transaction. No partially-deleted account is ever visible.
        async fn delete_account(
            &self,
            user_id: i32,
            ext_cxn: &mut impl TransactableExternalConnectivity,
            u_read: &impl driven_ports::UserReader,
            u_write: &impl driven_ports::UserWriter,
            task_write: &impl task::driven_ports::TaskWriter,
            list_write: &impl task_list::driven_ports::ListWriter,
            group_write: &impl group::driven_ports::GroupWriter,
        ) -> Result<(), Error>;
    }
}

pub struct UserService {}

impl driving_ports::UserPort for UserService {
    async fn register(
        &self,
        new_user: &CreateUser,
        ext_cxn: &mut impl ExternalConnectivity,
        u_read: &impl driven_ports::UserReader,
        u_write: &impl driven_ports::UserWriter,
    ) -> Result<User, Error> {
        let email_owner = u_read
            .by_email(&new_user.email, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("look up an account by email"))?;
        if email_owner.is_some() {
            return Err(Error::Conflict { field: "email" });
        }

        let username_owner = u_read
            .by_username(&new_user.username, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("look up an account by username"))?;
        if username_owner.is_some() {
            return Err(Error::Conflict { field: "username" });
        }

        u_write
            .create(new_user, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("create a new account"))
    }

    async fn find_by_login(
        &self,
        email: &str,
        ext_cxn: &mut impl ExternalConnectivity,
        u_read: &impl driven_ports::UserReader,
    ) -> Result<Option<User>, Error> {
        u_read
            .by_email(email, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("look up an account by email"))
    }

    async fn delete_account(
        &self,
        user_id: i32,
        ext_cxn: &mut impl TransactableExternalConnectivity,
        u_read: &impl driven_ports::UserReader,
        u_write: &impl driven_ports::UserWriter,
        task_write: &impl crate::domain::task::driven_ports::TaskWriter,
        list_write: &impl crate::domain::task_list::driven_ports::ListWriter,
        group_write: &impl crate::domain::group::driven_ports::GroupWriter,
    ) -> Result<(), Error> {
        let existing_user = u_read
            .by_id(user_id, &mut *ext_cxn)
            .await
            .map_err(Error::failed_to("look up the account being deleted"))?;
        if existing_user.is_none() {
            return Err(Error::DoesNotExist);
        }

        let mut txn = ext_cxn
            .start_transaction()
            .await
            .map_err(Error::failed_to("open a transaction for account deletion"))?;

        // Tasks reference lists and lists reference groups, so children go first.
        task_write
            .delete_for_user(user_id, &mut txn)
            .await
            .map_err(Error::failed_to("delete the account's tasks"))?;
        list_write
            .delete_for_user(user_id, &mut txn)
            .await
            .map_err(Error::failed_to("delete the account's lists"))?;
        group_write
            .delete_for_user(user_id, &mut txn)
            .await
            .map_err(Error::failed_to("delete the account's groups"))?;
        u_write
            .delete(user_id, &mut txn)
            .await
            .map_err(Error::failed_to("delete the account itself"))?;

        txn.commit()
            .await
            .map_err(Error::failed_to("commit account deletion"))?;

        Ok(())
    }
}
