use anyhow::Error;
use sqlx::PgConnection;

/// ExternalConnectivity is the set of handles business logic uses to reach the outside
/// world. Driven adapters borrow a database connection through it rather than owning
/// clients themselves, so adapters can be swapped out without touching domain code.
pub trait ExternalConnectivity: Sync {
    type DbHandle<'cxn_borrow>: ConnectionHandle
    where
        Self: 'cxn_borrow;

    /// Acquires a handle which can borrow a database connection
    async fn database_cxn(&mut self) -> Result<Self::DbHandle<'_>, Error>;
}

/// A handle owning or borrowing an active database connection
pub trait ConnectionHandle {
    fn borrow_connection(&mut self) -> &mut PgConnection;
}

/// Implemented by connectivity types which can open a database transaction. The returned
/// handle exposes the same connectivity interface, so domain logic composes multi-step
/// writes without knowing whether it's inside a transaction.
pub trait Transactable {
    type Handle: ExternalConnectivity + TransactionHandle;

    async fn start_transaction(&self) -> Result<Self::Handle, Error>;
}

/// An active database transaction which must be committed for its writes to become visible
pub trait TransactionHandle {
    async fn commit(self) -> Result<(), Error>;
}

/// Convenience trait for functions which both run queries and open transactions
pub trait TransactableExternalConnectivity: ExternalConnectivity + Transactable {}
impl<T: ExternalConnectivity + Transactable> TransactableExternalConnectivity for T {}
