//! Database handle, sessions, query planning and execution.

pub mod executor;
pub mod query;
pub mod response;
pub mod session;
pub mod store;


use crate::{
    error::{InternalError, StoreError},
    model::schema::Schema,
};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

// re-exports
pub use executor::{Comparator, JoinExecutor};
pub use query::{
    builder::Query,
    expr::{ColumnRef, CompareOp, Expr, col, lit},
    plan::{
        CollectionSelector, ExecutablePlan, JoinKind, JoinSource, JoinSpec, LateralColumn,
        LateralSpec, OrderDirection, OrderSpec, PlanFingerprint, ProjectionItem, QueryPlan,
    },
};
pub use response::{JoinResult, Tuple};
pub use session::{DbSession, Transaction};
pub use store::{DataStore, Row, RowSource};

///
/// Db
///
/// Shared handle to a schema and its committed store.
/// Clones share state; readers take a snapshot, writers commit through
/// an optimistic version check.
///

#[derive(Clone, Debug)]
pub struct Db {
    inner: Arc<DbInner>,
}

#[derive(Debug)]
struct DbInner {
    schema: Schema,
    committed: RwLock<Committed>,
}

#[derive(Debug)]
struct Committed {
    store: DataStore,
    version: u64,
}

impl Db {
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        let store = DataStore::new(&schema);

        Self {
            inner: Arc::new(DbInner {
                schema,
                committed: RwLock::new(Committed { store, version: 0 }),
            }),
        }
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.inner.schema
    }

    /// Open a session with default policy (no debug, global metrics).
    #[must_use]
    pub fn session(&self) -> DbSession {
        DbSession::new(self.clone())
    }

    /// Number of commits applied so far.
    pub fn version(&self) -> Result<u64, InternalError> {
        Ok(self.read()?.version)
    }

    /// Run `f` against the committed store under a read lock.
    pub(crate) fn with_committed<T>(
        &self,
        f: impl FnOnce(&DataStore) -> Result<T, InternalError>,
    ) -> Result<T, InternalError> {
        f(&self.read()?.store)
    }

    /// Clone the committed store with the version it was taken at.
    pub(crate) fn snapshot(&self) -> Result<(DataStore, u64), InternalError> {
        let committed = self.read()?;

        Ok((committed.store.clone(), committed.version))
    }

    /// Replace the committed store if nothing committed since `expected`.
    pub(crate) fn commit(&self, store: DataStore, expected: u64) -> Result<u64, InternalError> {
        let mut committed = self.write()?;
        if committed.version != expected {
            return Err(InternalError::store(StoreError::Conflict {
                expected,
                found: committed.version,
            }));
        }

        committed.store = store;
        committed.version += 1;

        Ok(committed.version)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Committed>, InternalError> {
        self.inner
            .committed
            .read()
            .map_err(|_| InternalError::store(StoreError::Poisoned))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Committed>, InternalError> {
        self.inner
            .committed
            .write()
            .map_err(|_| InternalError::store(StoreError::Poisoned))
    }
}
