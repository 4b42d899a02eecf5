use crate::{
    db::{
        Db,
        executor::{Comparator, JoinExecutor},
        query::plan::{ExecutablePlan, QueryPlan},
        response::JoinResult,
        store::{DataStore, Row, RowSource},
    },
    error::{InternalError, NotFoundError},
    obs::sink::{MetricsEvent, MetricsSink, record, with_metrics_sink},
    traits::EntityValue,
    value::{Value, natural_cmp},
};

///
/// DbSession
///
/// Session-scoped database handle with policy (debug, metrics, comparator)
/// and execution routing.
///

#[derive(Clone)]
pub struct DbSession {
    db: Db,
    debug: bool,
    metrics: Option<&'static dyn MetricsSink>,
    comparator: Comparator,
}

impl DbSession {
    #[must_use]
    pub const fn new(db: Db) -> Self {
        Self {
            db,
            debug: false,
            metrics: None,
            comparator: natural_cmp,
        }
    }

    #[must_use]
    pub const fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    #[must_use]
    pub const fn metrics_sink(mut self, sink: &'static dyn MetricsSink) -> Self {
        self.metrics = Some(sink);
        self
    }

    /// Order lateral subqueries with `comparator` instead of natural order.
    #[must_use]
    pub const fn comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = comparator;
        self
    }

    fn with_metrics<T>(&self, f: impl FnOnce() -> T) -> T {
        if let Some(sink) = self.metrics {
            with_metrics_sink(sink, f)
        } else {
            f()
        }
    }

    /// Resolve a plan against this database's schema.
    pub fn compile(&self, plan: &QueryPlan) -> Result<ExecutablePlan, InternalError> {
        plan.compile(self.db.schema())
    }

    /// Compile and run a plan against the committed store.
    pub fn execute_query(&self, plan: &QueryPlan) -> Result<JoinResult, InternalError> {
        let executable = self.compile(plan)?;

        self.with_metrics(|| {
            self.db
                .with_committed(|store| self.executor(store).execute(&executable))
        })
    }

    /// Begin a snapshot transaction.
    pub fn begin_transaction(&self) -> Result<Transaction<'_>, InternalError> {
        let (store, version) = self.db.snapshot()?;

        Ok(Transaction {
            session: self,
            store,
            version,
            rows_written: 0,
            finished: false,
        })
    }

    /// Run `f` in a transaction: commit on `Ok`, discard on `Err`.
    pub fn in_transaction<T>(
        &self,
        f: impl FnOnce(&mut Transaction<'_>) -> Result<T, InternalError>,
    ) -> Result<T, InternalError> {
        let mut tx = self.begin_transaction()?;
        let value = f(&mut tx)?;
        tx.commit()?;

        Ok(value)
    }

    fn executor<'s>(&self, store: &'s DataStore) -> JoinExecutor<'s, DataStore> {
        JoinExecutor::new(store, self.debug).with_comparator(self.comparator)
    }
}

///
/// Transaction
///
/// Private copy of the committed store taken at begin. Writes are staged
/// locally and become visible to others only on [`Transaction::commit`];
/// dropping an uncommitted transaction discards them.
///

pub struct Transaction<'s> {
    session: &'s DbSession,
    store: DataStore,
    version: u64,
    rows_written: u64,
    finished: bool,
}

impl Transaction<'_> {
    /// Validate and stage a typed entity.
    pub fn persist<E: EntityValue>(&mut self, entity: &E) -> Result<(), InternalError> {
        self.persist_row(E::MODEL.entity_name, entity.field_values())
    }

    /// Validate and stage positional values for `entity`.
    pub fn persist_row(&mut self, entity: &str, values: Vec<Value>) -> Result<(), InternalError> {
        let model = self.store.model(entity)?;
        let row = self.store.insert(entity, values)?;
        let key = model
            .primary_key_index()
            .and_then(|index| row.get(index))
            .cloned()
            .unwrap_or(Value::Null);
        self.rows_written += 1;

        let entity_path = model.path;
        self.session
            .with_metrics(|| record(MetricsEvent::Persist { entity_path }));
        if self.session.debug {
            tracing::debug!(target: "lateraldb::session", entity, %key, "persist");
        }

        Ok(())
    }

    /// Primary-key lookup; sees this transaction's own writes.
    pub fn load(&self, entity: &str, key: impl Into<Value>) -> Result<&Row, InternalError> {
        let key = key.into();

        self.store.get(entity, &key)?.ok_or_else(|| {
            InternalError::not_found(NotFoundError::Key {
                entity: entity.to_string(),
                key: key.to_string(),
            })
        })
    }

    /// Compile and run a plan against this transaction's snapshot.
    pub fn execute_query(&self, plan: &QueryPlan) -> Result<JoinResult, InternalError> {
        let executable = self.session.compile(plan)?;

        self.session
            .with_metrics(|| self.session.executor(&self.store).execute(&executable))
    }

    /// Publish staged writes.
    ///
    /// Fails with a conflict when another transaction committed after this
    /// one began; the staged writes are then discarded.
    pub fn commit(mut self) -> Result<(), InternalError> {
        self.finished = true;
        let store = std::mem::take(&mut self.store);
        let rows_written = self.rows_written;

        let result = self.session.db.commit(store, self.version);
        self.session.with_metrics(|| match &result {
            Ok(_) => record(MetricsEvent::Commit { rows_written }),
            Err(_) => record(MetricsEvent::Rollback),
        });

        let version = result?;
        if self.session.debug {
            tracing::debug!(target: "lateraldb::session", version, rows_written, "commit");
        }

        Ok(())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.session.with_metrics(|| record(MetricsEvent::Rollback));
        }
    }
}
