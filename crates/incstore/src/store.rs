//! `IncrementalStore`: the store adapter and its open/close lifecycle.

use crate::{
    config::StoreConfig,
    engine::Engine,
    error::{Error, UnsupportedRequest},
    executor::{
        self, ExecContext, FetchExecutor, FetchRequest, FetchResult, RelationshipExecutor,
        RequestResult, ResolvedRelationship, SaveChangesRequest, SaveExecutor, SaveOutcome,
        StoreNode, StoreRequest,
    },
    metadata::{self, LoadedMetadata, SchemaDrift, StoreMetadata},
    model::ObjectModel,
    obs::{MetricsReport, MetricsSink, StoreMetrics},
    schema::{SchemaRegistry, SchemaSet},
    value::ObjectId,
};
use std::{fmt, sync::Arc};

///
/// StoreState
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StoreState {
    Closed,
    Loading,
    Open,
}

impl fmt::Display for StoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Closed => "closed",
            Self::Loading => "loading",
            Self::Open => "open",
        };
        f.write_str(label)
    }
}

///
/// OpenStore
///
/// Everything that exists only while the store is open.
///

struct OpenStore {
    engine: Engine,
    schemas: SchemaSet,
    loaded: LoadedMetadata,
}

///
/// IncrementalStore
///
/// Persists an object graph described by an `ObjectModel` into the embedded
/// engine. Reads take `&self` and may run in parallel; each save is one
/// write transaction, serialised by the engine.
///

pub struct IncrementalStore {
    config: StoreConfig,
    model: ObjectModel,
    registry: Arc<SchemaRegistry>,
    metrics: Arc<StoreMetrics>,
    sink: Arc<dyn MetricsSink>,
    state: StoreState,
    open: Option<OpenStore>,
}

impl IncrementalStore {
    #[must_use]
    pub fn new(config: StoreConfig, model: ObjectModel) -> Self {
        let metrics = Arc::new(StoreMetrics::new());

        Self {
            config,
            model,
            registry: Arc::new(SchemaRegistry::new()),
            sink: Arc::clone(&metrics) as Arc<dyn MetricsSink>,
            metrics,
            state: StoreState::Closed,
            open: None,
        }
    }

    /// Share a schema registry with other stores of the same process.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<SchemaRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Route metrics events to a caller-supplied sink instead of the
    /// built-in counters.
    #[must_use]
    pub fn with_metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.sink = sink;
        self
    }

    #[must_use]
    pub const fn state(&self) -> StoreState {
        self.state
    }

    #[must_use]
    pub const fn model(&self) -> &ObjectModel {
        &self.model
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Store identity and persisted version hashes; `None` unless open.
    #[must_use]
    pub fn metadata(&self) -> Option<&StoreMetadata> {
        self.open.as_ref().map(|open| &open.loaded.metadata)
    }

    /// Entities whose model no longer matches the persisted version hashes.
    #[must_use]
    pub fn drift(&self) -> Option<&SchemaDrift> {
        self.open.as_ref().map(|open| &open.loaded.drift)
    }

    /// Snapshot of the built-in counters.
    #[must_use]
    pub fn metrics(&self) -> MetricsReport {
        self.metrics.report()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Build every backing schema, open the engine and load the metadata.
    ///
    /// The persisted metadata is returned as stored, together with any drift
    /// against this store's model. Failure leaves the store closed; nothing
    /// is retried.
    pub fn open(&mut self) -> Result<&LoadedMetadata, Error> {
        if self.state != StoreState::Closed {
            return Err(Error::InvalidState {
                expected: StoreState::Closed,
                found: self.state,
            });
        }

        self.state = StoreState::Loading;
        match self.load() {
            Ok(open) => {
                tracing::info!(
                    store_id = %open.loaded.metadata.store_id,
                    drifted = !open.loaded.drift.is_empty(),
                    entities = open.schemas.len(),
                    in_memory = self.config.in_memory,
                    "store opened"
                );
                self.state = StoreState::Open;
                Ok(&self.open.insert(open).loaded)
            }
            Err(err) => {
                tracing::warn!(error = %err.display_with_class(), "store failed to open");
                self.state = StoreState::Closed;
                Err(err)
            }
        }
    }

    /// Release the engine. Closing a closed store does nothing.
    pub fn close(&mut self) {
        if let Some(open) = self.open.take() {
            tracing::info!(store_id = %open.loaded.metadata.store_id, "store closed");
        }
        self.state = StoreState::Closed;
    }

    fn load(&self) -> Result<OpenStore, Error> {
        let schemas = self.registry.schemas_for(&self.model, self.sink.as_ref())?;

        let engine = Engine::open(&self.config)?;
        engine.ensure_collections(schemas.collections())?;

        let loaded = metadata::load_or_init(&engine, &self.model)?;
        for entity in &loaded.drift.changed {
            tracing::warn!(%entity, "entity model changed since the store was last opened");
        }
        for entity in &loaded.drift.added {
            tracing::warn!(%entity, "entity added since the store was last opened");
        }
        for entity in &loaded.drift.removed {
            tracing::warn!(%entity, "entity removed since the store was last opened");
        }

        Ok(OpenStore {
            engine,
            schemas,
            loaded,
        })
    }

    fn ctx(&self) -> Result<ExecContext<'_>, Error> {
        let open = self.open.as_ref().ok_or_else(|| Error::InvalidState {
            expected: StoreState::Open,
            found: self.state,
        })?;

        Ok(ExecContext {
            engine: &open.engine,
            model: &self.model,
            schemas: &open.schemas,
            sink: self.sink.as_ref(),
        })
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Dispatch one framework request.
    pub fn execute(&self, request: &StoreRequest) -> Result<RequestResult, Error> {
        match request {
            StoreRequest::Fetch(fetch) => self.fetch(fetch).map(RequestResult::Fetch),
            StoreRequest::Save(save) => self.save(save).map(RequestResult::Save),
            StoreRequest::BatchUpdate => Err(UnsupportedRequest::BatchUpdate.into()),
            StoreRequest::BatchDelete => Err(UnsupportedRequest::BatchDelete.into()),
        }
    }

    pub fn fetch(&self, request: &FetchRequest) -> Result<FetchResult, Error> {
        FetchExecutor::new(self.ctx()?).execute(request)
    }

    /// Apply inserts, updates and deletes atomically.
    pub fn save(&self, request: &SaveChangesRequest) -> Result<SaveOutcome, Error> {
        SaveExecutor::new(self.ctx()?).execute(request)
    }

    /// Attribute values and version of one stored object.
    pub fn materialize(&self, id: &ObjectId) -> Result<StoreNode, Error> {
        FetchExecutor::new(self.ctx()?).materialize(id)
    }

    pub fn resolve_relationship(
        &self,
        id: &ObjectId,
        relationship: &str,
    ) -> Result<ResolvedRelationship, Error> {
        RelationshipExecutor::new(self.ctx()?).resolve(id, relationship)
    }

    pub fn assign_permanent_ids(&self, ids: &[ObjectId]) -> Result<Vec<ObjectId>, Error> {
        let ctx = self.ctx()?;

        executor::assign_permanent_ids(ctx.model, ids)
    }
}
