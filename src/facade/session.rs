//! Open storage session: one schema, one engine and the accessor
//! collaborators that go with them.

use crate::accessor::{
    AccessorConfig, AccessorContext, AccessorResult, ChangeNotifier, ChangeObserver, DefaultValues,
};
use crate::core::Schema;
use crate::dynamic::Dynamic;
use crate::storage::{InMemoryStorage, TransactionalEngine};
use log::{debug, warn};
use std::sync::Arc;

/// # Examples
///
/// ```
/// use rowbridge::prelude::*;
/// use serde_json::json;
///
/// let schema = Schema::new(vec![ObjectTypeDescriptor::new(
///     "Person",
///     vec![
///         PropertyDescriptor::new("id", PrimitiveKind::Int).primary_key(),
///         PropertyDescriptor::new("name", PrimitiveKind::String),
///     ],
/// )])?;
/// let mut session = Session::new(schema);
///
/// let row = session.write(|ctx| {
///     ctx.realize(&json!({"id": 1, "name": "Ann"}), "Person", RealizeMode::Create)
/// })?;
/// let name = session.accessor().get_value_by_name(row, "name")?;
/// assert_eq!(name, Dynamic::from("Ann"));
/// # Ok::<(), AccessorError>(())
/// ```
pub struct Session<E: TransactionalEngine = InMemoryStorage> {
    schema: Arc<Schema>,
    engine: E,
    defaults: DefaultValues,
    notifier: ChangeNotifier,
    config: AccessorConfig,
}

impl Session<InMemoryStorage> {
    /// Session over a fresh in-memory engine.
    pub fn new(schema: Schema) -> Self {
        let engine = InMemoryStorage::new(&schema);
        Self::with_engine(schema, engine)
    }
}

impl<E: TransactionalEngine> Session<E> {
    /// Defaults declared on the schema's property descriptors are
    /// registered up front.
    pub fn with_engine(schema: Schema, engine: E) -> Self {
        let defaults = DefaultValues::from_schema(&schema);
        Self {
            schema: Arc::new(schema),
            engine,
            defaults,
            notifier: ChangeNotifier::new(),
            config: AccessorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AccessorConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces every registered default, including the schema-declared ones.
    pub fn with_defaults(mut self, defaults: DefaultValues) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn register_default(&mut self, object_type: &str, property: &str, value: impl Into<Dynamic>) {
        self.defaults.register(object_type, property, value.into());
    }

    pub fn subscribe(&mut self, observer: Arc<dyn ChangeObserver>) {
        self.notifier.subscribe(observer);
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn config(&self) -> &AccessorConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Accessor over the session outside any transaction. Writes made
    /// through it apply immediately and cannot be rolled back.
    pub fn accessor(&mut self) -> AccessorContext<'_, E> {
        AccessorContext::new(
            &self.schema,
            &mut self.engine,
            &self.defaults,
            &self.notifier,
            &self.config,
        )
    }

    /// Runs `f` inside a write transaction.
    ///
    /// Commits when `f` returns `Ok`. On `Err` every row allocated and every
    /// value written by `f` is undone before the error is returned.
    pub fn write<T, F>(&mut self, f: F) -> AccessorResult<T>
    where
        F: FnOnce(&mut AccessorContext<'_, E>) -> AccessorResult<T>,
    {
        self.engine.begin()?;
        let result = {
            let mut ctx = AccessorContext::new(
                &self.schema,
                &mut self.engine,
                &self.defaults,
                &self.notifier,
                &self.config,
            );
            f(&mut ctx)
        };

        match result {
            Ok(value) => {
                self.engine.commit()?;
                debug!("write transaction committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.engine.rollback() {
                    warn!("rollback after '{}' failed: {}", err, rollback_err);
                }
                Err(err)
            }
        }
    }
}
