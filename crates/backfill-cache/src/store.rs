use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use backfill_expand::{ExpansionPlan, ExpansionReport, Expander, RemoteTransport};
use backfill_schema::{CrawlerConfig, Schema, SchemaCrawler};
use backfill_types::{key_fragment, Document};

use crate::config::BackfillConfig;
use crate::error::{StoreError, StoreResult};
use crate::key::CacheKey;
use crate::traits::CacheAdapter;

/// Per-call expansion request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpandOptions {
    /// Comma-separated expansion expression, e.g. `author,comments.author`.
    pub expand: Option<String>,
}

impl ExpandOptions {
    /// No expansion.
    pub fn none() -> Self {
        Self::default()
    }

    /// Expand the references named by `expression`.
    pub fn expand(expression: impl Into<String>) -> Self {
        Self {
            expand: Some(expression.into()),
        }
    }

    /// The expression, if it contains anything besides whitespace.
    pub fn expression(&self) -> Option<&str> {
        self.expand.as_deref().filter(|e| !e.trim().is_empty())
    }
}

/// Builder for [`BackfillStore`]. Every collaborator is required.
pub struct BackfillStoreBuilder {
    config: BackfillConfig,
    crawler: CrawlerConfig,
    schema: Option<Schema>,
    cache: Option<Arc<dyn CacheAdapter>>,
    transport: Option<Arc<dyn RemoteTransport>>,
}

impl BackfillStoreBuilder {
    fn new(config: BackfillConfig) -> Self {
        Self {
            config,
            crawler: CrawlerConfig::default(),
            schema: None,
            cache: None,
            transport: None,
        }
    }

    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn cache(mut self, cache: Arc<dyn CacheAdapter>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn RemoteTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Override the crawler limits used to build the reference map.
    pub fn crawler(mut self, crawler: CrawlerConfig) -> Self {
        self.crawler = crawler;
        self
    }

    /// Build the store, crawling the schema into its reference map.
    pub fn build(self) -> StoreResult<BackfillStore> {
        if self.config.resource.is_empty() {
            return Err(StoreError::Configuration("resource name is empty".into()));
        }
        if self.config.primary_key.is_empty() {
            return Err(StoreError::Configuration("primary key field is empty".into()));
        }
        let cache = self
            .cache
            .ok_or_else(|| StoreError::Configuration("cache adapter not configured".into()))?;
        let transport = self
            .transport
            .ok_or_else(|| StoreError::Configuration("remote transport not configured".into()))?;
        let schema = self
            .schema
            .ok_or_else(|| StoreError::Configuration("schema not provided".into()))?;

        let references = SchemaCrawler::new(self.crawler).crawl(&schema)?;
        debug!(
            resource = %self.config.resource,
            references = references.len(),
            "backfill store ready"
        );

        let expander = Expander::new(
            Arc::new(references),
            transport,
            self.config.dispatch.clone(),
        );
        Ok(BackfillStore {
            config: self.config,
            cache,
            expander,
        })
    }
}

/// Cache-aside store for the documents of one resource.
pub struct BackfillStore {
    config: BackfillConfig,
    cache: Arc<dyn CacheAdapter>,
    expander: Expander,
}

impl BackfillStore {
    pub fn builder(config: BackfillConfig) -> BackfillStoreBuilder {
        BackfillStoreBuilder::new(config)
    }

    pub fn config(&self) -> &BackfillConfig {
        &self.config
    }

    pub fn expander(&self) -> &Expander {
        &self.expander
    }

    /// Key for a primary-key value of this resource.
    pub fn key_for(&self, id: &str) -> CacheKey {
        CacheKey::new(self.config.namespace.as_deref(), &self.config.resource, id)
    }

    fn key_of(&self, record: &Document) -> Option<CacheKey> {
        key_fragment(record.get(&self.config.primary_key)).map(|id| self.key_for(&id))
    }

    /// Cache `document` and optionally return it expanded.
    ///
    /// The document is first normalised to a plain JSON record. Returns
    /// `Ok(None)` without writing when it is not a record or has no primary
    /// key. The cache always receives the unexpanded snapshot.
    pub async fn store<T>(
        &self,
        document: &T,
        options: &ExpandOptions,
    ) -> StoreResult<Option<Document>>
    where
        T: Serialize + ?Sized,
    {
        let record = match serde_json::to_value(document) {
            Ok(Value::Object(record)) => record,
            Ok(_) => return Ok(None),
            Err(e) => return Err(StoreError::Serialization(e.to_string())),
        };
        let Some(key) = self.key_of(&record) else {
            debug!(resource = %self.config.resource, "document has no primary key; not cached");
            return Ok(None);
        };

        let bytes =
            serde_json::to_vec(&record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.cache.set(&key.to_string(), &bytes).await?;
        debug!(%key, bytes = bytes.len(), "document cached");

        Ok(Some(self.maybe_expand(record, options).await))
    }

    /// Read a cached document by the primary key in `filter`.
    ///
    /// Returns `Ok(None)` when the filter has no primary key, on a miss, or
    /// when the cached payload cannot be decoded; the caller then reads the
    /// authoritative store.
    pub async fn fetch(
        &self,
        filter: &Document,
        options: &ExpandOptions,
    ) -> StoreResult<Option<Document>> {
        let Some(key) = self.key_of(filter) else {
            return Ok(None);
        };
        let Some(bytes) = self.cache.get(&key.to_string()).await? else {
            debug!(%key, "cache miss");
            return Ok(None);
        };

        let record = match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(record)) => record,
            Ok(other) => {
                warn!(%key, kind = json_kind(&other), "cached payload is not a record; treating as miss");
                return Ok(None);
            }
            Err(e) => {
                warn!(%key, error = %e, "cached payload undecodable; treating as miss");
                return Ok(None);
            }
        };
        debug!(%key, "cache hit");

        Ok(Some(self.maybe_expand(record, options).await))
    }

    /// Read through the cache: on a miss, call `load` (the authoritative
    /// read), cache what it returns and hand it back, expanded if requested.
    /// A loaded document without a primary key is returned but not cached.
    pub async fn fetch_or_load<F, Fut, E>(
        &self,
        filter: &Document,
        options: &ExpandOptions,
        load: F,
    ) -> StoreResult<Option<Document>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<Document>, E>>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        if let Some(doc) = self.fetch(filter, options).await? {
            return Ok(Some(doc));
        }
        let Some(doc) = load().await.map_err(|e| StoreError::Load(e.into()))? else {
            return Ok(None);
        };
        if let Some(stored) = self.store(&doc, options).await? {
            return Ok(Some(stored));
        }
        debug!(resource = %self.config.resource, "loaded document has no primary key; returned uncached");
        Ok(Some(self.maybe_expand(doc, options).await))
    }

    /// Remove the cached document named by the primary key in `filter`.
    /// A filter without a primary key is a no-op.
    pub async fn evict(&self, filter: &Document) -> StoreResult<()> {
        let Some(key) = self.key_of(filter) else {
            return Ok(());
        };
        let existed = self.cache.del(&key.to_string()).await?;
        debug!(%key, existed, "cache entry evicted");
        Ok(())
    }

    /// Expand the references named by `expression` in `doc`.
    pub async fn expand(&self, doc: Document, expression: &str) -> Document {
        self.expander.expand(doc, expression).await
    }

    /// Expand and report each field's outcome.
    pub async fn expand_with_report(
        &self,
        doc: Document,
        expression: &str,
    ) -> (Document, ExpansionReport) {
        self.expander.expand_with_report(doc, expression).await
    }

    /// The jobs an expression would run against this resource.
    pub fn plan(&self, expression: &str) -> ExpansionPlan {
        self.expander.plan(expression)
    }

    async fn maybe_expand(&self, record: Document, options: &ExpandOptions) -> Document {
        match options.expression() {
            Some(expression) => self.expander.expand(record, expression).await,
            None => record,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
