use std::sync::Arc;

use backfill_schema::ReferenceMap;
use backfill_types::Document;

use crate::config::DispatchConfig;
use crate::dispatcher::Dispatcher;
use crate::report::ExpansionReport;
use crate::resolver::ExpansionPlan;
use crate::transport::RemoteTransport;

/// Neutralize, resolve and dispatch in one call.
pub struct Expander {
    references: Arc<ReferenceMap>,
    dispatcher: Dispatcher,
}

impl Expander {
    pub fn new(
        references: Arc<ReferenceMap>,
        transport: Arc<dyn RemoteTransport>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            references,
            dispatcher: Dispatcher::new(transport, config),
        }
    }

    pub fn references(&self) -> &ReferenceMap {
        &self.references
    }

    pub fn config(&self) -> &DispatchConfig {
        self.dispatcher.config()
    }

    /// The jobs `expression` would run, without running them.
    pub fn plan(&self, expression: &str) -> ExpansionPlan {
        ExpansionPlan::from_expression(&self.references, expression)
    }

    /// Expand the references named by `expression` in `doc`.
    ///
    /// Fields whose expansion fails keep their identifiers; use
    /// [`Self::expand_with_report`] to see which.
    pub async fn expand(&self, doc: Document, expression: &str) -> Document {
        self.expand_with_report(doc, expression).await.0
    }

    /// Expand and report the outcome of every job.
    pub async fn expand_with_report(
        &self,
        doc: Document,
        expression: &str,
    ) -> (Document, ExpansionReport) {
        let plan = self.plan(expression);
        self.dispatcher.dispatch(doc, &plan).await
    }
}
