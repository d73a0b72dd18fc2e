use serde::{Deserialize, Serialize};

use backfill_expand::DispatchConfig;

use crate::error::StoreResult;

/// Primary-key field used when none is configured.
pub const DEFAULT_PRIMARY_KEY: &str = "_id";

/// Configuration for a [`BackfillStore`](crate::BackfillStore).
///
/// ```toml
/// namespace = "prod"
/// resource = "posts"
/// primary_key = "_id"
///
/// [dispatch]
/// fetch_operation = "read"
/// max_concurrency_per_job = 8
/// call_timeout_ms = 2000
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackfillConfig {
    /// Deployment-scoped key prefix.
    pub namespace: Option<String>,
    /// Name of the resource whose documents this store caches.
    pub resource: String,
    /// Field holding the primary key in documents and filters.
    pub primary_key: String,
    /// Remote expansion settings.
    pub dispatch: DispatchConfig,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            resource: String::new(),
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
            dispatch: DispatchConfig::default(),
        }
    }
}

impl BackfillConfig {
    /// Config for `resource` with default settings.
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            ..Default::default()
        }
    }

    /// Parse from TOML text. Omitted fields take their defaults.
    pub fn from_toml_str(text: &str) -> StoreResult<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_primary_key(mut self, field: impl Into<String>) -> Self {
        self.primary_key = field.into();
        self
    }

    pub fn with_dispatch(mut self, dispatch: DispatchConfig) -> Self {
        self.dispatch = dispatch;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn default_config() {
        let c = BackfillConfig::new("posts");
        assert_eq!(c.resource, "posts");
        assert_eq!(c.primary_key, "_id");
        assert!(c.namespace.is_none());
        assert_eq!(c.dispatch.fetch_operation, "read");
    }

    #[test]
    fn parses_toml() {
        let c = BackfillConfig::from_toml_str(
            r#"
            namespace = "prod"
            resource = "posts"

            [dispatch]
            max_concurrency_per_job = 4
            call_timeout_ms = 1500
            "#,
        )
        .unwrap();
        assert_eq!(c.namespace.as_deref(), Some("prod"));
        assert_eq!(c.primary_key, "_id");
        assert_eq!(c.dispatch.max_concurrency_per_job, 4);
        assert_eq!(c.dispatch.call_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(c.dispatch.fetch_operation, "read");
    }

    #[test]
    fn rejects_bad_toml() {
        assert!(BackfillConfig::from_toml_str("resource = [").is_err());
    }
}
