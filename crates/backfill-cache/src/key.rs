use std::fmt;

/// Cache key of one document: `{namespace}:{resource}:{id}`, or
/// `{resource}:{id}` without a namespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: Option<String>,
    resource: String,
    id: String,
}

impl CacheKey {
    pub fn new(namespace: Option<&str>, resource: &str, id: &str) -> Self {
        Self {
            namespace: namespace.filter(|ns| !ns.is_empty()).map(str::to_string),
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{ns}:{}:{}", self.resource, self.id),
            None => write!(f, "{}:{}", self.resource, self.id),
        }
    }
}
