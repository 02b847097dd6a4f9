use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::HandlerError;
use super::service::SERVICE_FIELD;
use crate::domain::LogEntry;
use crate::port::LogHandler;

/// Set of service names, sorted and deduplicated once so membership is a
/// binary search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceFilter {
    names: Vec<String>,
}

impl ServiceFilter {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        names.sort();
        names.dedup();
        Self { names }
    }

    pub fn contains(&self, service: &str) -> bool {
        self.names
            .binary_search_by(|name| name.as_str().cmp(service))
            .is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Passes on only entries whose `service` field is in the filter.
///
/// Entries without a `service` field (or with an empty one) always pass,
/// as does everything when no filter, or an empty one, is configured. A
/// non-string `service` field is an error. Calls into the inner handler
/// are serialized.
pub struct ServiceFilterHandler {
    inner: Arc<dyn LogHandler>,
    filter: Option<ServiceFilter>,
    lock: Mutex<()>,
}

impl ServiceFilterHandler {
    pub fn new(inner: Arc<dyn LogHandler>, filter: Option<ServiceFilter>) -> Self {
        Self {
            inner,
            filter: filter.filter(|f| !f.is_empty()),
            lock: Mutex::new(()),
        }
    }

    pub fn filter(&self) -> Option<&ServiceFilter> {
        self.filter.as_ref()
    }

    pub fn should_log(&self, entry: &LogEntry) -> Result<bool, HandlerError> {
        let Some(value) = entry.field(SERVICE_FIELD) else {
            return Ok(true);
        };
        let service = value
            .as_str()
            .ok_or(HandlerError::InvalidServiceField {
                type_name: value.type_name(),
            })?;

        Ok(match &self.filter {
            Some(filter) if !service.is_empty() => filter.contains(service),
            _ => true,
        })
    }
}

impl LogHandler for ServiceFilterHandler {
    fn handle_log<'a>(&'a self, entry: &'a LogEntry) -> BoxFuture<'a, Result<(), HandlerError>> {
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            if self.should_log(entry)? {
                self.inner.handle_log(entry).await
            } else {
                Ok(())
            }
        })
    }
}
