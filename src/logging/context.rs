//! Request-scoped context that derived loggers can pick metadata from.

use std::{collections::HashMap, time::Duration};

use chrono::{DateTime, Utc};
use serde_json::Value;


/// Key under which request identifiers are stored in the untyped value map.
pub const REQUEST_ID_KEY: &str = "request_id";

/// Ambient metadata of a unit of work: an optional deadline, an optional
/// request identifier, and arbitrary additional values.
///
/// Loggers only read from a context, see [`Logger::with_context`](super::Logger::with_context);
/// the deadline is never enforced here.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestContext {
    deadline: Option<DateTime<Utc>>,
    request_id: Option<String>,
    values: HashMap<String, Value>,
}

impl RequestContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the deadline to `timeout` from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let deadline = chrono::Duration::from_std(timeout)
            .ok()
            .and_then(|timeout| Utc::now().checked_add_signed(timeout))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        self.with_deadline(deadline)
    }

    #[must_use]
    pub fn with_request_id<S: Into<String>>(mut self, request_id: S) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    #[must_use]
    pub fn with_value<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Looks up the request identifier: the dedicated slot first,
    /// then a string stored under [`REQUEST_ID_KEY`].
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref().or_else(|| {
            self.values
                .get(REQUEST_ID_KEY)
                .and_then(Value::as_str)
        })
    }
}
