//! Match predicates attached to pending requests.

use crate::domain::codec::decode_encoded;
use crate::domain::correlation::CorrelationId;
use crate::domain::error::{HubError, HubResult};
use shared_bus::event_types;
use shared_types::{names, Stanza};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Caller-supplied predicate. An `Err` counts as "no match".
pub type MatchFn = dyn Fn(&Stanza) -> HubResult<bool> + Send + Sync;

/// Decides whether an inbound stanza answers a pending request.
#[derive(Clone)]
pub enum Matcher {
    /// The stanza's `id` attribute equals the identifier.
    Id(CorrelationId),
    /// The stanza carries an `event` child of `event_type` whose encoded
    /// text has `field == value`.
    Event {
        event_type: String,
        field: String,
        value: String,
    },
    Custom(Arc<MatchFn>),
}

impl Matcher {
    /// Wrap a caller predicate. A panic inside it is reported as
    /// [`HubError::Predicate`] and counts as "no match".
    ///
    /// The predicate runs while the registry lock is held, so it must not
    /// call back into the registry or the client that owns it.
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&Stanza) -> HubResult<bool> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(predicate))
    }

    /// Matches the `startActivityFinished` event for the given activity.
    pub fn activity_finished(activity_id: impl Into<String>) -> Self {
        Self::Event {
            event_type: event_types::START_ACTIVITY_FINISHED.to_string(),
            field: "activityId".to_string(),
            value: activity_id.into(),
        }
    }

    pub fn matches(&self, stanza: &Stanza) -> HubResult<bool> {
        match self {
            Self::Id(id) => Ok(stanza.id().and_then(CorrelationId::parse) == Some(*id)),
            Self::Event {
                event_type,
                field,
                value,
            } => {
                let Some(event) = stanza.child(names::EVENT) else {
                    return Ok(false);
                };
                if event.attr(names::TYPE) != Some(event_type.as_str()) {
                    return Ok(false);
                }
                let text = event.text().unwrap_or_default();
                Ok(decode_encoded(text)
                    .map(|map| map.get(field) == Some(value.as_str()))
                    .unwrap_or(false))
            }
            Self::Custom(predicate) => catch_unwind(AssertUnwindSafe(|| predicate(stanza)))
                .unwrap_or_else(|panic| Err(HubError::Predicate(panic_message(&*panic)))),
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Id(_) => "id",
            Self::Event { .. } => "event",
            Self::Custom(_) => "custom",
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "predicate panicked".to_string()
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => f.debug_tuple("Id").field(id).finish(),
            Self::Event {
                event_type,
                field,
                value,
            } => f
                .debug_struct("Event")
                .field("event_type", event_type)
                .field("field", field)
                .field("value", value)
                .finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
