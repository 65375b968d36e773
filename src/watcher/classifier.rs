//! Event filtering and classification
//!
//! This module narrows the raw Service watch stream down to the events the
//! dispatcher cares about: add, modify, and delete transitions of
//! LoadBalancer services. Everything else is dropped without side effects.

use k8s_openapi::api::core::v1::Service;
use kube::api::WatchEvent;
use std::fmt;

/// Service type marker that qualifies an event for dispatch.
pub const LOAD_BALANCER_TYPE: &str = "LoadBalancer";

/// Lifecycle transition of a watched service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Service appeared
    Added,
    /// Service changed
    Modified,
    /// Service was removed
    Deleted,
}

impl fmt::Display for EventKind {
    /// Renders the uppercase wire form used in logs and workflow inputs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::Added => "ADDED",
            EventKind::Modified => "MODIFIED",
            EventKind::Deleted => "DELETED",
        };
        f.write_str(s)
    }
}

/// A qualifying change to a LoadBalancer service.
///
/// Produced by [`classify`], consumed once by the dispatch pipeline, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceChangeEvent {
    /// The lifecycle transition
    pub kind: EventKind,
    /// Namespace of the service
    pub namespace: String,
    /// Name of the service
    pub name: String,
}

impl ServiceChangeEvent {
    /// Stable identity key for the service, `namespace/name`.
    ///
    /// Used for logging and as the per-resource cooldown key.
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

/// Classifies a raw watch event.
///
/// Returns `Some` only for added/modified/deleted events whose service has
/// `spec.type == "LoadBalancer"`. Bookmarks, server-side error events,
/// services without a spec or type, and other service types all yield
/// `None`. This function never fails; malformed events are simply not
/// relevant, which keeps the watch loop single-purpose.
pub fn classify(event: &WatchEvent<Service>) -> Option<ServiceChangeEvent> {
    let (kind, service) = match event {
        WatchEvent::Added(svc) => (EventKind::Added, svc),
        WatchEvent::Modified(svc) => (EventKind::Modified, svc),
        WatchEvent::Deleted(svc) => (EventKind::Deleted, svc),
        WatchEvent::Bookmark(_) | WatchEvent::Error(_) => return None,
    };

    let service_type = service.spec.as_ref()?.type_.as_deref()?;
    if service_type != LOAD_BALANCER_TYPE {
        return None;
    }

    Some(ServiceChangeEvent {
        kind,
        namespace: service.metadata.namespace.clone().unwrap_or_default(),
        name: service.metadata.name.clone().unwrap_or_default(),
    })
}
