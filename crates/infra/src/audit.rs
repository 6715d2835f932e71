//! Best-effort audit side channel.
//!
//! Mutations record what happened after the primary transaction committed.
//! Recording is fire-and-forget: sink failures are logged and swallowed,
//! never surfaced to the caller and never able to abort the business
//! transaction that already committed.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use epitrack_core::TenantId;

/// One appended audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub tenant_id: TenantId,
    /// Entity kind ("process", "item", "collaborator", "company").
    pub entity: String,
    pub entity_id: String,
    /// What happened ("created", "updated", "deleted", "delivery_confirmed",
    /// "return_registered", ...).
    pub action: String,
    pub occurred_at: DateTime<Utc>,
    /// Free-form detail payload.
    pub detail: serde_json::Value,
}

impl AuditEvent {
    pub fn new(
        tenant_id: TenantId,
        entity: impl Into<String>,
        entity_id: impl ToString,
        action: impl Into<String>,
        detail: serde_json::Value,
    ) -> Self {
        Self {
            tenant_id,
            entity: entity.into(),
            entity_id: entity_id.to_string(),
            action: action.into(),
            occurred_at: Utc::now(),
            detail,
        }
    }
}

/// Append-only audit sink.
///
/// The signature is infallible on purpose: implementations own their failure
/// handling (log and drop).
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

impl<S> AuditSink for Arc<S>
where
    S: AuditSink + ?Sized,
{
    fn record(&self, event: AuditEvent) {
        (**self).record(event)
    }
}

/// In-memory sink for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    inner: Mutex<Vec<AuditEvent>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<AuditEvent> {
        self.inner.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn for_tenant(&self, tenant_id: TenantId) -> Vec<AuditEvent> {
        self.all()
            .into_iter()
            .filter(|e| e.tenant_id == tenant_id)
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        match self.inner.lock() {
            Ok(mut events) => events.push(event),
            Err(_) => tracing::warn!("audit sink lock poisoned; event dropped"),
        }
    }
}

/// Sink that writes audit records to the tracing pipeline.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        tracing::info!(
            tenant_id = %event.tenant_id,
            entity = %event.entity,
            entity_id = %event.entity_id,
            action = %event.action,
            detail = %event.detail,
            "audit"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_sink_collects_events_per_tenant() {
        let sink = InMemoryAuditSink::new();
        let a = TenantId::new();
        let b = TenantId::new();

        sink.record(AuditEvent::new(a, "item", "1", "created", serde_json::json!({})));
        sink.record(AuditEvent::new(b, "item", "2", "created", serde_json::json!({})));

        assert_eq!(sink.all().len(), 2);
        assert_eq!(sink.for_tenant(a).len(), 1);
        assert_eq!(sink.for_tenant(a)[0].entity_id, "1");
    }
}
