//! Infrastructure wiring for the HTTP layer.

use std::sync::Arc;

use epitrack_infra::{
    AuditSink, InMemoryStore, ProcessEngine, RegistryService, TracingAuditSink,
};

/// Shared service handles injected into every handler.
pub struct AppServices {
    pub store: Arc<InMemoryStore>,
    pub engine: ProcessEngine<Arc<InMemoryStore>>,
    pub registry: RegistryService<Arc<InMemoryStore>>,
}

pub fn build_services() -> AppServices {
    let store = Arc::new(InMemoryStore::new());
    let audit: Arc<dyn AuditSink> = Arc::new(TracingAuditSink);

    AppServices {
        engine: ProcessEngine::new(store.clone(), audit.clone()),
        registry: RegistryService::new(store.clone(), audit),
        store,
    }
}
