use crate::storage::MetricsStore;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<Box<dyn MetricsStore + Send>>>,
}

impl AppState {
    pub fn new(store: impl MetricsStore + Send + 'static) -> Self {
        Self {
            store: Arc::new(Mutex::new(Box::new(store))),
        }
    }
}
