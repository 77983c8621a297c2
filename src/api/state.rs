use std::sync::Arc;

use crate::config::Config;
use crate::fetch::OriginFetch;
use crate::observability::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub fetcher: Arc<dyn OriginFetch>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: Config, fetcher: Arc<dyn OriginFetch>) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
            metrics: Arc::new(Metrics::new()),
        }
    }
}
