use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::errors::{ServiceError, ServiceResult};
use crate::search::{SearchBackend, SearchMethod, SearchParams};

/// Runs searches on blocking threads, at most `max_concurrent_searches` at once.
#[derive(Clone)]
pub struct Dispatcher {
    backend: Arc<dyn SearchBackend>,
    workers: Arc<Semaphore>,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn SearchBackend>, max_concurrent_searches: usize) -> Dispatcher {
        Dispatcher {
            backend,
            workers: Arc::new(Semaphore::new(max_concurrent_searches.max(1))),
        }
    }

    pub fn available_workers(&self) -> usize {
        self.workers.available_permits()
    }

    pub async fn search(&self, method: SearchMethod, params: SearchParams) -> ServiceResult<String> {
        log::info!(
            "Receive inputs: root_dir={:?}, method={}, community_level={}, response_type={:?}, query={:?}",
            params.root_dir,
            method,
            params.community_level,
            params.response_type,
            params.query
        );

        let permit = self
            .workers
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| ServiceError::Upstream(e.into()))?;

        // The permit travels with the blocking task: a dropped request does not
        // cancel the search, and the slot stays taken until it finishes.
        let backend = self.backend.clone();
        let response = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            backend.search(method, &params)
        })
        .await??;

        log::info!("Search result:\n{}", response);
        Ok(response)
    }
}
