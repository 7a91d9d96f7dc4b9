//! Lifecycle Controller
//!
//! Builds the cache store and evaluation service, runs the reaper, and
//! stops it cleanly on request.

use std::sync::Arc;

use tracing::info;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::expr::{Compiler, FormulaCompiler};
use crate::service::EvaluationService;
use crate::tasks::{spawn_reaper, ReaperHandle};

// == Cache Runtime ==
/// A running cache: store, evaluation service, and its reaper.
///
/// Each runtime owns an independent store; nothing is shared through
/// global state, so several runtimes can coexist (as tests do).
#[derive(Debug)]
pub struct CacheRuntime {
    service: EvaluationService,
    reaper: ReaperHandle,
}

impl CacheRuntime {
    // == Start ==
    /// Starts a runtime using the built-in formula compiler.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: &Config) -> Self {
        Self::start_with_compiler(config, Arc::new(FormulaCompiler::new()))
    }

    /// Starts a runtime around any [`Compiler`].
    pub fn start_with_compiler(config: &Config, compiler: Arc<dyn Compiler>) -> Self {
        let store = Arc::new(CacheStore::new(config.max_entries));
        let service = EvaluationService::new(Arc::clone(&store), compiler, config.default_ttl);
        let reaper = spawn_reaper(store, config.reaper_interval);

        info!(
            "Cache runtime started: ttl={:?}, reaper_interval={:?}, max_entries={}",
            config.default_ttl, config.reaper_interval, config.max_entries
        );
        Self { service, reaper }
    }

    pub fn service(&self) -> &EvaluationService {
        &self.service
    }

    pub fn store(&self) -> &Arc<CacheStore> {
        self.service.store()
    }

    /// True while the reaper loop is still running.
    pub fn is_reaper_running(&self) -> bool {
        self.reaper.is_running()
    }

    // == Stop ==
    /// Signals the reaper to stop without waiting for it.
    ///
    /// Safe to call more than once; later calls are ignored. Evaluation keeps
    /// working afterwards, but idle entries are no longer evicted.
    pub fn stop(&self) {
        self.reaper.stop();
    }

    // == Shutdown ==
    /// Stops the reaper and waits for it to exit.
    pub async fn shutdown(self) {
        self.reaper.join().await;
        info!("Cache runtime shut down");
    }
}
