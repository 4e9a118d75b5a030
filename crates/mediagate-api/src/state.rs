use mediagate_core::Config;
use mediagate_processing::UploadPipeline;
use mediagate_storage::Storage;
use std::sync::Arc;

/// Shared application state.
///
/// The pipeline holds no per-request state, so one instance serves every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
    pub pipeline: Arc<UploadPipeline>,
}

impl AppState {
    pub fn new(config: Config, storage: Arc<dyn Storage>) -> Self {
        let pipeline = Arc::new(UploadPipeline::new(
            storage.clone(),
            config.pipeline().clone(),
        ));
        Self {
            config,
            storage,
            pipeline,
        }
    }
}
