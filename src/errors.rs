use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// The background expiry worker thread could not be started.
    #[error("failed to spawn expiry worker")]
    WorkerSpawn(#[from] std::io::Error),
}
