use jobwatch_client::MigrationApiError;
use jobwatch_core::CoreError;

/// Why a panel action did not go through.
///
/// None of these are fatal; the panel stays usable after every one.
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    /// Startup reconciliation has not finished yet.
    #[error("Panel is still initializing")]
    NotReady,

    /// [`PanelController::shutdown`](crate::PanelController::shutdown) was called.
    #[error("Panel has been shut down")]
    ShutDown,

    /// A start is in flight or a migration is still running. No call was made.
    #[error("A migration is already starting or running")]
    Busy,

    /// The backend refused the start or could not be reached.
    #[error("Failed to start migration: {0}")]
    Start(#[from] MigrationApiError),

    /// The backend accepted the start but its answer was unusable.
    #[error("Backend returned an unusable start response: {0}")]
    InvalidResponse(#[from] CoreError),
}
