//! The backend seam the panel is written against.

use async_trait::async_trait;
use jobwatch_core::MigrationUpdate;

use crate::api::{MigrationApi, MigrationApiError};

/// Start and status calls against whatever runs the migrations.
///
/// [`MigrationApi`] is the production implementation; tests substitute
/// in-memory fakes.
#[async_trait]
pub trait MigrationBackend: Send + Sync {
    async fn start(&self) -> Result<MigrationUpdate, MigrationApiError>;

    async fn fetch_status(&self, migration_id: &str) -> Result<MigrationUpdate, MigrationApiError>;
}

#[async_trait]
impl MigrationBackend for MigrationApi {
    async fn start(&self) -> Result<MigrationUpdate, MigrationApiError> {
        MigrationApi::start(self).await
    }

    async fn fetch_status(&self, migration_id: &str) -> Result<MigrationUpdate, MigrationApiError> {
        MigrationApi::fetch_status(self, migration_id).await
    }
}
