#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Migration not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}
