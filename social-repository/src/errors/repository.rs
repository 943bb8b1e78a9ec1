use thiserror::Error;

/// Represents errors that can occur within the social repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    /// A uniqueness constraint rejected the write. Carries the constraint name.
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    /// A check constraint rejected the write. Carries the constraint name.
    #[error("Check constraint violated: {0}")]
    CheckViolation(String),

    #[error("Invalid notification verb: {0}")]
    InvalidVerb(String),

    #[error("Invalid notification target kind: {0}")]
    InvalidTargetKind(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                return RepositoryError::Conflict(constraint);
            }
            if db_err.is_check_violation() {
                let constraint = db_err.constraint().unwrap_or("check").to_string();
                return RepositoryError::CheckViolation(constraint);
            }
        }
        RepositoryError::DatabaseError(err)
    }
}

impl RepositoryError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, RepositoryError::Conflict(_))
    }
}
