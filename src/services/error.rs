use thiserror::Error;

use crate::services::documents::DocumentError;
use crate::services::numbering::NumberingError;
use crate::services::totals::TotalsError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Numbering(#[from] NumberingError),

    #[error(transparent)]
    Totals(#[from] TotalsError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} lock poisoned")]
    Lock(&'static str),
}
