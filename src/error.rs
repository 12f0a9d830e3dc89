use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load student records: {context}")]
    DataSource {
        context: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to encode export: {0}")]
    Export(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn data_source(context: impl Into<String>, source: sqlx::Error) -> Self {
        Error::DataSource {
            context: context.into(),
            source,
        }
    }
}

/// A package value that could not be read as a number. Filtering treats it
/// as zero and carries on; this is logged, never returned as an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("student {student_id}: placement package {raw:?} is not numeric, treating as 0")]
pub struct CoercionWarning {
    pub student_id: i64,
    pub raw: String,
}
