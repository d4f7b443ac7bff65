use thiserror::Error;

/// Errors produced while parsing or writing percent-format scripts.
#[derive(Debug, Error)]
pub enum PercentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Notebook(#[from] ipynb::IpynbError),

    #[error("Header syntax error at line {line}: {message}")]
    Header { line: usize, message: String },

    #[error("Invalid cell marker at line {line}: {message}")]
    Marker { line: usize, message: String },

    #[error("Cannot pair {0}: expected a .py or .ipynb extension")]
    UnpairablePath(String),

    #[error("{0} does not exist")]
    MissingFile(String),
}

impl PercentError {
    pub(crate) fn header(line: usize, message: impl Into<String>) -> Self {
        PercentError::Header {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn marker(line: usize, message: impl Into<String>) -> Self {
        PercentError::Marker {
            line,
            message: message.into(),
        }
    }
}
