use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeneratorError {
    /// No usable SQL source, or options that cannot be combined.
    #[error("{0}")]
    InputResolution(String),

    #[error("parse error near `{fragment}`: {message}")]
    Parse { fragment: String, message: String },

    #[error("column '{column}' has unsupported type '{data_type}'")]
    UnsupportedType { column: String, data_type: String },

    #[error("column '{0}' is defined more than once")]
    DuplicateColumn(String),

    #[error("columns '{first}' and '{second}' both map to field '{field}'")]
    FieldCollision {
        field: String,
        first: String,
        second: String,
    },

    #[error("{0}")]
    Connection(String),

    /// The OS error is part of the message, not a source.
    #[error("{}: {error}", .path.display())]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },
}

impl GeneratorError {
    pub fn parse(fragment: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            fragment: fragment.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            error,
        }
    }
}

pub type Result<T, E = GeneratorError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_type_names_column_and_type() {
        let err = GeneratorError::UnsupportedType {
            column: "area".into(),
            data_type: "geometry".into(),
        };
        assert_eq!(
            err.to_string(),
            "column 'area' has unsupported type 'geometry'"
        );
    }

    #[test]
    fn io_error_includes_path() {
        let err = GeneratorError::io(
            "model/user.go",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "model/user.go: denied");
    }

    #[test]
    fn io_error_prints_once_in_a_chain() {
        let err = GeneratorError::io(
            "model/user.go",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let err = anyhow::Error::new(err).context("generating model");
        assert_eq!(format!("{err:#}"), "generating model: model/user.go: denied");
    }
}
