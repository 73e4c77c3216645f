// Error type shared by the library modules. The binary wraps these in
// `anyhow::Error` and adds context where it calls into the library.

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop an import run.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("{kind} column '{name}' not found in csv file")]
    ColumnNotFound { kind: &'static str, name: String },
    #[error("Column '{name}' is used as both {first} and {second} column")]
    ColumnRoleConflict {
        name: String,
        first: &'static str,
        second: &'static str,
    },
    #[error("Duplicate column '{0}' in csv header")]
    DuplicateColumn(String),
    #[error("CSV file has no header row")]
    EmptyHeader,
    #[error("Row {row}: {error}")]
    Row { row: usize, error: Box<ImportError> },
    #[error("{} does not exist", .0.display())]
    FileNotFound(PathBuf),
    #[error("CSV columns missing from database: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("Duplicate value '{0}' in merge column")]
    DuplicateKey(String),
    #[error("Invalid database url: {0}")]
    InvalidDatabaseUrl(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_column() {
        let err = ImportError::ColumnNotFound {
            kind: "Image caption",
            name: "image caption".into(),
        };
        assert_eq!(
            err.to_string(),
            "Image caption column 'image caption' not found in csv file"
        );
    }

    #[test]
    fn row_error_prefixes_row_number_once() {
        let err = ImportError::Row {
            row: 2,
            error: Box::new(ImportError::FileNotFound("test_image.jpg".into())),
        };
        assert_eq!(err.to_string(), "Row 2: test_image.jpg does not exist");
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn missing_columns_are_listed() {
        let err = ImportError::MissingColumns(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "CSV columns missing from database: a, b");
    }
}
