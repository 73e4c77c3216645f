// CSV input: reads the whole file up front so the column resolver can see
// every value of a column before anything is sent to the remote service.

use crate::error::{ImportError, Result};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// A parsed CSV file: header plus all records, each record the same
/// length as the header.
#[derive(Debug, Clone)]
pub struct CsvFile {
    path: PathBuf,
    header: Vec<String>,
    records: Vec<Vec<String>>,
}

impl CsvFile {
    /// Read and validate a UTF-8 CSV file whose first row is the header.
    pub fn read(path: &Path) -> Result<Self> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

        let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if header.is_empty() || header.iter().all(String::is_empty) {
            return Err(ImportError::EmptyHeader);
        }

        let mut seen = HashSet::new();
        for name in &header {
            if !seen.insert(name.as_str()) {
                return Err(ImportError::DuplicateColumn(name.clone()));
            }
        }

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record?;
            records.push(record.iter().map(str::to_string).collect());
        }

        tracing::debug!(
            path = %path.display(),
            columns = header.len(),
            rows = records.len(),
            "read csv file"
        );

        Ok(CsvFile {
            path: path.to_path_buf(),
            header,
            records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn records(&self) -> &[Vec<String>] {
        &self.records
    }

    /// Directory that relative media paths in the file are resolved against.
    pub fn base_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    /// File name without extension, used as the title of a new database.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Imported CSV".into())
    }

    /// Values of one column across all records.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &str> {
        self.records
            .iter()
            .map(move |record| record.get(index).map(String::as_str).unwrap_or(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_csv(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn reads_header_and_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "test.csv", "a,b,icon file\na,b,\nc,d,x.png\n");

        let csv = CsvFile::read(&path).unwrap();
        assert_eq!(csv.header(), ["a", "b", "icon file"]);
        assert_eq!(csv.records().len(), 2);
        assert_eq!(csv.records()[1][2], "x.png");
        assert_eq!(csv.column_values(2).collect::<Vec<_>>(), vec!["", "x.png"]);
        assert_eq!(csv.path(), path);
        assert_eq!(csv.stem(), "test");
        assert_eq!(csv.base_dir(), dir.path());
    }

    #[test]
    fn rejects_duplicate_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "dup.csv", "a,b,a\n1,2,3\n");

        let err = CsvFile::read(&path).unwrap_err();
        assert!(matches!(err, ImportError::DuplicateColumn(ref name) if name == "a"));
    }

    #[test]
    fn rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "empty.csv", "");

        assert!(matches!(
            CsvFile::read(&path).unwrap_err(),
            ImportError::EmptyHeader
        ));
    }

    #[test]
    fn ragged_rows_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "ragged.csv", "a,b\n1,2,3\n");

        assert!(matches!(
            CsvFile::read(&path).unwrap_err(),
            ImportError::Csv(_)
        ));
    }
}
