//! Data loading utilities

use crate::error::{BenchError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Loader for delimited tabular files
pub struct DataLoader {
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            infer_schema_length: 100,
        }
    }

    pub fn with_infer_schema_length(mut self, n: usize) -> Self {
        self.infer_schema_length = n;
        self
    }

    /// Load a CSV file
    pub fn load_csv(&self, path: &Path) -> Result<DataFrame> {
        self.load_csv_with_options(path, b',', true)
    }

    /// Load a CSV file with specific options
    pub fn load_csv_with_options(
        &self,
        path: &Path,
        delimiter: u8,
        has_header: bool,
    ) -> Result<DataFrame> {
        let file = File::open(path).map_err(|e| BenchError::Data(e.to_string()))?;

        let parse_opts = CsvParseOptions::default().with_separator(delimiter);

        let reader = CsvReadOptions::default()
            .with_has_header(has_header)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file);

        reader.finish().map_err(|e| BenchError::Data(e.to_string()))
    }

    /// Detect the delimiter from the extension and load
    pub fn load_auto(&self, path: &Path) -> Result<DataFrame> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let delimiter = match ext.as_str() {
            "tsv" => b'\t',
            _ => b',',
        };
        self.load_csv_with_options(path, delimiter, true)
    }
}

/// Rename one column of a frame in place, leaving the rest untouched.
pub fn rename_column(df: &mut DataFrame, from: &str, to: &str) -> Result<()> {
    df.rename(from, to.into())
        .map_err(|_| BenchError::FeatureNotFound(from.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv() -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "a,b,c").unwrap();
        writeln!(file, "1,2,3").unwrap();
        writeln!(file, "4,5,6").unwrap();
        writeln!(file, "7,8,9").unwrap();
        file
    }

    #[test]
    fn test_load_csv() {
        let file = create_test_csv();
        let loader = DataLoader::new();

        let df = loader.load_csv(file.path()).unwrap();

        assert_eq!(df.height(), 3);
        assert_eq!(df.width(), 3);
    }

    #[test]
    fn test_load_tsv() {
        let mut file = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
        writeln!(file, "x\ty").unwrap();
        writeln!(file, "1\t2").unwrap();

        let df = DataLoader::new().load_auto(file.path()).unwrap();
        assert_eq!(df.width(), 2);
        assert_eq!(df.height(), 1);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let loader = DataLoader::new();
        let result = loader.load_csv(Path::new("/nonexistent/file.csv"));
        assert!(matches!(result, Err(BenchError::Data(_))));
    }

    #[test]
    fn test_rename_column() {
        let file = create_test_csv();
        let mut df = DataLoader::new().load_csv(file.path()).unwrap();

        rename_column(&mut df, "a", "class").unwrap();
        assert!(df.column("class").is_ok());
        assert!(df.column("a").is_err());
    }

    #[test]
    fn test_rename_missing_column_fails() {
        let file = create_test_csv();
        let mut df = DataLoader::new().load_csv(file.path()).unwrap();

        assert!(matches!(
            rename_column(&mut df, "ghost", "class"),
            Err(BenchError::FeatureNotFound(_))
        ));
    }
}
