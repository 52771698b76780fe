//! CSV file reading.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use polars::prelude::{CsvParseOptions, CsvReadOptions, DataFrame, SerReader};

use crate::error::{IngestError, Result};

/// Options for [`read_csv_with`].
#[derive(Debug, Clone, Copy)]
pub struct CsvOptions {
    pub separator: u8,
    /// Let polars infer column types instead of reading everything as text.
    pub infer_types: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            separator: b',',
            infer_types: false,
        }
    }
}

/// Reads a comma-separated file with a header row, every column as text.
///
/// Empty fields become missing values.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    read_csv_with(path, CsvOptions::default())
}

/// Reads a delimited file with a header row.
pub fn read_csv_with(path: &Path, options: CsvOptions) -> Result<DataFrame> {
    validate_encoding(path)?;

    // 0 rows of inference reads every column as a string
    let infer_rows = if options.infer_types { 100 } else { 0 };

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(infer_rows))
        .with_parse_options(CsvParseOptions::default().with_separator(options.separator))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    tracing::debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "loaded CSV"
    );
    Ok(df)
}

/// Rejects files that start with a UTF-16 byte-order mark.
fn validate_encoding(path: &Path) -> Result<()> {
    let mut file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    let mut buffer = [0u8; 2];
    let bytes_read = file.read(&mut buffer).map_err(|e| IngestError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    if bytes_read == 2 {
        let encoding = match buffer {
            [0xFF, 0xFE] => Some("UTF-16 LE"),
            [0xFE, 0xFF] => Some("UTF-16 BE"),
            _ => None,
        };
        if let Some(encoding) = encoding {
            return Err(IngestError::UnsupportedEncoding {
                path: path.to_path_buf(),
                encoding,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::DataType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file
    }

    #[test]
    fn test_read_csv_keeps_text() {
        let file = create_temp_csv("name,age\nTaro,28\nHanako,\n".as_bytes());
        let df = read_csv(file.path()).unwrap();

        assert_eq!(df.get_column_names_str(), ["name", "age"]);
        let age = df.column("age").unwrap();
        assert_eq!(age.dtype(), &DataType::String);
        assert_eq!(age.str().unwrap().get(0), Some("28"));
        assert_eq!(age.null_count(), 1);
    }

    #[test]
    fn test_read_csv_with_separator_and_inference() {
        let file = create_temp_csv(b"a;b\n1;x\n2;y\n");
        let options = CsvOptions {
            separator: b';',
            infer_types: true,
        };
        let df = read_csv_with(file.path(), options).unwrap();
        assert_eq!(df.column("a").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn test_missing_file() {
        let result = read_csv(Path::new("/definitely/not/here.csv"));
        assert!(matches!(result, Err(IngestError::FileNotFound { .. })));
    }

    #[test]
    fn test_utf16_rejected() {
        let file = create_temp_csv(&[0xFF, 0xFE, b'a', 0]);
        assert!(matches!(
            read_csv(file.path()),
            Err(IngestError::UnsupportedEncoding { .. })
        ));
    }
}
