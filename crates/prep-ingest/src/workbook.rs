//! Named collections of sheets.

use std::path::{Path, PathBuf};

use polars::prelude::DataFrame;

use crate::csv::{CsvOptions, read_csv_with};
use crate::error::{IngestError, Result};

/// An ordered set of named sheets.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<(String, DataFrame)>,
}

impl Workbook {
    /// Builds a workbook from `(name, frame)` pairs.
    ///
    /// A later sheet with the same name replaces the earlier one.
    pub fn from_sheets<I, S>(sheets: I) -> Self
    where
        I: IntoIterator<Item = (S, DataFrame)>,
        S: Into<String>,
    {
        let mut book = Self::default();
        for (name, frame) in sheets {
            book.insert(name, frame);
        }
        book
    }

    /// Loads every `.csv` file in `dir` as a sheet named after its file stem.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        Self::from_dir_with(dir, CsvOptions::default())
    }

    pub fn from_dir_with(dir: &Path, options: CsvOptions) -> Result<Self> {
        let mut book = Self::default();
        for path in list_csv_files(dir)? {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if book.sheet(stem).is_some() {
                return Err(IngestError::DuplicateSheet {
                    sheet: stem.to_string(),
                    path,
                });
            }
            let frame = read_csv_with(&path, options)?;
            book.sheets.push((stem.to_string(), frame));
        }
        tracing::debug!(path = %dir.display(), sheets = book.sheets.len(), "loaded workbook");
        Ok(book)
    }

    pub fn insert(&mut self, name: impl Into<String>, frame: DataFrame) {
        let name = name.into();
        match self.sheets.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = frame,
            None => self.sheets.push((name, frame)),
        }
    }

    pub fn sheet(&self, name: &str) -> Option<&DataFrame> {
        self.sheets
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, frame)| frame)
    }

    /// Removes and returns the named sheet.
    pub fn take_sheet(&mut self, name: &str) -> Option<DataFrame> {
        let idx = self.sheets.iter().position(|(existing, _)| existing == name)?;
        Some(self.sheets.remove(idx).1)
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

/// Lists all CSV files in a directory.
///
/// Returns files sorted by filename.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, Series};
    use tempfile::TempDir;

    fn frame(value: &str) -> DataFrame {
        DataFrame::new(vec![Series::new("v".into(), vec![value]).into()]).unwrap()
    }

    #[test]
    fn test_from_sheets_replaces_duplicates() {
        let book = Workbook::from_sheets([("Sheet1", frame("a")), ("Sheet2", frame("b")), ("Sheet1", frame("c"))]);
        assert_eq!(book.sheet_names().collect::<Vec<_>>(), ["Sheet1", "Sheet2"]);
        let sheet = book.sheet("Sheet1").unwrap();
        assert_eq!(sheet.column("v").unwrap().str().unwrap().get(0), Some("c"));
    }

    #[test]
    fn test_from_dir_uses_file_stems() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Sheet1.csv"), "name\nTaro\n").unwrap();
        std::fs::write(dir.path().join("prefectures.CSV"), "id,name\n13,tokyo\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let book = Workbook::from_dir(dir.path()).unwrap();
        assert_eq!(book.len(), 2);
        assert!(book.sheet("Sheet1").is_some());
        assert!(book.sheet("prefectures").is_some());
        assert!(book.sheet("notes").is_none());
    }

    #[test]
    fn test_from_dir_missing() {
        let result = Workbook::from_dir(Path::new("/definitely/not/here"));
        assert!(matches!(result, Err(IngestError::DirectoryNotFound { .. })));
    }
}
