//! End-to-end loading tests.

use std::io::Write;

use polars::prelude::*;
use prep_ingest::{Source, Workbook, read_csv};
use tempfile::{NamedTempFile, TempDir};

#[test]
fn test_csv_with_utf8_bom_and_unicode_headers() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "\u{feff}名前,年齢\n太郎,28\n").unwrap();
    let df = read_csv(file.path()).unwrap();
    assert_eq!(df.get_column_names_str(), ["名前", "年齢"]);
    assert_eq!(df.column("年齢").unwrap().str().unwrap().get(0), Some("28"));
}

#[test]
fn test_directory_workbook_resolves_sheet() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("Sheet1.csv"), "name,age\nTaro,28\nJiro,31\n").unwrap();
    std::fs::write(dir.path().join("Other.csv"), "x\n1\n").unwrap();

    let source: Source = Workbook::from_dir(dir.path()).unwrap().into();
    let df = source.into_frame("Sheet1").unwrap();
    assert_eq!(df.height(), 2);
    assert_eq!(df.width(), 2);
}
