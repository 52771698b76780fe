//! Dataset inputs.

use polars::prelude::DataFrame;
use prep_model::{FlowError, Result};

use crate::workbook::Workbook;

/// What a dataset is constructed from.
#[derive(Debug, Clone)]
pub enum Source {
    /// A single table, used as-is.
    Frame(DataFrame),
    /// A workbook; the schema's sheet name selects the table.
    Workbook(Workbook),
}

impl Source {
    /// Resolves the input table.
    ///
    /// For a workbook, fails with [`FlowError::SheetNotFound`] when the
    /// sheet does not exist.
    pub fn into_frame(self, sheet_name: &str) -> Result<DataFrame> {
        match self {
            Source::Frame(frame) => Ok(frame),
            Source::Workbook(mut book) => {
                book.take_sheet(sheet_name)
                    .ok_or_else(|| FlowError::SheetNotFound {
                        sheet: sheet_name.to_string(),
                    })
            }
        }
    }
}

impl From<DataFrame> for Source {
    fn from(frame: DataFrame) -> Self {
        Source::Frame(frame)
    }
}

impl From<Workbook> for Source {
    fn from(book: Workbook) -> Self {
        Source::Workbook(book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, Series};

    fn frame() -> DataFrame {
        DataFrame::new(vec![Series::new("v".into(), vec!["x"]).into()]).unwrap()
    }

    #[test]
    fn frame_ignores_sheet_name() {
        let source = Source::from(frame());
        assert_eq!(source.into_frame("anything").unwrap().height(), 1);
    }

    #[test]
    fn workbook_selects_sheet() {
        let source = Source::from(Workbook::from_sheets([("Sheet1", frame())]));
        assert!(source.clone().into_frame("Sheet1").is_ok());
        match source.into_frame("Sheet2").unwrap_err() {
            FlowError::SheetNotFound { sheet } => assert_eq!(sheet, "Sheet2"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
