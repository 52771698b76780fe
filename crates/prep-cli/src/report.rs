//! Rendering of constructed tables and construction errors.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use polars::prelude::{DataFrame, PolarsResult};
use prep_core::{Dtype, FlowError, Value};
use prep_model::series_values;
use serde_json::{Map, Number, json};

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn value_cell(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::new("null").fg(Color::DarkGrey),
        Value::Integer(_) | Value::Float(_) => {
            Cell::new(value.to_text()).set_alignment(CellAlignment::Right)
        }
        other => Cell::new(other.to_text()),
    }
}

/// Column-major cell values of `df`.
fn columns(df: &DataFrame) -> PolarsResult<Vec<(String, Vec<Value>)>> {
    df.get_columns()
        .iter()
        .map(|column| {
            let values = series_values(column.as_materialized_series())?;
            Ok((column.name().to_string(), values))
        })
        .collect()
}

/// The first `limit` rows of `df` as a table, with column types in the header.
pub fn frame_table(df: &DataFrame, limit: usize) -> PolarsResult<Table> {
    let columns = columns(df)?;
    let mut table = Table::new();
    table.set_header(
        df.get_columns()
            .iter()
            .map(|c| header_cell(&format!("{}\n{}", c.name(), c.dtype()))),
    );
    apply_table_style(&mut table);
    for idx in 0..df.height().min(limit) {
        table.add_row(columns.iter().map(|(_, values)| value_cell(&values[idx])));
    }
    Ok(table)
}

/// The type registry as a table.
pub fn types_table() -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Type"), header_cell("Aliases")]);
    apply_table_style(&mut table);
    for dtype in Dtype::ALL {
        table.add_row(vec![Cell::new(dtype.name()), Cell::new(dtype.aliases().join(", "))]);
    }
    table
}

pub fn value_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => json!(b),
        Value::Integer(i) => json!(i),
        Value::Float(f) => Number::from_f64(*f).map_or(serde_json::Value::Null, Into::into),
        Value::Text(s) => json!(s),
        Value::Timestamp(ts) => json!(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
    }
}

/// `{"schema", "rows", "columns", "data"}` with one object per row.
pub fn frame_json(schema: &str, df: &DataFrame) -> PolarsResult<serde_json::Value> {
    let columns = columns(df)?;
    let rows: Vec<serde_json::Value> = (0..df.height())
        .map(|idx| {
            let row: Map<String, serde_json::Value> = columns
                .iter()
                .map(|(name, values)| (name.clone(), value_json(&values[idx])))
                .collect();
            serde_json::Value::Object(row)
        })
        .collect();
    Ok(json!({
        "schema": schema,
        "rows": df.height(),
        "columns": columns.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>(),
        "data": rows,
    }))
}

/// The structured fields of a construction error.
pub fn error_json(error: &FlowError) -> serde_json::Value {
    let mut object = Map::new();
    object.insert("error".into(), json!(error.kind()));
    object.insert("message".into(), json!(error.to_string()));
    if let Some(column) = error.column() {
        object.insert("column".into(), json!(column));
    }
    if let Some(row) = error.row_number() {
        object.insert("row_number".into(), json!(row));
    }
    if let Some(value) = error.value() {
        object.insert("value".into(), value_json(value));
    }
    match error {
        FlowError::NecessaryColumnsNotFound { columns }
        | FlowError::UnnecessaryColumnsExists { columns } => {
            object.insert("columns".into(), json!(columns));
        }
        FlowError::InvalidRegexpFound { regexp, .. } => {
            object.insert("regexp".into(), json!(regexp));
        }
        FlowError::InvalidCategoryFound { category, .. } => {
            object.insert(
                "category".into(),
                category.iter().map(value_json).collect::<Vec<_>>().into(),
            );
        }
        _ => {}
    }
    serde_json::Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_that_are_not_finite_become_null() {
        assert_eq!(value_json(&Value::Float(f64::NAN)), serde_json::Value::Null);
        assert_eq!(value_json(&Value::Float(1.5)), json!(1.5));
    }

    #[test]
    fn types_table_lists_registry() {
        let rendered = types_table().to_string();
        for dtype in Dtype::ALL {
            assert!(rendered.contains(dtype.name()));
        }
    }
}
