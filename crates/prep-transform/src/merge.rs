//! Reference merges.
//!
//! The foreign frame is projected down to the join keys plus the referenced
//! columns (renamed to their local attribute names) before joining, so no
//! other foreign column leaks into the result.

use polars::prelude::{
    DataFrame, Expr, IntoLazy, JoinArgs, JoinCoalesce, JoinType, MaintainOrderJoin, col,
};
use prep_model::{JoinKind, Result};

/// One join against a foreign frame.
#[derive(Debug, Clone)]
pub struct MergeSpec {
    /// Join keys, present under the same name on both sides.
    pub keys: Vec<String>,
    pub how: JoinKind,
    /// `(foreign column, local attribute)` pairs to bring in.
    pub columns: Vec<(String, String)>,
}

fn join_type(how: JoinKind) -> JoinType {
    match how {
        JoinKind::Full => JoinType::Full,
        JoinKind::Left => JoinType::Left,
        JoinKind::Inner => JoinType::Inner,
    }
}

fn maintain_order(how: JoinKind) -> MaintainOrderJoin {
    match how {
        JoinKind::Full => MaintainOrderJoin::LeftRight,
        JoinKind::Left | JoinKind::Inner => MaintainOrderJoin::Left,
    }
}

/// Joins the projected `foreign` frame onto `local`.
///
/// Local row order is preserved. Key columns are coalesced, so a full join
/// keeps a single copy of each key.
pub fn merge(local: &DataFrame, foreign: &DataFrame, spec: &MergeSpec) -> Result<DataFrame> {
    let keys: Vec<Expr> = spec.keys.iter().map(|k| col(k.as_str())).collect();
    let mut projection = keys.clone();
    projection.extend(
        spec.columns
            .iter()
            .map(|(foreign_name, local_name)| col(foreign_name.as_str()).alias(local_name.as_str())),
    );

    let mut args = JoinArgs::new(join_type(spec.how)).with_coalesce(JoinCoalesce::CoalesceColumns);
    args.maintain_order = maintain_order(spec.how);

    let merged = local
        .clone()
        .lazy()
        .join(foreign.clone().lazy().select(projection), keys.clone(), keys, args)
        .collect()?;

    tracing::debug!(
        how = %spec.how,
        keys = ?spec.keys,
        rows_before = local.height(),
        rows_after = merged.height(),
        "merged reference columns"
    );
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, Series};

    fn users() -> DataFrame {
        DataFrame::new(vec![
            Series::new("name".into(), vec!["a", "b", "c"]).into(),
            Series::new("prefecture_id".into(), vec![1i64, 2, 3]).into(),
        ])
        .unwrap()
    }

    fn prefectures() -> DataFrame {
        DataFrame::new(vec![
            Series::new("prefecture_id".into(), vec![2i64, 1]).into(),
            Series::new("name".into(), vec!["osaka", "tokyo"]).into(),
            Series::new("region".into(), vec!["kansai", "kanto"]).into(),
        ])
        .unwrap()
    }

    fn spec(how: JoinKind) -> MergeSpec {
        MergeSpec {
            keys: vec!["prefecture_id".to_string()],
            how,
            columns: vec![("name".to_string(), "prefecture_name".to_string())],
        }
    }

    #[test]
    fn left_join_keeps_local_rows_in_order() {
        let merged = merge(&users(), &prefectures(), &spec(JoinKind::Left)).unwrap();
        assert_eq!(
            merged.get_column_names_str(),
            ["name", "prefecture_id", "prefecture_name"]
        );
        let names = merged.column("prefecture_name").unwrap().str().unwrap();
        assert_eq!(names.get(0), Some("tokyo"));
        assert_eq!(names.get(1), Some("osaka"));
        assert_eq!(names.get(2), None);
        assert_eq!(merged.column("name").unwrap().str().unwrap().get(2), Some("c"));
    }

    #[test]
    fn inner_join_drops_unmatched_rows() {
        let merged = merge(&users(), &prefectures(), &spec(JoinKind::Inner)).unwrap();
        assert_eq!(merged.height(), 2);
    }

    #[test]
    fn full_join_keeps_both_sides() {
        let mut foreign = prefectures();
        foreign
            .vstack_mut(
                &DataFrame::new(vec![
                    Series::new("prefecture_id".into(), vec![9i64]).into(),
                    Series::new("name".into(), vec!["nagoya"]).into(),
                    Series::new("region".into(), vec!["chubu"]).into(),
                ])
                .unwrap(),
            )
            .unwrap();
        let merged = merge(&users(), &foreign, &spec(JoinKind::Full)).unwrap();
        assert_eq!(merged.height(), 4);
        assert_eq!(merged.column("prefecture_id").unwrap().null_count(), 0);
    }
}
