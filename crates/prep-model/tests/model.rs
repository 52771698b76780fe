//! Integration tests for the model crate.

use prep_model::{Dtype, FlowError, JoinKind, Value};
use proptest::prelude::*;

#[test]
fn dtype_serializes_lowercase() {
    let json = serde_json::to_string(&Dtype::ALL).unwrap();
    assert_eq!(
        json,
        r#"["text","integer","float","boolean","timestamp"]"#
    );
    let kind: JoinKind = serde_json::from_str(r#""inner""#).unwrap();
    assert_eq!(kind, JoinKind::Inner);
}

#[test]
fn value_cast_error_message() {
    let err = FlowError::ValueCast {
        column: "age".into(),
        row_number: 1,
        value: Value::from("二十八"),
        from: "str".into(),
        to: "i64".into(),
    };
    insta::assert_snapshot!(
        err.to_string(),
        @r#"cannot cast "二十八" in column 'age' at row 1 from str to i64"#
    );
}

#[test]
fn reference_errors_name_their_target() {
    let missing = FlowError::ReferenceDataNotFound {
        name: "PrefectureFlow".into(),
    };
    insta::assert_snapshot!(missing.to_string(), @"reference data 'PrefectureFlow' not found");
    let uninit = FlowError::ReferenceDataNotInitialization {
        name: "prefecture_name".into(),
    };
    assert_eq!(uninit.kind(), "ReferenceDataNotInitializationError");
}

proptest! {
    #[test]
    fn integers_survive_text_round_trip(n in any::<i64>()) {
        let text = Dtype::Text.cast(&Value::Integer(n)).unwrap();
        prop_assert_eq!(Dtype::Integer.cast(&text).unwrap(), Value::Integer(n));
    }

    #[test]
    fn every_cast_is_idempotent_on_its_output(n in -1_000_000i64..1_000_000) {
        for dtype in Dtype::ALL {
            if let Ok(once) = dtype.cast(&Value::Integer(n)) {
                prop_assert_eq!(dtype.cast(&once).unwrap(), once);
            }
        }
    }
}
