use crate::domain::model::{ChartData, ChartKind, HierNode, RawRow};
use crate::utils::error::{ChartError, Result};
use serde_json::Value;

/// 檢查資料結構是否符合圖表類型
///
/// 階層圖只看第一個根節點是否有數值 `value`；表格圖只檢查是否為陣列，
/// 多於一筆時再檢查第一列是否為陣列。列長度交由 deriver 檢查。
pub fn validate(kind: ChartKind, data: &Value) -> Result<()> {
    if kind.is_hierarchical() {
        return validate_hierarchical(kind, data);
    }

    let rows = match data {
        Value::Array(rows) => rows,
        other => {
            return Err(ChartError::DataNotArray {
                input: other.to_string(),
            })
        }
    };

    // 只有一筆時無法分辨是列還是單一值，直接放行
    if rows.len() > 1 && !rows[0].is_array() {
        return Err(ChartError::RowNotArray);
    }

    Ok(())
}

fn validate_hierarchical(kind: ChartKind, data: &Value) -> Result<()> {
    let malformed = || ChartError::MalformedHierarchicalData {
        kind: kind.to_string(),
    };

    let nodes = data.as_array().ok_or_else(|| malformed())?;

    match nodes.first() {
        Some(first) if !first.get("value").is_some_and(Value::is_number) => Err(malformed()),
        _ => Ok(()),
    }
}

impl ChartData {
    /// 驗證後轉成型別化資料
    pub fn from_request(kind: ChartKind, data: Value) -> Result<ChartData> {
        validate(kind, &data)?;

        let items = match data {
            Value::Array(items) => items,
            // validate 已排除非陣列
            _ => Vec::new(),
        };

        if kind.is_hierarchical() {
            Ok(ChartData::Hierarchical(
                items.iter().map(HierNode::from_value).collect(),
            ))
        } else {
            Ok(ChartData::Tabular(
                items.into_iter().map(RawRow::from_value).collect(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Scalar;
    use serde_json::json;

    #[test]
    fn test_tree_accepts_empty_sequence() {
        assert!(validate(ChartKind::Tree, &json!([])).is_ok());
    }

    #[test]
    fn test_tree_rejects_first_node_without_value() {
        let err = validate(ChartKind::Tree, &json!([{"name": "A"}])).unwrap_err();
        assert!(matches!(err, ChartError::MalformedHierarchicalData { .. }));

        let message = err.to_string();
        assert!(message.starts_with("tree chart data should be like"));
        assert!(message.contains(r#"[["A", 100], ["B", 200], ["C", 300]]"#));
        assert!(message.contains(r#""children""#));
    }

    #[test]
    fn test_hierarchical_value_must_be_numeric() {
        for kind in [ChartKind::Tree, ChartKind::Treemap, ChartKind::Sunburst] {
            assert!(validate(kind, &json!([{"name": "A", "value": null}])).is_err());
            assert!(validate(kind, &json!([{"name": "A", "value": "100"}])).is_err());
            assert!(validate(kind, &json!([["A", 100]])).is_err());
            assert!(validate(kind, &json!([{"name": "A", "value": 1.5}])).is_ok());
        }
    }

    #[test]
    fn test_hierarchical_only_checks_first_root() {
        let data = json!([{"name": "A", "value": 10}, {"name": "B"}]);
        assert!(validate(ChartKind::Sunburst, &data).is_ok());
    }

    #[test]
    fn test_hierarchical_non_array_is_malformed() {
        let err = validate(ChartKind::Treemap, &json!({"name": "A", "value": 1})).unwrap_err();
        assert!(matches!(err, ChartError::MalformedHierarchicalData { .. }));
    }

    #[test]
    fn test_tabular_non_array_fails() {
        for kind in [
            ChartKind::Bar,
            ChartKind::Line,
            ChartKind::Pie,
            ChartKind::Scatter,
            ChartKind::Funnel,
        ] {
            for data in [json!({"A": 1}), json!("A,1"), json!(42), Value::Null] {
                let err = validate(kind, &data).unwrap_err();
                assert!(matches!(err, ChartError::DataNotArray { .. }), "{} {}", kind, data);
            }
        }
    }

    #[test]
    fn test_data_not_array_message_embeds_input() {
        let err = validate(ChartKind::Bar, &json!({"A": 1})).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"Chart data must be an array. Input data: {"A":1}"#
        );
    }

    #[test]
    fn test_multi_row_requires_array_rows() {
        let err = validate(ChartKind::Bar, &json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, ChartError::RowNotArray));
        assert!(err.to_string().contains("array of arrays"));
    }

    #[test]
    fn test_single_or_empty_rows_skip_shape_check() {
        assert!(validate(ChartKind::Bar, &json!([])).is_ok());
        assert!(validate(ChartKind::Bar, &json!([5])).is_ok());
        assert!(validate(ChartKind::Pie, &json!([{"name": "A"}])).is_ok());
    }

    #[test]
    fn test_row_length_is_not_checked_here() {
        assert!(validate(ChartKind::Line, &json!([["A"], ["B"]])).is_ok());
    }

    #[test]
    fn test_from_request_builds_typed_data() {
        let data = ChartData::from_request(ChartKind::Bar, json!([["A", 1], ["B", 2]])).unwrap();
        match data {
            ChartData::Tabular(rows) => {
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[1].column(0), Scalar::from("B"));
            }
            other => panic!("unexpected {:?}", other),
        }

        let tree = ChartData::from_request(
            ChartKind::Tree,
            json!([{"name": "A", "value": 1, "children": [{"name": "A1", "value": 1}]}]),
        )
        .unwrap();
        assert_eq!(tree.family_name(), "hierarchical");
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_from_request_propagates_validation_errors() {
        let err = ChartData::from_request(ChartKind::Pie, json!("nope")).unwrap_err();
        assert!(matches!(err, ChartError::DataNotArray { .. }));
    }
}
