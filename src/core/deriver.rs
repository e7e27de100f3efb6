//! 由表格資料推導座標軸與序列結構。
//!
//! 型別判斷只取第一列作為樣本 (O(1))，其餘列的型別不再檢查；
//! 混合型別的欄位會沿用第一列的判斷結果。

use crate::domain::model::{AxisSpec, AxisValueKind, DerivedAxis, NameValue, RawRow, Scalar};
use crate::utils::error::{ChartError, Result};

/// 取得第一列並確認至少有兩個欄位；空資料集回傳 None
fn first_row(data: &[RawRow]) -> Result<Option<&RawRow>> {
    let Some(row) = data.first() else {
        return Ok(None);
    };

    if row.len() < 2 {
        return Err(ChartError::InvalidRowShape { found: row.len() });
    }

    Ok(Some(row))
}

fn column(data: &[RawRow], index: usize) -> Vec<Scalar> {
    data.iter().map(|row| row.column(index)).collect()
}

/// X 軸：第一欄為文字時為類別軸，否則為數值軸；值一律完整列出
pub fn derive_x(data: &[RawRow], axis_name: Option<&str>) -> Result<DerivedAxis> {
    let Some(row) = first_row(data)? else {
        return Ok(DerivedAxis::Empty);
    };

    let value_kind = if row.column(0).is_text() {
        AxisValueKind::Category
    } else {
        AxisValueKind::Numeric
    };

    Ok(DerivedAxis::Axis(AxisSpec {
        value_kind,
        values: Some(column(data, 0)),
        display_name: axis_name.map(str::to_string),
    }))
}

/// Y 軸：第二欄為數字時為數值軸且不列出值，否則為類別軸並列出第二欄
pub fn derive_y(data: &[RawRow], axis_name: Option<&str>) -> Result<DerivedAxis> {
    let Some(row) = first_row(data)? else {
        return Ok(DerivedAxis::Empty);
    };

    let (value_kind, values) = if row.column(1).is_number() {
        (AxisValueKind::Numeric, None)
    } else {
        (AxisValueKind::Category, Some(column(data, 1)))
    };

    Ok(DerivedAxis::Axis(AxisSpec {
        value_kind,
        values,
        display_name: axis_name.map(str::to_string),
    }))
}

/// pie / funnel 使用的 name/value 配對，不做型別推斷
pub fn derive_name_value(data: &[RawRow]) -> Result<Vec<NameValue>> {
    if first_row(data)?.is_none() {
        return Ok(Vec::new());
    }

    Ok(data
        .iter()
        .map(|row| NameValue {
            name: row.column(0),
            value: row.column(1),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(value: serde_json::Value) -> Vec<RawRow> {
        serde_json::from_value::<Vec<serde_json::Value>>(value)
            .unwrap()
            .into_iter()
            .map(RawRow::from_value)
            .collect()
    }

    #[test]
    fn test_empty_dataset_gives_placeholder() {
        assert_eq!(derive_x(&[], Some("X")).unwrap(), DerivedAxis::Empty);
        assert_eq!(derive_y(&[], None).unwrap(), DerivedAxis::Empty);
        assert!(derive_name_value(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_short_first_row_fails() {
        let data = rows(json!([["A"], ["B", 2]]));
        for result in [derive_x(&data, None), derive_y(&data, None)] {
            assert!(matches!(
                result,
                Err(ChartError::InvalidRowShape { found: 1 })
            ));
        }
        assert!(derive_name_value(&data).is_err());
    }

    #[test]
    fn test_non_array_row_fails_in_deriver() {
        let data = rows(json!([5]));
        assert!(matches!(
            derive_x(&data, None),
            Err(ChartError::InvalidRowShape { found: 0 })
        ));
    }

    #[test]
    fn test_x_category_from_text() {
        let data = rows(json!([["A", 100], ["B", 200], ["C", 300]]));
        let axis = derive_x(&data, Some("Fruit")).unwrap();
        assert_eq!(
            serde_json::to_value(&axis).unwrap(),
            json!({"type": "category", "data": ["A", "B", "C"], "name": "Fruit"})
        );
    }

    #[test]
    fn test_x_numeric_still_materializes_values() {
        let data = rows(json!([[1, 2], [3, 4]]));
        let axis = derive_x(&data, None).unwrap();
        let spec = axis.spec().unwrap();
        assert_eq!(spec.value_kind, AxisValueKind::Numeric);
        assert_eq!(spec.values.as_ref().unwrap().len(), 2);
        assert_eq!(spec.display_name, None);
    }

    #[test]
    fn test_y_numeric_omits_values() {
        let data = rows(json!([["A", 100], ["B", 200]]));
        let axis = derive_y(&data, Some("Amount")).unwrap();
        assert_eq!(
            serde_json::to_value(&axis).unwrap(),
            json!({"type": "value", "data": null, "name": "Amount"})
        );
    }

    #[test]
    fn test_y_category_materializes_second_column() {
        let data = rows(json!([["Mon", "low"], ["Tue", "high"]]));
        let spec = derive_y(&data, None).unwrap().spec().cloned().unwrap();
        assert_eq!(spec.value_kind, AxisValueKind::Category);
        assert_eq!(
            spec.values.unwrap(),
            vec![Scalar::from("low"), Scalar::from("high")]
        );
    }

    #[test]
    fn test_typing_samples_first_row_only() {
        let data = rows(json!([["A", 1], ["B", "x"]]));
        let spec = derive_y(&data, None).unwrap().spec().cloned().unwrap();
        assert_eq!(spec.value_kind, AxisValueKind::Numeric);
        assert_eq!(spec.values, None);

        let data = rows(json!([[1, 1], ["B", 2]]));
        let spec = derive_x(&data, None).unwrap().spec().cloned().unwrap();
        assert_eq!(spec.value_kind, AxisValueKind::Numeric);
    }

    #[test]
    fn test_later_short_rows_fill_null() {
        let data = rows(json!([["A", "x"], ["B"]]));
        let spec = derive_y(&data, None).unwrap().spec().cloned().unwrap();
        assert_eq!(spec.values.unwrap(), vec![Scalar::from("x"), Scalar::Null]);
    }

    #[test]
    fn test_name_value_pairs() {
        let data = rows(json!([["A", 100], ["B", 200]]));
        let pairs = derive_name_value(&data).unwrap();
        assert_eq!(
            serde_json::to_value(&pairs).unwrap(),
            json!([{"name": "A", "value": 100}, {"name": "B", "value": 200}])
        );
    }

    #[test]
    fn test_name_value_keeps_raw_types() {
        let data = rows(json!([[2024, "n/a"], ["B", 1.5]]));
        let pairs = derive_name_value(&data).unwrap();
        assert_eq!(pairs[0].name, Scalar::from(2024));
        assert_eq!(pairs[0].value, Scalar::from("n/a"));
    }
}
