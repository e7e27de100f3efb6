use crate::domain::model::ChartKind;
use crate::utils::error::{ChartError, Result};
use std::str::FromStr;

/// 驗證圖表類型是否在支援清單內
///
/// 比對區分大小寫；錯誤訊息會列出所有合法類型，讓呼叫端可以自行修正。
pub fn classify(kind: &str) -> Result<ChartKind> {
    ChartKind::ALL
        .iter()
        .copied()
        .find(|candidate| candidate.as_str() == kind)
        .ok_or_else(|| ChartError::UnsupportedChartKind {
            requested: kind.to_string(),
            valid: ChartKind::valid_list(),
        })
}

pub fn is_hierarchical(kind: &str) -> bool {
    matches!(kind, "tree" | "treemap" | "sunburst")
}

impl FromStr for ChartKind {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self> {
        classify(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_kinds() {
        for kind in ChartKind::ALL {
            assert_eq!(classify(kind.as_str()).unwrap(), kind);
        }
        assert_eq!("treemap".parse::<ChartKind>().unwrap(), ChartKind::Treemap);
    }

    #[test]
    fn test_unknown_kind_lists_valid_set() {
        for bad in ["heatmap", "Bar", "", " pie", "radar"] {
            let err = classify(bad).unwrap_err();
            assert!(matches!(err, ChartError::UnsupportedChartKind { .. }));
            assert_eq!(
                err.to_string(),
                "Invalid chart type. Must be one of: bar, line, pie, scatter, funnel, tree, treemap, sunburst"
            );
        }
    }

    #[test]
    fn test_is_hierarchical_partition() {
        assert!(is_hierarchical("tree"));
        assert!(is_hierarchical("treemap"));
        assert!(is_hierarchical("sunburst"));
        assert!(!is_hierarchical("bar"));
        assert!(!is_hierarchical("pie"));
        assert!(!is_hierarchical("unknown"));
    }
}
