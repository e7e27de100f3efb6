use crate::core::deriver::{derive_name_value, derive_x, derive_y};
use crate::domain::model::{
    ChartData, ChartKind, ChartOption, ChartTitle, SeriesPoints, SeriesSpec,
};
use crate::utils::error::{ChartError, Result};

/// 資料筆數低於此值時顯示數值標籤
pub const LABEL_VISIBLE_BELOW: usize = 16;

pub const DEFAULT_TITLE: &str = "Chart";

/// 組合完整的圖表設定
///
/// 純函式：相同輸入一定得到相同輸出，除了空標題改為 "Chart" 之外沒有其他預設值。
pub fn assemble(
    kind: ChartKind,
    data: &ChartData,
    title: &str,
    series_name: &str,
    x_axis_name: Option<&str>,
    y_axis_name: Option<&str>,
) -> Result<ChartOption> {
    let points = match (kind.is_hierarchical(), data) {
        (false, ChartData::Tabular(rows)) => SeriesPoints::Rows(rows.clone()),
        (true, ChartData::Hierarchical(nodes)) => SeriesPoints::Tree(nodes.clone()),
        (_, other) => {
            return Err(ChartError::FamilyMismatch {
                kind: kind.to_string(),
                family: other.family_name(),
            })
        }
    };

    let mut option = ChartOption {
        title: ChartTitle {
            text: if title.is_empty() {
                DEFAULT_TITLE.to_string()
            } else {
                title.to_string()
            },
        },
        series: Vec::new(),
        x_axis: None,
        y_axis: None,
    };

    let mut series = SeriesSpec {
        kind,
        name: series_name.to_string(),
        points,
        label_visible: false,
        animation_enabled: false,
    };

    match (kind, data) {
        (ChartKind::Pie | ChartKind::Funnel, ChartData::Tabular(rows)) => {
            series.points = SeriesPoints::NameValue(derive_name_value(rows)?);
        }
        (ChartKind::Bar | ChartKind::Line | ChartKind::Scatter, ChartData::Tabular(rows)) => {
            option.x_axis = Some(derive_x(rows, x_axis_name)?);
            option.y_axis = Some(derive_y(rows, y_axis_name)?);
            series.label_visible = rows.len() < LABEL_VISIBLE_BELOW;
        }
        // 階層圖直接使用原始巢狀資料
        _ => {}
    }

    series.animation_enabled = false;
    option.series.push(series);

    Ok(option)
}
