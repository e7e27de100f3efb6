use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Number, Value};
use std::fmt;

/// 支援的八種圖表類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
    Scatter,
    Funnel,
    Tree,
    Treemap,
    Sunburst,
}

impl ChartKind {
    pub const ALL: [ChartKind; 8] = [
        ChartKind::Bar,
        ChartKind::Line,
        ChartKind::Pie,
        ChartKind::Scatter,
        ChartKind::Funnel,
        ChartKind::Tree,
        ChartKind::Treemap,
        ChartKind::Sunburst,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Pie => "pie",
            ChartKind::Scatter => "scatter",
            ChartKind::Funnel => "funnel",
            ChartKind::Tree => "tree",
            ChartKind::Treemap => "treemap",
            ChartKind::Sunburst => "sunburst",
        }
    }

    /// tree / treemap / sunburst 使用巢狀 name/value/children 資料
    pub fn is_hierarchical(self) -> bool {
        matches!(
            self,
            ChartKind::Tree | ChartKind::Treemap | ChartKind::Sunburst
        )
    }

    /// 有 x/y 軸的圖表
    pub fn is_cartesian(self) -> bool {
        matches!(self, ChartKind::Bar | ChartKind::Line | ChartKind::Scatter)
    }

    /// 轉成 name/value 配對的比例圖
    pub fn is_proportion(self) -> bool {
        matches!(self, ChartKind::Pie | ChartKind::Funnel)
    }

    pub fn valid_list() -> String {
        Self::ALL
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 資料列中的單一值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(Number),
    Text(String),
    Bool(bool),
    Null,
}

impl Scalar {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Number(n) => Scalar::Number(n),
            Value::String(s) => Scalar::Text(s),
            Value::Bool(b) => Scalar::Bool(b),
            Value::Null => Scalar::Null,
            other => {
                tracing::warn!("Nested value inside a data row replaced by null: {}", other);
                Scalar::Null
            }
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Scalar::Text(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Scalar::Number(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => n.as_f64(),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => f.write_str(s),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Null => Ok(()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value.into())
    }
}

/// 表格資料的一列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow(pub Vec<Scalar>);

impl RawRow {
    /// 非陣列的元素視為空列，交由 deriver 判斷長度
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => RawRow(items.into_iter().map(Scalar::from_value).collect()),
            _ => RawRow(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Scalar> {
        self.0.get(index)
    }

    /// 取得欄位值，缺少時回傳 Null
    pub fn column(&self, index: usize) -> Scalar {
        self.0.get(index).cloned().unwrap_or(Scalar::Null)
    }
}

pub type TabularDataset = Vec<RawRow>;

/// 階層節點：繪圖用的欄位之外保留呼叫端送來的原始 JSON，序列化時原樣輸出
#[derive(Debug, Clone, PartialEq)]
pub struct HierNode {
    pub name: String,
    pub value: Option<Number>,
    pub children: Vec<HierNode>,
    raw: Value,
}

impl Serialize for HierNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl HierNode {
    pub fn new(name: &str, value: Option<i64>, children: Vec<HierNode>) -> Self {
        let mut raw = serde_json::Map::new();
        raw.insert("name".to_string(), Value::from(name));
        if let Some(v) = value {
            raw.insert("value".to_string(), Value::from(v));
        }
        if !children.is_empty() {
            raw.insert(
                "children".to_string(),
                Value::Array(children.iter().map(|child| child.raw.clone()).collect()),
            );
        }

        Self {
            name: name.to_string(),
            value: value.map(Number::from),
            children,
            raw: Value::Object(raw),
        }
    }

    /// 寬鬆轉換：缺少的欄位保留為空，不在這裡報錯
    pub fn from_value(value: &Value) -> Self {
        let name = match value.get("name") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };

        let node_value = match value.get("value") {
            Some(Value::Number(n)) => Some(n.clone()),
            _ => None,
        };

        let children = match value.get("children") {
            Some(Value::Array(items)) => items.iter().map(HierNode::from_value).collect(),
            _ => Vec::new(),
        };

        Self {
            name,
            value: node_value,
            children,
            raw: value.clone(),
        }
    }

    /// 呼叫端送來的原始節點
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn value_f64(&self) -> Option<f64> {
        self.value.as_ref().and_then(Number::as_f64)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

pub type HierDataset = Vec<HierNode>;

#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Tabular(TabularDataset),
    Hierarchical(HierDataset),
}

impl ChartData {
    pub fn len(&self) -> usize {
        match self {
            ChartData::Tabular(rows) => rows.len(),
            ChartData::Hierarchical(nodes) => nodes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn family_name(&self) -> &'static str {
        match self {
            ChartData::Tabular(_) => "tabular",
            ChartData::Hierarchical(_) => "hierarchical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AxisValueKind {
    #[serde(rename = "category")]
    Category,
    #[serde(rename = "value")]
    Numeric,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisSpec {
    #[serde(rename = "type")]
    pub value_kind: AxisValueKind,
    #[serde(rename = "data")]
    pub values: Option<Vec<Scalar>>,
    #[serde(rename = "name", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// 空資料集時 deriver 回傳 `Empty`，呼叫端需自行處理
#[derive(Debug, Clone, PartialEq)]
pub enum DerivedAxis {
    Empty,
    Axis(AxisSpec),
}

impl DerivedAxis {
    pub fn spec(&self) -> Option<&AxisSpec> {
        match self {
            DerivedAxis::Empty => None,
            DerivedAxis::Axis(spec) => Some(spec),
        }
    }
}

impl Serialize for DerivedAxis {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            DerivedAxis::Empty => serializer.collect_seq(std::iter::empty::<Scalar>()),
            DerivedAxis::Axis(spec) => spec.serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameValue {
    pub name: Scalar,
    pub value: Scalar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SeriesPoints {
    NameValue(Vec<NameValue>),
    Rows(TabularDataset),
    Tree(HierDataset),
}

impl SeriesPoints {
    pub fn len(&self) -> usize {
        match self {
            SeriesPoints::NameValue(pairs) => pairs.len(),
            SeriesPoints::Rows(rows) => rows.len(),
            SeriesPoints::Tree(nodes) => nodes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Serialize)]
struct LabelOption {
    show: bool,
}

fn serialize_label<S: Serializer>(
    visible: &bool,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    if *visible {
        LabelOption { show: true }.serialize(serializer)
    } else {
        serializer.serialize_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSpec {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub name: String,
    #[serde(rename = "data")]
    pub points: SeriesPoints,
    #[serde(rename = "label", serialize_with = "serialize_label")]
    pub label_visible: bool,
    #[serde(rename = "animation")]
    pub animation_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartTitle {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartOption {
    pub title: ChartTitle,
    pub series: Vec<SeriesSpec>,
    #[serde(rename = "xAxis", skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<DerivedAxis>,
    #[serde(rename = "yAxis", skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<DerivedAxis>,
}

impl ChartOption {
    pub fn primary_series(&self) -> Option<&SeriesSpec> {
        self.series.first()
    }
}

/// get-chart 工具的呼叫參數
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRequest {
    #[serde(rename = "type")]
    pub chart_type: String,
    pub data: Value,
    pub title: String,
    pub series_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl EncodedImage {
    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            format: ImageFormat::Png,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self.format {
            ImageFormat::Png => "png",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self.format {
            ImageFormat::Png => "image/png",
        }
    }
}
