//! `get-chart` 工具的呼叫介面：工具定義、參數解析與錯誤對應

use crate::core::engine::ChartEngine;
use crate::domain::model::{ChartKind, ChartRequest};
use crate::domain::ports::{ImageStore, Rasterizer};
use crate::utils::error::{ChartError, FaultCode};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const TOOL_NAME: &str = "get-chart";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

pub fn tool_definition() -> ToolDefinition {
    let kinds = ChartKind::valid_list();

    ToolDefinition {
        name: TOOL_NAME.to_string(),
        description: "Generate an ECharts chart".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "title": {
                    "type": "string",
                    "description": "Chart title"
                },
                "type": {
                    "type": "string",
                    "description": format!("Chart type ({})", kinds)
                },
                "seriesName": {
                    "type": "string",
                    "description": "Series name that will be displayed in the legend"
                },
                "data": {
                    "type": "array",
                    "description": "Chart data array. For example: [[\"A\", 100], [\"B\", 200], [\"C\", 300]] for bar/line/pie/scatter charts, or [{ \"name\": \"A\", \"value\": 100, \"children\": [{ \"name\": \"A1\", \"value\": 40}, { \"name\": \"A2\", \"value\": 60}]}] for tree charts"
                },
                "xAxisName": {
                    "type": "string",
                    "description": "Name of the first dimension (data[0]) including unit, for bar/line/scatter/pie charts. For example, when data is [[\"Apple\", 100], [\"Banana\", 200], [\"Cherry\", 300]], xAxisName should be \"Fruit\"."
                },
                "yAxisName": {
                    "type": "string",
                    "description": "Name of the second dimension (data[1]) including unit, for bar/line/scatter/pie charts. For example, when data is [[\"Apple\", 100], [\"Banana\", 200], [\"Cherry\", 300]], yAxisName should be \"Sales (USD)\"."
                }
            },
            "required": ["type", "data", "title", "seriesName"]
        }),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    pub fn chart(arguments: Value) -> Self {
        Self {
            name: TOOL_NAME.to_string(),
            arguments,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResponse {
    pub content: Vec<ToolContent>,
}

impl ToolResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: "text".to_string(),
                text: text.into(),
            }],
        }
    }

    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|c| c.text.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, thiserror::Error)]
#[error("[{code}] {message}")]
pub struct ToolFault {
    pub code: i32,
    pub message: String,
}

impl ToolFault {
    pub fn is_caller_fault(&self) -> bool {
        self.code != FaultCode::InternalError.code()
    }
}

impl From<&ChartError> for ToolFault {
    fn from(err: &ChartError) -> Self {
        Self {
            code: err.fault_code().code(),
            message: err.user_friendly_message(),
        }
    }
}

impl From<ChartError> for ToolFault {
    fn from(err: ChartError) -> Self {
        Self::from(&err)
    }
}

/// Lambda 回應格式：成功時為工具內容，失敗時為 `{ "error": {...} }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ToolOutcome {
    Success(ToolResponse),
    Failure { error: ToolFault },
}

impl From<Result<ToolResponse, ToolFault>> for ToolOutcome {
    fn from(result: Result<ToolResponse, ToolFault>) -> Self {
        match result {
            Ok(response) => ToolOutcome::Success(response),
            Err(error) => ToolOutcome::Failure { error },
        }
    }
}

/// 把工具參數轉成 `ChartRequest`，缺欄位或型別錯誤皆視為呼叫端錯誤
pub fn parse_request(arguments: Value) -> Result<ChartRequest, ChartError> {
    let object = arguments
        .as_object()
        .ok_or_else(|| ChartError::InvalidArguments {
            message: "arguments must be an object".to_string(),
        })?;

    // `data` 為 null 時 serde 不會報缺欄位，需自行檢查
    if object.get("data").map_or(true, Value::is_null) {
        return Err(ChartError::InvalidArguments {
            message: "missing field `data`".to_string(),
        });
    }

    serde_json::from_value(arguments).map_err(|e| ChartError::InvalidArguments {
        message: e.to_string(),
    })
}

#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn list_tools(&self) -> Vec<ToolDefinition>;
    async fn call_tool(&self, call: ToolCall) -> Result<ToolResponse, ToolFault>;
}

pub struct ChartTool<R: Rasterizer + 'static, S: ImageStore> {
    engine: ChartEngine<R, S>,
}

impl<R: Rasterizer + 'static, S: ImageStore> ChartTool<R, S> {
    pub fn new(rasterizer: R, store: S) -> Self {
        Self {
            engine: ChartEngine::new(rasterizer, store),
        }
    }

    pub fn engine(&self) -> &ChartEngine<R, S> {
        &self.engine
    }

    async fn run(&self, call: ToolCall) -> Result<String, ChartError> {
        if call.name != TOOL_NAME {
            return Err(ChartError::UnknownTool { name: call.name });
        }

        let request = parse_request(call.arguments)?;
        tracing::info!("📊 {} chart \"{}\"", request.chart_type, request.title);
        self.engine.generate(request).await
    }
}

#[async_trait]
impl<R: Rasterizer + 'static, S: ImageStore> ToolHandler for ChartTool<R, S> {
    fn list_tools(&self) -> Vec<ToolDefinition> {
        vec![tool_definition()]
    }

    async fn call_tool(&self, call: ToolCall) -> Result<ToolResponse, ToolFault> {
        match self.run(call).await {
            Ok(url) => {
                tracing::info!("✅ Chart ready: {}", url);
                Ok(ToolResponse::text(url))
            }
            Err(e) => {
                if e.is_caller_fault() {
                    tracing::warn!("Rejected tool call: {}", e);
                } else {
                    tracing::error!("❌ Chart generation failed: {}", e);
                    tracing::error!("💡 {}", e.recovery_suggestion());
                }
                Err(ToolFault::from(&e))
            }
        }
    }
}
