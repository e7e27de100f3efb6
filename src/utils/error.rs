use thiserror::Error;

/// 工具協定的錯誤代碼 (JSON-RPC)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultCode {
    InvalidParams,
    MethodNotFound,
    InternalError,
}

impl FaultCode {
    pub fn code(self) -> i32 {
        match self {
            FaultCode::InvalidParams => -32602,
            FaultCode::MethodNotFound => -32601,
            FaultCode::InternalError => -32603,
        }
    }
}

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Invalid chart type. Must be one of: {valid}")]
    UnsupportedChartKind { requested: String, valid: String },

    #[error("{kind} chart data should be like [[\"A\", 100], [\"B\", 200], [\"C\", 300]] for bar/line/pie/scatter charts, or [{{ \"name\": \"A\", \"value\": 100, \"children\": [{{ \"name\": \"A1\", \"value\": 40}}, {{ \"name\": \"A2\", \"value\": 60}}]}}]")]
    MalformedHierarchicalData { kind: String },

    #[error("Chart data must be an array. Input data: {input}")]
    DataNotArray { input: String },

    #[error("Chart data must be an array of arrays. For example: [[\"A\", 100], [\"B\", 200], [\"C\", 300]]")]
    RowNotArray,

    #[error("Invalid arguments: {message}")]
    InvalidArguments { message: String },

    #[error("Data must be 2d array (first row has {found} entries)")]
    InvalidRowShape { found: usize },

    #[error("{kind} chart cannot be built from {family} data")]
    FamilyMismatch { kind: String, family: &'static str },

    #[error("Rendering failed: {message}")]
    RenderError { message: String },

    #[error("Upload failed: {message}")]
    UploadError { message: String },

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

impl ChartError {
    pub fn fault_code(&self) -> FaultCode {
        match self {
            ChartError::UnsupportedChartKind { .. }
            | ChartError::MalformedHierarchicalData { .. }
            | ChartError::DataNotArray { .. }
            | ChartError::RowNotArray
            | ChartError::InvalidArguments { .. } => FaultCode::InvalidParams,
            ChartError::UnknownTool { .. } => FaultCode::MethodNotFound,
            _ => FaultCode::InternalError,
        }
    }

    /// 呼叫端輸入造成的錯誤，可直接回傳詳細訊息讓呼叫端自行修正
    pub fn is_caller_fault(&self) -> bool {
        self.fault_code() != FaultCode::InternalError
    }

    /// 回傳給呼叫端的訊息，內部錯誤不洩漏細節
    pub fn user_friendly_message(&self) -> String {
        match self {
            ChartError::UploadError { .. } => "Failed to save image".to_string(),
            ChartError::IoError(_)
            | ChartError::ConfigError { .. }
            | ChartError::MissingConfigError { .. }
            | ChartError::InvalidConfigValueError { .. } => {
                "Failed to generate chart: internal service error".to_string()
            }
            e if e.is_caller_fault() => e.to_string(),
            e => format!("Failed to generate chart: {}", e),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ChartError::UnsupportedChartKind { .. } => {
                "Pick one of the listed chart types"
            }
            ChartError::MalformedHierarchicalData { .. } => {
                "Give every tree node a numeric `value`, or use a tabular chart type"
            }
            ChartError::DataNotArray { .. } | ChartError::RowNotArray => {
                "Send data as an array of [name, value] rows"
            }
            ChartError::InvalidRowShape { .. } => "Each row needs at least two entries",
            ChartError::InvalidArguments { .. } => {
                "Provide type, data, title and seriesName"
            }
            ChartError::UnknownTool { .. } => "Call the get-chart tool",
            ChartError::UploadError { .. } => "Check storage credentials and bucket access",
            ChartError::MissingConfigError { .. }
            | ChartError::InvalidConfigValueError { .. }
            | ChartError::ConfigError { .. } => "Check the configuration file and environment",
            _ => "Retry the request; if it keeps failing, check the server logs",
        }
    }
}

pub type Result<T> = std::result::Result<T, ChartError>;
