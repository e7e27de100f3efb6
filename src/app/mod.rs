pub mod tool;

pub use tool::{ChartTool, ToolCall, ToolFault, ToolHandler, ToolOutcome, ToolResponse};
