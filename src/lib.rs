pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod render;
pub mod utils;

pub use app::tool::{tool_definition, ChartTool, ToolCall, ToolFault, ToolHandler, ToolOutcome};
pub use config::cli::LocalImageStore;
pub use config::toml_config::ChartToolConfig;
pub use core::engine::{build_option, ChartEngine};
pub use render::PlottersRasterizer;
pub use utils::error::{ChartError, Result};

#[cfg(feature = "cli")]
pub use config::CliConfig;

#[cfg(feature = "lambda")]
pub use config::lambda::{LambdaConfig, S3ImageStore};
