pub mod cli;
#[cfg(feature = "lambda")]
pub mod lambda;
pub mod storage;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::config::toml_config::ChartToolConfig;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Parser)]
#[command(name = "chartsnap")]
#[command(about = "Render a chart from tabular or hierarchical data and print its image URL")]
pub struct CliConfig {
    #[arg(long, help = "Tool call or chart arguments JSON file (reads stdin when omitted)")]
    pub request: Option<String>,

    #[arg(long, help = "TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, help = "Directory the rendered images are written to")]
    pub output_dir: Option<String>,

    #[arg(long, help = "Public URL prefix for the output directory")]
    pub public_base_url: Option<String>,

    #[arg(long)]
    pub width: Option<u32>,

    #[arg(long)]
    pub height: Option<u32>,

    #[arg(long, help = "Print the tool definitions and exit")]
    pub list_tools: bool,

    #[arg(long, help = "Print the assembled chart option without rendering")]
    pub option_only: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 載入 TOML 配置後套用命令列覆蓋
    pub fn resolve(&self) -> Result<ChartToolConfig> {
        let mut config = match &self.config {
            Some(path) => ChartToolConfig::from_file(path)?,
            None => ChartToolConfig::default(),
        };

        if let Some(output_dir) = &self.output_dir {
            config.storage.output_dir = output_dir.clone();
        }
        if let Some(url) = &self.public_base_url {
            config.storage.public_base_url = Some(url.clone());
        }
        if let Some(width) = self.width {
            config.render.width = width;
        }
        if let Some(height) = self.height {
            config.render.height = height;
        }

        Ok(config)
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_defaults() {
        let cli = CliConfig::parse_from([
            "chartsnap",
            "--output-dir",
            "/tmp/out",
            "--width",
            "1200",
            "--option-only",
        ]);
        assert!(cli.option_only);

        let config = cli.resolve().unwrap();
        assert_eq!(config.storage.output_dir, "/tmp/out");
        assert_eq!(config.render.width, 1200);
        assert_eq!(config.render.height, 600);
    }

    #[test]
    fn test_missing_config_file_fails() {
        let cli = CliConfig {
            config: Some("/definitely/not/here.toml".to_string()),
            ..CliConfig::default()
        };
        assert!(cli.resolve().is_err());
    }
}
