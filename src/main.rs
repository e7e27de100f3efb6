use chartsnap::app::tool::{parse_request, TOOL_NAME};
use chartsnap::utils::{logger, validation::Validate};
use chartsnap::{
    build_option, tool_definition, ChartError, ChartTool, CliConfig, LocalImageStore,
    PlottersRasterizer, ToolCall, ToolFault, ToolHandler,
};
use clap::Parser;
use serde_json::Value;
use tokio::io::AsyncReadExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    if cli.list_tools {
        println!("{}", serde_json::to_string_pretty(&vec![tool_definition()])?);
        return Ok(());
    }

    tracing::info!("Starting chartsnap CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 載入並驗證配置
    let config = match cli.resolve().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let call = match read_call(cli.request.as_deref()).await {
        Ok(call) => call,
        Err(e) => exit_with(ToolFault::from(&e)),
    };

    if cli.option_only {
        match option_json(call) {
            Ok(json) => println!("{}", json),
            Err(e) => exit_with(ToolFault::from(&e)),
        }
        return Ok(());
    }

    let rasterizer = PlottersRasterizer::new(config.render.width, config.render.height);
    let store = LocalImageStore::new(
        config.storage.output_dir.clone(),
        config.storage.public_base_url.clone(),
    )
    .with_base_path(&config.storage.base_path);
    let tool = ChartTool::new(rasterizer, store);

    match tool.call_tool(call).await {
        Ok(response) => {
            if let Some(url) = response.first_text() {
                println!("{}", url);
            }
            Ok(())
        }
        Err(fault) => exit_with(fault),
    }
}

/// 讀取工具呼叫；若輸入只有參數物件則視為 get-chart 的參數
async fn read_call(path: Option<&str>) -> chartsnap::Result<ToolCall> {
    let content = match path {
        Some(path) => tokio::fs::read_to_string(path).await?,
        None => {
            let mut buffer = String::new();
            tokio::io::stdin().read_to_string(&mut buffer).await?;
            buffer
        }
    };

    let value: Value =
        serde_json::from_str(&content).map_err(|e| ChartError::InvalidArguments {
            message: format!("request is not valid JSON: {}", e),
        })?;

    let is_tool_call = value.get("name").is_some_and(Value::is_string)
        && value.get("arguments").is_some();

    if is_tool_call {
        serde_json::from_value(value).map_err(|e| ChartError::InvalidArguments {
            message: e.to_string(),
        })
    } else {
        Ok(ToolCall::chart(value))
    }
}

fn option_json(call: ToolCall) -> chartsnap::Result<String> {
    if call.name != TOOL_NAME {
        return Err(ChartError::UnknownTool { name: call.name });
    }

    let request = parse_request(call.arguments)?;
    let option = build_option(&request)?;
    Ok(serde_json::to_string_pretty(&option)?)
}

fn exit_with(fault: ToolFault) -> ! {
    eprintln!("❌ {}", fault.message);

    // 呼叫端輸入錯誤回傳 2，其餘為 1
    let exit_code = if fault.is_caller_fault() { 2 } else { 1 };
    std::process::exit(exit_code);
}
