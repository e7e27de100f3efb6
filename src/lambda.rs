use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::Client as S3Client;
use chartsnap::utils::{logger, validation::Validate};
use chartsnap::{
    ChartTool, LambdaConfig, PlottersRasterizer, S3ImageStore, ToolCall, ToolHandler, ToolOutcome,
};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

type LambdaTool = ChartTool<PlottersRasterizer, S3ImageStore>;

async fn function_handler(
    tool: &LambdaTool,
    event: LambdaEvent<ToolCall>,
) -> Result<ToolOutcome, Error> {
    tracing::info!(
        request_id = %event.context.request_id,
        tool = %event.payload.name,
        "Handling tool call"
    );

    // 工具錯誤以 ToolOutcome::Failure 回傳，不當成 Lambda 執行失敗
    let outcome = ToolOutcome::from(tool.call_tool(event.payload).await);
    Ok(outcome)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    // 設定與 S3 客戶端只在冷啟動時建立一次
    let lambda_config = LambdaConfig::from_env()?;
    lambda_config.validate()?;

    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let region = Region::new(lambda_config.s3_region.clone());
    let config = aws_sdk_s3::config::Builder::from(&config)
        .region(region)
        .force_path_style(true)
        .build();
    let s3_client = S3Client::from_conf(config);

    let store = S3ImageStore::new(s3_client, &lambda_config);
    let rasterizer = PlottersRasterizer::new(lambda_config.width, lambda_config.height);
    let tool = ChartTool::new(rasterizer, store);
    let tool = &tool;

    run(service_fn(move |event: LambdaEvent<ToolCall>| async move {
        function_handler(tool, event).await
    }))
    .await
}
