use crate::core::assembler::assemble;
use crate::core::classifier::classify;
use crate::domain::model::{ChartData, ChartOption, ChartRequest, EncodedImage};
use crate::domain::ports::{ImageStore, Rasterizer};
use crate::utils::error::{ChartError, Result};
use std::sync::Arc;

/// 由請求組出圖表設定：分類 -> 驗證 -> 推導 -> 組合
pub fn build_option(request: &ChartRequest) -> Result<ChartOption> {
    let kind = classify(&request.chart_type)?;
    let data = ChartData::from_request(kind, request.data.clone())?;

    tracing::debug!("Classified {} chart with {} data points", kind, data.len());

    assemble(
        kind,
        &data,
        &request.title,
        &request.series_name,
        request.x_axis_name.as_deref(),
        request.y_axis_name.as_deref(),
    )
}

pub struct ChartEngine<R: Rasterizer + 'static, S: ImageStore> {
    rasterizer: Arc<R>,
    store: S,
}

impl<R: Rasterizer + 'static, S: ImageStore> ChartEngine<R, S> {
    pub fn new(rasterizer: R, store: S) -> Self {
        Self {
            rasterizer: Arc::new(rasterizer),
            store,
        }
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 繪圖是 CPU 密集工作，放到 blocking 執行緒
    pub async fn render(&self, option: ChartOption) -> Result<EncodedImage> {
        let rasterizer = Arc::clone(&self.rasterizer);

        tokio::task::spawn_blocking(move || rasterizer.rasterize(&option))
            .await
            .map_err(|e| ChartError::RenderError {
                message: format!("rasterizer task join failed (panic/cancelled): {}", e),
            })?
    }

    pub async fn generate(&self, request: ChartRequest) -> Result<String> {
        let option = build_option(&request)?;

        let image = self.render(option).await?;
        tracing::debug!("Rendered {} bytes of {}", image.bytes.len(), image.content_type());

        let url = self.store.save_image(&image).await.map_err(|e| {
            tracing::error!("❌ Image upload failed: {}", e);
            match e {
                ChartError::UploadError { .. } => e,
                other => ChartError::UploadError {
                    message: other.to_string(),
                },
            }
        })?;

        tracing::debug!("Chart stored at: {}", url);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ChartKind;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct StubRasterizer {
        calls: AtomicUsize,
    }

    impl Rasterizer for StubRasterizer {
        fn rasterize(&self, option: &ChartOption) -> Result<EncodedImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(EncodedImage::png(option.title.text.as_bytes().to_vec()))
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        saved: Mutex<Vec<Vec<u8>>>,
        fail: bool,
    }

    impl ImageStore for MemoryStore {
        async fn save_image(&self, image: &EncodedImage) -> Result<String> {
            if self.fail {
                return Err(ChartError::IoError(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "disk is read-only",
                )));
            }
            let mut saved = self.saved.lock().unwrap();
            saved.push(image.bytes.clone());
            Ok(format!("https://cdn.example.com/{}.png", saved.len()))
        }
    }

    fn request(chart_type: &str, data: serde_json::Value) -> ChartRequest {
        ChartRequest {
            chart_type: chart_type.to_string(),
            data,
            title: "Sales".to_string(),
            series_name: "S1".to_string(),
            x_axis_name: None,
            y_axis_name: None,
        }
    }

    fn engine(fail: bool) -> ChartEngine<StubRasterizer, MemoryStore> {
        ChartEngine::new(
            StubRasterizer {
                calls: AtomicUsize::new(0),
            },
            MemoryStore {
                fail,
                ..MemoryStore::default()
            },
        )
    }

    #[test]
    fn test_build_option_runs_full_core() {
        let option = build_option(&request("line", json!([["Mon", 1], ["Tue", 2]]))).unwrap();
        assert_eq!(option.series[0].kind, ChartKind::Line);
        assert!(option.x_axis.is_some());
    }

    #[test]
    fn test_build_option_stops_at_classifier() {
        let err = build_option(&request("radar", json!([]))).unwrap_err();
        assert!(matches!(err, ChartError::UnsupportedChartKind { .. }));
    }

    #[tokio::test]
    async fn test_generate_returns_store_url() {
        let engine = engine(false);
        let url = engine
            .generate(request("bar", json!([["A", 1], ["B", 2]])))
            .await
            .unwrap();

        assert_eq!(url, "https://cdn.example.com/1.png");
        assert_eq!(engine.rasterizer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(engine.store().saved.lock().unwrap()[0], b"Sales".to_vec());
    }

    #[tokio::test]
    async fn test_invalid_input_never_renders() {
        let engine = engine(false);
        let err = engine
            .generate(request("pie", json!({"A": 1})))
            .await
            .unwrap_err();

        assert!(matches!(err, ChartError::DataNotArray { .. }));
        assert_eq!(engine.rasterizer.calls.load(Ordering::SeqCst), 0);
        assert!(engine.store().saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_becomes_upload_error() {
        let engine = engine(true);
        let err = engine
            .generate(request("bar", json!([["A", 1]])))
            .await
            .unwrap_err();

        assert!(matches!(err, ChartError::UploadError { .. }));
        assert_eq!(err.user_friendly_message(), "Failed to save image");
    }
}
