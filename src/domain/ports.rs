use crate::domain::model::{ChartOption, EncodedImage};
use crate::utils::error::Result;

/// 將圖表設定繪製成圖片
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, option: &ChartOption) -> Result<EncodedImage>;
}

/// 儲存圖片並回傳公開 URL，暫存檔不論成功失敗都需清除
pub trait ImageStore: Send + Sync {
    fn save_image(
        &self,
        image: &EncodedImage,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}
