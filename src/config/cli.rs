use crate::config::storage::{file_name, object_key, public_url};
use crate::domain::model::EncodedImage;
use crate::domain::ports::ImageStore;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

/// 寫入本機目錄的圖片儲存
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    output_dir: PathBuf,
    base_path: String,
    public_base_url: Option<String>,
}

impl LocalImageStore {
    pub fn new(output_dir: impl Into<PathBuf>, public_base_url: Option<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            base_path: String::new(),
            public_base_url,
        }
    }

    pub fn with_base_path(mut self, base_path: &str) -> Self {
        self.base_path = base_path.to_string();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl ImageStore for LocalImageStore {
    async fn save_image(&self, image: &EncodedImage) -> Result<String> {
        let name = file_name(&chrono::Local::now(), &mut rand::thread_rng(), image.extension());
        let key = object_key(&self.base_path, &name);
        let full_path = self.output_dir.join(&key);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&full_path, &image.bytes).await?;
        tracing::debug!("Wrote {} bytes to {}", image.bytes.len(), full_path.display());

        let url = match &self.public_base_url {
            Some(base) => public_url(base, &key),
            None => {
                let absolute = std::fs::canonicalize(&full_path)?;
                format!("file://{}", absolute.display())
            }
        };

        Ok(url)
    }
}
