use crate::config::storage::{file_name, object_key, public_url};
use crate::domain::model::EncodedImage;
use crate::domain::ports::ImageStore;
use crate::render::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::utils::error::{ChartError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_range, validate_required_field, validate_url, Validate,
};
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use std::env;
use std::path::{Path, PathBuf};

/// Lambda 執行時的設定，啟動時建立一次後傳入各元件
#[derive(Debug, Clone)]
pub struct LambdaConfig {
    pub s3_bucket: String,
    pub s3_region: String,
    pub base_path: String,
    pub cdn_endpoint: String,
    pub tmp_dir: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 由任意來源讀取變數，方便測試時不動到行程環境變數
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self> {
        let s3_bucket = lookup("CHART_S3_BUCKET");
        let cdn_endpoint = lookup("CHART_CDN_ENDPOINT");

        Ok(Self {
            s3_bucket: validate_required_field("CHART_S3_BUCKET", &s3_bucket)?.clone(),
            s3_region: lookup("CHART_S3_REGION").unwrap_or_else(|| "ap-southeast-2".to_string()),
            base_path: lookup("CHART_BASE_PATH").unwrap_or_else(|| "upload/charts".to_string()),
            cdn_endpoint: validate_required_field("CHART_CDN_ENDPOINT", &cdn_endpoint)?.clone(),
            tmp_dir: lookup("CHART_TMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            width: parse_dimension("CHART_WIDTH", lookup("CHART_WIDTH"), DEFAULT_WIDTH)?,
            height: parse_dimension("CHART_HEIGHT", lookup("CHART_HEIGHT"), DEFAULT_HEIGHT)?,
        })
    }
}

fn parse_dimension(field: &str, raw: Option<String>, default: u32) -> Result<u32> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ChartError::InvalidConfigValueError {
                field: field.to_string(),
                value,
                reason: "must be a positive integer".to_string(),
            }),
    }
}

impl Validate for LambdaConfig {
    fn validate(&self) -> Result<()> {
        validate_s3_bucket_name("s3_bucket", &self.s3_bucket)?;
        validate_aws_region("s3_region", &self.s3_region)?;
        validate_url("cdn_endpoint", &self.cdn_endpoint)?;
        validate_range("width", self.width, 64, 4096)?;
        validate_range("height", self.height, 64, 4096)?;

        tracing::info!("✅ Lambda configuration validation passed");
        Ok(())
    }
}

fn validate_s3_bucket_name(field_name: &str, bucket_name: &str) -> Result<()> {
    if bucket_name.len() < 3 || bucket_name.len() > 63 {
        return Err(ChartError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket_name.to_string(),
            reason: "S3 bucket name must be between 3 and 63 characters".to_string(),
        });
    }

    if !bucket_name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(ChartError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket_name.to_string(),
            reason: "S3 bucket name can only contain lowercase letters, numbers, hyphens, and dots"
                .to_string(),
        });
    }

    if bucket_name.starts_with('-') || bucket_name.ends_with('-') {
        return Err(ChartError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket_name.to_string(),
            reason: "S3 bucket name cannot start or end with a hyphen".to_string(),
        });
    }

    Ok(())
}

fn validate_aws_region(field_name: &str, region: &str) -> Result<()> {
    validate_non_empty_string(field_name, region)?;

    if !region
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ChartError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: region.to_string(),
            reason: "AWS region can only contain lowercase letters, numbers, and hyphens"
                .to_string(),
        });
    }

    Ok(())
}

/// 上傳到 S3，回傳 CDN 網址
#[derive(Debug, Clone)]
pub struct S3ImageStore {
    client: S3Client,
    bucket: String,
    base_path: String,
    cdn_endpoint: String,
    tmp_dir: PathBuf,
}

impl S3ImageStore {
    pub fn new(client: S3Client, config: &LambdaConfig) -> Self {
        Self {
            client,
            bucket: config.s3_bucket.clone(),
            base_path: config.base_path.clone(),
            cdn_endpoint: config.cdn_endpoint.clone(),
            tmp_dir: config.tmp_dir.clone(),
        }
    }

    async fn upload(&self, key: &str, tmp_path: &Path, image: &EncodedImage) -> Result<()> {
        tokio::fs::write(tmp_path, &image.bytes)
            .await
            .map_err(|e| ChartError::UploadError {
                message: format!("Failed to write transient file {}: {}", tmp_path.display(), e),
            })?;

        let body = ByteStream::from_path(tmp_path)
            .await
            .map_err(|e| ChartError::UploadError {
                message: format!("Failed to read transient file: {}", e),
            })?;

        let result = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(image.content_type())
            .body(body)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => {
                let service_error = err.into_service_error();
                Err(ChartError::UploadError {
                    message: format!(
                        "put_object {}/{} failed: {} (code: {})",
                        self.bucket,
                        key,
                        service_error.message().unwrap_or("no message"),
                        service_error.code().unwrap_or("unknown"),
                    ),
                })
            }
        }
    }
}

impl ImageStore for S3ImageStore {
    async fn save_image(&self, image: &EncodedImage) -> Result<String> {
        let name = file_name(&chrono::Local::now(), &mut rand::thread_rng(), image.extension());
        let key = object_key(&self.base_path, &name);
        let tmp_path = self.tmp_dir.join(&name);

        let result = self.upload(&key, &tmp_path, image).await;

        // 不論上傳成功與否都清除暫存檔
        if let Err(e) = tokio::fs::remove_file(&tmp_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove transient file {}: {}", tmp_path.display(), e);
            }
        }

        result?;
        tracing::info!("📁 Uploaded s3://{}/{}", self.bucket, key);
        Ok(public_url(&self.cdn_endpoint, &key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = LambdaConfig::from_lookup(lookup(&[
            ("CHART_S3_BUCKET", "chart-images"),
            ("CHART_CDN_ENDPOINT", "https://cdn.example.com"),
        ]))
        .unwrap();

        assert_eq!(config.s3_region, "ap-southeast-2");
        assert_eq!(config.base_path, "upload/charts");
        assert_eq!((config.width, config.height), (800, 600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_bucket_is_reported() {
        let err = LambdaConfig::from_lookup(lookup(&[(
            "CHART_CDN_ENDPOINT",
            "https://cdn.example.com",
        )]))
        .unwrap_err();
        assert!(matches!(err, ChartError::MissingConfigError { field } if field == "CHART_S3_BUCKET"));
    }

    #[test]
    fn test_invalid_dimension() {
        let err = LambdaConfig::from_lookup(lookup(&[
            ("CHART_S3_BUCKET", "chart-images"),
            ("CHART_CDN_ENDPOINT", "https://cdn.example.com"),
            ("CHART_WIDTH", "wide"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ChartError::InvalidConfigValueError { .. }));
    }

    #[test]
    fn test_validation_rejects_bad_bucket() {
        let mut config = LambdaConfig::from_lookup(lookup(&[
            ("CHART_S3_BUCKET", "Chart_Images"),
            ("CHART_CDN_ENDPOINT", "https://cdn.example.com"),
        ]))
        .unwrap();
        assert!(config.validate().is_err());

        config.s3_bucket = "-charts".to_string();
        assert!(config.validate().is_err());

        config.s3_bucket = "charts".to_string();
        config.cdn_endpoint = "not a url".to_string();
        assert!(config.validate().is_err());
    }
}
