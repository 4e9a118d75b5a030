//! Configuration module
//!
//! Server, storage and pipeline settings. Everything the pipeline needs is carried
//! in [`PipelineConfig`] and passed in explicitly, so tests can vary thresholds
//! without touching process state.

use std::env;
use std::time::Duration;

use crate::constants::{
    BYTES_PER_MB, DEFAULT_DERIVATIVE_CONCURRENCY, DEFAULT_DERIVATIVE_TIMEOUT_SECS,
    DEFAULT_LARGE_FILE_THRESHOLD_MB, DEFAULT_SIGNATURE_PREFIX_BYTES, DEFAULT_THUMBNAIL_VARIANTS,
};
use crate::storage_types::StorageBackend;

const SERVER_PORT: u16 = 4000;
const MAX_UPLOAD_MB: u64 = 500;
const DEFAULT_MAX_SIZE_MB: u64 = 50;

/// One thumbnail variant: name, bounding box and JPEG quality.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivativeSpec {
    pub variant: String,
    pub max_width: u32,
    pub max_height: u32,
    pub quality: u8,
}

impl DerivativeSpec {
    pub fn new(variant: impl Into<String>, max_width: u32, max_height: u32, quality: u8) -> Self {
        Self {
            variant: variant.into(),
            max_width,
            max_height,
            quality,
        }
    }

    /// Parse a single variant in `name:WIDTHxHEIGHT@QUALITY` form, e.g. `small:200x200@80`.
    pub fn parse(s: &str) -> Result<Self, anyhow::Error> {
        let (variant, rest) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("Invalid variant '{}': expected name:WxH@Q", s))?;
        let (dims, quality) = rest
            .split_once('@')
            .ok_or_else(|| anyhow::anyhow!("Invalid variant '{}': missing @quality", s))?;
        let (width, height) = dims
            .split_once('x')
            .ok_or_else(|| anyhow::anyhow!("Invalid variant '{}': expected WxH", s))?;

        let variant = variant.trim();
        if variant.is_empty()
            || !variant
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(anyhow::anyhow!("Invalid variant name '{}'", variant));
        }

        let max_width: u32 = width
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid width in variant '{}'", s))?;
        let max_height: u32 = height
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid height in variant '{}'", s))?;
        let quality: u8 = quality
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid quality in variant '{}'", s))?;

        if max_width == 0 || max_height == 0 {
            return Err(anyhow::anyhow!("Variant '{}' has a zero dimension", variant));
        }
        if quality == 0 || quality > 100 {
            return Err(anyhow::anyhow!(
                "Variant '{}' quality must be between 1 and 100",
                variant
            ));
        }

        Ok(Self::new(variant, max_width, max_height, quality))
    }

    /// Parse a comma separated list of variants, preserving order.
    pub fn parse_list(s: &str) -> Result<Vec<Self>, anyhow::Error> {
        s.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(Self::parse)
            .collect()
    }
}

/// Settings that drive a single pipeline run.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Declared lengths at or above this switch to prefix-only validation and streaming commit.
    pub large_file_threshold_bytes: u64,
    /// Bytes read for signature validation on the streaming path.
    pub signature_prefix_bytes: usize,
    pub derivative_specs: Vec<DerivativeSpec>,
    /// Upper bound on derivatives processed at once.
    pub derivative_concurrency: usize,
    /// Budget for each derivative's resize/encode/upload chain.
    pub derivative_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            large_file_threshold_bytes: DEFAULT_LARGE_FILE_THRESHOLD_MB * BYTES_PER_MB,
            signature_prefix_bytes: DEFAULT_SIGNATURE_PREFIX_BYTES,
            derivative_specs: vec![
                DerivativeSpec::new("small", 200, 200, 80),
                DerivativeSpec::new("medium", 600, 600, 85),
                DerivativeSpec::new("large", 1200, 1200, 90),
            ],
            derivative_concurrency: DEFAULT_DERIVATIVE_CONCURRENCY,
            derivative_timeout: Duration::from_secs(DEFAULT_DERIVATIVE_TIMEOUT_SECS),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let large_file_threshold_mb = env::var("LARGE_FILE_THRESHOLD_MB")
            .unwrap_or_else(|_| DEFAULT_LARGE_FILE_THRESHOLD_MB.to_string())
            .parse::<u64>()
            .unwrap_or(DEFAULT_LARGE_FILE_THRESHOLD_MB);

        let variants = env::var("THUMBNAIL_VARIANTS")
            .unwrap_or_else(|_| DEFAULT_THUMBNAIL_VARIANTS.to_string());
        let derivative_specs = DerivativeSpec::parse_list(&variants)?;

        Ok(Self {
            large_file_threshold_bytes: large_file_threshold_mb.saturating_mul(BYTES_PER_MB),
            signature_prefix_bytes: env::var("SIGNATURE_PREFIX_BYTES")
                .unwrap_or_else(|_| DEFAULT_SIGNATURE_PREFIX_BYTES.to_string())
                .parse()
                .unwrap_or(DEFAULT_SIGNATURE_PREFIX_BYTES),
            derivative_specs,
            derivative_concurrency: env::var("DERIVATIVE_CONCURRENCY")
                .unwrap_or_else(|_| DEFAULT_DERIVATIVE_CONCURRENCY.to_string())
                .parse()
                .unwrap_or(DEFAULT_DERIVATIVE_CONCURRENCY),
            derivative_timeout: Duration::from_secs(
                env::var("DERIVATIVE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| DEFAULT_DERIVATIVE_TIMEOUT_SECS.to_string())
                    .parse()
                    .unwrap_or(DEFAULT_DERIVATIVE_TIMEOUT_SECS),
            ),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.large_file_threshold_bytes == 0 {
            return Err(anyhow::anyhow!("LARGE_FILE_THRESHOLD_MB must be greater than 0"));
        }
        if self.signature_prefix_bytes == 0 {
            return Err(anyhow::anyhow!("SIGNATURE_PREFIX_BYTES must be greater than 0"));
        }
        if self.derivative_concurrency == 0 {
            return Err(anyhow::anyhow!("DERIVATIVE_CONCURRENCY must be at least 1"));
        }
        if self.derivative_timeout.is_zero() {
            return Err(anyhow::anyhow!("DERIVATIVE_TIMEOUT_SECS must be greater than 0"));
        }
        let mut seen = std::collections::HashSet::new();
        for spec in &self.derivative_specs {
            if !seen.insert(spec.variant.as_str()) {
                return Err(anyhow::anyhow!(
                    "Duplicate thumbnail variant '{}'",
                    spec.variant
                ));
            }
        }
        Ok(())
    }
}

/// Base server configuration
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
    /// `json` or `pretty`
    pub log_format: String,
}

/// Storage backend configuration
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub storage_backend: Option<StorageBackend>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub s3_public_base_url: Option<String>,
    pub aws_region: Option<String>,
}

/// Full ingest service configuration.
#[derive(Clone, Debug)]
pub struct IngestConfig {
    pub base: BaseConfig,
    pub storage: StorageConfig,
    /// Hard transport ceiling; bytes beyond this are never accepted from the wire.
    pub max_upload_bytes: u64,
    /// Used when the caller omits `maxSizeMB`.
    pub default_max_size_mb: u64,
    pub pipeline: PipelineConfig,
}

impl IngestConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase(),
        };

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(s) => Some(s.parse::<StorageBackend>()?),
            Err(_) => Some(StorageBackend::Local),
        };

        let storage = StorageConfig {
            storage_backend,
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            s3_public_base_url: env::var("S3_PUBLIC_BASE_URL").ok(),
            aws_region: env::var("AWS_REGION").ok(),
        };

        let max_upload_mb = env::var("MAX_UPLOAD_MB")
            .unwrap_or_else(|_| MAX_UPLOAD_MB.to_string())
            .parse::<u64>()
            .unwrap_or(MAX_UPLOAD_MB);

        let config = IngestConfig {
            base,
            storage,
            max_upload_bytes: max_upload_mb.saturating_mul(BYTES_PER_MB),
            default_max_size_mb: env::var("DEFAULT_MAX_SIZE_MB")
                .unwrap_or_else(|_| DEFAULT_MAX_SIZE_MB.to_string())
                .parse()
                .unwrap_or(DEFAULT_MAX_SIZE_MB),
            pipeline: PipelineConfig::from_env()?,
        };

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_upload_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_MB must be greater than 0"));
        }
        if self.default_max_size_mb == 0 {
            return Err(anyhow::anyhow!("DEFAULT_MAX_SIZE_MB must be greater than 0"));
        }
        if self.default_max_size_mb.saturating_mul(BYTES_PER_MB) > self.max_upload_bytes {
            return Err(anyhow::anyhow!(
                "DEFAULT_MAX_SIZE_MB ({}) exceeds MAX_UPLOAD_MB",
                self.default_max_size_mb
            ));
        }

        match self.storage.storage_backend {
            Some(StorageBackend::Local) => {
                if self.storage.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when STORAGE_BACKEND=local"
                    ));
                }
                if self.storage.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when STORAGE_BACKEND=local"
                    ));
                }
            }
            Some(StorageBackend::S3) => {
                if self.storage.s3_region.is_none() && self.storage.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when STORAGE_BACKEND=s3"
                    ));
                }
            }
            None => return Err(anyhow::anyhow!("STORAGE_BACKEND must be set")),
        }

        self.pipeline.validate()
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<IngestConfig>);

impl Config {
    fn as_ingest(&self) -> &IngestConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = IngestConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_ingest().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.as_ingest().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.as_ingest().base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.as_ingest().base.environment
    }

    pub fn log_format(&self) -> &str {
        &self.as_ingest().base.log_format
    }

    pub fn storage_backend(&self) -> Option<StorageBackend> {
        self.as_ingest().storage.storage_backend
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_ingest().storage.local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.as_ingest().storage.local_storage_base_url.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.as_ingest().storage.s3_region.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.as_ingest().storage.aws_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_ingest().storage.s3_endpoint.as_deref()
    }

    pub fn s3_public_base_url(&self) -> Option<&str> {
        self.as_ingest().storage.s3_public_base_url.as_deref()
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.as_ingest().max_upload_bytes
    }

    pub fn default_max_size_mb(&self) -> u64 {
        self.as_ingest().default_max_size_mb
    }

    pub fn pipeline(&self) -> &PipelineConfig {
        &self.as_ingest().pipeline
    }
}
