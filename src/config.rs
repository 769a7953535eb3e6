use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub table: TableConfig,
    #[serde(default)]
    pub geocoder: GeocoderConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// `s3` or `local`.
    #[serde(default = "default_storage_backend")]
    pub backend: String,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Prepended to every generated object key.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom S3-compatible endpoint (MinIO, Supabase, LocalStack).
    #[serde(default)]
    pub endpoint_url: Option<String>,
    /// Base for public object URLs, e.g. a CDN or
    /// `https://<project>.supabase.co/storage/v1/object/public`.
    #[serde(default)]
    pub public_base_url: Option<String>,
    /// Root directory for the `local` backend.
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            bucket: default_bucket(),
            key_prefix: default_key_prefix(),
            region: default_region(),
            endpoint_url: None,
            public_base_url: None,
            root: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_storage_backend() -> String {
    "s3".to_string()
}
fn default_bucket() -> String {
    "item-images".to_string()
}
fn default_key_prefix() -> String {
    "public/".to_string()
}
fn default_region() -> String {
    "us-east-1".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct TableConfig {
    /// `sqlite` or `rest`.
    #[serde(default = "default_table_backend")]
    pub backend: String,
    #[serde(default = "default_table_name")]
    pub name: String,
    /// Project URL for the `rest` backend; `/rest/v1/<name>` is appended.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            backend: default_table_backend(),
            name: default_table_name(),
            url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_table_backend() -> String {
    "sqlite".to_string()
}
fn default_table_name() -> String {
    "items".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocoderConfig {
    /// `disabled` or `nominatim`.
    #[serde(default = "default_geocoder_provider")]
    pub provider: String,
    #[serde(default = "default_nominatim_url")]
    pub base_url: String,
    #[serde(default = "default_geocoder_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            provider: default_geocoder_provider(),
            base_url: default_nominatim_url(),
            timeout_secs: default_geocoder_timeout_secs(),
        }
    }
}

fn default_geocoder_provider() -> String {
    "disabled".to_string()
}
fn default_nominatim_url() -> String {
    "https://nominatim.openstreetmap.org/reverse".to_string()
}
fn default_geocoder_timeout_secs() -> u64 {
    10
}

impl GeocoderConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    // Validate storage
    match config.storage.backend.as_str() {
        "s3" => {}
        "local" => {
            if config.storage.root.is_none() {
                bail!("storage.root must be set when backend is 'local'");
            }
        }
        other => bail!(
            "Unknown storage backend: '{}'. Must be s3 or local.",
            other
        ),
    }
    if config.storage.bucket.trim().is_empty() {
        bail!("storage.bucket must not be empty");
    }

    // Validate table
    match config.table.backend.as_str() {
        "sqlite" => {}
        "rest" => {
            if config.table.url.is_none() {
                bail!("table.url must be set when backend is 'rest'");
            }
        }
        other => bail!("Unknown table backend: '{}'. Must be sqlite or rest.", other),
    }
    if !is_identifier(&config.table.name) {
        bail!(
            "table.name must be a plain identifier (letters, digits, underscores): '{}'",
            config.table.name
        );
    }

    // Validate geocoder
    match config.geocoder.provider.as_str() {
        "disabled" | "nominatim" => {}
        other => bail!(
            "Unknown geocoder provider: '{}'. Must be disabled or nominatim.",
            other
        ),
    }

    Ok(())
}

/// Table names are interpolated into SQL and URLs, so only `[A-Za-z_][A-Za-z0-9_]*`.
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
