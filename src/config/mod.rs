use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix for environment overrides, e.g. `CONTRIB_STATS_FETCH__ORG=openfaas`.
pub const ENV_PREFIX: &str = "CONTRIB_STATS";

/// Looked up in the working directory when no `--config` is given.
const DEFAULT_CONFIG_NAME: &str = "contrib-stats";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub layout: LayoutConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Stats endpoint receiving the POST.
    pub endpoint: String,
    /// Organization whose contributors are counted.
    pub org: String,
    /// Re-requests allowed after an unparseable JSON body.
    pub max_retries: u32,
    /// Per-request timeout in seconds; 0 waits forever.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Number of contributors in each display column, in order.
    pub column_sizes: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub pretty: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://kenfdev.o6s.io:443/github-stats".to_string(),
            org: "openfaas".to_string(),
            max_retries: 3,
            timeout_secs: 30,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            column_sizes: vec![12, 13, 14, 14],
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("_data/github_stats.json"),
            pretty: false,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Request body sent to the stats endpoint.
    pub fn payload(&self) -> Value {
        json!({ "org": self.org })
    }
}

impl LayoutConfig {
    /// Total number of contributors the columns can hold.
    pub fn capacity(&self) -> usize {
        self.column_sizes.iter().sum()
    }
}

impl Config {
    /// Layers defaults, an optional config file and `CONTRIB_STATS_*` environment
    /// variables. An explicitly given file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_in(Path::new("."), path)
    }

    /// Like [`Config::load`], looking for `contrib-stats.*` in `dir` when no
    /// file is given.
    pub fn load_in(dir: &Path, path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => ::config::File::from(path).required(true),
            None => {
                let default_name = dir.join(DEFAULT_CONFIG_NAME);
                ::config::File::with_name(&default_name.to_string_lossy()).required(false)
            }
        };

        let settings = ::config::Config::builder()
            .add_source(file)
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("layout.column_sizes")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?;

        settings
            .try_deserialize()
            .context("Configuration has invalid values")
    }

    pub fn validate(&self) -> Result<()> {
        if self.fetch.org.trim().is_empty() {
            bail!("fetch.org must not be empty");
        }

        let url = reqwest::Url::parse(&self.fetch.endpoint)
            .with_context(|| format!("fetch.endpoint is not a valid URL: {}", self.fetch.endpoint))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!(
                "fetch.endpoint must use http or https, got {}",
                url.scheme()
            );
        }

        if self.layout.capacity() == 0 {
            bail!("layout.column_sizes must hold at least one contributor");
        }

        Ok(())
    }
}
