use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::model::Site;

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "solar-dashboard.json";

/// Environment variable overriding [`DashboardConfig::data_dir`].
pub const DATA_DIR_ENV: &str = "SOLAR_DATA_DIR";

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// Where the site tables live and a few presentation knobs.
///
/// ```json
/// {
///   "data_dir": "data",
///   "site_files": { "Togo": "togo-dapaong_qc.parquet" },
///   "scatter_stride": 100,
///   "raw_preview_rows": 1000
/// }
/// ```
///
/// Any field may be omitted; sites missing from `site_files` use their
/// default file name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub data_dir: PathBuf,
    pub site_files: BTreeMap<Site, String>,
    /// Keep every n-th row in scatter plots.
    pub scatter_stride: usize,
    /// Rows shown in the raw data table.
    pub raw_preview_rows: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            site_files: BTreeMap::new(),
            scatter_stride: 100,
            raw_preview_rows: 1000,
        }
    }
}

impl DashboardConfig {
    /// Read the config from `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: DashboardConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Config from [`CONFIG_FILE`] if present (defaults otherwise), with the
    /// [`DATA_DIR_ENV`] override applied. A broken config file is logged and
    /// ignored.
    pub fn discover() -> Self {
        let path = Path::new(CONFIG_FILE);
        let mut config = if path.exists() {
            match Self::from_file(path) {
                Ok(config) => {
                    log::info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Ignoring configuration: {e:#}");
                    Self::default()
                }
            }
        } else {
            Self::default()
        };

        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }
        config.scatter_stride = config.scatter_stride.max(1);
        config
    }

    /// Full path of the site's source file.
    pub fn site_path(&self, site: Site) -> PathBuf {
        let file = self
            .site_files
            .get(&site)
            .map(String::as_str)
            .unwrap_or(site.default_file_name());
        self.data_dir.join(file)
    }

    /// Paths of every site, for the "expected files" hint.
    pub fn expected_files(&self) -> Vec<PathBuf> {
        Site::ALL.iter().map(|&s| self.site_path(s)).collect()
    }
}
