use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::{common::{download_big_file, ensure_dir_exists, extract_zip, find_first_with_extension}, error::TigerError};

/// Downloads archives into a cache directory and extracts them next to it.
pub struct Fetcher {
    download_dir: PathBuf,
    client: Client,
}

impl Fetcher {
    pub fn new(download_dir: impl Into<PathBuf>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("tigerclip/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build HTTP client")?;
        Ok(Self { download_dir: download_dir.into(), client })
    }

    /// Cache location of the archive for `name`.
    pub fn archive_path(&self, name: &str) -> PathBuf {
        self.download_dir.join(format!("{name}.zip"))
    }

    /// Return `downloads/<name>.zip`, downloading `url` only if the file is not there yet.
    pub fn fetch(&self, name: &str, url: &str) -> Result<PathBuf> {
        let zip_path = self.archive_path(name);
        if zip_path.exists() {
            info!("{name}: ZIP already exists, skipping download.");
            return Ok(zip_path);
        }

        ensure_dir_exists(&self.download_dir)?;
        info!("Downloading {name} from {url} ...");
        let bytes = download_big_file(&self.client, name, url, &zip_path)?;
        info!("{name}: downloaded to {} ({bytes} bytes)", zip_path.display());

        Ok(zip_path)
    }

    /// Extract `zip_path` into `downloads/<name>/` and return the first `.shp` inside.
    pub fn extract(&self, name: &str, zip_path: &Path) -> Result<PathBuf> {
        let extract_dir = self.download_dir.join(name);
        ensure_dir_exists(&extract_dir)?;

        info!("Unzipping {} to {} ...", zip_path.display(), extract_dir.display());
        extract_zip(zip_path, &extract_dir)?;
        debug!("{name}: unzip complete.");

        let shp_path = find_first_with_extension(&extract_dir, "shp")
            .ok_or_else(|| TigerError::NotFound { name: name.to_string(), dir: extract_dir.clone() })?;

        info!("{name}: using shapefile {}", shp_path.display());
        Ok(shp_path)
    }

    /// Fetch and extract in one step.
    pub fn fetch_shapefile(&self, name: &str, url: &str) -> Result<PathBuf> {
        let zip_path = self.fetch(name, url)?;
        self.extract(name, &zip_path)
    }
}
