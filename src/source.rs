use std::path::PathBuf;

use anyhow::Result;

use crate::common::ensure_dir_exists;

pub const DEFAULT_BASE_URL: &str = "https://www2.census.gov/geo/tiger";
pub const DEFAULT_YEAR: u16 = 2020;
pub const DEFAULT_PROJECT_DIR: &str = "GIS_Project_Starter";

/// National TIGER layers the pipeline always fetches.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NationalLayer { States, Counties, Roads }

impl NationalLayer {
    /// Logical name, also the cache file stem under `downloads/`.
    pub fn name(self) -> &'static str {
        match self {
            NationalLayer::States => "states",
            NationalLayer::Counties => "counties",
            NationalLayer::Roads => "roads",
        }
    }

    /// TIGER directory and file suffix, e.g. `("STATE", "state")`.
    fn path_parts(self) -> (&'static str, &'static str) {
        match self {
            NationalLayer::States => ("STATE", "state"),
            NationalLayer::Counties => ("COUNTY", "county"),
            NationalLayer::Roads => ("PRIMARYROADS", "primaryroads"),
        }
    }
}

/// URL templates for one TIGER vintage.
#[derive(Clone, Debug)]
pub struct TigerSource {
    base_url: String,
    year: u16,
}

impl Default for TigerSource {
    fn default() -> Self { Self::new(DEFAULT_BASE_URL, DEFAULT_YEAR) }
}

impl TigerSource {
    pub fn new(base_url: &str, year: u16) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_string(), year }
    }

    fn root(&self) -> String { format!("{}/TIGER{}", self.base_url, self.year) }

    /// URL of a nationwide layer archive.
    pub fn national_url(&self, layer: NationalLayer) -> String {
        let (dir, suffix) = layer.path_parts();
        format!("{}/{dir}/tl_{}_us_{suffix}.zip", self.root(), self.year)
    }

    /// URL of the place archive for one state, keyed by its 2-digit code.
    pub fn place_url(&self, state_code: &str) -> String {
        format!("{}/PLACE/tl_{}_{state_code}_place.zip", self.root(), self.year)
    }

    /// Logical cache name of the place archive for one state.
    pub fn place_name(state_code: &str) -> String { format!("places_{state_code}") }
}

/// On-disk layout of a run: `downloads/` cache and `clipped/` outputs under one root.
#[derive(Clone, Debug)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

    pub fn downloads(&self) -> PathBuf { self.root.join("downloads") }
    pub fn clipped(&self) -> PathBuf { self.root.join("clipped") }

    /// Output shapefile path for a clipped layer, e.g. `clipped/roads_clipped.shp`.
    pub fn clipped_output(&self, layer: &str) -> PathBuf {
        self.clipped().join(format!("{layer}_clipped.shp"))
    }

    /// Create the download and output directories.
    pub fn ensure_dirs(&self) -> Result<()> {
        ensure_dir_exists(&self.downloads())?;
        ensure_dir_exists(&self.clipped())
    }
}
