use std::path::PathBuf;

use thiserror::Error;

/// Failures the pipeline distinguishes. Everything else travels as a plain `anyhow::Error`.
#[derive(Error, Debug)]
pub enum TigerError {
    /// Transport failure or non-success HTTP status while fetching an archive
    #[error("failed to download {name} ({url})")]
    Download {
        name: String,
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Archive extracted but held no `.shp`
    #[error("no .shp found in {} for {name}", dir.display())]
    NotFound { name: String, dir: PathBuf },

    /// State identifier matched neither a full name nor a postal code
    #[error("could not resolve state '{input}'. Use full name (e.g., Texas) or 2-letter code (e.g., TX).")]
    Resolution { input: String },

    /// Malformed user input (county code, boundary kind, blank values)
    #[error("{0}")]
    Validation(String),

    /// A boundary filter matched no rows
    #[error("{0}")]
    EmptyResult(String),
}

impl TigerError {
    /// Find a `TigerError` anywhere in an `anyhow` error chain.
    pub fn find(err: &anyhow::Error) -> Option<&TigerError> {
        err.chain().find_map(|cause| cause.downcast_ref::<TigerError>())
    }
}
