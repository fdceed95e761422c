use anyhow::Result;

use crate::{error::TigerError, region::RegionTable};

/// Width of a state code.
pub const STATE_CODE_WIDTH: usize = 2;

/// One row of the states dataset relevant to name resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateEntry {
    pub name: String,
    pub abbr: String,
    pub code: String,
}

/// Resolves free-text state identifiers (full name or postal code) to numeric codes.
#[derive(Clone, Debug, Default)]
pub struct StateDirectory {
    entries: Vec<StateEntry>,
}

impl StateDirectory {
    pub fn new(entries: Vec<StateEntry>) -> Self { Self { entries } }

    /// Read `NAME`, `STUSPS` and `STATEFP` from a states table.
    pub fn from_table(table: &RegionTable) -> Result<Self> {
        let entries = table.column("NAME")?.into_iter()
            .zip(table.column("STUSPS")?)
            .zip(table.column("STATEFP")?)
            .map(|((name, abbr), code)| StateEntry {
                name: name.unwrap_or_default().to_string(),
                abbr: abbr.unwrap_or_default().to_string(),
                code: code.unwrap_or_default().to_string(),
            })
            .collect();
        Ok(Self { entries })
    }

    /// Match the full name first, then the postal abbreviation, both case-insensitively.
    pub fn resolve(&self, input: &str) -> Result<String, TigerError> {
        let text = input.trim();
        if text.is_empty() {
            return Err(TigerError::Resolution { input: input.to_string() });
        }
        self.entries.iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(text))
            .or_else(|| self.entries.iter().find(|entry| entry.abbr.eq_ignore_ascii_case(text)))
            .map(|entry| pad_code(&entry.code, STATE_CODE_WIDTH))
            .ok_or_else(|| TigerError::Resolution { input: input.to_string() })
    }
}

/// Left-pad a numeric code with zeros to `width` characters.
pub fn pad_code(code: &str, width: usize) -> String {
    format!("{:0>width$}", code.trim())
}
