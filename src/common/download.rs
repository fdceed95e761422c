use std::{fs::File, io::{Read, Write}, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use tempfile::NamedTempFile;

use crate::error::TigerError;

/// Response bodies are copied to disk in chunks of this size.
pub const CHUNK_SIZE: usize = 8192;

/// Write-then-rename wrapper for atomic big-file outputs
struct PendingWrite {
    target: PathBuf,
    tmp: NamedTempFile,
}

impl PendingWrite {
    /// Open a temp file next to `target`.
    fn open(target: &Path) -> Result<Self> {
        let parent = target.parent().unwrap_or(Path::new("."));
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create dir {}", parent.display()))?;
        let tmp = NamedTempFile::new_in(parent).context("create temp file")?;
        Ok(Self { target: target.to_path_buf(), tmp })
    }

    /// Finalize the big write.
    fn finalize(self) -> Result<()> {
        self.tmp.as_file().sync_all().ok(); // best-effort fsync file
        self.tmp.persist(&self.target)
            .with_context(|| format!("rename to {}", self.target.display()))?;
        if let Some(dir) = self.target.parent() {
            let _ = File::open(dir).and_then(|f| f.sync_all());
        }
        Ok(())
    }
}

impl Write for PendingWrite {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> { self.tmp.write(buf) }
    fn flush(&mut self) -> std::io::Result<()> { self.tmp.flush() }
}

/// Download `url` to `out_path` in fixed-size chunks. `name` labels the resource in errors.
pub fn download_big_file(client: &Client, name: &str, url: &str, out_path: &Path) -> Result<u64> {
    let download_error = |source: Box<dyn std::error::Error + Send + Sync>| TigerError::Download {
        name: name.to_string(),
        url: url.to_string(),
        source,
    };

    let mut resp = client.get(url).send()
        .and_then(|resp| resp.error_for_status())
        .map_err(|e| download_error(e.into()))?;

    let mut sink = PendingWrite::open(out_path)?;
    let mut buf = [0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        // a dropped connection mid-body is a transport failure too
        let n = resp.read(&mut buf).map_err(|e| download_error(e.into()))?;
        if n == 0 { break }
        sink.write_all(&buf[..n])
            .with_context(|| format!("write {}", out_path.display()))?;
        total += n as u64;
    }

    sink.finalize()?;
    Ok(total)
}
