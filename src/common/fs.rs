use std::{fs, path::{Path, PathBuf}};

use anyhow::{bail, Context, Result};
use walkdir::WalkDir;
use zip::ZipArchive;

/// Create the directory if it doesn’t exist; error if a non-directory exists there.
pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if path.exists() {
        if !path.is_dir() { bail!("Path exists but is not a directory: {}", path.display()); }
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {}", path.display()))?;
    }
    Ok(())
}

/// Extracts the given `.zip` file into `dest_dir`, overwriting files already there.
pub fn extract_zip(zip_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = fs::File::open(zip_path)
        .with_context(|| format!("failed to open {}", zip_path.display()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("failed to read zip archive {}", zip_path.display()))?;

    archive.extract(dest_dir)
        .with_context(|| format!("failed to extract {} to {}", zip_path.display(), dest_dir.display()))?;

    Ok(())
}

/// Return the first file with the given extension (case-insensitive) under `dir`, in traversal order.
pub fn find_first_with_extension(dir: &Path, ext: &str) -> Option<PathBuf> {
    WalkDir::new(dir).into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .find(|path| path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(ext)))
}
