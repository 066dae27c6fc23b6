use anyhow::{Context, Result};
use std::path::PathBuf;
use walkdir::WalkDir;

use docqa_core::error::Error;
use docqa_core::loader::DocumentKind;

/// Flat directory of uploaded documents. Names are reduced to their final
/// path component, so nothing is written outside `dir`.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

    /// Write `bytes` under the sanitized `file_name`, overwriting any earlier
    /// upload of the same name.
    pub async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let name = sanitize_file_name(file_name)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating {}", self.dir.display()))?;
        let path = self.dir.join(&name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(file = %name, bytes = bytes.len(), "stored upload");
        Ok(path)
    }

    pub fn resolve_existing(&self, file_name: &str) -> Result<PathBuf> {
        let name = sanitize_file_name(file_name)?;
        let path = self.dir.join(&name);
        if !path.is_file() {
            return Err(Error::InvalidRequest(format!("no uploaded document named {name}")).into());
        }
        Ok(path)
    }

    /// Supported documents in the upload directory, sorted by name.
    pub fn list(&self) -> Vec<String> {
        if !self.dir.is_dir() {
            return Vec::new();
        }
        let mut names: Vec<String> = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| DocumentKind::from_path(e.path()).is_ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Keep only the last component of a client-supplied name.
pub fn sanitize_file_name(raw: &str) -> Result<String, Error> {
    let name = raw.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default().trim();
    if name.is_empty() || name == "." || name == ".." {
        return Err(Error::InvalidRequest(format!("invalid file name {raw:?}")));
    }
    Ok(name.to_string())
}
