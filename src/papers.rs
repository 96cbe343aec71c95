use anyhow::{anyhow, Context};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

const PAPERS_DIR: &str = "papers";

#[derive(Debug, Clone)]
pub struct StoredPaper {
    pub name: String,
    pub content_ref: String,
}

/// Ingests an uploaded paper into the workspace and returns the opaque
/// content reference the owning record stores. Content is addressed by its
/// SHA-256 digest, so identical uploads deduplicate to one stored file.
pub fn ingest(workspace: &Path, paper_path: &Path) -> anyhow::Result<StoredPaper> {
    let name = paper_path
        .file_name()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow!("paper path has no file name"))?;
    let bytes = std::fs::read(paper_path)
        .with_context(|| format!("failed to read paper {}", paper_path.to_string_lossy()))?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let content_ref = format!("{:x}", hasher.finalize());

    let dir = workspace.join(PAPERS_DIR);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create {}", dir.to_string_lossy()))?;
    let dest = dir.join(&content_ref);
    if !dest.is_file() {
        std::fs::write(&dest, &bytes)
            .with_context(|| format!("failed to store paper {}", dest.to_string_lossy()))?;
    }

    Ok(StoredPaper { name, content_ref })
}

/// Resolves a content reference back to the stored file.
pub fn resolve(workspace: &Path, content_ref: &str) -> anyhow::Result<PathBuf> {
    // References are hex digests; anything else never names a stored paper.
    if content_ref.is_empty() || !content_ref.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(anyhow!("invalid paper reference: {}", content_ref));
    }
    let path = workspace.join(PAPERS_DIR).join(content_ref);
    if !path.is_file() {
        return Err(anyhow!("paper not found: {}", content_ref));
    }
    Ok(path)
}

/// Copies the referenced paper to `out_path` and returns the destination.
pub fn fetch_to(workspace: &Path, content_ref: &str, out_path: &Path) -> anyhow::Result<PathBuf> {
    let src = resolve(workspace, content_ref)?;
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    std::fs::copy(&src, out_path).with_context(|| {
        format!(
            "failed to copy paper {} to {}",
            src.to_string_lossy(),
            out_path.to_string_lossy()
        )
    })?;
    Ok(out_path.to_path_buf())
}
