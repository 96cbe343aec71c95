use anyhow::{anyhow, Context};
use serde_json::json;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MANIFEST_ENTRY: &str = "manifest.json";
const DB_ENTRY: &str = "db/scoresafe.sqlite3";
const PAPERS_PREFIX: &str = "papers/";
pub const BUNDLE_FORMAT_V1: &str = "scoresafe-workspace-v1";

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bundle_format: String,
    pub entry_count: usize,
    pub paper_count: usize,
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub bundle_format_detected: String,
    pub paper_count: usize,
}

pub fn export_workspace_bundle(
    workspace_path: &Path,
    out_path: &Path,
) -> anyhow::Result<ExportSummary> {
    let db_path = workspace_path.join("scoresafe.sqlite3");
    if !db_path.is_file() {
        return Err(anyhow!(
            "workspace store not found: {}",
            db_path.to_string_lossy()
        ));
    }

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let out_file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    let mut zip = ZipWriter::new(out_file);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let exported_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let manifest = json!({
        "format": BUNDLE_FORMAT_V1,
        "version": 1,
        "appVersion": env!("CARGO_PKG_VERSION"),
        "exportedAt": exported_at,
    });
    zip.start_file(MANIFEST_ENTRY, opts)
        .context("failed to start manifest entry")?;
    zip.write_all(
        serde_json::to_string_pretty(&manifest)
            .context("failed to serialize manifest")?
            .as_bytes(),
    )
    .context("failed to write manifest entry")?;

    zip.start_file(DB_ENTRY, opts)
        .context("failed to start store entry")?;
    let mut db_file = File::open(&db_path)
        .with_context(|| format!("failed to open store {}", db_path.to_string_lossy()))?;
    std::io::copy(&mut db_file, &mut zip).context("failed to write store entry")?;

    let mut paper_count = 0usize;
    let papers_dir = workspace_path.join("papers");
    if papers_dir.is_dir() {
        for ent in std::fs::read_dir(&papers_dir)
            .with_context(|| format!("failed to list {}", papers_dir.to_string_lossy()))?
        {
            let ent = ent?;
            let p = ent.path();
            if !p.is_file() {
                continue;
            }
            let Some(name) = p.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            zip.start_file(format!("{}{}", PAPERS_PREFIX, name), opts)
                .with_context(|| format!("failed to start paper entry {}", name))?;
            let mut f = File::open(&p)
                .with_context(|| format!("failed to open paper {}", p.to_string_lossy()))?;
            std::io::copy(&mut f, &mut zip)
                .with_context(|| format!("failed to write paper entry {}", name))?;
            paper_count += 1;
        }
    }

    zip.finish().context("failed to finalize zip bundle")?;

    Ok(ExportSummary {
        bundle_format: BUNDLE_FORMAT_V1.to_string(),
        entry_count: 2 + paper_count,
        paper_count,
    })
}

pub fn import_workspace_bundle(
    in_path: &Path,
    workspace_path: &Path,
) -> anyhow::Result<ImportSummary> {
    std::fs::create_dir_all(workspace_path).with_context(|| {
        format!(
            "failed to create workspace {}",
            workspace_path.to_string_lossy()
        )
    })?;
    let dst = workspace_path.join("scoresafe.sqlite3");

    let in_file = File::open(in_path)
        .with_context(|| format!("failed to open bundle {}", in_path.to_string_lossy()))?;
    let mut archive = ZipArchive::new(in_file).context("invalid zip archive")?;

    let mut manifest_text = String::new();
    archive
        .by_name(MANIFEST_ENTRY)
        .context("bundle missing manifest.json")?
        .read_to_string(&mut manifest_text)
        .context("failed to read manifest.json")?;
    let manifest: serde_json::Value =
        serde_json::from_str(&manifest_text).context("manifest.json is invalid JSON")?;
    let format = manifest
        .get("format")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if format != BUNDLE_FORMAT_V1 {
        return Err(anyhow!("unsupported bundle format: {}", format));
    }

    // Extract to a temp name first so a truncated bundle cannot destroy
    // the live store.
    let tmp_dst = workspace_path.join("scoresafe.sqlite3.importing");
    if tmp_dst.exists() {
        let _ = std::fs::remove_file(&tmp_dst);
    }

    let mut db_out = File::create(&tmp_dst)
        .with_context(|| format!("failed to create temp store {}", tmp_dst.to_string_lossy()))?;
    {
        let mut db_entry = archive
            .by_name(DB_ENTRY)
            .context("bundle missing db/scoresafe.sqlite3")?;
        std::io::copy(&mut db_entry, &mut db_out).context("failed to extract store entry")?;
    }
    db_out.flush().context("failed to flush extracted store")?;

    if dst.exists() {
        std::fs::remove_file(&dst).with_context(|| {
            format!("failed to remove existing store {}", dst.to_string_lossy())
        })?;
    }
    std::fs::rename(&tmp_dst, &dst).with_context(|| {
        format!(
            "failed to move extracted store to {}",
            dst.to_string_lossy()
        )
    })?;

    let mut paper_count = 0usize;
    let papers_dir = workspace_path.join("papers");
    let names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with(PAPERS_PREFIX))
        .map(|n| n.to_string())
        .collect();
    for entry_name in names {
        let file_name = match entry_name.strip_prefix(PAPERS_PREFIX) {
            Some(v) => v.to_string(),
            None => continue,
        };
        // Paper entries are flat hex digests; skip anything else.
        if file_name.is_empty() || !file_name.chars().all(|c| c.is_ascii_hexdigit()) {
            continue;
        }
        std::fs::create_dir_all(&papers_dir)
            .with_context(|| format!("failed to create {}", papers_dir.to_string_lossy()))?;
        let mut entry = archive
            .by_name(&entry_name)
            .with_context(|| format!("failed to reopen paper entry {}", entry_name))?;
        let out_path = papers_dir.join(&file_name);
        let mut out = File::create(&out_path)
            .with_context(|| format!("failed to create paper {}", out_path.to_string_lossy()))?;
        std::io::copy(&mut entry, &mut out)
            .with_context(|| format!("failed to extract paper {}", entry_name))?;
        paper_count += 1;
    }

    Ok(ImportSummary {
        bundle_format_detected: BUNDLE_FORMAT_V1.to_string(),
        paper_count,
    })
}
