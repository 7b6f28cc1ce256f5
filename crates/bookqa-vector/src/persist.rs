//! On-disk layout of a [`DenseIndex`].
//!
//! ```text
//! <dir>/vectors.bin   count * dim little-endian f32, row-major
//! <dir>/meta.json     {format_version, dim, count, checksum, built_at}
//! ```
//!
//! `checksum` is the BLAKE3 hex digest of `vectors.bin`. Both files are
//! written to temporaries in `<dir>` and renamed into place.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use bookqa_core::error::{Error, Result};

use crate::index::{DenseIndex, FlatVectors};

pub const VECTORS_FILE: &str = "vectors.bin";
pub const META_FILE: &str = "meta.json";
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseMeta {
    pub format_version: u32,
    pub dim: usize,
    pub count: usize,
    pub checksum: String,
    pub built_at: String,
}

impl DenseIndex {
    pub fn save(&self, dir: &Path) -> Result<DenseMeta> {
        let flat = self.flat()?;
        fs::create_dir_all(dir)?;

        let mut bytes = Vec::with_capacity(flat.data.len() * 4);
        for x in &flat.data {
            bytes.extend_from_slice(&x.to_le_bytes());
        }
        let meta = DenseMeta {
            format_version: FORMAT_VERSION,
            dim: flat.dim,
            count: self.len(),
            checksum: blake3::hash(&bytes).to_hex().to_string(),
            built_at: chrono::Utc::now().to_rfc3339(),
        };

        write_atomic(dir, VECTORS_FILE, &bytes)?;
        write_atomic(dir, META_FILE, serde_json::to_string_pretty(&meta)?.as_bytes())?;
        tracing::info!(dir = %dir.display(), count = meta.count, dim = meta.dim, "saved dense index");
        Ok(meta)
    }

    pub fn load(dir: &Path) -> Result<Self> {
        let meta = read_meta(dir)?;
        if meta.format_version != FORMAT_VERSION {
            return Err(Error::CorruptIndex(format!(
                "unsupported dense index format version {}",
                meta.format_version
            )));
        }
        if meta.dim == 0 || meta.count == 0 {
            return Err(Error::CorruptIndex(format!(
                "dense index metadata describes an empty index (dim={}, count={})",
                meta.dim, meta.count
            )));
        }

        let vectors_path = dir.join(VECTORS_FILE);
        if !vectors_path.exists() {
            return Err(Error::NotFound(vectors_path.display().to_string()));
        }
        let expected_len = meta
            .dim
            .checked_mul(meta.count)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| {
                Error::CorruptIndex(format!(
                    "dense index metadata is out of range (dim={}, count={})",
                    meta.dim, meta.count
                ))
            })?;
        let bytes = fs::read(&vectors_path)?;
        if bytes.len() != expected_len {
            return Err(Error::CorruptIndex(format!(
                "{} holds {} bytes, metadata expects {}",
                vectors_path.display(),
                bytes.len(),
                expected_len
            )));
        }
        if blake3::hash(&bytes).to_hex().as_str() != meta.checksum {
            return Err(Error::CorruptIndex(format!("checksum mismatch for {}", vectors_path.display())));
        }

        let data = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        tracing::info!(dir = %dir.display(), count = meta.count, dim = meta.dim, "loaded dense index");
        Ok(Self::from_flat(FlatVectors { dim: meta.dim, data }))
    }
}

pub fn read_meta(dir: &Path) -> Result<DenseMeta> {
    let meta_path = dir.join(META_FILE);
    if !meta_path.exists() {
        return Err(Error::NotFound(meta_path.display().to_string()));
    }
    serde_json::from_str(&fs::read_to_string(&meta_path)?)
        .map_err(|e| Error::CorruptIndex(format!("{}: {e}", meta_path.display())))
}

fn write_atomic(dir: &Path, name: &str, bytes: &[u8]) -> Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dir.join(name)).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
